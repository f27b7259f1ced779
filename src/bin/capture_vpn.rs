//! VPN/IKE/WireGuard capture engine, matching
//! `original_source/VPN4500and500.cpp`: ports {500, 4500, 51820}.

use netsentry::capture::pcap_driver::PcapDriver;
use netsentry::capture::BpfPreset;
use netsentry::config::EngineConfig;
use netsentry::lifecycle::EngineController;

fn main() -> anyhow::Result<()> {
    netsentry::init_tracing();

    let config = EngineConfig::from_env()?;
    let driver = PcapDriver;
    let preset = BpfPreset::vpn();
    let controller = EngineController::start(&driver, &config, Some(&preset))?;

    tracing::info!("netsentry capture-vpn running on ports 500/4500/51820; press Ctrl-C to stop");
    controller.join();
    Ok(())
}
