//! DNS/BGP capture engine, matching the port-restricted variant in
//! `original_source/"DNS (UDP/UDP/TCP(port 53),BGP (TCP 179).cpp"`: ports {53, 179}.

use netsentry::capture::pcap_driver::PcapDriver;
use netsentry::capture::BpfPreset;
use netsentry::config::EngineConfig;
use netsentry::lifecycle::EngineController;

fn main() -> anyhow::Result<()> {
    netsentry::init_tracing();

    let config = EngineConfig::from_env()?;
    let driver = PcapDriver;
    let preset = BpfPreset::dns_bgp();
    let controller = EngineController::start(&driver, &config, Some(&preset))?;

    tracing::info!("netsentry capture-dns-bgp running on ports 53/179; press Ctrl-C to stop");
    controller.join();
    Ok(())
}
