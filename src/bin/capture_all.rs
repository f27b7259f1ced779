//! All-protocols capture engine, matching
//! `original_source/BG-Realtime-Parsing.cpp`: every interface, no BPF filter.

use netsentry::capture::pcap_driver::PcapDriver;
use netsentry::config::EngineConfig;
use netsentry::lifecycle::EngineController;

fn main() -> anyhow::Result<()> {
    netsentry::init_tracing();

    let config = EngineConfig::from_env()?;
    let driver = PcapDriver;
    let controller = EngineController::start(&driver, &config, None)?;

    tracing::info!("netsentry capture-all running; press Ctrl-C to stop, or enter 'd' to dump a cleartext snapshot");
    controller.join();
    Ok(())
}
