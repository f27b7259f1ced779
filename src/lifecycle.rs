//! Engine lifecycle: wires capture workers, the periodic writer, and the
//! command loop together, and owns the shutdown signal (spec.md §4.H, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::aggregator::Aggregator;
use crate::capture::{spawn_workers, BpfPreset, CaptureDriver};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::interface_registry::InterfaceRegistry;
use crate::writer::{ondemand, periodic};

pub struct EngineController {
    shutdown: Arc<AtomicBool>,
    breakers: Vec<Arc<dyn Fn() + Send + Sync>>,
    capture_handles: Vec<std::thread::JoinHandle<()>>,
    writer_handle: Option<std::thread::JoinHandle<()>>,
}

impl EngineController {
    /// Starts N capture workers (one per opened interface), the periodic
    /// writer, and installs the Ctrl-C termination hook. Returns
    /// `EngineError::NoInterfaces` if not a single interface could be opened.
    pub fn start<D>(driver: &D, config: &EngineConfig, preset: Option<&BpfPreset>) -> Result<Self, EngineError>
    where
        D: CaptureDriver,
        D::Session: 'static,
    {
        let aggregator = Arc::new(Aggregator::new());
        let registry = Arc::new(InterfaceRegistry::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let (capture_handles, breakers) =
            spawn_workers(driver, preset, Arc::clone(&aggregator), registry);

        if capture_handles.is_empty() {
            return Err(EngineError::NoInterfaces);
        }

        let writer_handle = periodic::spawn(
            Arc::clone(&aggregator),
            config.encrypted_output.clone(),
            config.secret_key,
            Duration::from_secs(config.writer_interval_secs),
            Arc::clone(&shutdown),
        );

        let ctrlc_shutdown = Arc::clone(&shutdown);
        let ctrlc_breakers = breakers.clone();
        ctrlc::set_handler(move || {
            tracing::info!("termination signal received, shutting down");
            ctrlc_shutdown.store(true, Ordering::Relaxed);
            for breaker in &ctrlc_breakers {
                breaker();
            }
        })
        .expect("failed to install termination handler");

        let cleartext_path = config.cleartext_output.clone();
        let command_loop_aggregator = Arc::clone(&aggregator);
        std::thread::Builder::new()
            .name("command-loop".into())
            .spawn(move || ondemand::run_command_loop(&command_loop_aggregator, &cleartext_path))
            .ok();

        Ok(EngineController {
            shutdown,
            breakers,
            capture_handles,
            writer_handle: Some(writer_handle),
        })
    }

    /// Blocks until every capture worker has exited (spec.md §4.H).
    pub fn join(mut self) {
        for handle in self.capture_handles.drain(..) {
            let _ = handle.join();
        }
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.writer_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for breaker in &self.breakers {
            breaker();
        }
    }
}
