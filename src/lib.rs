pub mod aggregator;
pub mod byte_reader;
pub mod capture;
pub mod codec;
pub mod config;
pub mod decode;
pub mod error;
pub mod flow;
pub mod interface_registry;
pub mod lifecycle;
pub mod writer;

/// Installs the `tracing` subscriber shared by all three binaries, honouring
/// `RUST_LOG` and defaulting to info-level if unset.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netsentry=info".into()),
        )
        .init();
}
