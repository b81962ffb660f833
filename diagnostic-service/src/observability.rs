use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "diagnostic_service=info,diagnostic_engine=info";

/// `RUST_LOG` wins when set; otherwise service and engine log at info.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // Keeps an already installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
