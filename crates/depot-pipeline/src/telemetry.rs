use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter. Fails if a subscriber is already set.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Logs go to stderr so command output on stdout stays machine-readable.
    let console_fmt = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "depot=debug".into()))
        .with(console_fmt)
        .try_init()?;

    tracing::debug!("Tracing initialized");
    Ok(())
}
