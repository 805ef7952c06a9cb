use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// The filter is taken from `RUST_LOG` when set and defaults to `info`
/// otherwise.
pub fn init_telemetry() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).try_init().map_err(|e| {
        anyhow::anyhow!("failed to install tracing subscriber: {e}")
    })?;

    Ok(())
}
