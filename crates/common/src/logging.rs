use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
