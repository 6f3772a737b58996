//! Validate command - checks the cache configuration without serving traffic

use std::path::PathBuf;

use tracing::info;

/// Run the validate command
pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = super::bootstrap(config_path.as_ref())?;
    let cache = config.cache.to_configuration()?;

    info!(
        "Configuration valid: dimension={}, threshold={}, metric={}, capacity={:?}, ttl={:?}",
        cache.dimension(),
        cache.distance_threshold(),
        cache.metric(),
        cache.capacity(),
        cache.ttl()
    );

    println!("{}", serde_json::to_string_pretty(&cache)?);

    Ok(())
}
