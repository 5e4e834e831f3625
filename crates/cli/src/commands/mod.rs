//! Command implementations.

mod info;
mod run;
mod serve;
mod validate;

pub use info::run_info;
pub use run::run_pipeline;
pub use serve::run_serve;
pub use validate::run_validate;

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::ServiceBlueprint;
use tracing::info;

use crate::error::{CliError, Result};

/// Load the blueprint at `path`, or the validated defaults when no path is given
pub(crate) fn load_blueprint(path: Option<&Path>) -> Result<ServiceBlueprint> {
    let Some(path) = path else {
        info!("No configuration file given, using defaults");
        let blueprint = ServiceBlueprint::default();
        ConfigLoader::validate(&blueprint)?;
        return Ok(blueprint);
    };

    info!(config = %path.display(), "Loading configuration");
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()));
    }

    Ok(ConfigLoader::load_from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_path() {
        let blueprint = load_blueprint(None).unwrap();
        assert_eq!(blueprint.grouping.idle_timeout_ms, 1000);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = load_blueprint(Some(Path::new("/nonexistent/series.toml"))).unwrap_err();
        assert!(matches!(err, CliError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"[grouping]\ntick_interval_ms = 0\n").unwrap();

        let err = load_blueprint(Some(file.path())).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
