/*!
 * Cadence Init Command - write a starter configuration file
 */

use crate::config::CadenceConfig;
use crate::error::{CadenceError, Result};
use std::path::Path;
use tracing::info;

/// Write the default configuration to `path`, refusing to overwrite
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(CadenceError::Config(format!(
            "{} already exists; remove it first",
            path.display()
        )));
    }

    CadenceConfig::default().to_file(path)?;
    info!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence.toml");

        write_default_config(&path).unwrap();
        assert_eq!(
            CadenceConfig::from_file(&path).unwrap(),
            CadenceConfig::default()
        );
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cadence.toml");
        std::fs::write(&path, "# mine").unwrap();

        assert!(write_default_config(&path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");
    }
}
