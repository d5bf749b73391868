use anyhow::{Context, Result};
use md2enex_pipeline::ConvertConfig;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load conversion settings from `path`, or defaults when no file is given.
///
/// An explicitly named file that cannot be read is an error.
pub fn load(path: Option<&Path>) -> Result<ConvertConfig> {
    let Some(path) = path else {
        debug!("No config file given, using defaults");
        return Ok(ConvertConfig::default());
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = ConvertConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;

    debug!("Loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_no_file_uses_defaults() {
        assert_eq!(load(None).unwrap(), ConvertConfig::default());
    }

    #[test]
    fn test_loads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("md2enex.toml");
        fs::write(&path, "[convert]\noutput = \"all.enex\"\n").unwrap();

        let config = load(Some(&path)).unwrap();

        assert_eq!(config.output, PathBuf::from("all.enex"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[convert]\nembed_images = \"yes\"\n").unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
