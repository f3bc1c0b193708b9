use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One tracked brand: a display name and the public handle of its channel.
///
/// The handle is used verbatim as configured; a leading `@` is tolerated and
/// stripped by the channel resolver before searching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    pub channel_handle: String,
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

/// Load and validate the brands configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        if brand.channel_handle.trim_start_matches('@').trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "brand '{}' has an empty channel_handle",
                brand.name
            )));
        }

        let lower_name = brand.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn brand(name: &str, handle: &str) -> BrandConfig {
        BrandConfig {
            name: name.to_string(),
            channel_handle: handle.to_string(),
        }
    }

    #[test]
    fn validate_accepts_valid_brands() {
        let brands_file = BrandsFile {
            brands: vec![
                brand("3CE", "@3CE_Official"),
                brand("ETUDE", "@etudeofficial"),
                brand("CLIO", "@clio_official"),
            ],
        };
        assert!(validate_brands(&brands_file).is_ok());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let brands_file = BrandsFile {
            brands: vec![brand("  ", "@handle")],
        };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_empty_handle() {
        let brands_file = BrandsFile {
            brands: vec![brand("Some Brand", "@")],
        };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("empty channel_handle"));
    }

    #[test]
    fn validate_rejects_duplicate_name_case_insensitive() {
        let brands_file = BrandsFile {
            brands: vec![brand("Clio", "@clio_official"), brand("CLIO", "@clio2")],
        };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("duplicate brand name"));
    }

    #[test]
    fn load_brands_parses_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "brands:\n  - name: 3CE\n    channel_handle: \"@3CE_Official\"\n  - name: ETUDE\n    channel_handle: \"@etudeofficial\"\n"
        )
        .expect("write yaml");

        let brands_file = load_brands(file.path()).expect("should load");
        assert_eq!(brands_file.brands.len(), 2);
        assert_eq!(brands_file.brands[0].name, "3CE");
        assert_eq!(brands_file.brands[0].channel_handle, "@3CE_Official");
    }

    #[test]
    fn load_brands_missing_file_is_io_error() {
        let result = load_brands(Path::new("/nonexistent/brands.yaml"));
        assert!(
            matches!(result, Err(ConfigError::BrandsFileIo { .. })),
            "expected BrandsFileIo, got: {result:?}"
        );
    }
}
