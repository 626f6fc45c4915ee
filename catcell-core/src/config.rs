use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "catcell.toml";

/// Top-level catcell configuration, matching `catcell.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatcellConfig {
    #[serde(default)]
    pub catmaid: CatmaidSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatmaidSection {
    pub base_url: String,
    pub project_id: u32,
    /// Environment variable holding the API token.
    pub token_env: String,
    /// Optional username for HTTP basic auth, sent alongside the token.
    pub username: String,
    /// Environment variable holding the basic-auth password.
    pub password_env: String,
    pub accept_invalid_certs: bool,
    pub timeout_secs: u64,
}

impl Default for CatmaidSection {
    fn default() -> Self {
        Self {
            base_url: "https://jls.janelia.org/catmaid".into(),
            project_id: 49,
            token_env: "CATMAID_TOKEN".into(),
            username: String::new(),
            password_env: "CATMAID_PASSWORD".into(),
            accept_invalid_certs: true,
            timeout_secs: 60,
        }
    }
}

impl CatmaidSection {
    pub fn token(&self) -> Option<String> {
        non_empty_env(&self.token_env)
    }

    pub fn password(&self) -> Option<String> {
        non_empty_env(&self.password_env)
    }

    pub fn username(&self) -> Option<&str> {
        let name = self.username.trim();
        (!name.is_empty()).then_some(name)
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    if var.is_empty() {
        return None;
    }
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub dir: PathBuf,
    pub cell_data: PathBuf,
    pub centriole_locations: PathBuf,
    pub centriole_vectors: PathBuf,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            cell_data: PathBuf::from("cell_data.csv"),
            centriole_locations: PathBuf::from("centriole_locs.csv"),
            centriole_vectors: PathBuf::from("centriole_vectors.txt"),
        }
    }
}

impl OutputSection {
    /// Resolve an output file against `dir` unless it is already absolute.
    pub fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.dir.join(file)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub centrioles: PathBuf,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            centrioles: PathBuf::from("centrioles.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Abort on the first per-cell failure instead of skipping the cell.
    pub strict: bool,
}

impl CatcellConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Load `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.catmaid.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "catmaid.base_url must be an http(s) URL, got {url:?}"
            )));
        }
        if self.catmaid.project_id == 0 {
            return Err(ConfigError::Invalid(
                "catmaid.project_id must be positive".into(),
            ));
        }
        if self.catmaid.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "catmaid.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn api_root(&self) -> String {
        format!(
            "{}/{}",
            self.catmaid.base_url.trim().trim_end_matches('/'),
            self.catmaid.project_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_dataset() {
        let config = CatcellConfig::default();
        assert_eq!(config.catmaid.project_id, 49);
        assert_eq!(config.api_root(), "https://jls.janelia.org/catmaid/49");
        assert_eq!(config.output.cell_data, PathBuf::from("cell_data.csv"));
        assert!(!config.run.strict);
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CatcellConfig::from_toml(
            r#"
[catmaid]
base_url = "http://localhost:8000/"
project_id = 3

[run]
strict = true
"#,
        )
        .unwrap();
        assert_eq!(config.api_root(), "http://localhost:8000/3");
        assert_eq!(config.catmaid.token_env, "CATMAID_TOKEN");
        assert_eq!(config.catmaid.timeout_secs, 60);
        assert!(config.run.strict);
        assert_eq!(config.cache.centrioles, PathBuf::from("centrioles.json"));
    }

    #[test]
    fn rejects_non_http_url() {
        let err = CatcellConfig::from_toml("[catmaid]\nbase_url = \"ftp://x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_project() {
        let err = CatcellConfig::from_toml("[catmaid]\nproject_id = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn parse_error_is_reported() {
        let err = CatcellConfig::from_toml("[catmaid\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CatcellConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
        let fallback = CatcellConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(fallback.catmaid.project_id, 49);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catcell.toml");
        std::fs::write(&path, "[output]\ndir = \"reports\"\n").unwrap();
        let config = CatcellConfig::load(&path).unwrap();
        assert_eq!(
            config.output.resolve(&config.output.cell_data),
            PathBuf::from("reports").join("cell_data.csv")
        );
    }

    #[test]
    fn absolute_output_is_not_rebased() {
        let dir = tempfile::tempdir().unwrap();
        let abs = dir.path().join("out.csv");
        let output = OutputSection::default();
        assert_eq!(output.resolve(&abs), abs);
    }

    #[test]
    fn blank_username_means_no_basic_auth() {
        let mut section = CatmaidSection::default();
        assert_eq!(section.username(), None);
        section.username = "  reader ".into();
        assert_eq!(section.username(), Some("reader"));
    }
}
