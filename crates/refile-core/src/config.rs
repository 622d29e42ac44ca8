use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Path to the relational store holding `files` and `file_relations`.
    pub db_path: String,
    /// URL substrings identifying the decommissioned storage origin.
    /// Any file whose url contains one of these is classified `source`.
    #[serde(default)]
    pub source_url_patterns: Vec<String>,
    /// Files created strictly before this timestamp are classified
    /// `source` when no url pattern applies. RFC 3339 or
    /// "YYYY-MM-DD HH:MM:SS".
    #[serde(default)]
    pub created_cutoff: Option<String>,
    /// Gzip-compressed SQL dump to draw the source inventory from
    /// instead of the live store.
    #[serde(default)]
    pub backup_path: Option<String>,
    #[serde(default = "default_files_table")]
    pub backup_files_table: String,
    #[serde(default = "default_relations_table")]
    pub backup_relations_table: String,
}

fn default_files_table() -> String {
    "files".to_string()
}

fn default_relations_table() -> String {
    "files_related_morphs".to_string()
}

/// Load configuration from an optional `Config.toml` plus `REFILE_`-prefixed
/// environment variables. Nothing store-related is ever compiled in.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("db_path", "refile.db")?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("REFILE"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
