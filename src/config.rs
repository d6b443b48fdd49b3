use crate::core::db::TableSpec;
use crate::core::{CrudError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration shipped with the program: the restaurant database and its
/// six editable tables.
pub const DEFAULT_CONFIG: &str = r#"
[database]
path = "skovoroTka.db"
sanity_table = "Klienti"

[ui]
title = "SIA \"SkovoroTka\""
log_file = "tuicrud.log"
log_level = "info"

[[tabs]]
title = "Klienti"
table = "Klienti"
primary_key = "klients_id"
columns = [
    { name = "vards", label = "Vārds" },
    { name = "uzvards", label = "Uzvārds" },
    { name = "telefons", label = "Telefons" },
    { name = "alergijas", label = "Alerģijas" },
]

[[tabs]]
title = "Darbinieki"
table = "Darbinieki"
primary_key = "darbinieks_id"
columns = [
    { name = "vards", label = "Vārds" },
    { name = "uzvards", label = "Uzvārds" },
    { name = "vecums", label = "Vecums" },
    { name = "pieredze", label = "Pieredze" },
]

[[tabs]]
title = "Pasūtījumi"
table = "Pasutijumi"
primary_key = "pasutijums_id"
columns = [
    { name = "laiks", label = "Laiks" },
    { name = "galds", label = "Galds" },
    { name = "klients_id", label = "Klients ID" },
    { name = "darbinieks_id", label = "Darbinieks ID" },
]

[[tabs]]
title = "Pamatēdieni"
table = "Pamatedieni"
primary_key = "pamatediens_id"
columns = [
    { name = "nosaukums", label = "Nosaukums" },
    { name = "daudzums", label = "Daudzums" },
    { name = "kategorija_id", label = "Kategorija ID" },
    { name = "pasutijums_id", label = "Pasutijums ID" },
]

[[tabs]]
title = "Deserti"
table = "Deserti"
primary_key = "deserts_id"
columns = [
    { name = "nosaukums", label = "Nosaukums" },
    { name = "daudzums", label = "Daudzums" },
    { name = "kategorija_id", label = "Kategorija ID" },
    { name = "pasutijums_id", label = "Pasutijums ID" },
]

[[tabs]]
title = "Dzērieni"
table = "Dzerieni"
primary_key = "dzeriens_id"
columns = [
    { name = "nosaukums", label = "Nosaukums" },
    { name = "daudzums", label = "Daudzums" },
    { name = "alkohols", label = "Alkohols (jā/nē)" },
    { name = "kategorija_id", label = "Kategorija ID" },
    { name = "pasutijums_id", label = "Pasutijums ID" },
]
"#;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ui: UIConfig,
    pub tabs: Vec<TabConfig>,
}

/// Where the database lives and how to recognise it.
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Relative paths are resolved against the executable's directory.
    pub path: PathBuf,
    /// A table that must exist for the file to count as the right database.
    pub sanity_table: String,
}

/// UI and logging configuration.
#[derive(Debug, Default, Deserialize)]
pub struct UIConfig {
    pub title: Option<String>,
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// One editor tab.
#[derive(Debug, Clone, Deserialize)]
pub struct TabConfig {
    pub title: String,
    pub table: String,
    pub primary_key: String,
    pub columns: Vec<ColumnConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    pub label: String,
}

impl TabConfig {
    /// Validates the record into an immutable [`TableSpec`].
    pub fn to_spec(&self) -> Result<TableSpec> {
        TableSpec::new(
            self.title.clone(),
            self.table.as_str(),
            self.primary_key.as_str(),
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.label.clone()))
                .collect(),
        )
    }
}

impl Config {
    /// The built-in configuration.
    pub fn builtin() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Loads `explicit` if given, else the user's config file if it exists,
    /// else the built-in configuration.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return load_config(path);
        }
        if let Some(path) = user_config_path().filter(|p| p.is_file()) {
            return load_config(path);
        }
        debug!("Using built-in configuration");
        Self::builtin()
    }

    /// Every tab as a validated [`TableSpec`].
    pub fn table_specs(&self) -> Result<Vec<TableSpec>> {
        self.tabs.iter().map(TabConfig::to_spec).collect()
    }

    /// Finds a tab by title or table name, ignoring case.
    pub fn find_tab(&self, name: &str) -> Option<&TabConfig> {
        self.tabs.iter().find(|tab| {
            tab.title.eq_ignore_ascii_case(name) || tab.table.eq_ignore_ascii_case(name)
        })
    }

    /// The database path, anchored next to the executable when relative.
    pub fn database_path(&self) -> PathBuf {
        resolve_beside_exe(&self.database.path)
    }

    /// The log file path, anchored like the database path.
    pub fn log_path(&self) -> PathBuf {
        let file = self
            .ui
            .log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("tuicrud.log"));
        resolve_beside_exe(&file)
    }

    pub fn log_level(&self) -> tracing::Level {
        self.ui
            .log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(tracing::Level::INFO)
    }

    pub fn title(&self) -> &str {
        self.ui.title.as_deref().unwrap_or("tuicrud")
    }
}

/// `<config dir>/tuicrud/config.toml`, when the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tuicrud").join("config.toml"))
}

/// Loads configuration from a TOML file at the given path.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading configuration");
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    if config.tabs.is_empty() {
        return Err(CrudError::Config("no [[tabs]] configured".to_string()));
    }
    config.table_specs()?;
    Ok(config)
}

fn resolve_beside_exe(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(path)))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[database]
path = "/srv/data/shop.db"
sanity_table = "customers"

[ui]
log_level = "debug"

[[tabs]]
title = "Customers"
table = "customers"
primary_key = "id"
columns = [{ name = "name", label = "Name" }]
"#;

    #[test]
    fn test_builtin_config_has_six_tabs() {
        let config = Config::builtin().expect("built-in config must parse");
        assert_eq!(config.tabs.len(), 6);
        assert_eq!(config.database.sanity_table, "Klienti");
        assert_eq!(config.title(), "SIA \"SkovoroTka\"");

        let specs = config.table_specs().unwrap();
        let dzerieni = &specs[5];
        assert_eq!(dzerieni.name().as_str(), "Dzerieni");
        assert_eq!(dzerieni.columns().len(), 5);
        assert_eq!(dzerieni.columns()[2].label, "Alkohols (jā/nē)");
    }

    #[test]
    fn test_load_config_from_str() {
        let config = parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/srv/data/shop.db"));
        assert_eq!(config.log_level(), tracing::Level::DEBUG);
        assert_eq!(config.title(), "tuicrud");
        assert_eq!(config.find_tab("CUSTOMERS").unwrap().primary_key, "id");
        assert!(config.find_tab("orders").is_none());
    }

    #[test]
    fn test_find_tab_by_title_or_table() {
        let config = Config::builtin().unwrap();
        assert_eq!(config.find_tab("pasutijumi").unwrap().title, "Pasūtījumi");
        assert_eq!(config.find_tab("Pasūtījumi").unwrap().table, "Pasutijumi");
    }

    #[test]
    fn test_relative_paths_resolve_beside_executable() {
        let config = Config::builtin().unwrap();
        let db = config.database_path();
        assert!(db.is_absolute());
        assert!(db.ends_with("skovoroTka.db"));
        assert!(config.log_path().ends_with("tuicrud.log"));
    }

    #[test]
    fn test_invalid_tab_is_rejected() {
        let bad = SAMPLE_CONFIG.replace(r#"name = "name""#, r#"name = "id""#);
        assert!(matches!(parse_config(&bad), Err(CrudError::Config(_))));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        assert!(matches!(parse_config("[database"), Err(CrudError::Toml(_))));
    }

    #[test]
    fn test_missing_tabs_is_rejected() {
        let text = "tabs = []\n[database]\npath = \"x.db\"\nsanity_table = \"t\"\n";
        assert!(matches!(parse_config(text), Err(CrudError::Config(_))));
    }
}
