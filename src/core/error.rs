/// TUICRUD Error Module
///
/// This module defines the error types for the table editor. Errors never
/// cross a table editor's boundary; they are turned into notifications at the
/// gateway, or reported once at startup before the terminal UI is shown.
use std::path::PathBuf;
use thiserror::Error;

/// Error type for the whole application.
#[derive(Error, Debug)]
pub enum CrudError {
    /// Database-related errors from SQLite operations
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database file does not exist next to the program
    #[error("Database file not found: {}", .0.display())]
    DatabaseMissing(PathBuf),

    /// The database opened fine but lacks the table used as a sanity check
    #[error("Table '{table}' is missing from {}; tables present: {tables:?}", .path.display())]
    MissingTable {
        table: String,
        path: PathBuf,
        tables: Vec<String>,
    },

    /// A generated statement failed; carries everything shown to the operator
    #[error("{message}\n\nSQL:\n{sql}\n\nParams:\n{params}")]
    Statement {
        message: String,
        sql: String,
        params: String,
    },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML syntax errors in a configuration file
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),

    /// UI-related errors (export formats, terminal setup)
    #[error("UI error: {0}")]
    Ui(String),

    /// File system and terminal I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON export errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use CrudError as the error type.
pub type Result<T> = std::result::Result<T, CrudError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let db_err = CrudError::Database(rusqlite::Error::ExecuteReturnedResults);
        assert!(db_err.to_string().contains("Database error"));

        let missing = CrudError::DatabaseMissing(PathBuf::from("/tmp/none.db"));
        assert_eq!(missing.to_string(), "Database file not found: /tmp/none.db");

        let config_err = CrudError::Config("Invalid config".to_string());
        assert!(config_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_statement_error_carries_sql_and_params() {
        let err = CrudError::Statement {
            message: "NOT NULL constraint failed: Klienti.vards".to_string(),
            sql: "INSERT INTO \"Klienti\" (\"vards\") VALUES (?)".to_string(),
            params: "[Null]".to_string(),
        };
        let text = err.to_string();
        assert!(text.starts_with("NOT NULL constraint failed"));
        assert!(text.contains("SQL:\nINSERT INTO \"Klienti\""));
        assert!(text.contains("Params:\n[Null]"));
    }

    #[test]
    fn test_missing_table_lists_tables() {
        let err = CrudError::MissingTable {
            table: "Klienti".to_string(),
            path: PathBuf::from("skovoroTka.db"),
            tables: vec!["Other".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("'Klienti'"));
        assert!(text.contains("\"Other\""));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let crud_err: CrudError = io_err.into();
        match crud_err {
            CrudError::Io(_) => {}
            _ => panic!("Expected IO error"),
        }

        let json_err: std::result::Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{ invalid json }");
        let crud_err: CrudError = json_err.unwrap_err().into();
        match crud_err {
            CrudError::Json(_) => {}
            _ => panic!("Expected JSON error"),
        }
    }
}
