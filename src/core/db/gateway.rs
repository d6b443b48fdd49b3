/// Connection Gateway
///
/// The single point through which every statement reaches the database.
/// Driver errors stop here: they are shown to the operator together with
/// the SQL text and parameters, and the caller only learns that the
/// statement did not happen.
use crate::core::{CrudError, Notice, NoticeKind, Notifier, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, error, info};

/// One result row, in select-list order.
pub type RowRecord = Vec<Value>;

/// The outcome of a successful statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Column names of the select list (empty for non-SELECT statements)
    pub columns: Vec<String>,
    pub rows: Vec<RowRecord>,
    /// Rows changed by an INSERT, UPDATE or DELETE
    pub affected: usize,
}

/// Executes statements on behalf of table editors.
pub trait Gateway {
    /// Runs `sql` with `params` bound positionally and commits on success.
    ///
    /// On failure the operator has already been notified when this returns
    /// `Err`; callers must skip whatever follow-up assumed success.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<RowSet>;

    /// Like [`Gateway::execute`], but a failure reads as "no rows".
    fn fetch_all(&self, sql: &str, params: &[Value]) -> Vec<RowRecord> {
        self.execute(sql, params)
            .map(|set| set.rows)
            .unwrap_or_default()
    }
}

/// Gateway over one SQLite connection shared by every tab.
pub struct SqliteGateway {
    conn: Connection,
    path: Option<PathBuf>,
    notifier: RefCell<Rc<dyn Notifier>>,
}

impl SqliteGateway {
    /// Opens an existing database file and checks that `sanity_table` is in it.
    ///
    /// A missing file is an error rather than an invitation to create an
    /// empty database.
    pub fn open(
        path: impl AsRef<Path>,
        sanity_table: &str,
        notifier: Rc<dyn Notifier>,
    ) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CrudError::DatabaseMissing(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let gateway = SqliteGateway {
            conn,
            path: Some(path.to_path_buf()),
            notifier: RefCell::new(notifier),
        };

        let tables = gateway.table_names()?;
        info!(path = %path.display(), ?tables, "Opened database");
        if !tables.iter().any(|t| t == sanity_table) {
            return Err(CrudError::MissingTable {
                table: sanity_table.to_string(),
                path: path.to_path_buf(),
                tables,
            });
        }

        Ok(gateway)
    }

    /// Wraps an already open connection, e.g. an in-memory database.
    pub fn from_connection(conn: Connection, notifier: Rc<dyn Notifier>) -> Self {
        SqliteGateway {
            conn,
            path: None,
            notifier: RefCell::new(notifier),
        }
    }

    /// Routes later failure reports to `notifier`, e.g. once the terminal UI
    /// is up after opening the database on the console.
    pub fn set_notifier(&self, notifier: Rc<dyn Notifier>) {
        *self.notifier.borrow_mut() = notifier;
    }

    /// Path of the database file (`None` for wrapped connections).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Names of the user tables, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type='table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Commits anything pending and closes the connection.
    pub fn close(self) -> Result<()> {
        self.commit()?;
        self.conn.close().map_err(|(_, e)| CrudError::Database(e))?;
        info!("Database closed");
        Ok(())
    }

    fn commit(&self) -> rusqlite::Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn run(&self, sql: &str, params: &[Value]) -> rusqlite::Result<RowSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = stmt.column_count();

        let set = if column_count == 0 {
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            RowSet {
                columns,
                rows: Vec::new(),
                affected,
            }
        } else {
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(row.get::<_, Value>(i)?);
                }
                records.push(values);
            }
            RowSet {
                columns,
                rows: records,
                affected: 0,
            }
        };

        self.commit()?;
        Ok(set)
    }
}

impl Gateway for SqliteGateway {
    fn execute(&self, sql: &str, params: &[Value]) -> Result<RowSet> {
        debug!(sql, params = %describe_params(params), "Executing statement");
        match self.run(sql, params) {
            Ok(set) => Ok(set),
            Err(e) => {
                let params = describe_params(params);
                error!(error = %e, sql, params = %params, "Statement failed");
                let failure = CrudError::Statement {
                    message: e.to_string(),
                    sql: sql.to_string(),
                    params,
                };
                let notifier = self.notifier.borrow().clone();
                notifier.notify(&Notice::new(
                    NoticeKind::StatementFailed,
                    "Database error",
                    failure.to_string(),
                ));
                Err(failure)
            }
        }
    }
}

/// Renders bound parameters the way they are shown in failure reports.
pub fn describe_params(params: &[Value]) -> String {
    let items: Vec<String> = params
        .iter()
        .map(|v| match v {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => f.to_string(),
            Value::Text(t) => format!("'{}'", t),
            Value::Blob(b) => format!("<BLOB: {} bytes>", b.len()),
        })
        .collect();
    format!("({})", items.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::Recorder;
    use tempfile::NamedTempFile;

    fn memory_gateway() -> (SqliteGateway, Rc<Recorder>) {
        let recorder = Rc::new(Recorder::new());
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             INSERT INTO people (name) VALUES ('Alice'), ('Bob');",
        )
        .unwrap();
        (SqliteGateway::from_connection(conn, recorder.clone()), recorder)
    }

    #[test]
    fn test_select_returns_rows_and_columns() {
        let (gateway, recorder) = memory_gateway();
        let set = gateway
            .execute("SELECT id, name FROM people WHERE name = ?", &[Value::Text("Bob".into())])
            .unwrap();
        assert_eq!(set.columns, vec!["id", "name"]);
        assert_eq!(set.rows, vec![vec![Value::Integer(2), Value::Text("Bob".into())]]);
        assert!(recorder.notices().is_empty());
    }

    #[test]
    fn test_non_select_reports_affected_rows() {
        let (gateway, _) = memory_gateway();
        let set = gateway
            .execute("UPDATE people SET name = ? WHERE id > ?", &[Value::Text("X".into()), Value::Integer(0)])
            .unwrap();
        assert!(set.rows.is_empty());
        assert_eq!(set.affected, 2);
    }

    #[test]
    fn test_failure_is_notified_with_sql_and_params() {
        let (gateway, recorder) = memory_gateway();
        let result = gateway.execute("INSERT INTO people (name) VALUES (?)", &[Value::Null]);

        assert!(matches!(result, Err(CrudError::Statement { .. })));
        let notice = recorder.last().unwrap();
        assert_eq!(notice.kind, NoticeKind::StatementFailed);
        assert!(notice.message.contains("NOT NULL"));
        assert!(notice.message.contains("INSERT INTO people (name) VALUES (?)"));
        assert!(notice.message.contains("(NULL)"));
    }

    #[test]
    fn test_fetch_all_degrades_to_no_rows() {
        let (gateway, recorder) = memory_gateway();
        let rows = gateway.fetch_all("SELECT * FROM nonexistent_table", &[]);
        assert!(rows.is_empty());
        assert_eq!(recorder.kinds(), vec![NoticeKind::StatementFailed]);
    }

    #[test]
    fn test_set_notifier_redirects_failures() {
        let (gateway, first) = memory_gateway();
        let second = Rc::new(Recorder::new());
        gateway.set_notifier(second.clone());
        assert!(gateway.execute("SELECT nope FROM people", &[]).is_err());
        assert!(first.notices().is_empty());
        assert_eq!(second.kinds(), vec![NoticeKind::StatementFailed]);
    }

    #[test]
    fn test_open_transaction_is_committed() {
        let (gateway, _) = memory_gateway();
        gateway.connection().execute_batch("BEGIN").unwrap();
        gateway
            .execute("DELETE FROM people WHERE id = ?", &[Value::Integer(1)])
            .unwrap();
        assert!(gateway.connection().is_autocommit());
    }

    #[test]
    fn test_open_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let result = SqliteGateway::open(&path, "Klienti", Rc::new(Recorder::new()));
        assert!(matches!(result, Err(CrudError::DatabaseMissing(_))));
        assert!(!path.exists(), "open must not create the file");
    }

    #[test]
    fn test_open_requires_sanity_table() {
        let file = NamedTempFile::new().unwrap();
        Connection::open(file.path())
            .unwrap()
            .execute_batch("CREATE TABLE Other (id INTEGER PRIMARY KEY);")
            .unwrap();

        match SqliteGateway::open(file.path(), "Klienti", Rc::new(Recorder::new())) {
            Err(CrudError::MissingTable { table, tables, .. }) => {
                assert_eq!(table, "Klienti");
                assert_eq!(tables, vec!["Other".to_string()]);
            }
            Err(other) => panic!("Expected MissingTable, got {:?}", other),
            Ok(_) => panic!("Expected MissingTable, got a gateway"),
        }

        let gateway = SqliteGateway::open(file.path(), "Other", Rc::new(Recorder::new())).unwrap();
        assert_eq!(gateway.path(), Some(file.path()));
        gateway.close().unwrap();
    }

    #[test]
    fn test_describe_params() {
        let params = vec![
            Value::Text("Jane".into()),
            Value::Integer(5),
            Value::Null,
            Value::Blob(vec![1, 2, 3]),
        ];
        assert_eq!(describe_params(&params), "('Jane', 5, NULL, <BLOB: 3 bytes>)");
    }
}
