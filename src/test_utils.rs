/// # Test Utilities Module
///
/// Fixtures shared by unit and integration tests: the restaurant schema the
/// built-in tabs edit, a few sample rows, and gateways wired to a
/// [`Recorder`] so tests can see every notice.
use crate::core::db::SqliteGateway;
use crate::core::notify::Recorder;
use crate::core::Result;
use rusqlite::Connection;
use std::path::Path;
use std::rc::Rc;

/// Schema of the six built-in tabs plus the category table they reference.
pub const RESTAURANT_SCHEMA: &str = "
    CREATE TABLE Klienti (
        klients_id INTEGER PRIMARY KEY AUTOINCREMENT,
        vards TEXT NOT NULL,
        uzvards TEXT NOT NULL,
        telefons TEXT,
        alergijas TEXT
    );

    CREATE TABLE Darbinieki (
        darbinieks_id INTEGER PRIMARY KEY AUTOINCREMENT,
        vards TEXT NOT NULL,
        uzvards TEXT NOT NULL,
        vecums INTEGER,
        pieredze INTEGER
    );

    CREATE TABLE Kategorijas (
        kategorija_id INTEGER PRIMARY KEY AUTOINCREMENT,
        pamatediens TEXT,
        deserts TEXT,
        dzeriens TEXT,
        cena REAL
    );

    CREATE TABLE Pasutijumi (
        pasutijums_id INTEGER PRIMARY KEY AUTOINCREMENT,
        laiks TEXT NOT NULL,
        galds INTEGER NOT NULL,
        klients_id INTEGER REFERENCES Klienti (klients_id),
        darbinieks_id INTEGER REFERENCES Darbinieki (darbinieks_id)
    );

    CREATE TABLE Pamatedieni (
        pamatediens_id INTEGER PRIMARY KEY AUTOINCREMENT,
        nosaukums TEXT NOT NULL,
        daudzums INTEGER,
        kategorija_id INTEGER REFERENCES Kategorijas (kategorija_id),
        pasutijums_id INTEGER REFERENCES Pasutijumi (pasutijums_id)
    );

    CREATE TABLE Deserti (
        deserts_id INTEGER PRIMARY KEY AUTOINCREMENT,
        nosaukums TEXT NOT NULL,
        daudzums INTEGER,
        kategorija_id INTEGER REFERENCES Kategorijas (kategorija_id),
        pasutijums_id INTEGER REFERENCES Pasutijumi (pasutijums_id)
    );

    CREATE TABLE Dzerieni (
        dzeriens_id INTEGER PRIMARY KEY AUTOINCREMENT,
        nosaukums TEXT NOT NULL,
        daudzums INTEGER,
        alkohols TEXT,
        kategorija_id INTEGER REFERENCES Kategorijas (kategorija_id),
        pasutijums_id INTEGER REFERENCES Pasutijumi (pasutijums_id)
    );
";

pub const SAMPLE_DATA: &str = "
    INSERT INTO Klienti (vards, uzvards, telefons, alergijas) VALUES
        ('Anna', 'Ozola', '20000001', 'nav'),
        ('Bob', 'Berzs', '20000002', NULL);
    INSERT INTO Darbinieki (vards, uzvards, vecums, pieredze) VALUES
        ('Ilze', 'Kalna', 31, 8);
    INSERT INTO Kategorijas (pamatediens, deserts, dzeriens, cena) VALUES
        ('Zupa', NULL, NULL, 4.5);
    INSERT INTO Pasutijumi (laiks, galds, klients_id, darbinieks_id) VALUES
        ('2024-05-01 12:30', 7, 1, 1);
    INSERT INTO Pamatedieni (nosaukums, daudzums, kategorija_id, pasutijums_id) VALUES
        ('Soljanka', 1, 1, 1);
    INSERT INTO Dzerieni (nosaukums, daudzums, alkohols, kategorija_id, pasutijums_id) VALUES
        ('Kvass', 2, 'nē', 1, 1);
";

/// A restaurant database plus the recorder its gateway reports to.
pub struct DatabaseFixture {
    pub gateway: Rc<SqliteGateway>,
    pub recorder: Rc<Recorder>,
}

impl DatabaseFixture {
    /// In-memory database with the schema and no rows.
    pub fn empty() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(RESTAURANT_SCHEMA)?;
        Ok(Self::wrap(conn))
    }

    /// In-memory database with the schema and the sample rows.
    pub fn with_sample_data() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(RESTAURANT_SCHEMA)?;
        conn.execute_batch(SAMPLE_DATA)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        let recorder = Rc::new(Recorder::new());
        let gateway = Rc::new(SqliteGateway::from_connection(conn, recorder.clone()));
        DatabaseFixture { gateway, recorder }
    }

    /// Number of rows currently in `table`.
    pub fn count(&self, table: &str) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM {}",
            crate::core::db::quote_ident(table)
        );
        Ok(self
            .gateway
            .connection()
            .query_row(&sql, [], |row| row.get(0))?)
    }
}

/// Writes the restaurant schema and sample rows into a new file at `path`.
pub fn create_database_file(path: &Path) -> Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(RESTAURANT_SCHEMA)?;
    conn.execute_batch(SAMPLE_DATA)?;
    Ok(())
}
