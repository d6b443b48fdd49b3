//! Tests for the tuicrud binary in its non-interactive dump mode.

#[cfg(test)]
mod cli_tests {
    use assert_cmd::Command;
    use tempfile::TempDir;
    use tuicrud::test_utils::create_database_file;

    /// A scratch directory holding a sample database and serving as the
    /// config home, so no user configuration leaks into the run.
    fn setup() -> (TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("shop.db");
        create_database_file(&db).unwrap();
        (dir, db)
    }

    fn tuicrud(dir: &TempDir) -> Command {
        let mut cmd = Command::cargo_bin("tuicrud").unwrap();
        cmd.env("XDG_CONFIG_HOME", dir.path()).env("HOME", dir.path());
        cmd
    }

    fn stdout_of(cmd: &mut Command) -> String {
        let output = cmd.output().unwrap();
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn test_dump_csv() {
        let (dir, db) = setup();
        let out = stdout_of(tuicrud(&dir).arg(&db).args(["--dump", "Klienti"]));
        assert_eq!(
            out,
            "klients_id,vards,uzvards,telefons,alergijas\n\
             2,Bob,Berzs,20000002,\n\
             1,Anna,Ozola,20000001,nav\n"
        );
    }

    #[test]
    fn test_dump_search_json() {
        let (dir, db) = setup();
        let out = stdout_of(
            tuicrud(&dir)
                .arg(&db)
                .args(["--dump", "klienti", "--format", "json", "--search", "  an "]),
        );
        let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["vards"], "Anna");
        assert_eq!(rows[0]["klients_id"], 1);
    }

    #[test]
    fn test_dump_with_config_file() {
        let (dir, db) = setup();
        let config = dir.path().join("kategorijas.toml");
        std::fs::write(
            &config,
            r#"
[database]
path = "unused.db"
sanity_table = "Kategorijas"

[[tabs]]
title = "Kategorijas"
table = "Kategorijas"
primary_key = "kategorija_id"
columns = [
    { name = "pamatediens", label = "Pamatēdiens" },
    { name = "cena", label = "Cena" },
]
"#,
        )
        .unwrap();

        let out = stdout_of(
            tuicrud(&dir)
                .arg(&db)
                .arg("--config")
                .arg(&config)
                .args(["--dump", "Kategorijas", "--format", "md"]),
        );
        assert!(out.contains("| 1 | Zupa | 4.5 |"), "got {}", out);
    }

    #[test]
    fn test_missing_database_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("absent.db");
        let output = tuicrud(&dir)
            .arg(&db)
            .args(["--dump", "Klienti"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Database file not found"), "stderr: {}", stderr);
        assert!(!db.exists());
    }

    #[test]
    fn test_database_without_sanity_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("other.db");
        rusqlite::Connection::open(&db)
            .unwrap()
            .execute_batch("CREATE TABLE Other (id INTEGER PRIMARY KEY);")
            .unwrap();
        let output = tuicrud(&dir)
            .arg(&db)
            .args(["--dump", "Klienti"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("'Klienti' is missing"));
    }

    #[test]
    fn test_bad_arguments_print_usage() {
        let dir = tempfile::tempdir().unwrap();
        let output = tuicrud(&dir).args(["--format", "csv"]).output().unwrap();
        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Usage: tuicrud"));

        let help = stdout_of(tuicrud(&dir).arg("--help"));
        assert!(help.contains("--dump TAB"));
    }

    #[test]
    fn test_unknown_tab_fails() {
        let (dir, db) = setup();
        let output = tuicrud(&dir)
            .arg(&db)
            .args(["--dump", "Nope"])
            .output()
            .unwrap();
        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("no tab named 'Nope'"));
    }
}
