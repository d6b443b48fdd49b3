//! Command-line handling.
//!
//! `tuicrud [DB_PATH] [--config FILE] [--dump TAB] [--format FMT] [--search TEXT]`
//!
//! Without `--dump` the terminal editor starts. With it, the named tab is
//! refreshed once and its rows are printed, which is handy for scripting and
//! for checking a database without a terminal.
use crate::config::Config;
use crate::core::db::{Gateway, SqliteGateway};
use crate::core::{CrudError, Notice, NoticeKind, Notifier, Result};
use crate::table_editor::{Outcome, TableEditor};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::warn;

pub const USAGE: &str = "\
Usage: tuicrud [DB_PATH] [options]

Options:
  --config FILE    Read tabs and database settings from FILE
  --dump TAB       Print the rows of TAB instead of starting the editor
  --format FMT     Output format for --dump: csv, json or markdown (default csv)
  --search TEXT    Only dump rows where some column contains TEXT
  -h, --help       Show this help
";

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub database: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub dump: Option<String>,
    pub format: Option<String>,
    pub search: Option<String>,
    pub help: bool,
}

impl Args {
    /// Parses arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parsed = Args::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--config" => parsed.config = Some(PathBuf::from(value_for(&arg, args.next())?)),
                "--dump" => parsed.dump = Some(value_for(&arg, args.next())?),
                "--format" => parsed.format = Some(value_for(&arg, args.next())?),
                "--search" => parsed.search = Some(value_for(&arg, args.next())?),
                flag if flag.starts_with("--") => {
                    return Err(CrudError::Config(format!("unknown option '{}'", flag)));
                }
                _ if parsed.database.is_none() => parsed.database = Some(PathBuf::from(&arg)),
                _ => {
                    return Err(CrudError::Config(format!("unexpected argument '{}'", arg)));
                }
            }
        }

        if parsed.dump.is_none() && (parsed.format.is_some() || parsed.search.is_some()) {
            return Err(CrudError::Config(
                "--format and --search only apply to --dump".to_string(),
            ));
        }
        Ok(parsed)
    }

    /// The database to open: the command line wins over the configuration.
    pub fn database_path(&self, config: &Config) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| config.database_path())
    }
}

fn value_for(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| CrudError::Config(format!("{} needs a value", flag)))
}

/// Refreshes one tab and renders its rows in `format`.
pub fn dump(
    config: &Config,
    gateway: Rc<dyn Gateway>,
    notifier: Rc<dyn Notifier>,
    tab: &str,
    format: &str,
    search: Option<&str>,
) -> Result<String> {
    let spec = config
        .find_tab(tab)
        .ok_or_else(|| CrudError::Config(format!("no tab named '{}'", tab)))?
        .to_spec()?;

    let mut editor = TableEditor::new(spec, gateway, notifier);
    if let Some(text) = search {
        editor.set_search(text);
    }
    match editor.refresh() {
        Outcome::Applied => editor.grid().export(format),
        _ => Err(CrudError::Ui(format!("could not read table '{}'", tab))),
    }
}

/// Opens the database named by `args`/`config` with the sanity check applied.
pub fn open_gateway(
    args: &Args,
    config: &Config,
    notifier: Rc<dyn Notifier>,
) -> Result<SqliteGateway> {
    let path = args.database_path(config);
    SqliteGateway::open(&path, &config.database.sanity_table, notifier)
}

/// Closes `gateway` with its final commit whatever `result` is, and returns
/// the first error of the two.
pub fn shutdown<T>(result: Result<T>, gateway: Rc<SqliteGateway>) -> Result<T> {
    let closed = match Rc::try_unwrap(gateway) {
        Ok(gateway) => gateway.close(),
        Err(_) => {
            warn!("Gateway still shared at shutdown; leaving the connection to drop");
            Ok(())
        }
    };
    let value = result?;
    closed.map(|()| value)
}

/// The notice shown once the database is open, listing its tables.
pub fn opened_notice(path: &Path, tables: &[String]) -> Notice {
    Notice::new(
        NoticeKind::Info,
        "Database opened",
        format!(
            "{}\n\n{} tables: {}",
            path.display(),
            tables.len(),
            tables.join(", ")
        ),
    )
}
