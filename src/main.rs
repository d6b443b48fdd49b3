use std::cell::RefCell;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Mutex;
use tracing::info;
use tuicrud::app::App;
use tuicrud::cli::{self, Args, USAGE};
use tuicrud::config::Config;
use tuicrud::core::db::SqliteGateway;
use tuicrud::core::notify::ConsoleNotifier;
use tuicrud::core::{Notice, NoticeKind, Notifier, Result};
use tuicrud::tui::{TerminalNotifier, Tui};

fn main() -> ExitCode {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };
    if args.help {
        print!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Startup and terminal failures are fatal; report once and stop.
            ConsoleNotifier.notify(&Notice::new(NoticeKind::Fatal, "tuicrud", e.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::discover(args.config.as_deref())?;
    init_logging(&config, args.dump.is_none());
    info!("Starting tuicrud...");

    let console: Rc<dyn Notifier> = Rc::new(ConsoleNotifier);
    let gateway = Rc::new(cli::open_gateway(&args, &config, console.clone())?);

    let result = match &args.dump {
        Some(tab) => cli::dump(
            &config,
            gateway.clone(),
            console,
            tab,
            args.format.as_deref().unwrap_or("csv"),
            args.search.as_deref(),
        )
        .map(|output| print!("{}", output)),
        None => run_editor(&args, &config, &gateway, console),
    };
    cli::shutdown(result, gateway)
}

/// Runs the terminal editor until the operator quits. The terminal is
/// restored before this returns, error or not.
fn run_editor(
    args: &Args,
    config: &Config,
    gateway: &Rc<SqliteGateway>,
    console: Rc<dyn Notifier>,
) -> Result<()> {
    let specs = config.table_specs()?;
    let tables = gateway.table_names()?;
    let path = args.database_path(config);

    let tui = Rc::new(RefCell::new(Tui::new()?));
    let notifier: Rc<dyn Notifier> = Rc::new(TerminalNotifier::new(tui.clone()));
    gateway.set_notifier(notifier.clone());

    notifier.notify(&cli::opened_notice(&path, &tables));
    let mut app = App::new(config.title(), specs, gateway.clone(), notifier);
    app.set_status(format!("Opened {}", path.display()));
    let result = app.run(&tui);
    drop(app);

    gateway.set_notifier(console);
    let restored = tui.borrow_mut().restore();
    result.and(restored)
}

/// Logs to stderr for dump mode and to a file while the terminal UI owns the
/// screen.
fn init_logging(config: &Config, to_file: bool) {
    let builder = tracing_subscriber::fmt().with_max_level(config.log_level());
    if !to_file {
        builder.with_writer(std::io::stderr).init();
        return;
    }

    let path = config.log_path();
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
        Err(e) => {
            eprintln!("Cannot open log file {}: {}; logging disabled", path.display(), e);
            builder.with_writer(std::io::sink).init();
        }
    }
}
