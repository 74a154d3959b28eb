use std::io::{self, Write};
use std::path::Path;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trio::cli::{generate_completions, Args, Commands, DumpFormat};
use trio::config::AppConfig;
use trio::diagnostic::DiagnosticRenderer;
use trio::format;
use trio::interpreter::Error;
use trio::repl::Repl;
use trio::session::Session;

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    init_tracing(&config);

    let Some(dialect) = args.dialect else {
        error_message(&config, "A dialect is required: anna, alex or rosa");
        std::process::exit(2);
    };

    let mut session = Session::with_budget(dialect, config.budget.clone());
    tracing::debug!(%dialect, file = ?args.file, "starting");

    if let Some(path) = &args.file {
        let source = match read_file(path) {
            Ok(source) => source,
            Err(e) => {
                error_message(&config, &e);
                std::process::exit(1);
            }
        };

        let result = session.run_program(&source).map(|_| ());
        print_output(&mut session);
        if let Err(err) = result {
            let file_name = path.display().to_string();
            eprint!("{}", render_error(&source, &file_name, &err, config.color_enabled));
            std::process::exit(1);
        }

        if let Some(dump) = config.dump_env {
            print_environment(&session, dump);
        }

        if !args.repl {
            return;
        }
    }

    let stdin = io::stdin();
    let mut repl = Repl::new(session, stdin.lock(), io::stdout());
    if let Err(e) = repl.run() {
        error_message(&config, &format!("Error reading input: {}", e));
        std::process::exit(1);
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_directive()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn print_output(session: &mut Session) {
    let mut stdout = io::stdout().lock();
    for line in session.take_output() {
        let _ = writeln!(stdout, "{}", line);
    }
    let _ = stdout.flush();
}

fn print_environment(session: &Session, dump: DumpFormat) {
    match dump {
        DumpFormat::Text => print!("{}", format::environment_to_text(session.environment())),
        DumpFormat::Json => println!("{}", format::environment_to_json(session.environment(), false)),
    }
}

fn render_error(source: &str, file_name: &str, err: &Error, use_color: bool) -> String {
    DiagnosticRenderer::new(source, file_name, use_color).render(&err.to_diagnostic(source))
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
