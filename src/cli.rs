use std::path::PathBuf;

use lisperer::config::{Command, Config, Prelude};
use lisperer::interpreter::Interpreter;
use lisperer::value::Value;
use rustyline::{error::ReadlineError, DefaultEditor};

fn main() {
    init_tracing();

    let command = match Config::from_env() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    match command {
        Command::Help => print_usage(),
        Command::Version => print_version(),
        Command::Run(config) => run(&config),
    }
}

/// Installs a subscriber only when `RUST_LOG` asks for one.
fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(EnvFilter::from_default_env())
        .init();
}

fn print_usage() {
    eprintln!("Lisperer, a small Lisp");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  lisperer [options] [paths...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --prelude <file>   Load <file> before anything else (default: stlib.lspy)");
    eprintln!("  --no-prelude       Do not load a prelude");
    eprintln!("  -i, --interactive  Start the prompt after loading the given paths");
    eprintln!("  help               Show this help message");
    eprintln!("  version            Show version information");
    eprintln!();
    eprintln!("Directories load every .lspy file beneath them. The prelude can also be");
    eprintln!("set with LISPERER_PRELUDE.");
}

fn print_version() {
    println!("lisperer {}", env!("CARGO_PKG_VERSION"));
}

fn run(config: &Config) {
    let interpreter = Interpreter::new();

    match &config.prelude {
        Prelude::Explicit(path) => report(interpreter.load(path)),
        Prelude::Default(path) if path.is_file() => report(interpreter.load(path)),
        Prelude::Default(_) | Prelude::Disabled => {}
    }

    for path in config.sources() {
        report(interpreter.load(&path));
    }

    if config.runs_interactive() {
        repl(&interpreter);
    }
}

/// Prints the outcome of a load when it failed as a whole.
fn report(result: Value) {
    if result.is_error() {
        println!("{}", result);
    }
}

fn repl(interpreter: &Interpreter) {
    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("Failed to initialize line editor: {}", err);
            std::process::exit(1);
        }
    };

    let history_path = history_path();
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    println!("Lisperer Version {}", env!("CARGO_PKG_VERSION"));
    println!("Type exit() to quit\n");

    loop {
        match rl.readline("lisperer> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                match interpreter.eval_source(&line) {
                    Ok(Value::Exit) => {
                        println!("{}", Value::Exit);
                        break;
                    }
                    Ok(value) => println!("{}", value),
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
}

fn history_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".lisperer_history"))
}
