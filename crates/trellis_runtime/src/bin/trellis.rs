//! Trellis CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use trellis_foundation::{Event, Value};
use trellis_runtime::Session;

/// One step of the run, in command-line order.
enum Action {
    Fire { name: String, payload: Option<String> },
    Advance(Duration),
}

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    actions: Vec<Action>,
    show_help: bool,
    show_version: bool,
    trace: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "--trace" => config.trace = true,
            "--event" => {
                i += 1;
                let spec = args.get(i).ok_or("--event requires a value")?;
                let (name, payload) = match spec.split_once('=') {
                    Some((name, payload)) => (name, Some(payload.to_string())),
                    None => (spec.as_str(), None),
                };
                if name.is_empty() {
                    return Err(format!("invalid --event value: {spec}").into());
                }
                config.actions.push(Action::Fire {
                    name: name.to_string(),
                    payload,
                });
            }
            "--advance" => {
                i += 1;
                let value = args.get(i).ok_or("--advance requires a value")?;
                let secs: f64 = value
                    .parse()
                    .ok()
                    .filter(|s: &f64| s.is_finite() && *s >= 0.0)
                    .ok_or_else(|| format!("invalid --advance value: {value}"))?;
                config.actions.push(Action::Advance(Duration::from_secs_f64(secs)));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

fn init_logging(trace: bool) {
    let filter = if trace {
        EnvFilter::new("trace")
    } else {
        EnvFilter::try_from_env("TRELLIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns false if any script had load errors.
fn run(args: Vec<String>) -> Result<bool, Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(true);
    }

    if config.show_version {
        println!("trellis {}", env!("CARGO_PKG_VERSION"));
        return Ok(true);
    }

    init_logging(config.trace);

    let mut session = Session::new()?;
    let mut clean = true;
    for file in &config.files {
        let script = session.load_file(file)?;
        for error in script.errors() {
            eprintln!("\x1b[31m{}:{error}\x1b[0m", file.display());
        }
        for warning in script.warnings() {
            eprintln!("\x1b[33m{}:{warning}\x1b[0m", file.display());
        }
        clean &= script.is_clean();
    }

    for action in config.actions {
        match action {
            Action::Fire { name, payload } => {
                let mut event = Event::new(name.as_str());
                if let Some(payload) = payload {
                    event = event.with_payload(Value::string(payload));
                }
                let dispatch = session.dispatch(event);
                if dispatch.cancelled {
                    eprintln!("\x1b[33m{name}: cancelled\x1b[0m");
                }
            }
            Action::Advance(by) => {
                session.advance(by);
            }
        }
        for message in session.outbox().take() {
            println!("{message}");
        }
    }

    let pending = session.clock().pending();
    if pending > 0 {
        eprintln!("\x1b[33m{pending} delayed execution(s) still waiting\x1b[0m");
    }
    Ok(clean)
}

fn print_help() {
    println!(
        "\x1b[1mTrellis\x1b[0m - Natural-language scripting engine

\x1b[1mUSAGE:\x1b[0m
    trellis [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Script files to load

\x1b[1mOPTIONS:\x1b[0m
    -h, --help                  Print help information
    -V, --version               Print version information
    --event NAME[=PAYLOAD]      Fire an event (repeatable, runs in order)
    --advance SECONDS           Move the virtual clock forward (repeatable)
    --trace                     Log everything (otherwise TRELLIS_LOG, default warn)

\x1b[1mEXAMPLES:\x1b[0m
    trellis greet.sk --event load
    trellis chat.sk --event \"message=hello there\" --advance 5
    trellis bot.sk --event command=/help --trace

Output from broadcast effects is printed after each event or advance.
Exits with status 2 if any script had load errors."
    );
}
