//! Controller binary entry point (`spec.md` §6). Parses the CLI, builds the
//! shared [`nix_lsp::Server`], and serves LSP over stdio. Argument parsing
//! follows `perl-lsp`'s flat `while i < args.len()` loop rather than reaching
//! for a CLI-parsing crate, since the teacher doesn't either.

use nix_config::Config;
use nix_lsp::{Server, Workers};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// The attribute-set worker binary installed alongside this one, used when
/// `NIXD_ATTRSET_EVAL` isn't set (`spec.md` §6).
const DEFAULT_WORKER_BIN_NAME: &str = "nix-eval-worker";

struct Cli {
    log_level: String,
    pretty: bool,
    config_json: Option<String>,
    option_worker_stderr: PathBuf,
    nixpkgs_worker_stderr: PathBuf,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            pretty: false,
            config_json: None,
            option_worker_stderr: PathBuf::from("/dev/null"),
            nixpkgs_worker_stderr: PathBuf::from("/dev/null"),
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = Cli::default();

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--lit-test" => {
                // Test-harness convenience: verbose logging, pretty output.
                // Input framing is unchanged — the same Content-Length
                // stream, just easier to read back when run by hand.
                cli.log_level = "verbose".to_string();
                cli.pretty = true;
            }
            "--pretty" => cli.pretty = true,
            _ if arg.starts_with("--log=") => cli.log_level = arg["--log=".len()..].to_string(),
            _ if arg.starts_with("--config=") => cli.config_json = Some(arg["--config=".len()..].to_string()),
            _ if arg.starts_with("--option-worker-stderr=") => {
                cli.option_worker_stderr = PathBuf::from(&arg["--option-worker-stderr=".len()..])
            }
            _ if arg.starts_with("--nixpkgs-worker-stderr=") => {
                cli.nixpkgs_worker_stderr = PathBuf::from(&arg["--nixpkgs-worker-stderr=".len()..])
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    init_logging(&cli.log_level);

    let config = match &cli.config_json {
        Some(json) => match Config::from_cli_json(json) {
            Ok(c) => c,
            Err(err) => {
                eprintln!("invalid --config JSON: {err}");
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let worker_program = attrset_worker_program();
    let workers = Workers::new(
        worker_program,
        cli.nixpkgs_worker_stderr.clone(),
        cli.option_worker_stderr.clone(),
        config.options.keys().cloned(),
    );

    let pool_size = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
    let output: Box<dyn io::Write + Send> = Box::new(io::stdout());
    let server = Arc::new(Server::new(config, workers, pool_size, output));

    tracing::info!(pool_size, pretty = cli.pretty, "nix-lsp started (stdio)");

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());
    if let Err(err) = nix_lsp::serve(&server, &mut reader) {
        eprintln!("nix-lsp: fatal transport error: {err}");
        process::exit(1);
    }
}

/// `$NIXD_ATTRSET_EVAL` if set, otherwise `nix-eval-worker` installed next to
/// this binary, falling back to a bare binary name resolved via `$PATH` if
/// this binary's own location can't be determined (`spec.md` §6: "absent,
/// the controller uses a compile-time install path").
fn attrset_worker_program() -> String {
    if let Ok(path) = std::env::var("NIXD_ATTRSET_EVAL") {
        return path;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_WORKER_BIN_NAME)))
        .and_then(|path| path.to_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_WORKER_BIN_NAME.to_string())
}

fn init_logging(level: &str) {
    let directive = match level {
        "error" => "error",
        "info" => "info",
        "debug" => "debug",
        "verbose" => "trace",
        other => {
            eprintln!("nix-lsp: unknown --log level {other:?}, defaulting to info");
            "info"
        }
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::new(directive))
        .init();
}

fn print_help() {
    eprintln!("nix-lsp: a language server for the Nix expression language");
    eprintln!();
    eprintln!("Usage: nix-lsp [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --lit-test                     delimited input, verbose logging, pretty output");
    eprintln!("  --log=error|info|debug|verbose  set log verbosity (default: info)");
    eprintln!("  --pretty                        pretty-print logged output");
    eprintln!("  --config=<json>                 seed configuration without a client roundtrip");
    eprintln!("  --option-worker-stderr=<path>   redirect option worker stderr (default: /dev/null)");
    eprintln!("  --nixpkgs-worker-stderr=<path>  redirect nixpkgs worker stderr (default: /dev/null)");
    eprintln!("  --help, -h                      show this help message");
}
