//! Purpose: `hostlink` CLI entry point and top-level command dispatch.
//! Exports: Binary entry point (clap-based CLI).
//! Role: Inspect version rules, stub layouts, and module loading from the shell.
//! Invariants: Successful command output is JSON on stdout; errors are JSON on stderr.
//! Invariants: Exit codes map from core error kinds.
//! Invariants: Diagnostics from tracing go to stderr so stdout stays parseable.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::ffi::OsString;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use clap::error::ErrorKind as ClapErrorKind;
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

use hostlink::api::{Error, ErrorKind, HostConfig, Interp, to_exit_code};

mod command_dispatch;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse_from(std::env::args_os().collect::<Vec<OsString>>()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `hostlink --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command, cli.config)
        .map_err(add_kind_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "hostlink",
    version,
    about = "Version negotiation and versioned host tables for extension modules",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"A host publishes a stub table under its package name. Modules negotiate
a version range, receive the table, and reach the host only through it.
"#,
    after_help = r#"EXAMPLES
  $ hostlink vcompare 8.5a1 8.5
  $ hostlink satisfies 8.6.0 8.5-9.1
  $ hostlink negotiate 8.5-9.1
  $ hostlink eval --load sample 'sample_sub 7 3'
  $ hostlink layout

LEARN MORE
  $ hostlink <command> --help"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON host config file (version, search_path, safe, stubs)",
        value_hint = ValueHint::FilePath
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Overrides applied on top of the resolved `HostConfig`.
#[derive(Args, Clone, Debug, Default)]
struct HostArgs {
    #[arg(long = "host-version", help = "Version the host provides")]
    host_version: Option<String>,
    #[arg(
        long = "search-path",
        help = "Encoding directory (repeatable; replaces the configured list)",
        value_hint = ValueHint::DirPath
    )]
    search_path: Vec<String>,
    #[arg(long, help = "Create a restricted (safe) interpreter")]
    safe: bool,
    #[arg(long = "no-stubs", help = "Provide the host package without a stub table")]
    no_stubs: bool,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Compare two versions",
        after_help = r#"EXAMPLES
  $ hostlink vcompare 8.10 8.9        # {"cmp":1,...}
  $ hostlink vcompare 8.5a1 8.5       # alpha sorts before the release"#
    )]
    Vcompare {
        #[arg(help = "Left version")]
        left: String,
        #[arg(help = "Right version")]
        right: String,
    },
    #[command(
        about = "Check a version against a requirement",
        long_about = r#"Check a version against a requirement.

A requirement with exactly one non-digit character (8.5) must be a text prefix
of the version. Anything else is matched numerically: ranges (8.5-9.1), open
ranges (8.5-), and bare versions (8, 8.5.1) which mean "same major, not older"
or, with --exact, "same leading segments"."#,
        after_help = r#"EXAMPLES
  $ hostlink satisfies 8.6.0 8.5-9.1
  $ hostlink satisfies 9.0b2 9 --exact     # same leading segments"#
    )]
    Satisfies {
        #[arg(help = "Provided version")]
        version: String,
        #[arg(help = "Requirement", default_value = "")]
        spec: String,
        #[arg(long, help = "Bare versions must match segment for segment")]
        exact: bool,
    },
    #[command(
        about = "Require a package from a configured host",
        after_help = r#"EXAMPLES
  $ hostlink require Host 8.5-9.1
  $ hostlink require Host --host-version 9.2 8.5-9.1   # version conflict, exit 5"#
    )]
    Require {
        #[arg(help = "Package name")]
        package: String,
        #[arg(help = "Requirement", default_value = "")]
        spec: String,
        #[arg(long, help = "Bare versions must match segment for segment")]
        exact: bool,
        #[command(flatten)]
        host: HostArgs,
    },
    #[command(
        about = "Negotiate the host stub table",
        after_help = r#"EXAMPLES
  $ hostlink negotiate 8.5-9.1
  $ hostlink negotiate --no-stubs       # stubs unsupported, exit 6"#
    )]
    Negotiate {
        #[arg(help = "Requirement on the host version", default_value = "8.5-9.1")]
        spec: String,
        #[arg(long, help = "Bare versions must match segment for segment")]
        exact: bool,
        #[command(flatten)]
        host: HostArgs,
    },
    #[command(
        about = "Load a static module into a fresh host",
        after_help = r#"EXAMPLES
  $ hostlink load sample
  $ hostlink load sample --safe"#
    )]
    Load {
        #[arg(help = "Module prefix")]
        prefix: String,
        #[command(flatten)]
        host: HostArgs,
    },
    #[command(
        about = "Evaluate a script in a fresh host",
        after_help = r#"EXAMPLES
  $ hostlink eval 'package names'
  $ hostlink eval --load sample 'sample_sub 7 3'"#
    )]
    Eval {
        #[arg(help = "Script to evaluate")]
        script: String,
        #[arg(long = "load", help = "Module prefix to load first (repeatable)")]
        load: Vec<String>,
        #[command(flatten)]
        host: HostArgs,
    },
    #[command(about = "Print the stub table layout ledger")]
    Layout,
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
    #[command(about = "Print version info")]
    Version,
}

/// Fresh interpreter from defaults, `--config`, the environment, and flags.
fn build_interp(config_path: Option<&std::path::Path>, args: HostArgs) -> Result<Interp, Error> {
    let mut config = HostConfig::resolve(config_path)?;
    if let Some(version) = args.host_version {
        config.version = version;
    }
    if !args.search_path.is_empty() {
        config.search_path = args.search_path;
    }
    if args.safe {
        config.safe = true;
    }
    if args.no_stubs {
        config.stubs = false;
    }
    tracing::debug!(
        version = config.version.as_str(),
        safe = config.safe,
        stubs = config.stubs,
        "host configured"
    );
    Interp::from_config(&config)
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("hostlink {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(json!({
            "name": "hostlink",
            "version": env!("CARGO_PKG_VERSION"),
        }));
    }
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(err.result_text()));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(package) = err.package() {
        inner.insert("package".to_string(), json!(package));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        err.result_text()
    )];
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(package) = err.package() {
        lines.push(format!(
            "{} {package}",
            colorize_label("package:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

fn add_kind_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::VersionIncompatible => {
            err.with_hint("Check the requirement with `hostlink satisfies <version> <spec>`.")
        }
        ErrorKind::StubsUnsupported => {
            err.with_hint("The host must provide its package with a stub table (drop --no-stubs).")
        }
        ErrorKind::UnknownCommand => {
            err.with_hint("Load the module that defines it first, e.g. --load sample.")
        }
        ErrorKind::Internal => err.with_hint(
            "Unexpected internal failure. Retry with RUST_LOG=debug and share command/context if it persists.",
        ),
        _ => err,
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
