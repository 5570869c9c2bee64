//! Command-line front end: configure a [`Logger`] from flags and feed it
//! messages from the operands or from standard input.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};
use logging::{LogError, Logger, LoggerConfig, Severity};

const PROGRAM_NAME: &str = "asynclog";

/// Exit status when a configuration call failed but messages were still
/// logged through the fallback sink.
const EXIT_CONFIG_FAILURE: u8 = 1;

/// Exit status for command-line usage errors.
const EXIT_USAGE: u8 = 2;

struct ParsedArgs {
    config: LoggerConfig,
    severity: Severity,
    fatal: Option<String>,
    messages: Vec<String>,
}

fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .about("Write messages through the asynchronous logging backend.")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Log to PATH (a symlink to the active PATH.<stamp> file) instead of stdout.")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("append")
                .long("append")
                .help("Keep existing content of the log and warning files.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("warning-file")
                .long("warning-file")
                .value_name("PATH")
                .help("Also write warning and fatal lines to PATH.")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("log-size")
                .long("log-size")
                .value_name("MB")
                .help("Rotate the log file once it exceeds MB megabytes (0 disables rotation).")
                .default_value("0")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("log-count")
                .long("log-count")
                .value_name("N")
                .help("Keep at most N rotated log files (0 keeps all).")
                .default_value("0")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("level")
                .long("level")
                .value_name("LEVEL")
                .help("Minimum severity written: debug, info, warning or fatal.")
                .default_value("info")
                .value_parser(str::parse::<Severity>),
        )
        .arg(
            Arg::new("severity")
                .long("severity")
                .value_name("LEVEL")
                .help("Severity of the logged messages.")
                .default_value("info")
                .value_parser(str::parse::<Severity>),
        )
        .arg(
            Arg::new("fatal")
                .long("fatal")
                .value_name("MESSAGE")
                .help("Log MESSAGE at fatal severity after the other messages, then abort."),
        )
        .arg(
            Arg::new("sync")
                .long("sync")
                .help("Sync file data to disk on every flush.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("messages")
                .value_name("MESSAGE")
                .help("Messages to log; standard input lines are logged when omitted.")
                .action(ArgAction::Append)
                .num_args(0..),
        )
}

fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let mut matches = clap_command().try_get_matches_from(arguments)?;

    let append = matches.get_flag("append");
    let mut config = LoggerConfig::default()
        .with_level(matches.remove_one::<Severity>("level").unwrap_or_default())
        .with_log_size_mb(matches.remove_one::<u64>("log-size").unwrap_or_default())
        .with_log_count(matches.remove_one::<usize>("log-count").unwrap_or_default())
        .with_sync_on_flush(matches.get_flag("sync"));
    if let Some(path) = matches.remove_one::<PathBuf>("log-file") {
        config = config.with_log_file(path, append);
    }
    if let Some(path) = matches.remove_one::<PathBuf>("warning-file") {
        config = config.with_warning_file(path, append);
    }

    Ok(ParsedArgs {
        config,
        severity: matches
            .remove_one::<Severity>("severity")
            .unwrap_or_default(),
        fatal: matches.remove_one::<String>("fatal"),
        messages: matches
            .remove_many::<String>("messages")
            .map(Iterator::collect)
            .unwrap_or_default(),
    })
}

/// Installs a stderr subscriber for the writer's own diagnostics.
///
/// `RUST_LOG` overrides the default `warn` filter.
pub fn init_diagnostics() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Parses `args`, logs the requested messages and returns the exit status.
///
/// Help and version output go to `stdout`, diagnostics to `stderr`. Log
/// lines themselves go to the configured file or to the process's standard
/// output.
pub fn run_with<I, In, Out, Err>(
    args: I,
    stdin: &mut In,
    stdout: &mut Out,
    stderr: &mut Err,
) -> ExitCode
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    In: BufRead,
    Out: Write,
    Err: Write,
{
    ExitCode::from(run_status(args, stdin, stdout, stderr))
}

fn run_status<I, In, Out, Err>(args: I, stdin: &mut In, stdout: &mut Out, stderr: &mut Err) -> u8
where
    I: IntoIterator,
    I::Item: Into<OsString> + Clone,
    In: BufRead,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(args) {
        Ok(parsed) => parsed,
        Err(error) => {
            let stream: &mut dyn Write = if error.use_stderr() { stderr } else { stdout };
            let _ = write!(stream, "{error}");
            return if error.use_stderr() { EXIT_USAGE } else { 0 };
        }
    };

    // Only the writer settings fixed at spawn go through `start`; the sinks
    // are applied afterwards so a bad path falls back instead of aborting.
    let startup = LoggerConfig::default()
        .with_queue(parsed.config.queue)
        .with_sync_on_flush(parsed.config.sync_on_flush);
    let logger = match Logger::start(startup) {
        Ok(logger) => logger,
        Err(error) => {
            report(stderr, &error);
            return EXIT_CONFIG_FAILURE;
        }
    };

    let configured = logger.apply(&parsed.config);
    match &configured {
        Ok(()) => tracing::debug!(config = ?parsed.config, "logger configured"),
        Err(error) => report(stderr, error),
    }

    if parsed.messages.is_empty() && parsed.fatal.is_none() {
        for line in stdin.lines() {
            match line {
                Ok(line) => logger.log(parsed.severity, line),
                Err(error) => {
                    let _ = writeln!(stderr, "{PROGRAM_NAME}: failed to read stdin: {error}");
                    break;
                }
            }
        }
    } else {
        for message in &parsed.messages {
            logger.log(parsed.severity, message);
        }
    }

    if let Some(message) = &parsed.fatal {
        logger.log(Severity::Fatal, message);
    }

    logger.shutdown();
    if configured.is_err() {
        EXIT_CONFIG_FAILURE
    } else {
        0
    }
}

fn report<W: Write>(stderr: &mut W, error: &LogError) {
    let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str], input: &str) -> (u8, String, String) {
        let mut stdin = input.as_bytes();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut argv = vec![PROGRAM_NAME];
        argv.extend_from_slice(args);
        let code = run_status(argv, &mut stdin, &mut stdout, &mut stderr);
        (
            code,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(stderr).unwrap(),
        )
    }

    #[test]
    fn parse_defaults() {
        let parsed = parse_args([PROGRAM_NAME]).unwrap();
        assert_eq!(parsed.config, LoggerConfig::default());
        assert_eq!(parsed.severity, Severity::Info);
        assert!(parsed.fatal.is_none());
        assert!(parsed.messages.is_empty());
    }

    #[test]
    fn parse_all_flags() {
        let parsed = parse_args([
            PROGRAM_NAME,
            "--log-file",
            "/tmp/app.log",
            "--warning-file",
            "/tmp/app.warn",
            "--append",
            "--log-size",
            "10",
            "--log-count",
            "3",
            "--level",
            "debug",
            "--severity",
            "WARN",
            "--sync",
            "first",
            "second",
        ])
        .unwrap();

        let expected = LoggerConfig::default()
            .with_level(Severity::Debug)
            .with_log_file("/tmp/app.log", true)
            .with_warning_file("/tmp/app.warn", true)
            .with_log_size_mb(10)
            .with_log_count(3)
            .with_sync_on_flush(true);
        assert_eq!(parsed.config, expected);
        assert_eq!(parsed.severity, Severity::Warning);
        assert_eq!(parsed.messages, ["first", "second"]);
    }

    #[test]
    fn invalid_level_is_a_usage_error() {
        let (code, stdout, stderr) = run(&["--level", "loud"], "");
        assert_eq!(code, EXIT_USAGE);
        assert!(stdout.is_empty());
        assert!(stderr.contains("loud"));
    }

    #[test]
    fn help_goes_to_stdout() {
        let (code, stdout, stderr) = run(&["--help"], "");
        assert_eq!(code, 0);
        assert!(stdout.contains("--log-file"));
        assert!(stderr.is_empty());
    }

    #[test]
    fn stdin_lines_are_logged_when_no_operands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let path_arg = path.to_str().unwrap();

        let (code, _, stderr) = run(&["--log-file", path_arg], "alpha\nbeta\n");
        assert_eq!(code, 0, "stderr: {stderr}");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" alpha"));
        assert!(lines[1].ends_with(" beta"));
    }

    #[test]
    fn unopenable_log_file_exits_with_config_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");

        let (code, _, stderr) = run(&["--log-file", path.to_str().unwrap(), "message"], "");
        assert_eq!(code, EXIT_CONFIG_FAILURE);
        assert!(stderr.contains("failed to open log file"));
    }
}
