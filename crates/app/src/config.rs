use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use services::DEFAULT_SESSION_TTL_MINUTES;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgsError {
    #[error("{flag} requires a value")]
    MissingValue { flag: &'static str },
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("invalid bind address: {raw}")]
    InvalidBindAddr { raw: String },
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },
    #[error("invalid --upload-dir value: {raw}")]
    InvalidUploadDir { raw: String },
    #[error("invalid --session-ttl-minutes value: {raw} (expected 1..=525600)")]
    InvalidSessionTtl { raw: String },
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--bind <addr>] [--upload-dir <dir>] [--db <sqlite_url>]");
    eprintln!("                      [--session-ttl-minutes <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --bind {DEFAULT_BIND}");
    eprintln!("  --upload-dir {DEFAULT_UPLOAD_DIR}");
    eprintln!("  --db (unset: sessions and registrations stay in memory)");
    eprintln!("  --session-ttl-minutes {DEFAULT_SESSION_TTL_MINUTES}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_BIND_ADDR, QUIZ_UPLOAD_DIR, QUIZ_DB_URL, QUIZ_SESSION_TTL_MINUTES, RUST_LOG");
}

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve(Config),
    Help,
}

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub upload_dir: PathBuf,
    pub db_url: Option<String>,
    /// Idle minutes before a quiz session is evicted.
    pub session_ttl_minutes: i64,
}

fn parse_bind(raw: String) -> Result<SocketAddr, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidBindAddr { raw })
}

fn parse_ttl(raw: String) -> Result<i64, ArgsError> {
    match raw.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_SESSION_TTL_MINUTES).contains(&minutes) => Ok(minutes),
        _ => Err(ArgsError::InvalidSessionTtl { raw }),
    }
}

impl Config {
    /// Build the config from environment defaults, then command-line flags.
    ///
    /// `env` looks up a variable by name so tests can supply their own.
    ///
    /// # Errors
    ///
    /// Returns `ArgsError` for unknown flags, missing values or unparsable values.
    pub fn parse(
        env: impl Fn(&str) -> Option<String>,
        mut args: impl Iterator<Item = String>,
    ) -> Result<Command, ArgsError> {
        let mut bind = parse_bind(env("QUIZ_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.into()))?;
        let mut upload_dir =
            PathBuf::from(env("QUIZ_UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into()));
        let mut db_url = env("QUIZ_DB_URL")
            .filter(|v| !v.trim().is_empty())
            .map(normalize_sqlite_url);
        let mut session_ttl_minutes = env("QUIZ_SESSION_TTL_MINUTES")
            .map(parse_ttl)
            .transpose()?
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--bind" => {
                    bind = parse_bind(require_value(&mut args, "--bind")?)?;
                }
                "--upload-dir" => {
                    let value = require_value(&mut args, "--upload-dir")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidUploadDir { raw: value });
                    }
                    upload_dir = PathBuf::from(value);
                }
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--session-ttl-minutes" => {
                    session_ttl_minutes =
                        parse_ttl(require_value(&mut args, "--session-ttl-minutes")?)?;
                }
                "--help" | "-h" => return Ok(Command::Help),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Command::Serve(Self {
            bind,
            upload_dir,
            db_url,
            session_ttl_minutes,
        }))
    }
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the SQLite file and its parent directory exist before connecting.
///
/// # Errors
///
/// Returns an error if the URL is not a file URL or the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}
