//! CLI argument definitions for the Caderneta application.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default HTTP port when neither flag, env var nor config sets one.
const DEFAULT_PORT: u16 = 3040;

/// Caderneta: records sales, expenses and income from plain Portuguese
/// sentences.
#[derive(Parser, Debug)]
#[command(name = "caderneta", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Product catalog JSON file.
    #[arg(long = "catalog", global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Talk to the interpreter on stdin (default).
    Repl {
        /// Conversation id used for every turn.
        #[arg(long = "conversation", default_value = "cli")]
        conversation: String,
    },
    /// Serve the turn protocol over HTTP.
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port")]
        port: Option<u16>,
    },
}

impl CliArgs {
    /// The subcommand to run; `repl` when none was given.
    pub fn resolve_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Repl {
            conversation: "cli".to_string(),
        })
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > CADERNETA_CONFIG env var > ~/.caderneta/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("CADERNETA_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the API server port.
    ///
    /// Priority: serve --port > CADERNETA_PORT env var > config file value > 3040.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(Command::Serve { port: Some(p) }) = self.command {
            return p;
        }
        if let Ok(val) = std::env::var("CADERNETA_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        if config_port != 0 {
            return config_port;
        }
        DEFAULT_PORT
    }

    /// Resolve the catalog file.
    ///
    /// Priority: --catalog flag > config file value, with `~` expanded.
    pub fn resolve_catalog_path(&self, config_catalog: &str) -> PathBuf {
        match self.catalog {
            Some(ref p) => p.clone(),
            None => expand_home(config_catalog),
        }
    }

    /// Resolve the log level.
    ///
    /// Returns `None` if not overridden on the command line.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(rest),
        },
        None => PathBuf::from(path),
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let var = "USERPROFILE";
    #[cfg(not(target_os = "windows"))]
    let var = "HOME";
    std::env::var(var).ok().map(PathBuf::from)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".caderneta").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_default_command_is_repl() {
        let args = parse(&["caderneta"]);
        assert_eq!(
            args.resolve_command(),
            Command::Repl {
                conversation: "cli".to_string()
            }
        );
    }

    #[test]
    fn test_serve_port_flag_wins() {
        let args = parse(&["caderneta", "serve", "--port", "8080"]);
        assert_eq!(args.resolve_port(3040), 8080);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&[
            "caderneta",
            "repl",
            "--conversation",
            "loja",
            "--config",
            "/tmp/c.toml",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/c.toml"));
        assert_eq!(args.resolve_log_level().as_deref(), Some("debug"));
        assert_eq!(
            args.resolve_command(),
            Command::Repl {
                conversation: "loja".to_string()
            }
        );
    }

    #[test]
    fn test_catalog_flag_overrides_config() {
        let args = parse(&["caderneta", "--catalog", "demos/catalog.json"]);
        assert_eq!(
            args.resolve_catalog_path("~/.caderneta/catalog.json"),
            PathBuf::from("demos/catalog.json")
        );
        let args = parse(&["caderneta"]);
        assert_eq!(
            args.resolve_catalog_path("/srv/catalog.json"),
            PathBuf::from("/srv/catalog.json")
        );
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        let expanded = expand_home("~/.caderneta/catalog.json");
        assert!(expanded.ends_with(".caderneta/catalog.json"));
        assert!(!expanded.starts_with("~"));
    }

    #[test]
    fn test_unknown_subcommand_rejected() {
        assert!(CliArgs::try_parse_from(["caderneta", "launch"]).is_err());
    }
}
