use std::{env, fmt, path::PathBuf};

use common::config;
use common::settings;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug)]
pub enum Error {
    Merging {
        context: String,
        source: config::Error,
    },
    Deserializing {
        context: String,
        source: ::config::ConfigError,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Merging { context, source } => {
                write!(fmt, "Could not merge configuration: {context} | {source}")
            }
            Error::Deserializing { context, source } => {
                write!(
                    fmt,
                    "Could not deserialize configuration: {context} | {source}"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, clap::Parser)]
#[clap(
    name = "inkpost",
    about = "Newsletter backend for the blog",
    version = VERSION,
    )]
pub struct Opts {
    /// Defines the config directory
    ///
    #[arg(value_parser = clap::value_parser!(PathBuf), short = 'c', long = "config-dir")]
    pub config_dir: PathBuf,

    /// Defines the run mode in {testing, dev, prod, ...}
    ///
    /// If no run mode is provided, a default behavior will be used.
    #[arg(short = 'm', long = "run-mode")]
    pub run_mode: Option<String>,

    /// Override settings values using key=value
    #[arg(short = 's', long = "setting")]
    pub settings: Vec<String>,

    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Clone, clap::Parser)]
pub enum Command {
    /// Serve the newsletter REST API
    Run,
    /// Prints inkpost's configuration
    Config,
    /// Scan rendered posts and write the static index page
    BuildIndex {
        /// Directory holding the rendered post pages
        #[arg(value_parser = clap::value_parser!(PathBuf), long = "posts-dir")]
        posts_dir: PathBuf,
        /// Where the index page is written
        #[arg(value_parser = clap::value_parser!(PathBuf), long = "out")]
        out: PathBuf,
    },
    /// Screenshot a page and ask a vision model for design feedback
    Review {
        /// URL of the page under review
        #[arg(long = "url")]
        url: String,
    },
}

impl TryInto<settings::Settings> for Opts {
    type Error = Error;

    fn try_into(self) -> Result<settings::Settings, Self::Error> {
        config::merge_configuration(
            self.config_dir.as_ref(),
            &["service", "database", "email", "newsletter"],
            self.run_mode.as_deref(),
            "INKPOST",
            self.settings.clone(),
        )
        .map_err(|err| Error::Merging {
            context: "Inkpost Server Settings: Could not merge configuration".to_string(),
            source: err,
        })?
        .try_deserialize()
        .map_err(|err| Error::Deserializing {
            context: "Inkpost Server Settings: Could not deserialize configuration".to_string(),
            source: err,
        })
    }
}
