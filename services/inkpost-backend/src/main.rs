use clap::Parser;
use std::fmt;

use common::err_context::{ErrorContext, ErrorContextExt};
use common::settings::Settings;
use inkpost::application::opts::{Command, Error as OptsError, Opts};
use inkpost::application::{ApplicationBuilder, Error as ApplicationError};
use inkpost::index;
use inkpost::review;
use inkpost::telemetry;

#[derive(Debug)]
pub enum Error {
    Options {
        context: String,
        source: OptsError,
    },
    Application {
        context: String,
        source: ApplicationError,
    },
    Index {
        context: String,
        source: index::Error,
    },
    Review {
        context: String,
        source: review::Error,
    },
    Configuration {
        context: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Options { context, source } => {
                write!(fmt, "Options Error: {context} | {source}")
            }
            Error::Application { context, source } => {
                write!(fmt, "Could not build application: {context} | {source}")
            }
            Error::Index { context, source } => {
                write!(fmt, "Could not build index: {context} | {source}")
            }
            Error::Review { context, source } => {
                write!(fmt, "Could not run review: {context} | {source}")
            }
            Error::Configuration { context } => {
                write!(fmt, "Configuration Error: {context}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorContext<OptsError>> for Error {
    fn from(err: ErrorContext<OptsError>) -> Self {
        Error::Options {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<ApplicationError>> for Error {
    fn from(err: ErrorContext<ApplicationError>) -> Self {
        Error::Application {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<index::Error>> for Error {
    fn from(err: ErrorContext<index::Error>) -> Self {
        Error::Index {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<review::Error>> for Error {
    fn from(err: ErrorContext<review::Error>) -> Self {
        Error::Review {
            context: err.0,
            source: err.1,
        }
    }
}

#[allow(clippy::result_large_err)]
#[tokio::main]
async fn main() -> Result<(), Error> {
    let subscriber =
        telemetry::get_subscriber("inkpost".to_string(), "info".to_string(), std::io::stdout);
    telemetry::init_subscriber(subscriber);

    let opts = Opts::parse();

    let cmd = opts.cmd.clone();

    let settings: Settings = opts.try_into().context("Compiling Application Settings")?;

    match cmd {
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings).map_err(|err| {
                Error::Configuration {
                    context: format!("Could not render settings: {err}"),
                }
            })?;
            println!("{rendered}");
        }
        Command::Run => {
            let app = ApplicationBuilder::new(settings)
                .await
                .context("could not build application")?
                .build()
                .context("could not build application")?;
            app.run_until_stopped()
                .await
                .context("application runtime error")?;
        }
        Command::BuildIndex { posts_dir, out } => {
            let count =
                index::build_index(&posts_dir, &out).context("could not build the post index")?;
            println!("indexed {count} posts into {}", out.display());
        }
        Command::Review { url } => {
            let review_settings =
                settings
                    .review
                    .as_ref()
                    .ok_or_else(|| Error::Configuration {
                        context: "No [review] settings were configured".to_string(),
                    })?;
            let critique = review::run_review(review_settings, &url)
                .await
                .context(format!("could not review {url}"))?;
            println!("{critique}");
        }
    }
    Ok(())
}
