//! Tracing subscriber initialization.
//!
//! # Usage
//!
//! ```no_run
//! use interview_chatbot::config::LoggingConfig;
//!
//! interview_chatbot::telemetry::init_tracing(&LoggingConfig::default()).unwrap();
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Output goes to
/// stderr so it never interleaves with the interview transcript on stdout.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber has
/// already been set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}
