//! Process setup: environment and logging

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load `.env` from the working directory, if present.
///
/// `PDFFORM_FONT_FILE` and `PDFFORM_FONT_SIZE` are picked up from here by
/// the `fill` arguments.
pub fn load_env() {
    dotenvy::dotenv().ok();
}

pub fn log_level(debug: bool) -> Level {
    if debug {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Logs go to stderr so stdout stays clean for piping.
pub fn init_tracing(debug: bool) {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level(debug).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
