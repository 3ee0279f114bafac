//! Log output on stderr.

use tracing::Dispatch;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "inotes=info,inotes_core=info,inotes_imap=warn";
const DEBUG_FILTER: &str = "inotes=debug,inotes_core=debug,inotes_imap=debug";

/// Builds the stderr logger and installs it as the global default.
///
/// `RUST_LOG` overrides the default filter; `debug` overrides both.
pub fn install(debug: bool) -> Dispatch {
    let filter = if debug {
        EnvFilter::new(DEBUG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(debug),
    );

    let dispatch = Dispatch::new(subscriber);
    if let Err(error) = tracing::dispatcher::set_global_default(dispatch.clone()) {
        eprintln!("inotes: {error}");
    }
    dispatch
}
