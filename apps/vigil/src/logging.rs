//! Diagnostics setup.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g. `VIGIL_LOG=vigil=debug`.
pub const LOG_ENV: &str = "VIGIL_LOG";

const DEFAULT_FILTER: &str = "vigil=warn";

/// Install the stderr subscriber once.
///
/// Falls back to `vigil=warn` when `VIGIL_LOG` is unset or invalid. Stdout
/// stays reserved for command output, so JSON stays machine-readable.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .with(filter)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::warn!("still alive");
    }
}
