//! Tracing bootstrap, shared by the CLI and integration tests.

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static INIT: Once = Once::new();

/// Initialize the global `tracing` subscriber. Safe to call more than once
/// (subsequent calls are no-ops) so both `main()` and tests can call it.
///
/// Priority: `RUST_LOG` if set, otherwise `debug` > `verbose` > the default
/// `anvil=info,warn,error` filter.
pub fn init_tracing(verbose: bool, debug: bool) {
    INIT.call_once(|| {
        let env_filter = if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::EnvFilter::from_default_env()
        } else if debug {
            tracing_subscriber::EnvFilter::new("debug")
        } else if verbose {
            tracing_subscriber::EnvFilter::new("anvil=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new("anvil=info,warn,error")
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(debug)
                    .with_level(verbose || debug)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    });
}
