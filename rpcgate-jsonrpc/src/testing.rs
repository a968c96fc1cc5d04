//! Helpers shared by the unit and integration tests.
//!
//! Only compiled for tests; the integration tests pull it in with `#[path]`.

/// Initialize tracing so log output shows up in test output, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call does anything.
pub fn init_test_logging() {
    use std::sync::OnceLock;

    const DEFAULT_LOG_FILTER: &str = "rpcgate_jsonrpc=trace,rpcgate_schema=debug";
    static INIT_LOGGING: OnceLock<()> = OnceLock::new();

    INIT_LOGGING.get_or_init(|| {
        // Fails if some other test harness got there first, which is fine
        let _ = tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
            .with_test_writer()
            .try_init();
    });
}
