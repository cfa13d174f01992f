use std::sync::Once;

static LOGGING_INIT: Once = Once::new();

/// Routes the walker, filter and packer logs of unit tests to the test writer,
/// filtered by `RUST_LOG`. Safe to call from every test.
pub fn setup_test_logging() {
    LOGGING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok(); // Another test harness may already own the global subscriber.
    });
}

/// Root can list a `0o000` directory, so the walker's unreadable-entry tests
/// return early when this is true.
#[inline]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no side effects.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
