//! tracing subscriber setup for test binaries

use tracing_subscriber::fmt;

/// Install a fmt subscriber that writes through the test harness
///
/// Safe to call from every test; only the first call installs anything.
pub fn init() {
    let _ = fmt().with_test_writer().try_init();
}
