//! Test logging setup.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Route `tracing` output of the mocks to the test harness at `level`.
///
/// Only the first call installs a subscriber; later calls are no-ops, so every
/// test may call this.
pub fn init_test_tracing(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
