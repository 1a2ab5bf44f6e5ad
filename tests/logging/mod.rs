/// Routes `tracing` output through the test harness so it is only shown for
/// failing tests. Safe to call from every test.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
