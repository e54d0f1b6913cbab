//! Shared setup for the integration tests.

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("weave=info".parse().unwrap()))
        .with_test_writer()
        .try_init();
}
