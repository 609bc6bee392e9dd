//! Logging setup for the resolution engine
//!
//! The engine only talks to the `log` facade; embedders pick the backend.
//! These helpers wire up `env_logger` for binaries, benches and tests.
//!
//! # Log Levels
//!
//! - `error!` - Broken invariants that the engine recovered from
//! - `warn!` - Suppressed contract violations, stale cached values
//! - `info!` - Project loading
//! - `debug!` - Session (re)builds, code fragment synthesis
//! - `trace!` - Designated transformer steps, provider candidate selection
//!
//! # Environment Variable
//!
//! ```bash
//! RUST_LOG=lazy_resolve=debug cargo test
//! RUST_LOG=lazy_resolve::lazy=trace cargo test
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging at Warn level. Later calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize logging with a specific level. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from `RUST_LOG`, defaulting to Warn.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Initialize logging for tests (captured output, never panics on re-init).
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
        log::warn!("logging initialized twice");
    }
}
