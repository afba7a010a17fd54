//! Public surface for pkgconfig-rs.
//!
//! This crate re-exports the resolution engine and provides the command-line
//! front end plus a small logging initialization helper.

pub mod cli;

/// Re-export for convenience.
pub use pkgconfig_rs_core as core;
pub use pkgconfig_rs_core::{
    ConfigError, ConfigResolver, EnvironmentLayout, ResolvedConfig, ResolverOptions, SchemaSource,
    resolve,
};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
