//! Quiet-mode aware logging. With MFASCRAPE_QUIET=1 the `[INFO]` progress
//! lines about artifact creation are suppressed.

#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if !$crate::log::is_quiet() {
            tracing::info!($($arg)*);
        }
    }};
}

pub fn is_quiet() -> bool {
    mfascrape_core::config::ObservabilityConfig::from_env().quiet
}
