//! Unified logging macro for knx-hid
//!
//! This module provides a unified logging interface that automatically
//! selects between `defmt::` and `log::` based on the active feature flags.
//!
//! # Usage
//!
//! ```rust,ignore
//! hid_log!(warn, "only received {} bytes, expected {}", len, 64);
//! hid_log!(debug, "telegram complete ({} bytes)", n);
//! ```
//!
//! # Feature Flags
//!
//! - `defmt` - Uses `defmt::` (embedded targets, takes precedence)
//! - `log` - Uses the `log` facade (default)
//! - neither - Log statements compile to nothing; arguments are still type-checked

/// Unified logging macro - selects defmt:: or log:: based on features
#[macro_export]
#[cfg(feature = "defmt")]
macro_rules! hid_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! hid_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}

#[macro_export]
#[cfg(not(any(feature = "log", feature = "defmt")))]
macro_rules! hid_log {
    ($level:ident, $($arg:tt)*) => {{
        if false {
            let _ = ::core::format_args!($($arg)*);
        }
    }};
}
