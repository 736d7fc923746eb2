//! Diagnostics for the timing components.
//!
//! Nothing here returns an error: anomalies are logged once and clamped by the
//! caller, invariant violations abort only in checked builds.

/// True when invariant violations should abort the process.
/// Debug builds and the `strict-invariants` feature turn this on.
pub const STRICT_INVARIANTS: bool = cfg!(any(debug_assertions, feature = "strict-invariants"));

/// Emit a `log::warn!` the first time this call site is reached.
/// Evaluates to `true` on the call that logged.
macro_rules! warn_once {
    ($($arg:tt)+) => {{
        static WARNED: ::std::sync::atomic::AtomicBool = ::std::sync::atomic::AtomicBool::new(false);
        let first = !WARNED.swap(true, ::std::sync::atomic::Ordering::Relaxed);
        if first {
            ::log::warn!($($arg)+);
        }
        first
    }};
}

/// Panic if `$cond` is false and strict invariants are enabled.
macro_rules! sync_invariant {
    ($cond:expr, $($arg:tt)+) => {{
        if $crate::core::diag::STRICT_INVARIANTS && !($cond) {
            panic!($($arg)+);
        }
    }};
}

pub(crate) use sync_invariant;
pub(crate) use warn_once;
