//! Internal logging helpers for structured row set events.

/// Single logging target for the crate.
pub(crate) const LOG_TARGET: &str = "rowset";

/// Emits `event=<name> <fields>` through the `log` facade.
///
/// The format arguments are only evaluated when the level is enabled, so the
/// macro is safe to leave on write paths.
macro_rules! rowset_log {
    ($level:expr, $event:expr, $fmt:expr $(, $args:expr)* $(,)?) => {{
        if log::log_enabled!(target: $crate::logging::LOG_TARGET, $level) {
            log::log!(
                target: $crate::logging::LOG_TARGET,
                $level,
                "event={} {}",
                $event,
                format_args!($fmt $(, $args)*)
            );
        }
    }};
}

pub(crate) use rowset_log;
