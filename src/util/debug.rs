/// A wrapper over `tracing::debug!` that is enabled
/// only when the `debug` feature is enabled.
///
/// Passing `true` as the first token marks the message as heavy,
/// it is then only emitted with `debug_all` and logged at trace level.
macro_rules! netcore_debug {
    (true, $($t: tt)*) => {
        if cfg!(feature = "debug") && cfg!(feature = "debug_all") {
            ::tracing::trace!(target: "netcore", "{}", format!($($t)*));
        }
    };
    ($($t: tt)*) => {
        if cfg!(feature = "debug") {
            ::tracing::debug!(target: "netcore", "{}", format!($($t)*));
        }
    };
}

/// Dumps raw buffers, enabled with the `debug_buffers` feature.
/// The first argument tells whether the buffer was received (`true`) or sent.
macro_rules! netcore_debug_buffers {
    ($incoming: expr, $($t: tt)*) => {
        if cfg!(feature = "debug_buffers") {
            let direction = if $incoming { "IN" } else { "OUT" };
            ::tracing::trace!(target: "netcore::buffers", "[{}] {}", direction, format!($($t)*));
        }
    };
}

pub(crate) use netcore_debug;
pub(crate) use netcore_debug_buffers;
