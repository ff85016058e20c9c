//! Logging shim
//!
//! Forwards to defmt when the `defmt` feature is enabled. Otherwise the
//! arguments are only borrowed, so host tests carry no logger and values
//! used just for logging do not warn.

#[cfg(feature = "defmt")]
macro_rules! trace {
    ($($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! trace {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $fmt;
        $(let _ = &$arg;)*
    }};
}

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { defmt::debug!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $fmt;
        $(let _ = &$arg;)*
    }};
}

#[cfg(feature = "defmt")]
macro_rules! info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $fmt;
        $(let _ = &$arg;)*
    }};
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        let _ = $fmt;
        $(let _ = &$arg;)*
    }};
}

#[cfg(all(test, not(feature = "defmt")))]
mod tests {
    use crate::error::BufferError;

    #[test]
    fn test_macros_borrow_arguments() {
        let e = BufferError::CapacityExceeded {
            requested: 9,
            capacity: 4,
        };
        warn!("ramp table rejected: {}", e);
        debug!("requested {} of {}", 9u32, 4u32,);
        trace!("no arguments");

        // Still owned after logging
        assert_eq!(
            e,
            BufferError::CapacityExceeded {
                requested: 9,
                capacity: 4
            }
        );
    }
}
