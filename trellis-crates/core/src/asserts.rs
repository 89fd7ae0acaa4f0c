//! Internal consistency checks whose cost is gated by a level: simple checks always run, moderate
//! checks also run in tests, and every level runs with the `debug-checks` feature.

pub const TRELLIS_ASSERT_SIMPLE: u8 = 1;
pub const TRELLIS_ASSERT_MODERATE: u8 = 2;
pub const TRELLIS_ASSERT_ADVANCED: u8 = 3;
pub const TRELLIS_ASSERT_EXTREME: u8 = 4;

#[cfg(all(not(test), not(feature = "debug-checks")))]
pub const TRELLIS_ASSERT_LEVEL_DEFINITION: u8 = TRELLIS_ASSERT_SIMPLE;

#[cfg(all(test, not(feature = "debug-checks")))]
pub const TRELLIS_ASSERT_LEVEL_DEFINITION: u8 = TRELLIS_ASSERT_MODERATE;

#[cfg(feature = "debug-checks")]
pub const TRELLIS_ASSERT_LEVEL_DEFINITION: u8 = TRELLIS_ASSERT_EXTREME;

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_SIMPLE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_eq_simple {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_SIMPLE {
            assert_eq!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_moderate {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_MODERATE {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_advanced {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_ADVANCED {
            assert!($($arg)*);
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! trellis_assert_extreme {
    ($($arg:tt)*) => {
        if $crate::asserts::TRELLIS_ASSERT_LEVEL_DEFINITION >= $crate::asserts::TRELLIS_ASSERT_EXTREME {
            assert!($($arg)*);
        }
    };
}
