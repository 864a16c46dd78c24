/// Abort the current operation with a Firestore-styled internal assertion message.
///
/// Used for invariant violations (indexing an empty path, malformed internal input).
/// These are programming errors and are never reported through `FirestoreResult`.
pub fn fail(message: impl AsRef<str>) -> ! {
    panic!("{}", assertion_error(message));
}

/// Build the string used when raising assertion errors.
pub fn assertion_error(message: impl AsRef<str>) -> String {
    format!(
        "Firestore ({}) INTERNAL ASSERT FAILED: {}",
        env!("CARGO_PKG_VERSION"),
        message.as_ref()
    )
}

/// Calls [`fail`] when the condition is false. The message is only formatted on failure.
macro_rules! hard_assert {
    ($condition:expr, $($arg:tt)+) => {
        if !$condition {
            $crate::util::assert::fail(format!($($arg)+));
        }
    };
}

pub(crate) use hard_assert;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "INTERNAL ASSERT FAILED: should panic")]
    fn fail_panics() {
        fail("should panic");
    }

    #[test]
    #[should_panic(expected = "INTERNAL ASSERT FAILED: index 3 out of range")]
    fn macro_formats_lazily() {
        hard_assert!(1 > 2, "index {} out of range", 3);
    }

    #[test]
    fn assertion_error_formats_message() {
        let err = assertion_error("boom");
        assert!(err.contains("Firestore"));
        assert!(err.contains("boom"));
    }
}
