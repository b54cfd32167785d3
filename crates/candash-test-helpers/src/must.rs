//! Unwrap helpers with good error messages.
//!
//! Test code in this workspace never calls `unwrap()`/`expect()` directly;
//! these helpers panic with the error value and the caller's location.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

/// Unwrap a `Result`, panicking with the error on failure.
///
/// ```rust
/// use candash_test_helpers::must;
///
/// let value = must(Ok::<_, &str>(42));
/// assert_eq!(value, 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` if `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result`, prefixing the panic message with `context`.
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

/// Await `future`, panicking if it does not complete within `limit`.
///
/// ```rust
/// use candash_test_helpers::must_within;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let value = must_within(Duration::from_millis(100), async { 7 }).await;
/// assert_eq!(value, 7);
/// # }
/// ```
///
/// # Panics
///
/// Panics when the deadline passes first.
pub async fn must_within<F: Future>(limit: Duration, future: F) -> F::Output {
    match tokio::time::timeout(limit, future).await {
        Ok(v) => v,
        Err(_) => panic!("must_within: future did not complete within {limit:?}"),
    }
}
