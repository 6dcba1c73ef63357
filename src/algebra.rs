//! Result/Option combinators
//!
//! `std::result::Result` and `Option` already carry `map`, `and_then` and
//! `unwrap_or`. This module adds the two pieces they lack:
//!
//! - [`Fold`]: collapse either arm into a plain value. This is the only
//!   way verdicts leave the pipeline.
//! - [`chain`]: bind a `Result` to an async stage that returns another
//!   `Result`, without nested matching at the call site.

use std::future::Future;

/// Catamorphism over a two-armed value.
pub trait Fold<T, E> {
    fn fold<R>(self, on_success: impl FnOnce(T) -> R, on_failure: impl FnOnce(E) -> R) -> R;
}

impl<T, E> Fold<T, E> for Result<T, E> {
    fn fold<R>(self, on_success: impl FnOnce(T) -> R, on_failure: impl FnOnce(E) -> R) -> R {
        match self {
            Ok(value) => on_success(value),
            Err(err) => on_failure(err),
        }
    }
}

/// Absence is the failure arm; it carries no payload.
impl<T> Fold<T, ()> for Option<T> {
    fn fold<R>(self, on_success: impl FnOnce(T) -> R, on_failure: impl FnOnce(()) -> R) -> R {
        match self {
            Some(value) => on_success(value),
            None => on_failure(()),
        }
    }
}

/// Async-aware bind: run `next` on the success value, pass failure through.
pub async fn chain<T, U, E, F, Fut>(result: Result<T, E>, next: F) -> Result<U, E>
where
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<U, E>>,
{
    match result {
        Ok(value) => next(value).await,
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_picks_the_populated_arm() {
        let ok: Result<i32, String> = Ok(2);
        let err: Result<i32, String> = Err("boom".into());

        assert_eq!(ok.fold(|v| v * 10, |_| -1), 20);
        assert_eq!(err.fold(|v| v * 10, |e| e.len() as i32), 4);
    }

    #[test]
    fn test_map_passes_failure_through() {
        let err: Result<i32, &str> = Err("nope");
        let mapped = err.map(|v| v + 1);
        assert_eq!(mapped, Err("nope"));
    }

    #[test]
    fn test_option_fold_and_or_else() {
        assert_eq!(Some(3).fold(|v| v, |_| 0), 3);
        assert_eq!(None::<i32>.fold(|v| v, |_| 0), 0);
        assert_eq!(None::<i32>.map(|v| v * 2).unwrap_or(7), 7);
        assert_eq!(Some(4).and_then(|v| (v > 3).then_some(v)), Some(4));
    }

    #[tokio::test]
    async fn test_chain_sequences_async_stages() {
        let start: Result<i32, String> = Ok(5);
        let out = chain(start, |v| async move { Ok::<_, String>(v * 2) }).await;
        assert_eq!(out, Ok(10));
    }

    #[tokio::test]
    async fn test_chain_skips_stage_on_failure() {
        let start: Result<i32, String> = Err("early".into());
        let mut called = false;
        let out = chain(start, |v| {
            called = true;
            async move { Ok::<_, String>(v) }
        })
        .await;
        assert_eq!(out, Err("early".to_string()));
        assert!(!called);
    }
}
