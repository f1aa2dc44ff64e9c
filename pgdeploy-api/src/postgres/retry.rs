use std::future::Future;
use std::time::Duration;

use pgdeploy_config::shared::RetryConfig;

/// Error returned by [`retry_on_conflict`], tagged with the phase that
/// failed.
///
/// Fetch failures abort immediately and are never retried; write failures
/// are retried only while they classify as conflicts and attempts remain.
#[derive(Debug, PartialEq, Eq)]
pub enum ConflictRetryError<E> {
    /// Fetching the current object failed.
    Fetch(E),
    /// Writing the mutated object failed, either with a non-conflict error
    /// or with a conflict that survived every attempt.
    Write(E),
}

/// Runs a fetch-mutate-write cycle, retrying on write conflicts.
///
/// Each cycle fetches the current object, applies `mutate` to it, and writes
/// it back. When the write is rejected with an error for which `is_conflict`
/// returns true, the cycle repeats against a fresh copy after a backoff
/// delay, up to `policy.max_attempts` attempts in total. Any other error, on
/// either phase, aborts immediately.
pub async fn retry_on_conflict<T, E, FetchFut, WriteFut>(
    policy: &RetryConfig,
    mut fetch: impl FnMut() -> FetchFut,
    mut mutate: impl FnMut(&mut T),
    mut write: impl FnMut(T) -> WriteFut,
    is_conflict: impl Fn(&E) -> bool,
) -> Result<(), ConflictRetryError<E>>
where
    FetchFut: Future<Output = Result<T, E>>,
    WriteFut: Future<Output = Result<(), E>>,
{
    let mut delay = Duration::from_millis(policy.initial_delay_ms);
    let max_delay = Duration::from_millis(policy.max_delay_ms);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let mut current = fetch().await.map_err(ConflictRetryError::Fetch)?;
        mutate(&mut current);

        match write(current).await {
            Ok(()) => return Ok(()),
            Err(error) if is_conflict(&error) && attempt < policy.max_attempts => {
                tokio::time::sleep(delay).await;
                delay = delay.mul_f32(policy.backoff_factor).min(max_delay);
            }
            Err(error) => return Err(ConflictRetryError::Write(error)),
        }
    }
}
