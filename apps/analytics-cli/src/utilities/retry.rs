use std::future::Future;
use std::time::Duration;

/// Runs `operation` until it succeeds or `should_retry` declines the error.
///
/// `should_retry` receives the zero-based attempt number and the error of that attempt.
pub async fn retry<F, Fut, T, E, P>(
    mut operation: F,
    mut should_retry: P,
    delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(u32, &E) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if should_retry(attempt, &error) => {
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
