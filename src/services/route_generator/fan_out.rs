use crate::error::{AppError, Result};
use futures::future::join_all;
use std::future::Future;
use std::time::Duration;

/// Run every future concurrently and wait until all have settled.
///
/// Each future gets its own `timeout`; an elapsed timer becomes
/// [`AppError::Timeout`] for that item only. Results keep input order.
pub async fn join_settled<I, F, T>(futures: I, timeout: Duration, label: &str) -> Vec<Result<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    join_all(futures.into_iter().map(|future| async move {
        match tokio::time::timeout(timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!("{} after {:?}", label, timeout))),
        }
    }))
    .await
}
