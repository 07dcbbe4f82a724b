//! Cancellation helper shared by the service and its adapters.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::errors::ServiceError;

/// Drive `fut` to completion unless `ct` fires first.
///
/// An already-cancelled token wins without polling `fut`, and the losing future
/// is dropped, which aborts whatever I/O it had in flight.
pub async fn with_cancel<T, F>(ct: &CancellationToken, fut: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    tokio::select! {
        biased;
        _ = ct.cancelled() => Err(ServiceError::Cancelled),
        res = fut => res,
    }
}
