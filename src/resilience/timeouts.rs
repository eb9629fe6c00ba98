//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every socket operation with a deadline
//! - Turn an elapsed deadline into a distinct transport error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A stalled peer ends its own session, never the accept loop

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// Run an I/O future with a deadline.
pub async fn with_deadline<F, T>(
    operation: &'static str,
    after: Duration,
    future: F,
) -> Result<T, TransportError>
where
    F: Future<Output = std::io::Result<T>>,
{
    match tokio::time::timeout(after, future).await {
        Ok(result) => result.map_err(TransportError::Io),
        Err(_) => Err(TransportError::Timeout { operation, after }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_within_deadline() {
        let value = with_deadline("noop", Duration::from_secs(1), async { Ok::<_, std::io::Error>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn elapsed_deadline_is_timeout() {
        let err = with_deadline("read", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, std::io::Error>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TransportError::Timeout { operation: "read", .. }));
    }

    #[tokio::test]
    async fn io_errors_pass_through() {
        let err = with_deadline("write", Duration::from_secs(1), async {
            Err::<(), _>(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
    }
}
