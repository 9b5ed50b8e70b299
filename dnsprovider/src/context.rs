//! Caller-supplied cancellation context.
//!
//! Every operation that reaches the backing service takes a [`Context`]. A call
//! whose context is cancelled, or whose deadline passes, returns
//! [`ProviderError::Cancelled`] promptly. Nothing is rolled back: whatever the
//! backend already committed stays committed.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ProviderError, Result};

/// Cancellation token plus optional deadline.
///
/// Cloning shares the token; [`child`](Self::child) derives a token that is
/// cancelled with its parent but can also be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. a service-wide shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Child context that additionally expires after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context that additionally expires at `deadline`.
    ///
    /// The earlier of the parent's and the new deadline wins.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the context is already done.
    pub fn check(&self, provider: &str, operation: &str) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(cancelled(provider, operation, "context cancelled"));
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(cancelled(provider, operation, "deadline exceeded"));
        }
        Ok(())
    }

    /// Run `fut` unless the context is cancelled or expires first.
    ///
    /// When the context wins, `fut` is dropped mid-flight.
    pub async fn run<T, F>(&self, provider: &str, operation: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(provider, operation)?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => {
                log::debug!("[{provider}] {operation} cancelled by caller");
                Err(cancelled(provider, operation, "context cancelled"))
            }
            () = deadline => {
                log::debug!("[{provider}] {operation} hit its deadline");
                Err(cancelled(provider, operation, "deadline exceeded"))
            }
            result = fut => result,
        }
    }

    /// Sleep for `duration`, waking early with an error on cancellation.
    pub async fn sleep(&self, provider: &str, operation: &str, duration: Duration) -> Result<()> {
        self.run(provider, operation, async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

fn cancelled(provider: &str, operation: &str, detail: &str) -> ProviderError {
    ProviderError::Cancelled {
        provider: provider.to_string(),
        operation: operation.to_string(),
        detail: detail.to_string(),
    }
}
