use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Interrupt;

/// Cancellation signal plus an optional deadline, threaded through every
/// blocking step of a transfer.
///
/// Clones share the same token, so cancelling any clone (or the token handed
/// to [`CancelScope::from_token`]) stops all of them.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    token:    CancellationToken,
    deadline: Option<Instant>,
}

impl CancelScope {
    pub fn new() -> Self { Self::default() }

    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Add a deadline `timeout` from now; an earlier existing deadline wins.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.with_deadline(deadline)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        self
    }

    /// A scope that also ends when this one does, with its own deadline.
    pub fn child(&self) -> Self {
        Self {
            token:    self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) { self.token.cancel(); }

    pub fn token(&self) -> &CancellationToken { &self.token }

    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    /// `Err` if the scope is already cancelled or past its deadline.
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.token.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupt::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `fut` until it completes or the scope ends, whichever is first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupt> {
        self.check()?;
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Interrupt::Cancelled),
            _ = expired => Err(Interrupt::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }

    /// Sleep for `duration`, waking early if the scope ends.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Interrupt> {
        if duration.is_zero() {
            return self.check();
        }
        self.run(tokio::time::sleep(duration)).await
    }
}
