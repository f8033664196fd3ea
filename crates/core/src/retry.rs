//! Bounded exponential backoff.
//!
//! A call moves through [`RetryState`]s:
//!
//! ```text
//! Idle -> Attempting(n) -> Success
//!                       -> RetryWait(n) -> Attempting(n + 1)
//!                       -> Failed
//! ```
//!
//! [`RetryPolicy::advance`] is the whole transition table and does no I/O,
//! so failure sequences can be checked without a transport. [`retry_with_backoff`]
//! drives it against a real operation, sleeping through a [`Sleeper`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::{PitchlensError, Result, ServiceError};

/// Backoff parameters.
///
/// Defaults: 5 attempts, 1 s initial delay, ×2 per retry, 30 s cap, ±10% jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each further failure.
    pub multiplier: f64,
    /// Upper bound for any single wait.
    pub max_delay: Duration,
    /// Random spread as a fraction of the delay, in `[0, 1]`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: 0.1,
        }
    }
}

/// Where a single retried call currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Idle,
    /// Attempt number, starting at 1.
    Attempting(u32),
    /// Waiting after failed attempt `attempt`.
    RetryWait { attempt: u32, delay: Duration },
    Success,
    Failed,
}

impl fmt::Display for RetryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryState::Idle => write!(f, "idle"),
            RetryState::Attempting(n) => write!(f, "attempting({})", n),
            RetryState::RetryWait { attempt, delay } => write!(f, "retry-wait({}, {:?})", attempt, delay),
            RetryState::Success => write!(f, "success"),
            RetryState::Failed => write!(f, "failed"),
        }
    }
}

impl RetryPolicy {
    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff delay after failed attempt `attempt` (1-based), before jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64()).max(0.0);
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }

    /// Transition function of the retry state machine.
    ///
    /// `failure` is the error of the attempt that just finished, or `None` when
    /// it succeeded. Outside `Attempting` the outcome is ignored.
    pub fn advance(&self, state: RetryState, failure: Option<&ServiceError>) -> RetryState {
        match state {
            RetryState::Idle => RetryState::Attempting(1),
            RetryState::Attempting(n) => match failure {
                None => RetryState::Success,
                Some(err) if err.is_transient() && n < self.attempts() => {
                    let mut delay = self.delay_for(n);
                    if let Some(requested) = err.retry_after() {
                        delay = delay.max(requested).min(self.max_delay);
                    }
                    RetryState::RetryWait { attempt: n, delay }
                }
                Some(_) => RetryState::Failed,
            },
            RetryState::RetryWait { attempt, .. } => RetryState::Attempting(attempt + 1),
            terminal => terminal,
        }
    }

    /// Spread `delay` by up to ±`jitter`, never above `max_delay`.
    pub fn jittered(&self, delay: Duration) -> Duration {
        let spread = self.jitter.clamp(0.0, 1.0);
        if spread == 0.0 {
            return delay;
        }

        let factor = 1.0 + rand::thread_rng().gen_range(-spread..=spread);
        delay.mul_f64(factor).min(self.max_delay)
    }

    /// Actual wait for a `RetryWait` delay: jittered, then raised back to the
    /// service's Retry-After (capped at `max_delay`) if jitter went below it.
    pub fn wait_for(&self, delay: Duration, retry_after: Option<Duration>) -> Duration {
        let floor = retry_after.unwrap_or_default().min(self.max_delay);
        self.jittered(delay).max(floor)
    }
}

/// Something that can wait.
///
/// Injected so tests can record waits instead of sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs `op` under `policy`.
///
/// `op` receives the 1-based attempt number. Transient failures are retried
/// until the attempts run out, which yields
/// [`PitchlensError::ServiceUnavailable`] carrying the last cause. Any other
/// failure is returned after the attempt that produced it.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, sleeper: &dyn Sleeper, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, ServiceError>>,
{
    let mut attempt = match policy.advance(RetryState::Idle, None) {
        RetryState::Attempting(n) => n,
        _ => 1,
    };

    loop {
        let err = match op(attempt).await {
            Ok(value) => {
                tracing::debug!(attempt, "Request succeeded");
                return Ok(value);
            }
            Err(err) => err,
        };

        let wait = policy.advance(RetryState::Attempting(attempt), Some(&err));
        let RetryState::RetryWait { delay, .. } = wait else {
            return Err(give_up(attempt, err));
        };

        let delay = policy.wait_for(delay, err.retry_after());
        tracing::warn!(
            attempt,
            max_attempts = policy.attempts(),
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Transient failure, backing off"
        );
        sleeper.sleep(delay).await;

        let RetryState::Attempting(next) = policy.advance(wait, None) else {
            return Err(give_up(attempt, err));
        };
        attempt = next;
    }
}

fn give_up(attempts: u32, err: ServiceError) -> PitchlensError {
    if err.is_transient() {
        tracing::error!(attempts, error = %err, "Retries exhausted");
        PitchlensError::ServiceUnavailable { attempts, source: err }
    } else {
        tracing::error!(attempt = attempts, error = %err, "Permanent failure, not retrying");
        PitchlensError::from(err)
    }
}
