//! Retry bookkeeping and pacing.
//!
//! Which failures are retried is fixed: only transport errors whose kind is
//! retryable (see [`TransportErrorKind::is_retryable`]). How many times is
//! set per request and capped at [`MAX_RETRIES`]. The only thing a client
//! configures here is the [`Backoff`] between attempts.
//!
//! [`TransportErrorKind::is_retryable`]: crate::transport::TransportErrorKind::is_retryable
//! [`MAX_RETRIES`]: crate::MAX_RETRIES

use crate::request::MAX_RETRIES;
use rand::Rng;
use std::time::Duration;

/// Per-call retry counter.
///
/// Lives only for the duration of one call and is dropped once the call
/// resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    retries_so_far: usize,
    max_retries: usize,
}

impl RetryState {
    /// Starts a fresh counter. `max_retries` is capped at [`MAX_RETRIES`].
    pub fn new(max_retries: usize) -> Self {
        Self {
            retries_so_far: 0,
            max_retries: max_retries.min(MAX_RETRIES),
        }
    }

    /// Claims one retry from the budget.
    ///
    /// Returns `false`, leaving the counter untouched, once the budget is spent.
    pub fn register_retry(&mut self) -> bool {
        if self.retries_so_far < self.max_retries {
            self.retries_so_far += 1;
            true
        } else {
            false
        }
    }

    /// Retries taken so far.
    pub fn retries(&self) -> usize {
        self.retries_so_far
    }

    /// Attempts made so far, counting the first one.
    pub fn attempts(&self) -> usize {
        self.retries_so_far + 1
    }

    /// The retry budget for this call.
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

/// How long to wait before re-issuing a request after a transient failure.
///
/// # Examples
///
/// ```
/// use netcall::Backoff;
/// use std::time::Duration;
///
/// // Re-issue immediately.
/// let none = Backoff::None;
///
/// // 100ms, 200ms, 400ms, 800ms...
/// let exponential = Backoff::Exponential {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(5),
///     jitter: true,
/// };
///
/// // 1s, 1s, 1s...
/// let linear = Backoff::Linear {
///     delay: Duration::from_secs(1),
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Backoff {
    /// Re-issue the request as soon as the previous attempt fails.
    #[default]
    None,

    /// Wait the same amount before every retry.
    Linear {
        /// The delay between attempts.
        delay: Duration,
    },

    /// Wait `initial_delay * 2^(retry - 1)`, capped at `max_delay`.
    Exponential {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// Scale each delay by a random factor in `[0.5, 1.0]`.
        jitter: bool,
    },
}

impl Backoff {
    /// Returns the delay before the given retry (1 = first retry).
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Linear { delay } => *delay,
            Backoff::Exponential {
                initial_delay,
                max_delay,
                jitter,
            } => {
                let exponent = retry.saturating_sub(1).min(31) as u32;
                let base_delay = initial_delay.saturating_mul(2u32.saturating_pow(exponent));
                let delay = base_delay.min(*max_delay);

                if *jitter {
                    let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
                    delay.mul_f64(jitter_factor)
                } else {
                    delay
                }
            }
        }
    }
}
