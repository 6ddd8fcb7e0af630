//! Operation framework
//!
//! Every SOAP action the client can send is a type implementing
//! [`VieraOperation`]. The type knows its service and action name, turns its
//! request into the XML fragment placed inside the action element and parses
//! the raw response text into a typed value.

pub mod macros;

use std::fmt;
use std::ops::RangeInclusive;
use std::time::Duration;

use crate::error::ApiError;
use crate::service::Service;

pub trait VieraOperation {
    type Request: Validate;
    type Response;

    const SERVICE: Service;
    const ACTION: &'static str;

    /// Validate the request and build its XML fragment
    fn build_payload(request: &Self::Request) -> Result<String, InvalidParameter>;

    fn parse_response(xml: &str) -> Result<Self::Response, ApiError>;
}

/// A request parameter rejected before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {parameter}: {reason}")]
pub struct InvalidParameter {
    pub parameter: &'static str,
    pub reason: String,
}

impl InvalidParameter {
    pub fn out_of_range(parameter: &'static str, range: RangeInclusive<i64>, value: i64) -> Self {
        Self {
            parameter,
            reason: format!("{} is outside {}..={}", value, range.start(), range.end()),
        }
    }

    pub fn empty(parameter: &'static str) -> Self {
        Self {
            parameter,
            reason: "must not be empty".to_string(),
        }
    }
}

/// Checked by [`VieraOperation::build_payload`] before encoding
pub trait Validate {
    fn validate(&self) -> Result<(), InvalidParameter> {
        Ok(())
    }
}

/// How long to wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed(Duration),
    /// Starts at the given delay and doubles per retry
    Doubling(Duration),
}

/// Retry policy for transport failures
///
/// Device faults and bad arguments are never retried. The client applies its
/// read policy to `get_volume`/`get_mute`; other commands retry only through
/// an explicit `execute_with_retry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            retries: 0,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    pub const fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub const fn exponential(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries,
            backoff: Backoff::Doubling(base_delay),
        }
    }

    /// Delay before retry number `retry` (1-based), `None` once retries are used up
    pub fn delay_before(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.retries {
            return None;
        }
        Some(match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Doubling(base) => base.saturating_mul(1 << (retry - 1).min(16)),
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.backoff {
            Backoff::Fixed(delay) => write!(f, "{} retries every {:?}", self.retries, delay),
            Backoff::Doubling(base) => write!(f, "{} retries from {:?} doubling", self.retries, base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let error = InvalidParameter::out_of_range("desired_volume", 0..=100, 150);
        assert_eq!(error.to_string(), "invalid desired_volume: 150 is outside 0..=100");
    }

    #[test]
    fn test_no_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy, RetryPolicy::none());
        assert_eq!(policy.delay_before(1), None);
    }

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::fixed(2, Duration::from_millis(500));
        assert_eq!(policy.delay_before(1), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_before(2), Some(Duration::from_millis(500)));
        assert_eq!(policy.delay_before(3), None);
    }

    #[test]
    fn test_doubling_delay() {
        let policy = RetryPolicy::exponential(3, Duration::from_millis(100));
        let delays: Vec<_> = (1..=4).map(|n| policy.delay_before(n)).collect();
        assert_eq!(
            delays,
            vec![
                Some(Duration::from_millis(100)),
                Some(Duration::from_millis(200)),
                Some(Duration::from_millis(400)),
                None,
            ]
        );
    }
}
