use coarsetime::{Clock, Duration, UnixTimeStamp};
use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;

use crate::claims::LifetimeClaims;
use crate::error::DecodeError;

/// Default tolerance applied to `exp`/`nbf` when validation parameters are given.
pub const DEFAULT_CLOCK_SKEW_SECS: u64 = 300;

/// Replaces the built-in `exp`/`nbf` checks. Runs only after the signature
/// has been verified and the payload parsed.
pub type LifetimeValidator<T> =
    Arc<dyn Fn(&LifetimeClaims, &T, &ValidationParameters<T>) -> Result<(), DecodeError> + Send + Sync>;

/// Source of the current time used for lifetime checks.
pub type ClockSource = Arc<dyn Fn() -> UnixTimeStamp + Send + Sync>;

/// Options for validating the lifetime of a decoded token
pub struct ValidationParameters<T> {
    /// Check `exp` and `nbf` at all
    pub validate_lifetime: bool,

    /// Time tolerance for `exp` and `nbf`
    pub clock_skew: Duration,

    /// Custom check taking over from the built-in one
    pub lifetime_validator: Option<LifetimeValidator<T>>,

    /// Time source, the system clock if not set
    pub clock: Option<ClockSource>,
}

impl<T> Default for ValidationParameters<T> {
    fn default() -> Self {
        ValidationParameters {
            validate_lifetime: true,
            clock_skew: Duration::from_secs(DEFAULT_CLOCK_SKEW_SECS),
            lifetime_validator: None,
            clock: None,
        }
    }
}

impl<T> Clone for ValidationParameters<T> {
    fn clone(&self) -> Self {
        ValidationParameters {
            validate_lifetime: self.validate_lifetime,
            clock_skew: self.clock_skew,
            lifetime_validator: self.lifetime_validator.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<T> fmt::Debug for ValidationParameters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationParameters")
            .field("validate_lifetime", &self.validate_lifetime)
            .field("clock_skew", &self.clock_skew)
            .field("lifetime_validator", &self.lifetime_validator.is_some())
            .field("clock", &self.clock.is_some())
            .finish()
    }
}

impl<T> ValidationParameters<T> {
    /// No skew and the system clock. This is what decoding without
    /// parameters uses.
    pub fn strict() -> Self {
        ValidationParameters {
            clock_skew: Duration::from_secs(0),
            ..Default::default()
        }
    }

    /// Accept any `exp`/`nbf`.
    pub fn without_lifetime_validation() -> Self {
        ValidationParameters {
            validate_lifetime: false,
            ..Default::default()
        }
    }

    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    pub fn with_lifetime_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&LifetimeClaims, &T, &ValidationParameters<T>) -> Result<(), DecodeError>
            + Send
            + Sync
            + 'static,
    {
        self.lifetime_validator = Some(Arc::new(validator));
        self
    }

    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> UnixTimeStamp + Send + Sync + 'static,
    {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Current time in seconds since the Unix epoch, from the configured clock.
    pub fn now_secs(&self) -> i64 {
        let now = match &self.clock {
            Some(clock) => clock(),
            None => Clock::now_since_epoch(),
        };
        secs_as_i64(now)
    }

    pub(crate) fn clock_skew_secs(&self) -> i64 {
        secs_as_i64(self.clock_skew)
    }

    /// The built-in lifetime check.
    pub fn check_lifetime(&self, claims: &LifetimeClaims) -> Result<(), DecodeError> {
        if !self.validate_lifetime {
            return Ok(());
        }
        claims.check(self.now_secs(), self.clock_skew_secs())
    }
}

fn secs_as_i64(duration: Duration) -> i64 {
    i64::try_from(duration.as_secs()).unwrap_or(i64::MAX)
}
