use std::time::SystemTime;

use time::{Duration, OffsetDateTime};
use x509_cert::time::{Time, Validity};

use crate::error::{CertSmithError, Result};

/// Validity window of a certificate.
///
/// `not_after` is always strictly later than `not_before`. Both are kept
/// at whole-second precision since that is all X.509 can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateLifetime {
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
}

impl CertificateLifetime {
    pub const DEFAULT_DAYS: i64 = 90;

    /// Creates a lifetime spanning `not_before..=not_after`.
    pub fn new(not_before: OffsetDateTime, not_after: OffsetDateTime) -> Result<Self> {
        let not_before = truncate(not_before);
        let not_after = truncate(not_after);
        if not_after <= not_before {
            return Err(CertSmithError::InvalidArgument(format!(
                "certificate lifetime ends ({not_after}) before it starts ({not_before})"
            )));
        }
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Starts now and lasts for `duration`.
    pub fn from_duration(duration: Duration) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        Self::new(now, now + duration)
    }

    /// Starts now and ends at `not_after`.
    pub fn until(not_after: OffsetDateTime) -> Result<Self> {
        Self::new(OffsetDateTime::now_utc(), not_after)
    }

    pub fn for_days(days: u32) -> Result<Self> {
        Self::from_duration(Duration::days(i64::from(days)))
    }

    /// Starts now and ends on the same calendar day `years` years later.
    ///
    /// February 29th rolls back to the 28th when the target year is not a
    /// leap year.
    pub fn for_years(years: u32) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        let year = i32::try_from(years)
            .ok()
            .and_then(|years| now.year().checked_add(years))
            .ok_or_else(|| CertSmithError::InvalidArgument(format!("{years} years is too long")))?;
        let not_after = now
            .replace_year(year)
            .or_else(|_| now.replace_day(28).and_then(|day| day.replace_year(year)))
            .map_err(|e| CertSmithError::InvalidArgument(e.to_string()))?;
        Self::new(now, not_after)
    }

    pub fn one_year() -> Result<Self> {
        Self::for_years(1)
    }

    pub fn five_years() -> Result<Self> {
        Self::for_years(5)
    }

    pub fn ten_years() -> Result<Self> {
        Self::for_years(10)
    }

    pub fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }

    /// Whether `instant` falls inside this window.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.not_before <= instant && instant <= self.not_after
    }

    /// Moves `not_before` back by `by`, leaving `not_after` in place.
    ///
    /// Negative or sub-second amounts leave the lifetime unchanged.
    pub fn backdated(&self, by: Duration) -> Self {
        if by.whole_seconds() <= 0 {
            return *self;
        }
        Self {
            not_before: self.not_before - Duration::seconds(by.whole_seconds()),
            not_after: self.not_after,
        }
    }

    /// Narrows this lifetime to fit inside `outer`.
    ///
    /// Fails with `InvalidArgument` when the two windows do not overlap.
    pub fn clamp_to(&self, outer: &CertificateLifetime) -> Result<Self> {
        let not_before = self.not_before.max(outer.not_before);
        let not_after = self.not_after.min(outer.not_after);
        if not_after <= not_before {
            return Err(CertSmithError::InvalidArgument(format!(
                "lifetime {} .. {} does not overlap the issuer's {} .. {}",
                self.not_before, self.not_after, outer.not_before, outer.not_after
            )));
        }
        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Encodes this lifetime as an X.509 `Validity`.
    ///
    /// Dates before 2050 use UTCTime, later ones GeneralizedTime.
    pub fn to_validity(&self) -> Result<Validity> {
        Ok(Validity {
            not_before: encode_time(self.not_before)?,
            not_after: encode_time(self.not_after)?,
        })
    }

    /// Reads a lifetime back from an X.509 `Validity`.
    pub fn from_validity(validity: &Validity) -> Result<Self> {
        Self::new(
            decode_time(&validity.not_before),
            decode_time(&validity.not_after),
        )
    }
}

impl Default for CertificateLifetime {
    /// Ninety days starting now.
    fn default() -> Self {
        let now = truncate(OffsetDateTime::now_utc());
        Self {
            not_before: now,
            not_after: now + Duration::days(Self::DEFAULT_DAYS),
        }
    }
}

fn truncate(instant: OffsetDateTime) -> OffsetDateTime {
    instant.replace_nanosecond(0).unwrap_or(instant)
}

fn encode_time(instant: OffsetDateTime) -> Result<Time> {
    Ok(Time::try_from(SystemTime::from(instant))?)
}

pub(crate) fn decode_time(time: &Time) -> OffsetDateTime {
    OffsetDateTime::from(time.to_system_time())
}
