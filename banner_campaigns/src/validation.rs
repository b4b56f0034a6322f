//! Campaign invariants as pure predicates.
//!
//! Every state-changing registry operation runs the relevant checks before it
//! touches storage, so a rejected call leaves both the store and the
//! in-memory snapshot untouched.

use chrono::NaiveDate;

use crate::model::Banner;

/// Rejected campaign or showing input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Start date after end date.
    #[error("incorrect dates: start {start} is after end {end}")]
    InvalidDateRange {
        /// Requested first day.
        start: NaiveDate,
        /// Requested last day.
        end: NaiveDate,
    },

    /// Minimum quota above maximum quota (after clamping negatives to zero).
    #[error("minimum showings ({min}) cannot exceed maximum showings ({max})")]
    InvalidQuotaOrder {
        /// Clamped minimum.
        min: u32,
        /// Clamped maximum.
        max: u32,
    },

    /// Showing date outside the banner's validity window.
    #[error("showing date {date} is outside the banner window {start}..={end}")]
    ShowingOutsideWindow {
        /// Date of the rejected showing.
        date: NaiveDate,
        /// Banner start date.
        start: NaiveDate,
        /// Banner end date.
        end: NaiveDate,
    },

    /// The banner already has `max` showings on that date.
    #[error("maximum of {max} showings already reached on {date}")]
    QuotaExceeded {
        /// Date of the rejected showing.
        date: NaiveDate,
        /// Banner daily maximum.
        max: u32,
    },
}

/// Fails with [`ValidationError::InvalidDateRange`] when `date_start > date_end`.
pub fn validate_banner_window(
    date_start: NaiveDate,
    date_end: NaiveDate,
) -> Result<(), ValidationError> {
    if date_start > date_end {
        return Err(ValidationError::InvalidDateRange {
            start: date_start,
            end: date_end,
        });
    }
    Ok(())
}

/// Largest daily quota; the storage column is a 32-bit signed integer.
pub const MAX_QUOTA: u32 = i32::MAX as u32;

/// `value` clamped into `0..=MAX_QUOTA`.
pub fn clamp_quota(value: i64) -> u32 {
    value.clamp(0, MAX_QUOTA as i64) as u32
}

/// Fails with [`ValidationError::InvalidQuotaOrder`] when `min > max`.
pub fn validate_quota_order(min_showings: u32, max_showings: u32) -> Result<(), ValidationError> {
    if min_showings > max_showings {
        return Err(ValidationError::InvalidQuotaOrder {
            min: min_showings,
            max: max_showings,
        });
    }
    Ok(())
}

/// Fails with [`ValidationError::ShowingOutsideWindow`] unless
/// `banner.date_start <= date <= banner.date_end`.
pub fn validate_showing_window(date: NaiveDate, banner: &Banner) -> Result<(), ValidationError> {
    if !banner.is_active_on(date) {
        return Err(ValidationError::ShowingOutsideWindow {
            date,
            start: banner.date_start(),
            end: banner.date_end(),
        });
    }
    Ok(())
}

/// Fails with [`ValidationError::QuotaExceeded`] when the banner's current
/// showings on `date` already number `max_showings` or more.
///
/// The count covers every showing currently held by the banner, including one
/// that an update is about to replace.
pub fn validate_showing_capacity(date: NaiveDate, banner: &Banner) -> Result<(), ValidationError> {
    let max = banner.max_showings();
    if banner.count_showings_on(date) >= max as usize {
        return Err(ValidationError::QuotaExceeded { date, max });
    }
    Ok(())
}

/// Window first, then capacity.
pub fn validate_showing(date: NaiveDate, banner: &Banner) -> Result<(), ValidationError> {
    validate_showing_window(date, banner)?;
    validate_showing_capacity(date, banner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Showing;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn banner_with(max: i64, showing_days: &[u32]) -> Banner {
        let showings = showing_days
            .iter()
            .enumerate()
            .map(|(i, day)| Showing {
                id: i as i32 + 1,
                site_name: "example.com".into(),
                datetime: d(1, *day).and_hms_opt(12, 0, 0).unwrap(),
                banner_id: 1,
            })
            .collect();
        Banner::try_new(1, "B", "C", d(1, 1), d(1, 31), 0, max, showings).unwrap()
    }

    #[test]
    fn window_bounds_are_inclusive() {
        assert!(validate_banner_window(d(1, 1), d(1, 1)).is_ok());
        assert!(validate_banner_window(d(1, 2), d(1, 1)).is_err());

        let b = banner_with(3, &[]);
        assert!(validate_showing_window(d(1, 1), &b).is_ok());
        assert!(validate_showing_window(d(1, 31), &b).is_ok());
        assert_eq!(
            validate_showing_window(d(2, 1), &b),
            Err(ValidationError::ShowingOutsideWindow {
                date: d(2, 1),
                start: d(1, 1),
                end: d(1, 31)
            })
        );
    }

    #[test]
    fn clamp_floors_negatives_and_caps_at_storable_max() {
        assert_eq!(clamp_quota(-7), 0);
        assert_eq!(clamp_quota(0), 0);
        assert_eq!(clamp_quota(12), 12);
        assert_eq!(clamp_quota(i32::MAX as i64), MAX_QUOTA);
        assert_eq!(clamp_quota(3_000_000_000), MAX_QUOTA);
        assert_eq!(clamp_quota(i64::MAX), MAX_QUOTA);
    }

    #[test]
    fn quota_order() {
        assert!(validate_quota_order(3, 3).is_ok());
        assert_eq!(
            validate_quota_order(4, 3),
            Err(ValidationError::InvalidQuotaOrder { min: 4, max: 3 })
        );
    }

    #[test]
    fn capacity_counts_existing_showings_for_the_day() {
        let b = banner_with(2, &[5, 5, 6]);
        assert_eq!(
            validate_showing_capacity(d(1, 5), &b),
            Err(ValidationError::QuotaExceeded { date: d(1, 5), max: 2 })
        );
        assert!(validate_showing_capacity(d(1, 6), &b).is_ok());
        assert!(validate_showing_capacity(d(1, 7), &b).is_ok());
    }

    #[test]
    fn zero_max_rejects_every_day() {
        let b = banner_with(0, &[]);
        assert!(matches!(
            validate_showing_capacity(d(1, 10), &b),
            Err(ValidationError::QuotaExceeded { max: 0, .. })
        ));
    }

    #[test]
    fn window_is_checked_before_capacity() {
        let b = banner_with(0, &[]);
        assert!(matches!(
            validate_showing(d(3, 1), &b),
            Err(ValidationError::ShowingOutsideWindow { .. })
        ));
    }
}
