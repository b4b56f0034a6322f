//! Campaign domain types.
//!
//! [`Banner`] and [`BannerShortData`] can only be built through validating
//! constructors: negative quotas are clamped to zero first, then the window
//! and quota-order invariants are checked. Nothing mutates a banner's scalar
//! fields afterwards; an update replaces the whole value.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::dates;
use crate::validation::{self, ValidationError};

/// Storage-assigned banner identity.
pub type BannerId = i32;
/// Storage-assigned showing identity.
pub type ShowingId = i32;

/// Validated campaign fields without an identity (input of create/update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerShortData {
    name: String,
    company_name: String,
    date_start: NaiveDate,
    date_end: NaiveDate,
    min_showings: u32,
    max_showings: u32,
}

impl BannerShortData {
    /// Clamp the quotas, then check the date window and the quota order.
    pub fn new(
        name: impl Into<String>,
        company_name: impl Into<String>,
        date_start: NaiveDate,
        date_end: NaiveDate,
        min_showings: i64,
        max_showings: i64,
    ) -> Result<Self, ValidationError> {
        validation::validate_banner_window(date_start, date_end)?;
        let min_showings = validation::clamp_quota(min_showings);
        let max_showings = validation::clamp_quota(max_showings);
        validation::validate_quota_order(min_showings, max_showings)?;
        Ok(Self {
            name: name.into(),
            company_name: company_name.into(),
            date_start,
            date_end,
            min_showings,
            max_showings,
        })
    }

    /// Campaign name.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Advertiser name.
    pub fn company_name(&self) -> &str {
        &self.company_name
    }
    /// First day of the campaign (inclusive).
    pub fn date_start(&self) -> NaiveDate {
        self.date_start
    }
    /// Last day of the campaign (inclusive).
    pub fn date_end(&self) -> NaiveDate {
        self.date_end
    }
    /// Contractual minimum showings per day.
    pub fn min_showings(&self) -> u32 {
        self.min_showings
    }
    /// Contractual maximum showings per day.
    pub fn max_showings(&self) -> u32 {
        self.max_showings
    }
}

/// A campaign with its recorded showings (insertion order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    id: BannerId,
    #[serde(flatten)]
    data: BannerShortData,
    showings: Vec<Showing>,
}

impl Banner {
    /// Attach an identity and showings to already validated fields.
    pub fn new(id: BannerId, data: BannerShortData, showings: Vec<Showing>) -> Self {
        Self { id, data, showings }
    }

    /// Validate raw fields (e.g. a row read back from storage) into a banner.
    #[allow(clippy::too_many_arguments)]
    pub fn try_new(
        id: BannerId,
        name: impl Into<String>,
        company_name: impl Into<String>,
        date_start: NaiveDate,
        date_end: NaiveDate,
        min_showings: i64,
        max_showings: i64,
        showings: Vec<Showing>,
    ) -> Result<Self, ValidationError> {
        let data = BannerShortData::new(
            name,
            company_name,
            date_start,
            date_end,
            min_showings,
            max_showings,
        )?;
        Ok(Self::new(id, data, showings))
    }

    /// Storage identity.
    pub fn id(&self) -> BannerId {
        self.id
    }
    /// Campaign name.
    pub fn name(&self) -> &str {
        self.data.name()
    }
    /// Advertiser name.
    pub fn company_name(&self) -> &str {
        self.data.company_name()
    }
    /// First day of the campaign (inclusive).
    pub fn date_start(&self) -> NaiveDate {
        self.data.date_start
    }
    /// Last day of the campaign (inclusive).
    pub fn date_end(&self) -> NaiveDate {
        self.data.date_end
    }
    /// Contractual minimum showings per day.
    pub fn min_showings(&self) -> u32 {
        self.data.min_showings
    }
    /// Contractual maximum showings per day.
    pub fn max_showings(&self) -> u32 {
        self.data.max_showings
    }
    /// Recorded showings in insertion order.
    pub fn showings(&self) -> &[Showing] {
        &self.showings
    }

    /// Identity-free copy of the scalar fields (for edit forms).
    pub fn to_short_data(&self) -> BannerShortData {
        self.data.clone()
    }

    /// Same banner with new scalar fields; showings are kept.
    pub fn with_data(&self, data: BannerShortData) -> Self {
        Self {
            id: self.id,
            data,
            showings: self.showings.clone(),
        }
    }

    /// Number of showings recorded on `date`.
    pub fn count_showings_on(&self, date: NaiveDate) -> usize {
        self.showings.iter().filter(|s| s.date() == date).count()
    }

    /// `date_start <= date <= date_end`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.date_start() <= date && date <= self.date_end()
    }

    /// Length of the campaign window in days, both ends included.
    pub fn lifetime_days(&self) -> u64 {
        ((self.date_end() - self.date_start()).num_days() + 1) as u64
    }

    pub(crate) fn push_showing(&mut self, showing: Showing) {
        self.showings.push(showing);
    }

    pub(crate) fn showing_position(&self, showing_id: ShowingId) -> Option<usize> {
        self.showings.iter().position(|s| s.id == showing_id)
    }

    pub(crate) fn replace_showing(&mut self, index: usize, showing: Showing) {
        self.showings[index] = showing;
    }

    pub(crate) fn remove_showing(&mut self, index: usize) -> Showing {
        self.showings.remove(index)
    }
}

/// One recorded display of a banner on a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Showing {
    /// Storage identity.
    pub id: ShowingId,
    /// Site the banner was rendered on.
    pub site_name: String,
    /// Display time (minute precision in storage).
    pub datetime: NaiveDateTime,
    /// Owning banner.
    pub banner_id: BannerId,
}

impl Showing {
    /// Calendar date of the display.
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// Identity-free copy (for edit forms).
    pub fn to_short_data(&self) -> ShowingShortData {
        ShowingShortData {
            site_name: self.site_name.clone(),
            datetime: self.datetime,
        }
    }
}

/// Showing input before storage assigns an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowingShortData {
    /// Site the banner was rendered on.
    pub site_name: String,
    /// Display time.
    pub datetime: NaiveDateTime,
}

impl ShowingShortData {
    /// Build showing input. The time is truncated to whole minutes.
    pub fn new(site_name: impl Into<String>, datetime: NaiveDateTime) -> Self {
        Self {
            site_name: site_name.into(),
            datetime: dates::truncate_to_minute(datetime),
        }
    }

    /// Calendar date of the display.
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }
}
