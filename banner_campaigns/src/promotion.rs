//! Promotion Analyzer: which banners ran on a given day and how complete
//! their contractual minimums are.
//!
//! The analyzer borrows the banner snapshot, so the registry cannot be
//! mutated while an analysis is alive. Build a new one after every change.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::days_inclusive;
use crate::model::{Banner, BannerId};

/// Date → ids of the banners with at least one showing that day.
pub type DateBannerIndex = BTreeMap<NaiveDate, BTreeSet<BannerId>>;

/// `fact / required * 100`, capped at 100. A zero requirement yields 0.
pub fn completion_percent(fact: u64, required: u64) -> f64 {
    if required == 0 {
        tracing::debug!(fact, "zero minimum quota, completion reported as 0%");
        return 0.0;
    }
    (fact as f64 / required as f64 * 100.0).min(100.0)
}

/// Dates covered by the index: earliest start through the latest end, never
/// later than the day before `today`.
fn index_window(banners: &[Banner], today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let min = banners.iter().map(Banner::date_start).min()?;
    let max = banners.iter().map(Banner::date_end).max()?;
    let max = max.min(today.pred_opt()?);
    (min <= max).then_some((min, max))
}

/// Build the date → banner-id index from scratch.
///
/// Every date in the window gets an entry (possibly empty). Showings dated
/// `today` or later, or outside the window, are ignored.
pub fn build_index(banners: &[Banner], today: NaiveDate) -> DateBannerIndex {
    let mut index = DateBannerIndex::new();
    let Some((min, max)) = index_window(banners, today) else {
        return index;
    };
    for date in days_inclusive(min, max) {
        index.insert(date, BTreeSet::new());
    }

    let mut ignored = 0usize;
    for banner in banners {
        for showing in banner.showings() {
            let date = showing.date();
            if date >= today {
                continue;
            }
            match index.get_mut(&date) {
                Some(ids) => {
                    ids.insert(banner.id());
                }
                None => ignored += 1,
            }
        }
    }
    tracing::debug!(dates = index.len(), ignored, "date-banner index rebuilt");
    index
}

/// Completion figures for one banner relative to one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannerPromotionData {
    /// Banner id.
    pub banner_id: BannerId,
    /// Campaign name.
    pub name: String,
    /// Advertiser.
    pub company_name: String,
    /// Campaign start.
    pub date_start: NaiveDate,
    /// Campaign end.
    pub date_end: NaiveDate,
    /// The reference date.
    pub date: NaiveDate,
    /// Daily minimum.
    pub min_today: u64,
    /// Daily maximum.
    pub max_today: u64,
    /// Showings recorded on `date`.
    pub fact_today: u64,
    /// `lifetime_days * min_showings`.
    pub min_all: u64,
    /// `lifetime_days * max_showings`.
    pub max_all: u64,
    /// Every showing ever recorded.
    pub fact_all: u64,
}

impl BannerPromotionData {
    /// Compute the figures for `banner` on `date`.
    pub fn from_banner(banner: &Banner, date: NaiveDate) -> Self {
        let days = banner.lifetime_days();
        Self {
            banner_id: banner.id(),
            name: banner.name().to_string(),
            company_name: banner.company_name().to_string(),
            date_start: banner.date_start(),
            date_end: banner.date_end(),
            date,
            min_today: banner.min_showings() as u64,
            max_today: banner.max_showings() as u64,
            fact_today: banner.count_showings_on(date) as u64,
            min_all: days * banner.min_showings() as u64,
            max_all: days * banner.max_showings() as u64,
            fact_all: banner.showings().len() as u64,
        }
    }

    /// Share of the daily minimum met on `date`, in `[0, 100]`.
    pub fn completion_today(&self) -> f64 {
        completion_percent(self.fact_today, self.min_today)
    }

    /// Share of the lifetime minimum met so far, in `[0, 100]`.
    pub fn completion_all(&self) -> f64 {
        completion_percent(self.fact_all, self.min_all)
    }
}

/// Portfolio-wide sums across all banners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllTimeTotals {
    /// Sum of recorded showings.
    pub fact_all: u64,
    /// Sum of lifetime minimums.
    pub min_all: u64,
    /// Sum of lifetime maximums.
    pub max_all: u64,
}

impl AllTimeTotals {
    /// `fact_all / min_all * 100`, capped at 100.
    pub fn completion(&self) -> f64 {
        completion_percent(self.fact_all, self.min_all)
    }
}

/// Sum lifetime figures across `banners`.
pub fn alltime_totals(banners: &[Banner]) -> AllTimeTotals {
    banners.iter().fold(AllTimeTotals::default(), |acc, b| {
        let days = b.lifetime_days();
        AllTimeTotals {
            fact_all: acc.fact_all + b.showings().len() as u64,
            min_all: acc.min_all + days * b.min_showings() as u64,
            max_all: acc.max_all + days * b.max_showings() as u64,
        }
    })
}

/// Date-banner index over a borrowed snapshot.
#[derive(Debug, Clone)]
pub struct PromotionAnalyzer<'a> {
    banners: &'a [Banner],
    index: DateBannerIndex,
    today: NaiveDate,
}

impl<'a> PromotionAnalyzer<'a> {
    /// Build the index for `banners` as of `today`.
    pub fn new(banners: &'a [Banner], today: NaiveDate) -> Self {
        Self {
            banners,
            index: build_index(banners, today),
            today,
        }
    }

    /// Reference date the index was built for.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// The underlying index.
    pub fn index(&self) -> &DateBannerIndex {
        &self.index
    }

    /// First indexed date.
    pub fn min_date(&self) -> Option<NaiveDate> {
        self.index.keys().next().copied()
    }

    /// Last indexed date (never later than yesterday).
    pub fn max_date(&self) -> Option<NaiveDate> {
        self.index.keys().next_back().copied()
    }

    /// Banners with showings on `date`, in snapshot order. Empty for unindexed dates.
    pub fn select_for_date(&self, date: NaiveDate) -> Vec<&'a Banner> {
        let Some(ids) = self.index.get(&date) else {
            return Vec::new();
        };
        self.banners
            .iter()
            .filter(|b| ids.contains(&b.id()))
            .collect()
    }

    /// Completion rows for every banner selected on `date`.
    pub fn stats_for_date(&self, date: NaiveDate) -> Vec<BannerPromotionData> {
        self.select_for_date(date)
            .into_iter()
            .map(|b| BannerPromotionData::from_banner(b, date))
            .collect()
    }

    /// Completion figures for one banner on `date`.
    pub fn banner_stats(&self, banner: &Banner, date: NaiveDate) -> BannerPromotionData {
        BannerPromotionData::from_banner(banner, date)
    }

    /// Lifetime sums over the whole snapshot.
    pub fn alltime_totals(&self) -> AllTimeTotals {
        alltime_totals(self.banners)
    }
}
