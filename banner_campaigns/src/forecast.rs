//! Forecast Engine: weekday seasonality and proportional daily allocation.
//!
//! Historical showings (strictly before `today`) give an average
//! showings-per-weekday figure. Each future day's figure is split among the
//! banners active that day in proportion to their `min_showings`, capped at
//! each banner's `max_showings`.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::dates::days_inclusive;
use crate::model::{Banner, BannerId};

/// One retained banner and its sparse date → count allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
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
    /// Daily minimum.
    pub min_showings: u32,
    /// Daily maximum.
    pub max_showings: u32,
    /// Forecast per date. Dates where the banner is inactive have no entry.
    pub daily: BTreeMap<NaiveDate, u32>,
}

/// Parallel sequences for plotting one banner's forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastSeries {
    /// Forecast dates, ascending.
    pub dates: Vec<NaiveDate>,
    /// Forecasted showings per date.
    pub counts: Vec<u32>,
    /// `min_showings`, repeated.
    pub min_showings: Vec<u32>,
    /// `max_showings`, repeated.
    pub max_showings: Vec<u32>,
}

/// A complete forecast computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    today: NaiveDate,
    weekday_average: [f64; 7],
    rows: Vec<ForecastRow>,
}

/// Average showings per weekday (Monday first) over `[min(date_start), today)`.
///
/// A weekday that never occurred in the window averages 0.
pub fn weekday_average(banners: &[Banner], today: NaiveDate) -> [f64; 7] {
    let mut counts = [0u64; 7];
    for showing in banners.iter().flat_map(Banner::showings) {
        let date = showing.date();
        if date < today {
            counts[weekday_index(date)] += 1;
        }
    }

    let mut occurrences = [0u64; 7];
    if let (Some(first), Some(yesterday)) = (
        banners.iter().map(Banner::date_start).min(),
        today.pred_opt(),
    ) {
        for date in days_inclusive(first, yesterday) {
            occurrences[weekday_index(date)] += 1;
        }
    }

    let mut average = [0.0; 7];
    for (i, slot) in average.iter_mut().enumerate() {
        if occurrences[i] == 0 {
            if counts[i] > 0 {
                tracing::debug!(
                    weekday = i,
                    showings = counts[i],
                    "weekday absent from history window"
                );
            }
            continue;
        }
        *slot = counts[i] as f64 / occurrences[i] as f64;
    }
    average
}

fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// Share of `target` for a banner with `min_showings` out of `pool_min`,
/// rounded half-to-even and capped at `max_showings`.
pub fn allocate(min_showings: u32, max_showings: u32, target: f64, pool_min: u64) -> u32 {
    if pool_min == 0 {
        return 0;
    }
    let share = (min_showings as f64 * target / pool_min as f64).round_ties_even();
    if share >= max_showings as f64 {
        max_showings
    } else {
        share.max(0.0) as u32
    }
}

impl Forecast {
    /// Compute the forecast for every banner still running on or after `today`.
    pub fn build(banners: &[Banner], today: NaiveDate) -> Self {
        let weekday_average = weekday_average(banners, today);

        let mut active: Vec<&Banner> = banners.iter().filter(|b| b.date_end() >= today).collect();
        active.sort_by_key(|b| b.min_showings());

        let mut rows: Vec<ForecastRow> = active
            .iter()
            .map(|b| ForecastRow {
                banner_id: b.id(),
                name: b.name().to_string(),
                company_name: b.company_name().to_string(),
                date_start: b.date_start(),
                date_end: b.date_end(),
                min_showings: b.min_showings(),
                max_showings: b.max_showings(),
                daily: BTreeMap::new(),
            })
            .collect();

        if let Some(last) = active.iter().map(|b| b.date_end()).max() {
            for date in days_inclusive(today, last) {
                let target = weekday_average[weekday_index(date)];
                let pool_min: u64 = active
                    .iter()
                    .filter(|b| b.is_active_on(date))
                    .map(|b| b.min_showings() as u64)
                    .sum();
                if pool_min == 0 {
                    tracing::debug!(%date, "no minimum quota among active banners, allocating 0");
                }
                for (banner, row) in active.iter().zip(rows.iter_mut()) {
                    if banner.is_active_on(date) {
                        let (min, max) = (banner.min_showings(), banner.max_showings());
                        row.daily.insert(date, allocate(min, max, target, pool_min));
                    }
                }
            }
        }

        tracing::debug!(%today, banners = rows.len(), "forecast rebuilt");
        Self {
            today,
            weekday_average,
            rows,
        }
    }

    /// Reference date.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Average showings per weekday, Monday first.
    pub fn weekday_average(&self) -> &[f64; 7] {
        &self.weekday_average
    }

    /// Retained banners, ascending by `min_showings`.
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// Position of a banner in [`Forecast::rows`].
    pub fn position(&self, banner_id: BannerId) -> Option<usize> {
        self.rows.iter().position(|r| r.banner_id == banner_id)
    }

    /// Plot series for the row at `index`.
    pub fn forecast_for_banner(&self, index: usize) -> Option<ForecastSeries> {
        let row = self.rows.get(index)?;
        let len = row.daily.len();
        Some(ForecastSeries {
            dates: row.daily.keys().copied().collect(),
            counts: row.daily.values().copied().collect(),
            min_showings: vec![row.min_showings; len],
            max_showings: vec![row.max_showings; len],
        })
    }
}
