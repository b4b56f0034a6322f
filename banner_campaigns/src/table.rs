//! Read-only tabular views for a presentation layer.
//!
//! Each view borrows from the registry snapshot or a derived result and
//! exposes row/column counts, static headers and cell values.
//! [`terminal_table`] lays any view out with `comfy_table` for the CLI.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell as TermCell, CellAlignment, Color, Table};

use crate::dates::{format_date, format_datetime};
use crate::forecast::{Forecast, ForecastSeries};
use crate::model::{Banner, Showing};
use crate::promotion::PromotionAnalyzer;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Free text.
    Text(String),
    /// Calendar date, rendered `dd.mm.yyyy`.
    Date(NaiveDate),
    /// Timestamp, rendered `dd.mm.yyyy HH:MM`.
    DateTime(NaiveDateTime),
    /// Non-negative count.
    Count(u64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => f.write_str(&format_date(*d)),
            Cell::DateTime(dt) => f.write_str(&format_datetime(*dt)),
            Cell::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Pull-based table accessors.
pub trait TableModel {
    /// Static column labels.
    fn headers(&self) -> &'static [&'static str];

    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Number of columns.
    fn column_count(&self) -> usize {
        self.headers().len()
    }

    /// Label for column `column`.
    fn header(&self, column: usize) -> Option<&'static str> {
        self.headers().get(column).copied()
    }

    /// Value at (`row`, `column`); `None` when out of range.
    fn cell(&self, row: usize, column: usize) -> Option<Cell>;
}

/// Banner list.
pub struct BannerTable<'a> {
    banners: &'a [Banner],
}

impl<'a> BannerTable<'a> {
    /// Wrap a banner slice.
    pub fn new(banners: &'a [Banner]) -> Self {
        Self { banners }
    }
}

impl TableModel for BannerTable<'_> {
    fn headers(&self) -> &'static [&'static str] {
        &["Name", "Start date of banner action", "End date of banner action"]
    }

    fn row_count(&self) -> usize {
        self.banners.len()
    }

    fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        let b = self.banners.get(row)?;
        match column {
            0 => Some(Cell::Text(b.name().to_string())),
            1 => Some(Cell::Date(b.date_start())),
            2 => Some(Cell::Date(b.date_end())),
            _ => None,
        }
    }
}

/// Showings of one banner.
pub struct ShowingTable<'a> {
    showings: &'a [Showing],
}

impl<'a> ShowingTable<'a> {
    /// Wrap a showing slice.
    pub fn new(showings: &'a [Showing]) -> Self {
        Self { showings }
    }
}

impl TableModel for ShowingTable<'_> {
    fn headers(&self) -> &'static [&'static str] {
        &["Site name", "Show time"]
    }

    fn row_count(&self) -> usize {
        self.showings.len()
    }

    fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        let s = self.showings.get(row)?;
        match column {
            0 => Some(Cell::Text(s.site_name.clone())),
            1 => Some(Cell::DateTime(s.datetime)),
            _ => None,
        }
    }
}

/// Banners that ran on a selected date.
pub struct PromotionTable<'a> {
    banners: Vec<&'a Banner>,
    date: NaiveDate,
}

impl<'a> PromotionTable<'a> {
    /// Select the banners for `date` from an analyzer.
    pub fn new(analyzer: &PromotionAnalyzer<'a>, date: NaiveDate) -> Self {
        Self {
            banners: analyzer.select_for_date(date),
            date,
        }
    }

    /// Selected date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Banner behind `row`.
    pub fn banner(&self, row: usize) -> Option<&'a Banner> {
        self.banners.get(row).copied()
    }
}

impl TableModel for PromotionTable<'_> {
    fn headers(&self) -> &'static [&'static str] {
        &["Name", "Min shows", "Actual shows"]
    }

    fn row_count(&self) -> usize {
        self.banners.len()
    }

    fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        let b = self.banners.get(row)?;
        match column {
            0 => Some(Cell::Text(b.name().to_string())),
            1 => Some(Cell::Count(b.min_showings() as u64)),
            2 => Some(Cell::Count(b.count_showings_on(self.date) as u64)),
            _ => None,
        }
    }
}

/// Banners retained by a forecast.
pub struct ForecastTable<'a> {
    forecast: &'a Forecast,
}

impl<'a> ForecastTable<'a> {
    /// Wrap a forecast.
    pub fn new(forecast: &'a Forecast) -> Self {
        Self { forecast }
    }
}

impl TableModel for ForecastTable<'_> {
    fn headers(&self) -> &'static [&'static str] {
        &["Name", "Company", "End date of banner action"]
    }

    fn row_count(&self) -> usize {
        self.forecast.rows().len()
    }

    fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        let r = self.forecast.rows().get(row)?;
        match column {
            0 => Some(Cell::Text(r.name.clone())),
            1 => Some(Cell::Text(r.company_name.clone())),
            2 => Some(Cell::Date(r.date_end)),
            _ => None,
        }
    }
}

/// One banner's forecast series, a row per date.
pub struct SeriesTable<'a> {
    series: &'a ForecastSeries,
}

impl<'a> SeriesTable<'a> {
    /// Wrap a series.
    pub fn new(series: &'a ForecastSeries) -> Self {
        Self { series }
    }
}

impl TableModel for SeriesTable<'_> {
    fn headers(&self) -> &'static [&'static str] {
        &["Date", "Forecast", "Min shows", "Max shows"]
    }

    fn row_count(&self) -> usize {
        self.series.dates.len()
    }

    fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        let s = self.series;
        match column {
            0 => s.dates.get(row).copied().map(Cell::Date),
            1 => s.counts.get(row).map(|n| Cell::Count(*n as u64)),
            2 => s.min_showings.get(row).map(|n| Cell::Count(*n as u64)),
            3 => s.max_showings.get(row).map(|n| Cell::Count(*n as u64)),
            _ => None,
        }
    }
}

fn terminal_cell(cell: Option<Cell>) -> TermCell {
    match cell {
        Some(value @ Cell::Count(_)) => {
            TermCell::new(value).set_alignment(CellAlignment::Right)
        }
        Some(value) => TermCell::new(value),
        None => TermCell::new(""),
    }
}

fn build_terminal_table(model: &dyn TableModel, ids: Option<&[i32]>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    let mut header = Vec::with_capacity(model.column_count() + 1);
    if ids.is_some() {
        header.push(TermCell::new("Id").fg(Color::Cyan));
    }
    header.extend(model.headers().iter().map(|h| TermCell::new(h).fg(Color::Cyan)));
    table.set_header(header);

    for row in 0..model.row_count() {
        let mut cells = Vec::with_capacity(model.column_count() + 1);
        if let Some(ids) = ids {
            let id = ids.get(row).map(|id| Cell::Count(*id as u64));
            cells.push(terminal_cell(id));
        }
        cells.extend((0..model.column_count()).map(|c| terminal_cell(model.cell(row, c))));
        table.add_row(cells);
    }
    table
}

/// Lay a model out as a terminal table, header first.
pub fn terminal_table(model: &dyn TableModel) -> Table {
    build_terminal_table(model, None)
}

/// Like [`terminal_table`] with a leading `Id` column, one id per row.
pub fn terminal_table_with_ids(model: &dyn TableModel, ids: &[i32]) -> Table {
    build_terminal_table(model, Some(ids))
}
