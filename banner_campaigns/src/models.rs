//! Diesel models mapping to the database schema.
//!
//! These rows mirror the tables in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::banners`]: one campaign per row, dates as `dd.MM.yyyy` text
//! - [`crate::schema::showings`]: one display event per row, `dd.MM.yyyy hh:mm` text,
//!   FK to `banners` with `ON DELETE CASCADE`
//!
//! Conversion to the domain types happens in [`crate::storage::sqlite`].

use diesel::prelude::*;

use crate::schema::*;

/// A row in [`crate::schema::banners`].
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = banners, check_for_backend(diesel::sqlite::Sqlite))]
pub struct BannerRow {
    /// Database primary key.
    pub id: i32,
    /// Campaign name.
    pub name: String,
    /// Advertiser name.
    pub company_name: String,
    /// Inclusive start, `dd.MM.yyyy`.
    pub date_start: String,
    /// Inclusive end, `dd.MM.yyyy`.
    pub date_end: String,
    /// Daily minimum.
    pub min_showings: i32,
    /// Daily maximum.
    pub max_showings: i32,
}

/// Insertable/changeset form of [`BannerRow`].
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = banners)]
pub struct NewBannerRow<'a> {
    /// Campaign name.
    pub name: &'a str,
    /// Advertiser name.
    pub company_name: &'a str,
    /// Inclusive start, `dd.MM.yyyy`.
    pub date_start: String,
    /// Inclusive end, `dd.MM.yyyy`.
    pub date_end: String,
    /// Daily minimum.
    pub min_showings: i32,
    /// Daily maximum.
    pub max_showings: i32,
}

/// A row in [`crate::schema::showings`].
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = showings, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(BannerRow, foreign_key = banner_id))]
pub struct ShowingRow {
    /// Database primary key.
    pub id: i32,
    /// Site the banner was shown on.
    pub site_name: String,
    /// Display time, `dd.MM.yyyy hh:mm`.
    pub datetime: String,
    /// FK to [`BannerRow::id`].
    pub banner_id: i32,
}

/// Insertable form of [`ShowingRow`].
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = showings)]
pub struct NewShowingRow<'a> {
    /// Site the banner was shown on.
    pub site_name: &'a str,
    /// Display time, `dd.MM.yyyy hh:mm`.
    pub datetime: String,
    /// FK to [`BannerRow::id`].
    pub banner_id: i32,
}

/// Changeset for editing a showing in place (owner never changes).
#[derive(Debug, AsChangeset)]
#[diesel(table_name = showings)]
pub struct ShowingUpdate<'a> {
    /// Replacement site name.
    pub site_name: &'a str,
    /// Replacement display time, `dd.MM.yyyy hh:mm`.
    pub datetime: String,
}
