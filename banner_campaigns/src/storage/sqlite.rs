//! SQLite implementation of [`CampaignStore`].
//!
//! Multi-row writes (bulk inserts, banner delete, clear) run inside one
//! `BEGIN IMMEDIATE` transaction via `SqliteConnection::immediate_transaction`,
//! so they either apply completely or not at all.

use chrono::ParseResult;
use diesel::prelude::*;
use diesel::sql_query;

use crate::dates;
use crate::model::{Banner, BannerId, BannerShortData, Showing, ShowingId, ShowingShortData};
use crate::models::{BannerRow, NewBannerRow, NewShowingRow, ShowingRow, ShowingUpdate};
use crate::schema::{banners, showings};
use crate::storage::{CampaignStore, StoreError, StoreResult};

/// Campaign store backed by one SQLite connection.
pub struct SqliteStore {
    conn: SqliteConnection,
}

impl SqliteStore {
    /// Run pending migrations on `database_url`, then open a tuned connection.
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        crate::db::migrate::run_sqlite(database_url)?;
        let conn = crate::db::connection::connect_sqlite(database_url)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already migrated connection.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self { conn }
    }

    /// Direct access for ad-hoc queries (tests, maintenance).
    pub fn connection_mut(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

fn quota_to_db(value: u32) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::QuotaOutOfRange(value))
}

fn new_banner_row(data: &BannerShortData) -> StoreResult<NewBannerRow<'_>> {
    Ok(NewBannerRow {
        name: data.name(),
        company_name: data.company_name(),
        date_start: dates::format_date(data.date_start()),
        date_end: dates::format_date(data.date_end()),
        min_showings: quota_to_db(data.min_showings())?,
        max_showings: quota_to_db(data.max_showings())?,
    })
}

fn parse_column<T>(
    column: &'static str,
    id: i32,
    value: &str,
    parse: fn(&str) -> ParseResult<T>,
) -> StoreResult<T> {
    parse(value).map_err(|source| StoreError::BadDate {
        column,
        id,
        value: value.to_string(),
        source,
    })
}

fn showing_from_row(row: ShowingRow) -> StoreResult<Showing> {
    let datetime = parse_column("datetime", row.id, &row.datetime, dates::parse_datetime)?;
    Ok(Showing {
        id: row.id,
        site_name: row.site_name,
        datetime,
        banner_id: row.banner_id,
    })
}

fn banner_from_rows(row: BannerRow, showing_rows: Vec<ShowingRow>) -> StoreResult<Banner> {
    let date_start = parse_column("date_start", row.id, &row.date_start, dates::parse_date)?;
    let date_end = parse_column("date_end", row.id, &row.date_end, dates::parse_date)?;
    let showings = showing_rows
        .into_iter()
        .map(showing_from_row)
        .collect::<StoreResult<Vec<_>>>()?;

    Banner::try_new(
        row.id,
        row.name,
        row.company_name,
        date_start,
        date_end,
        row.min_showings as i64,
        row.max_showings as i64,
        showings,
    )
    .map_err(|source| StoreError::CorruptBanner { id: row.id, source })
}

fn insert_banner_row(conn: &mut SqliteConnection, data: &BannerShortData) -> StoreResult<BannerId> {
    let id = diesel::insert_into(banners::table)
        .values(&new_banner_row(data)?)
        .returning(banners::id)
        .get_result::<i32>(conn)?;
    Ok(id)
}

fn insert_showing_row(
    conn: &mut SqliteConnection,
    data: &ShowingShortData,
    banner_id: BannerId,
) -> StoreResult<ShowingId> {
    let row = NewShowingRow {
        site_name: &data.site_name,
        datetime: dates::format_datetime(data.datetime),
        banner_id,
    };
    let id = diesel::insert_into(showings::table)
        .values(&row)
        .returning(showings::id)
        .get_result::<i32>(conn)?;
    Ok(id)
}

impl CampaignStore for SqliteStore {
    fn load_all_banners(&mut self) -> StoreResult<Vec<Banner>> {
        let banner_rows = banners::table
            .order(banners::id.asc())
            .select(BannerRow::as_select())
            .load::<BannerRow>(&mut self.conn)?;

        let grouped = ShowingRow::belonging_to(&banner_rows)
            .order(showings::id.asc())
            .select(ShowingRow::as_select())
            .load::<ShowingRow>(&mut self.conn)?
            .grouped_by(&banner_rows);

        let out = banner_rows
            .into_iter()
            .zip(grouped)
            .map(|(row, showing_rows)| banner_from_rows(row, showing_rows))
            .collect::<StoreResult<Vec<_>>>()?;
        tracing::debug!(banners = out.len(), "loaded banners from sqlite");
        Ok(out)
    }

    fn insert_banner(&mut self, data: &BannerShortData) -> StoreResult<BannerId> {
        insert_banner_row(&mut self.conn, data)
    }

    fn insert_banners(&mut self, data: &[BannerShortData]) -> StoreResult<Vec<BannerId>> {
        self.conn
            .immediate_transaction::<_, StoreError, _>(|conn| {
                data.iter().map(|d| insert_banner_row(conn, d)).collect()
            })
    }

    fn update_banner(&mut self, banner: &Banner) -> StoreResult<()> {
        let data = banner.to_short_data();
        let n = diesel::update(banners::table.find(banner.id()))
            .set(&new_banner_row(&data)?)
            .execute(&mut self.conn)?;
        if n == 0 {
            return Err(StoreError::NotFound {
                entity: "banner",
                id: banner.id(),
            });
        }
        Ok(())
    }

    fn delete_banner(&mut self, id: BannerId) -> StoreResult<()> {
        self.conn.immediate_transaction::<_, StoreError, _>(|conn| {
            diesel::delete(showings::table.filter(showings::banner_id.eq(id))).execute(conn)?;
            let n = diesel::delete(banners::table.find(id)).execute(conn)?;
            if n == 0 {
                return Err(StoreError::NotFound {
                    entity: "banner",
                    id,
                });
            }
            Ok(())
        })
    }

    fn insert_showing(
        &mut self,
        data: &ShowingShortData,
        banner_id: BannerId,
    ) -> StoreResult<ShowingId> {
        insert_showing_row(&mut self.conn, data, banner_id)
    }

    fn insert_showings(
        &mut self,
        data: &[ShowingShortData],
        banner_id: BannerId,
    ) -> StoreResult<Vec<ShowingId>> {
        self.conn
            .immediate_transaction::<_, StoreError, _>(|conn| {
                data.iter()
                    .map(|d| insert_showing_row(conn, d, banner_id))
                    .collect()
            })
    }

    fn update_showing(&mut self, showing: &Showing) -> StoreResult<()> {
        let n = diesel::update(showings::table.find(showing.id))
            .set(&ShowingUpdate {
                site_name: &showing.site_name,
                datetime: dates::format_datetime(showing.datetime),
            })
            .execute(&mut self.conn)?;
        if n == 0 {
            return Err(StoreError::NotFound {
                entity: "showing",
                id: showing.id,
            });
        }
        Ok(())
    }

    fn delete_showing(&mut self, id: ShowingId) -> StoreResult<()> {
        let n = diesel::delete(showings::table.find(id)).execute(&mut self.conn)?;
        if n == 0 {
            return Err(StoreError::NotFound {
                entity: "showing",
                id,
            });
        }
        Ok(())
    }

    fn clear_all(&mut self) -> StoreResult<()> {
        self.conn.immediate_transaction::<_, StoreError, _>(|conn| {
            diesel::delete(showings::table).execute(conn)?;
            diesel::delete(banners::table).execute(conn)?;
            // restart AUTOINCREMENT ids like freshly created tables
            sql_query("DELETE FROM sqlite_sequence WHERE name IN ('banners', 'showings')")
                .execute(conn)?;
            Ok(())
        })?;
        tracing::info!("cleared all banners and showings");
        Ok(())
    }
}
