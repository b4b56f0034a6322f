//! Storage contract for banners and showings.
//!
//! The registry never talks to a database directly; it goes through
//! [`CampaignStore`]. Two implementations ship with the crate:
//! - [`sqlite::SqliteStore`]: Diesel over SQLite (the production store)
//! - [`memory::MemoryStore`]: plain vectors, for tests and throwaway runs
//!
//! Dates cross this boundary as typed values; only the SQLite adapter turns
//! them into `dd.MM.yyyy` / `dd.MM.yyyy hh:mm` text.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::model::{Banner, BannerId, BannerShortData, Showing, ShowingId, ShowingShortData};

/// Errors that can occur while reading or writing campaign storage.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A Diesel query failed.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// The database could not be opened.
    #[error("connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    /// Schema migrations could not be applied.
    #[error("migration failed: {0}")]
    Migration(String),

    /// A stored date/time string does not match the expected format.
    #[error("malformed {column} value {value:?} in row {id}")]
    BadDate {
        /// Column holding the text.
        column: &'static str,
        /// Row id.
        id: i32,
        /// Raw stored text.
        value: String,
        /// Parser failure.
        #[source]
        source: chrono::ParseError,
    },

    /// A stored banner violates the campaign invariants.
    #[error("stored banner {id} is invalid: {source}")]
    CorruptBanner {
        /// Row id.
        id: BannerId,
        /// Violated invariant.
        #[source]
        source: crate::validation::ValidationError,
    },

    /// An update or delete matched no row.
    #[error("{entity} {id} not found")]
    NotFound {
        /// `"banner"` or `"showing"`.
        entity: &'static str,
        /// Requested id.
        id: i32,
    },

    /// A quota too large for the 32-bit storage column.
    #[error("quota {0} does not fit the storage column")]
    QuotaOutOfRange(u32),
}

/// Result type used by every store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence surface consumed by [`crate::registry::CampaignRegistry`].
///
/// Implementations assign ids on insert and cascade banner deletes to the
/// banner's showings.
pub trait CampaignStore {
    /// Every banner with its showings. Banners by id, showings in insertion order.
    fn load_all_banners(&mut self) -> StoreResult<Vec<Banner>>;

    /// Persist a new banner and return its id.
    fn insert_banner(&mut self, data: &BannerShortData) -> StoreResult<BannerId>;

    /// Persist many banners at once; ids are returned in input order.
    fn insert_banners(&mut self, data: &[BannerShortData]) -> StoreResult<Vec<BannerId>>;

    /// Overwrite the scalar fields of an existing banner.
    fn update_banner(&mut self, banner: &Banner) -> StoreResult<()>;

    /// Delete a banner and all of its showings.
    fn delete_banner(&mut self, id: BannerId) -> StoreResult<()>;

    /// Persist a new showing for `banner_id` and return its id.
    fn insert_showing(&mut self, data: &ShowingShortData, banner_id: BannerId)
    -> StoreResult<ShowingId>;

    /// Persist many showings for one banner; ids are returned in input order.
    fn insert_showings(
        &mut self,
        data: &[ShowingShortData],
        banner_id: BannerId,
    ) -> StoreResult<Vec<ShowingId>>;

    /// Overwrite site and time of an existing showing.
    fn update_showing(&mut self, showing: &Showing) -> StoreResult<()>;

    /// Delete one showing.
    fn delete_showing(&mut self, id: ShowingId) -> StoreResult<()>;

    /// Remove every banner and showing.
    fn clear_all(&mut self) -> StoreResult<()>;
}
