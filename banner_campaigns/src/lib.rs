//! Banner campaign tracking: campaigns, recorded showings, promotion
//! completion analysis and quota-aware showing forecasts.

#![warn(missing_docs)]

pub mod config;
pub mod dates;
pub mod db;
pub mod forecast;
pub mod model;
pub mod models;
pub mod promotion;
pub mod registry;
pub mod schema;
pub mod seed;
pub mod storage;
pub mod table;
pub mod validation;

pub use forecast::{Forecast, ForecastSeries};
pub use model::{Banner, BannerId, BannerShortData, Showing, ShowingId, ShowingShortData};
pub use promotion::{AllTimeTotals, BannerPromotionData, PromotionAnalyzer};
pub use registry::{CampaignRegistry, RegistryError, SortMode};
pub use storage::{CampaignStore, StoreError};
pub use validation::ValidationError;
