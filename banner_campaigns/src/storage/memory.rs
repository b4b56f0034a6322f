//! In-memory [`CampaignStore`].
//!
//! Stores rows in plain vectors with monotonically increasing ids, which makes
//! it fast, deterministic and isolated: suitable for unit tests and for CLI
//! runs that should not touch a database file.

use crate::model::{Banner, BannerId, BannerShortData, Showing, ShowingId, ShowingShortData};
use crate::storage::{CampaignStore, StoreError, StoreResult};

/// Vector-backed store. Ids start at 1 and are never reused until [`CampaignStore::clear_all`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    banners: Vec<(BannerId, BannerShortData)>,
    showings: Vec<Showing>,
    next_banner_id: BannerId,
    next_showing_id: ShowingId,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            banners: Vec::new(),
            showings: Vec::new(),
            next_banner_id: 1,
            next_showing_id: 1,
        }
    }

    /// Number of stored showings across all banners.
    pub fn showing_count(&self) -> usize {
        self.showings.len()
    }

    fn banner_exists(&self, id: BannerId) -> bool {
        self.banners.iter().any(|(bid, _)| *bid == id)
    }
}

impl CampaignStore for MemoryStore {
    fn load_all_banners(&mut self) -> StoreResult<Vec<Banner>> {
        let mut out = Vec::with_capacity(self.banners.len());
        for (id, data) in &self.banners {
            let owned = self
                .showings
                .iter()
                .filter(|s| s.banner_id == *id)
                .cloned()
                .collect();
            out.push(Banner::new(*id, data.clone(), owned));
        }
        Ok(out)
    }

    fn insert_banner(&mut self, data: &BannerShortData) -> StoreResult<BannerId> {
        let id = self.next_banner_id;
        self.next_banner_id += 1;
        self.banners.push((id, data.clone()));
        Ok(id)
    }

    fn insert_banners(&mut self, data: &[BannerShortData]) -> StoreResult<Vec<BannerId>> {
        data.iter().map(|d| self.insert_banner(d)).collect()
    }

    fn update_banner(&mut self, banner: &Banner) -> StoreResult<()> {
        let slot = self
            .banners
            .iter_mut()
            .find(|(id, _)| *id == banner.id())
            .ok_or(StoreError::NotFound {
                entity: "banner",
                id: banner.id(),
            })?;
        slot.1 = banner.to_short_data();
        Ok(())
    }

    fn delete_banner(&mut self, id: BannerId) -> StoreResult<()> {
        if !self.banner_exists(id) {
            return Err(StoreError::NotFound {
                entity: "banner",
                id,
            });
        }
        self.banners.retain(|(bid, _)| *bid != id);
        self.showings.retain(|s| s.banner_id != id);
        Ok(())
    }

    fn insert_showing(
        &mut self,
        data: &ShowingShortData,
        banner_id: BannerId,
    ) -> StoreResult<ShowingId> {
        if !self.banner_exists(banner_id) {
            return Err(StoreError::NotFound {
                entity: "banner",
                id: banner_id,
            });
        }
        let id = self.next_showing_id;
        self.next_showing_id += 1;
        self.showings.push(Showing {
            id,
            site_name: data.site_name.clone(),
            datetime: data.datetime,
            banner_id,
        });
        Ok(id)
    }

    fn insert_showings(
        &mut self,
        data: &[ShowingShortData],
        banner_id: BannerId,
    ) -> StoreResult<Vec<ShowingId>> {
        if !self.banner_exists(banner_id) {
            return Err(StoreError::NotFound {
                entity: "banner",
                id: banner_id,
            });
        }
        data.iter()
            .map(|d| self.insert_showing(d, banner_id))
            .collect()
    }

    fn update_showing(&mut self, showing: &Showing) -> StoreResult<()> {
        let slot = self
            .showings
            .iter_mut()
            .find(|s| s.id == showing.id)
            .ok_or(StoreError::NotFound {
                entity: "showing",
                id: showing.id,
            })?;
        slot.site_name = showing.site_name.clone();
        slot.datetime = showing.datetime;
        Ok(())
    }

    fn delete_showing(&mut self, id: ShowingId) -> StoreResult<()> {
        let before = self.showings.len();
        self.showings.retain(|s| s.id != id);
        if self.showings.len() == before {
            return Err(StoreError::NotFound {
                entity: "showing",
                id,
            });
        }
        Ok(())
    }

    fn clear_all(&mut self) -> StoreResult<()> {
        *self = Self::new();
        Ok(())
    }
}
