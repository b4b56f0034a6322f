//! Campaign Registry: the authoritative in-memory banner snapshot.
//!
//! Every mutation follows the same sequence: validate, persist through the
//! [`CampaignStore`], then apply to the snapshot. A validation or storage
//! failure returns before the snapshot is touched, so callers observe either
//! the complete change or none of it.
//!
//! Derived views (promotion index, forecast) are never cached here. Call
//! [`CampaignRegistry::promotion`] / [`CampaignRegistry::forecast`] after a
//! mutation to get a freshly computed one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::forecast::Forecast;
use crate::model::{Banner, BannerId, BannerShortData, Showing, ShowingId, ShowingShortData};
use crate::promotion::PromotionAnalyzer;
use crate::storage::{CampaignStore, StoreError};
use crate::validation::{self, ValidationError};

/// Errors returned by registry operations.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    /// Input rejected by a campaign invariant; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed; the snapshot was left unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No banner with this id in the snapshot.
    #[error("unknown banner {0}")]
    UnknownBanner(BannerId),

    /// The banner has no showing with this id.
    #[error("banner {banner_id} has no showing {showing_id}")]
    UnknownShowing {
        /// Owning banner.
        banner_id: BannerId,
        /// Requested showing.
        showing_id: ShowingId,
    },
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Ordering of the banner snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Ascending `date_start`.
    #[default]
    ByDateStart,
    /// Ascending `date_end`.
    ByDateEnd,
}

/// In-memory banner list plus the store it mirrors.
pub struct CampaignRegistry<S: CampaignStore> {
    store: S,
    banners: Vec<Banner>,
    sort_mode: SortMode,
    selected: Option<BannerId>,
}

fn rejected<T>(op: &'static str, result: Result<T, ValidationError>) -> RegistryResult<T> {
    result.map_err(|e| {
        tracing::warn!(op, error = %e, "validation rejected");
        RegistryError::from(e)
    })
}

impl<S: CampaignStore> CampaignRegistry<S> {
    /// Empty snapshot over `store`. Call [`Self::load`] to populate it.
    pub fn new(store: S) -> Self {
        Self {
            store,
            banners: Vec::new(),
            sort_mode: SortMode::default(),
            selected: None,
        }
    }

    /// Build a registry and load the snapshot in one go.
    pub fn open(store: S) -> RegistryResult<Self> {
        let mut registry = Self::new(store);
        registry.load()?;
        Ok(registry)
    }

    /// Replace the snapshot with everything in storage, ordered by the current sort mode.
    pub fn load(&mut self) -> RegistryResult<()> {
        self.banners = self.store.load_all_banners()?;
        self.resort();
        if self.selected.is_some_and(|id| self.banner(id).is_none()) {
            self.selected = None;
        }
        tracing::info!(banners = self.banners.len(), "registry loaded");
        Ok(())
    }

    /// Current snapshot, in sort order.
    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    /// Banner by id.
    pub fn banner(&self, id: BannerId) -> Option<&Banner> {
        self.banners.iter().find(|b| b.id() == id)
    }

    /// Active sort mode.
    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable store access for bulk maintenance (e.g. seeding).
    ///
    /// Writes made here bypass the snapshot; call [`Self::load`] afterwards.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn position(&self, id: BannerId) -> RegistryResult<usize> {
        self.banners
            .iter()
            .position(|b| b.id() == id)
            .ok_or(RegistryError::UnknownBanner(id))
    }

    fn validate_banner(op: &'static str, data: &BannerShortData) -> RegistryResult<()> {
        rejected(
            op,
            validation::validate_banner_window(data.date_start(), data.date_end()).and_then(|_| {
                validation::validate_quota_order(data.min_showings(), data.max_showings())
            }),
        )
    }

    /// Validate, persist, and append a banner with no showings.
    pub fn create_banner(&mut self, data: BannerShortData) -> RegistryResult<BannerId> {
        Self::validate_banner("create_banner", &data)?;
        let id = self.store.insert_banner(&data)?;
        tracing::info!(banner_id = id, name = data.name(), "banner created");
        self.banners.push(Banner::new(id, data, Vec::new()));
        Ok(id)
    }

    /// Replace a banner's scalar fields; its showings are preserved.
    pub fn update_banner(
        &mut self,
        data: BannerShortData,
        target_id: BannerId,
    ) -> RegistryResult<()> {
        let idx = self.position(target_id)?;
        Self::validate_banner("update_banner", &data)?;
        let updated = self.banners[idx].with_data(data);
        self.store.update_banner(&updated)?;
        self.banners[idx] = updated;
        tracing::info!(banner_id = target_id, "banner updated");
        Ok(())
    }

    /// Delete a banner and (in storage) all of its showings.
    pub fn delete_banner(&mut self, id: BannerId) -> RegistryResult<()> {
        let idx = self.position(id)?;
        self.store.delete_banner(id)?;
        let removed = self.banners.remove(idx);
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::info!(banner_id = id, showings = removed.showings().len(), "banner deleted");
        Ok(())
    }

    /// Record a showing after checking the banner window and the day's capacity.
    pub fn create_showing(
        &mut self,
        data: ShowingShortData,
        banner_id: BannerId,
    ) -> RegistryResult<ShowingId> {
        // snapshot and store must agree on minute precision
        let data = ShowingShortData::new(data.site_name, data.datetime);
        let idx = self.position(banner_id)?;
        rejected(
            "create_showing",
            validation::validate_showing(data.date(), &self.banners[idx]),
        )?;
        let id = self.store.insert_showing(&data, banner_id)?;
        self.banners[idx].push_showing(Showing {
            id,
            site_name: data.site_name,
            datetime: data.datetime,
            banner_id,
        });
        tracing::info!(banner_id, showing_id = id, "showing created");
        Ok(id)
    }

    /// Replace a showing in place.
    ///
    /// Capacity is checked against the banner's current showings, the one
    /// being replaced included. Moving a showing within a day that is already
    /// at `max_showings` is therefore rejected.
    pub fn update_showing(
        &mut self,
        data: ShowingShortData,
        banner_id: BannerId,
        showing_id: ShowingId,
    ) -> RegistryResult<()> {
        let data = ShowingShortData::new(data.site_name, data.datetime);
        let idx = self.position(banner_id)?;
        let pos = self.banners[idx]
            .showing_position(showing_id)
            .ok_or(RegistryError::UnknownShowing {
                banner_id,
                showing_id,
            })?;
        rejected(
            "update_showing",
            validation::validate_showing(data.date(), &self.banners[idx]),
        )?;
        let showing = Showing {
            id: showing_id,
            site_name: data.site_name,
            datetime: data.datetime,
            banner_id,
        };
        self.store.update_showing(&showing)?;
        self.banners[idx].replace_showing(pos, showing);
        tracing::info!(banner_id, showing_id, "showing updated");
        Ok(())
    }

    /// Delete one showing.
    pub fn delete_showing(
        &mut self,
        banner_id: BannerId,
        showing_id: ShowingId,
    ) -> RegistryResult<()> {
        let idx = self.position(banner_id)?;
        let pos = self.banners[idx]
            .showing_position(showing_id)
            .ok_or(RegistryError::UnknownShowing {
                banner_id,
                showing_id,
            })?;
        self.store.delete_showing(showing_id)?;
        self.banners[idx].remove_showing(pos);
        tracing::info!(banner_id, showing_id, "showing deleted");
        Ok(())
    }

    /// Reorder the snapshot. No-op when `mode` is already active.
    pub fn sort(&mut self, mode: SortMode) {
        if self.sort_mode == mode {
            return;
        }
        self.sort_mode = mode;
        self.resort();
    }

    fn resort(&mut self) {
        match self.sort_mode {
            SortMode::ByDateStart => self.banners.sort_by_key(|b| b.date_start()),
            SortMode::ByDateEnd => self.banners.sort_by_key(|b| b.date_end()),
        }
    }

    // ---- selection (edit form state) ----

    /// Mark a banner as selected and return its editable fields.
    pub fn select_banner(&mut self, id: BannerId) -> RegistryResult<BannerShortData> {
        let idx = self.position(id)?;
        self.selected = Some(id);
        Ok(self.banners[idx].to_short_data())
    }

    /// Forget the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected banner, if any.
    pub fn selected_banner(&self) -> Option<&Banner> {
        self.selected.and_then(|id| self.banner(id))
    }

    /// Showings of the selected banner (empty when nothing is selected).
    pub fn selected_showings(&self) -> &[Showing] {
        self.selected_banner().map(Banner::showings).unwrap_or(&[])
    }

    /// Editable fields of one showing.
    pub fn showing_short_data(
        &self,
        banner_id: BannerId,
        showing_id: ShowingId,
    ) -> Option<ShowingShortData> {
        self.banner(banner_id)?
            .showings()
            .iter()
            .find(|s| s.id == showing_id)
            .map(Showing::to_short_data)
    }

    // ---- derived views ----

    /// Promotion analysis over the current snapshot.
    pub fn promotion(&self, today: NaiveDate) -> PromotionAnalyzer<'_> {
        PromotionAnalyzer::new(&self.banners, today)
    }

    /// Showing forecast over the current snapshot.
    pub fn forecast(&self, today: NaiveDate) -> Forecast {
        Forecast::build(&self.banners, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreResult};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn noon(date: NaiveDate) -> chrono::NaiveDateTime {
        date.and_hms_opt(12, 0, 0).unwrap()
    }

    fn short(name: &str, start: NaiveDate, end: NaiveDate, min: i64, max: i64) -> BannerShortData {
        BannerShortData::new(name, "Acme", start, end, min, max).unwrap()
    }

    fn registry() -> CampaignRegistry<MemoryStore> {
        CampaignRegistry::open(MemoryStore::new()).unwrap()
    }

    #[test]
    fn create_update_delete_banner_roundtrip() {
        let mut reg = registry();
        let id = reg.create_banner(short("A", d(1, 1), d(1, 31), 1, 3)).unwrap();
        reg.create_showing(ShowingShortData::new("x.com", noon(d(1, 5))), id).unwrap();

        reg.update_banner(short("A2", d(1, 1), d(2, 29), 2, 4), id).unwrap();
        let b = reg.banner(id).unwrap();
        assert_eq!(b.name(), "A2");
        assert_eq!(b.date_end(), d(2, 29));
        assert_eq!(b.showings().len(), 1);

        // the store agrees with the snapshot
        reg.load().unwrap();
        assert_eq!(reg.banner(id).unwrap().name(), "A2");
        assert_eq!(reg.banner(id).unwrap().showings().len(), 1);

        reg.delete_banner(id).unwrap();
        assert!(reg.banners().is_empty());
        assert_eq!(reg.store().showing_count(), 0);
        assert!(matches!(reg.delete_banner(id), Err(RegistryError::UnknownBanner(_))));
    }

    #[test]
    fn quota_exceeded_and_outside_window_leave_state_untouched() {
        let mut reg = registry();
        let id = reg.create_banner(short("A", d(1, 1), d(1, 31), 0, 2)).unwrap();
        for h in [9, 10] {
            let at = d(1, 5).and_hms_opt(h, 0, 0).unwrap();
            reg.create_showing(ShowingShortData::new("x.com", at), id).unwrap();
        }

        let err = reg
            .create_showing(ShowingShortData::new("x.com", noon(d(1, 5))), id)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::QuotaExceeded { max: 2, .. })
        ));

        let err = reg
            .create_showing(ShowingShortData::new("x.com", noon(d(2, 1))), id)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::ShowingOutsideWindow { .. })
        ));

        assert_eq!(reg.banner(id).unwrap().showings().len(), 2);
        assert_eq!(reg.store().showing_count(), 2);
    }

    #[test]
    fn update_showing_counts_the_replaced_showing() {
        let mut reg = registry();
        let id = reg.create_banner(short("A", d(1, 1), d(1, 31), 0, 1)).unwrap();
        let sid = reg
            .create_showing(ShowingShortData::new("x.com", noon(d(1, 5))), id)
            .unwrap();

        // same day, different site: the old occurrence still fills the quota
        let err = reg
            .update_showing(ShowingShortData::new("y.com", noon(d(1, 5))), id, sid)
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::QuotaExceeded { .. })
        ));

        // moving it to an empty day succeeds
        reg.update_showing(ShowingShortData::new("y.com", noon(d(1, 6))), id, sid)
            .unwrap();
        let s = &reg.banner(id).unwrap().showings()[0];
        assert_eq!((s.id, s.site_name.as_str(), s.date()), (sid, "y.com", d(1, 6)));

        assert!(matches!(
            reg.update_showing(ShowingShortData::new("y.com", noon(d(1, 7))), id, 999),
            Err(RegistryError::UnknownShowing { showing_id: 999, .. })
        ));
    }

    #[test]
    fn delete_showing_removes_from_both_sides() {
        let mut reg = registry();
        let id = reg.create_banner(short("A", d(1, 1), d(1, 31), 0, 5)).unwrap();
        let s1 = reg.create_showing(ShowingShortData::new("a", noon(d(1, 2))), id).unwrap();
        let s2 = reg.create_showing(ShowingShortData::new("b", noon(d(1, 3))), id).unwrap();
        reg.delete_showing(id, s1).unwrap();
        let ids: Vec<_> = reg.banner(id).unwrap().showings().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![s2]);
        assert_eq!(reg.store().showing_count(), 1);
    }

    #[test]
    fn sort_modes_are_stable_and_idempotent() {
        let mut reg = registry();
        let late_start = reg.create_banner(short("L", d(3, 1), d(3, 10), 0, 1)).unwrap();
        let early = reg.create_banner(short("E", d(1, 1), d(6, 1), 0, 1)).unwrap();
        let mid = reg.create_banner(short("M", d(2, 1), d(2, 2), 0, 1)).unwrap();

        // appends keep insertion order until a re-sort
        let order = |r: &CampaignRegistry<MemoryStore>| {
            r.banners().iter().map(Banner::id).collect::<Vec<_>>()
        };
        assert_eq!(order(&reg), vec![late_start, early, mid]);

        // same mode: no-op
        reg.sort(SortMode::ByDateStart);
        assert_eq!(order(&reg), vec![late_start, early, mid]);

        reg.sort(SortMode::ByDateEnd);
        assert_eq!(order(&reg), vec![mid, late_start, early]);

        reg.sort(SortMode::ByDateStart);
        assert_eq!(order(&reg), vec![early, mid, late_start]);
    }

    #[test]
    fn selection_tracks_the_snapshot() {
        let mut reg = registry();
        let id = reg.create_banner(short("A", d(1, 1), d(1, 31), 0, 5)).unwrap();
        assert!(reg.selected_showings().is_empty());

        let data = reg.select_banner(id).unwrap();
        assert_eq!(data.name(), "A");
        let sid = reg.create_showing(ShowingShortData::new("a", noon(d(1, 2))), id).unwrap();
        assert_eq!(reg.selected_showings().len(), 1);
        assert_eq!(
            reg.showing_short_data(id, sid),
            Some(ShowingShortData::new("a", noon(d(1, 2))))
        );

        reg.delete_banner(id).unwrap();
        assert!(reg.selected_banner().is_none());
    }

    /// Store whose writes always fail, to prove the snapshot is not touched.
    struct BrokenStore(MemoryStore);

    fn broken() -> StoreError {
        StoreError::Migration("disk on fire".into())
    }

    impl CampaignStore for BrokenStore {
        fn load_all_banners(&mut self) -> StoreResult<Vec<Banner>> {
            self.0.load_all_banners()
        }
        fn insert_banner(&mut self, _: &BannerShortData) -> StoreResult<BannerId> {
            Err(broken())
        }
        fn insert_banners(&mut self, _: &[BannerShortData]) -> StoreResult<Vec<BannerId>> {
            Err(broken())
        }
        fn update_banner(&mut self, _: &Banner) -> StoreResult<()> {
            Err(broken())
        }
        fn delete_banner(&mut self, _: BannerId) -> StoreResult<()> {
            Err(broken())
        }
        fn insert_showing(&mut self, _: &ShowingShortData, _: BannerId) -> StoreResult<ShowingId> {
            Err(broken())
        }
        fn insert_showings(
            &mut self,
            _: &[ShowingShortData],
            _: BannerId,
        ) -> StoreResult<Vec<ShowingId>> {
            Err(broken())
        }
        fn update_showing(&mut self, _: &Showing) -> StoreResult<()> {
            Err(broken())
        }
        fn delete_showing(&mut self, _: ShowingId) -> StoreResult<()> {
            Err(broken())
        }
        fn clear_all(&mut self) -> StoreResult<()> {
            Err(broken())
        }
    }

    #[test]
    fn store_failures_do_not_reach_the_snapshot() {
        let mut seeded = MemoryStore::new();
        let id = seeded.insert_banner(&short("A", d(1, 1), d(1, 31), 0, 5)).unwrap();
        let mut reg = CampaignRegistry::open(BrokenStore(seeded)).unwrap();
        let before = reg.banners().to_vec();

        assert!(matches!(
            reg.create_banner(short("B", d(1, 1), d(1, 2), 0, 1)),
            Err(RegistryError::Store(_))
        ));
        assert!(reg.update_banner(short("A2", d(1, 1), d(1, 31), 0, 5), id).is_err());
        assert!(reg.delete_banner(id).is_err());
        assert!(reg.create_showing(ShowingShortData::new("a", noon(d(1, 2))), id).is_err());

        assert_eq!(reg.banners(), before.as_slice());
    }
}
