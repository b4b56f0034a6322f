mod common;

use banner_campaigns::storage::SqliteStore;
use banner_campaigns::{
    CampaignRegistry, RegistryError, ShowingShortData, SortMode, ValidationError,
};
use common::*;

#[test]
fn mutations_survive_a_reopen() {
    let (db, store) = setup_store();
    let mut reg = CampaignRegistry::open(store).unwrap();
    let late = reg
        .create_banner(banner("Late", date(2024, 2, 1), date(2024, 2, 20), 1, 3))
        .unwrap();
    let early = reg
        .create_banner(banner("Early", date(2024, 1, 1), date(2024, 3, 1), 1, 2))
        .unwrap();
    let sid = reg.create_showing(showing("la.com", at(date(2024, 2, 2), 10, 0)), late).unwrap();
    reg.create_showing(showing("Kva.com", at(date(2024, 1, 2), 11, 0)), early).unwrap();
    reg.update_showing(showing("Ggg.com", at(date(2024, 2, 3), 12, 5)), late, sid).unwrap();
    drop(reg);

    let reopened = CampaignRegistry::open(SqliteStore::open(&db.path).unwrap()).unwrap();
    let names: Vec<_> = reopened.banners().iter().map(|b| b.name()).collect();
    assert_eq!(names, vec!["Early", "Late"]);
    let moved = reopened.showing_short_data(late, sid).unwrap();
    assert_eq!(moved.site_name, "Ggg.com");
    assert_eq!(moved.datetime, at(date(2024, 2, 3), 12, 5));
}

#[test]
fn rejected_showing_touches_neither_snapshot_nor_database() {
    let (db, store) = setup_store();
    let mut reg = CampaignRegistry::open(store).unwrap();
    let id = reg.create_banner(banner("A", date(2024, 1, 1), date(2024, 1, 31), 0, 1)).unwrap();
    reg.create_showing(showing("a.com", at(date(2024, 1, 5), 8, 0)), id).unwrap();

    let full = reg.create_showing(showing("b.com", at(date(2024, 1, 5), 9, 0)), id);
    assert!(matches!(
        full,
        Err(RegistryError::Validation(ValidationError::QuotaExceeded { max: 1, .. }))
    ));
    let outside = reg.create_showing(showing("b.com", at(date(2024, 2, 1), 9, 0)), id);
    assert!(matches!(
        outside,
        Err(RegistryError::Validation(ValidationError::ShowingOutsideWindow { .. }))
    ));

    assert_eq!(reg.banner(id).unwrap().showings().len(), 1);
    let reopened = CampaignRegistry::open(SqliteStore::open(&db.path).unwrap()).unwrap();
    assert_eq!(reopened.banner(id).unwrap().showings().len(), 1);
}

#[test]
fn deleting_a_banner_cascades_and_clears_selection() {
    let (db, store) = setup_store();
    let mut reg = CampaignRegistry::open(store).unwrap();
    let id = reg.create_banner(banner("A", date(2024, 1, 1), date(2024, 1, 31), 1, 5)).unwrap();
    reg.create_showing(showing("a.com", at(date(2024, 1, 5), 8, 0)), id).unwrap();
    reg.select_banner(id).unwrap();
    assert_eq!(reg.selected_showings().len(), 1);

    reg.delete_banner(id).unwrap();
    assert!(reg.selected_banner().is_none());
    assert!(reg.selected_showings().is_empty());

    let reopened = CampaignRegistry::open(SqliteStore::open(&db.path).unwrap()).unwrap();
    assert!(reopened.banners().is_empty());
}

#[test]
fn sort_modes_and_reload_order() {
    let (_db, store) = setup_store();
    let mut reg = CampaignRegistry::open(store).unwrap();
    reg.create_banner(banner("B", date(2024, 1, 5), date(2024, 1, 10), 1, 2)).unwrap();
    reg.create_banner(banner("A", date(2024, 1, 1), date(2024, 1, 20), 1, 2)).unwrap();
    // appended, not re-sorted
    let names: Vec<_> = reg.banners().iter().map(|b| b.name().to_string()).collect();
    assert_eq!(names, vec!["B", "A"]);

    reg.load().unwrap();
    assert_eq!(reg.banners()[0].name(), "A");

    reg.sort(SortMode::ByDateEnd);
    assert_eq!(reg.banners()[0].name(), "B");
    reg.load().unwrap();
    assert_eq!(reg.sort_mode(), SortMode::ByDateEnd);
    assert_eq!(reg.banners()[0].name(), "B");
}

#[test]
fn snapshot_matches_reloaded_showing_times() {
    let (_db, store) = setup_store();
    let mut reg = CampaignRegistry::open(store).unwrap();
    let id = reg.create_banner(banner("A", date(2024, 1, 1), date(2024, 1, 31), 1, 5)).unwrap();

    // struct literal skips the truncating constructor
    let raw = ShowingShortData {
        site_name: "la.com".into(),
        datetime: date(2024, 1, 5).and_hms_opt(10, 0, 42).unwrap(),
    };
    let sid = reg.create_showing(raw, id).unwrap();
    assert_eq!(reg.banners()[0].showings()[0].datetime, at(date(2024, 1, 5), 10, 0));
    let before = reg.banners().to_vec();
    reg.load().unwrap();
    assert_eq!(before, reg.banners());

    let moved = ShowingShortData {
        site_name: "Kva.com".into(),
        datetime: date(2024, 1, 6).and_hms_milli_opt(11, 30, 59, 500).unwrap(),
    };
    reg.update_showing(moved, id, sid).unwrap();
    let before = reg.banners().to_vec();
    reg.load().unwrap();
    assert_eq!(before, reg.banners());
    assert_eq!(reg.banners()[0].showings()[0].datetime, at(date(2024, 1, 6), 11, 30));
}

#[test]
fn capped_quotas_match_after_reload() {
    let (_db, store) = setup_store();
    let mut reg = CampaignRegistry::open(store).unwrap();
    let huge = banner("Huge", date(2024, 1, 1), date(2024, 1, 31), 2_500_000_000, 3_000_000_000);
    reg.create_banner(huge).unwrap();
    let before = reg.banners().to_vec();
    reg.load().unwrap();
    assert_eq!(before, reg.banners());
}
