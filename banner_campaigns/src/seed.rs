//! Demo data for trying the tool out on an empty database.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::dates::days_inclusive;
use crate::model::{BannerShortData, ShowingShortData};
use crate::registry::RegistryResult;
use crate::storage::CampaignStore;
use crate::validation::ValidationError;

/// Sites the demo showings are spread over.
pub const DEMO_SITES: [&str; 9] = [
    "Cucumber.com",
    "WeeeWeee.com",
    "Ooooo.com",
    "qwerty.com",
    "Kva.com",
    "la.com",
    "Ggg.com",
    "Jojo.com",
    "Robot.com",
];

/// Default generator seed used by the CLI.
pub const DEFAULT_SEED: u64 = 0x0BA7_7E12;

// (start offset, end offset, min, max) relative to today
const DEMO_PLAN: [(i64, i64, i64, i64); 6] = [
    (-15, 12, 5, 30),
    (-18, 14, 10, 25),
    (-8, 5, 10, 30),
    (-13, 3, 5, 25),
    (-7, 7, 15, 30),
    (1, 15, 10, 20),
];

/// What a seeding run wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Banners inserted.
    pub banners: usize,
    /// Showings inserted across all banners.
    pub showings: usize,
}

/// Six demo banners placed around `today`.
pub fn demo_banners(today: NaiveDate) -> Result<Vec<BannerShortData>, ValidationError> {
    DEMO_PLAN
        .iter()
        .enumerate()
        .map(|(i, &(from, to, min, max))| {
            BannerShortData::new(
                format!("Banner {}", i + 1),
                format!("Company {}", i + 1),
                today + Duration::days(from),
                today + Duration::days(to),
                min,
                max,
            )
        })
        .collect()
}

/// Showings for every past day of `banner`: between 1 and `max_showings`
/// per day, at random sites within the first hours of the day.
pub fn demo_showings(
    banner: &BannerShortData,
    today: NaiveDate,
    rng: &mut StdRng,
) -> Vec<ShowingShortData> {
    let mut out = Vec::new();
    let Some(yesterday) = today.pred_opt() else {
        return out;
    };
    if banner.max_showings() == 0 {
        return out;
    }
    for date in days_inclusive(banner.date_start(), yesterday) {
        let per_day = rng.random_range(1..=banner.max_showings());
        for _ in 0..per_day {
            let site = DEMO_SITES[rng.random_range(0..DEMO_SITES.len())];
            // storage keeps minute precision
            let minutes = rng.random_range(0..=15_000i64) / 60;
            let datetime = date.and_time(NaiveTime::MIN) + Duration::minutes(minutes);
            out.push(ShowingShortData::new(site, datetime));
        }
    }
    out
}

/// Replace the store contents with demo data. The same seed and date always
/// produce the same data.
pub fn seed_store<S: CampaignStore + ?Sized>(
    store: &mut S,
    today: NaiveDate,
    seed: u64,
) -> RegistryResult<SeedReport> {
    let banners = demo_banners(today)?;
    let mut rng = StdRng::seed_from_u64(seed);

    store.clear_all()?;
    let ids = store.insert_banners(&banners)?;
    let mut showings = 0;
    for (banner, id) in banners.iter().zip(ids) {
        let batch = demo_showings(banner, today, &mut rng);
        showings += store.insert_showings(&batch, id)?.len();
    }

    let report = SeedReport {
        banners: banners.len(),
        showings,
    };
    tracing::info!(
        banners = report.banners,
        showings = report.showings,
        %today,
        "demo data seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::validation::validate_showing;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn demo_banners_follow_the_plan() {
        let banners = demo_banners(today()).unwrap();
        assert_eq!(banners.len(), 6);
        assert_eq!(banners[0].name(), "Banner 1");
        assert_eq!(banners[0].date_start(), NaiveDate::from_ymd_opt(2024, 5, 31).unwrap());
        assert_eq!(banners[5].company_name(), "Company 6");
        assert_eq!((banners[4].min_showings(), banners[4].max_showings()), (15, 30));
    }

    #[test]
    fn seeding_is_deterministic_and_valid() {
        let mut a = MemoryStore::new();
        let mut b = MemoryStore::new();
        let ra = seed_store(&mut a, today(), 7).unwrap();
        let rb = seed_store(&mut b, today(), 7).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(ra.banners, 6);

        let loaded = a.load_all_banners().unwrap();
        assert_eq!(loaded, b.load_all_banners().unwrap());
        assert_eq!(loaded.iter().map(|x| x.showings().len()).sum::<usize>(), ra.showings);

        for banner in &loaded {
            for s in banner.showings() {
                assert!(s.date() < today());
                assert!(s.date() >= banner.date_start());
                assert!(DEMO_SITES.contains(&s.site_name.as_str()));
            }
            for date in days_inclusive(banner.date_start(), today() - Duration::days(1)) {
                let n = banner.count_showings_on(date);
                assert!(n >= 1 && n <= banner.max_showings() as usize);
            }
        }
        // starts tomorrow
        assert!(loaded[5].showings().is_empty());
        // a later showing for today still fits
        assert!(validate_showing(today(), &loaded[0]).is_ok());
    }

    #[test]
    fn reseeding_replaces_previous_data() {
        let mut store = MemoryStore::new();
        seed_store(&mut store, today(), 1).unwrap();
        seed_store(&mut store, today(), 2).unwrap();
        let loaded = store.load_all_banners().unwrap();
        assert_eq!(loaded.len(), 6);
        assert_eq!(loaded[0].id(), 1);
    }
}
