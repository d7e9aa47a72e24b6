//! Deterministic demo dataset for local runs and integration tests.
//!
//! The reports cluster around a reference point in Berlin so that a
//! recommendation request at [`SeedDataset::ANCHOR`] exercises all three
//! scoring passes with predictable output.

use sqlx::Row;

use curbreport_core::errors::StoreError;

use crate::DbPool;

/// User who filed the seeded history reports; recommendation requests with
/// this id get a user-history signal.
pub const SEED_USER_ID: &str = "9b2e7a51-33b4-4d8e-8f5a-6f1f1d2c9a77";

struct SeedReport {
    id: &'static str,
    user: Option<&'static str>,
    violation_type: u32,
    time: i64,
    latitude: f64,
    longitude: f64,
    severity: u32,
    image_token: Option<&'static str>,
}

// Times are Unix seconds; the seed user's reports share a morning
// time-of-day so temporal scoring favors type 2 for morning requests.
const SEED_REPORTS: &[SeedReport] = &[
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e01",
        user: Some(SEED_USER_ID),
        violation_type: 2,
        time: 1_622_536_200, // 2021-06-01 08:30 UTC
        latitude: 52.512900,
        longitude: 13.326850,
        severity: 1,
        image_token: Some("seed-token-01"),
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e02",
        user: Some(SEED_USER_ID),
        violation_type: 2,
        time: 1_623_141_900, // 2021-06-08 08:45 UTC
        latitude: 52.513100,
        longitude: 13.327000,
        severity: 1,
        image_token: Some("seed-token-02"),
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e03",
        user: Some(SEED_USER_ID),
        violation_type: 10,
        time: 1_623_776_400, // 2021-06-15 17:00 UTC
        latitude: 52.512500,
        longitude: 13.326500,
        severity: 2,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e04",
        user: None,
        violation_type: 2,
        time: 1_624_262_400, // 2021-06-21 08:00 UTC
        latitude: 52.512700,
        longitude: 13.326700,
        severity: 1,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e05",
        user: None,
        violation_type: 2,
        time: 1_624_870_800, // 2021-06-28 09:00 UTC
        latitude: 52.513000,
        longitude: 13.327100,
        severity: 0,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e06",
        user: None,
        violation_type: 1,
        time: 1_625_511_600, // 2021-07-05 19:00 UTC
        latitude: 52.513400,
        longitude: 13.327400,
        severity: 0,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e07",
        user: None,
        violation_type: 1,
        time: 1_626_116_400, // 2021-07-12 19:00 UTC
        latitude: 52.514000,
        longitude: 13.328000,
        severity: 0,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e08",
        user: None,
        violation_type: 0,
        time: 1_626_721_200, // 2021-07-19 19:00 UTC
        latitude: 52.511800,
        longitude: 13.325900,
        severity: 1,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e09",
        user: None,
        violation_type: 0,
        time: 1_627_326_000, // 2021-07-26 19:00 UTC
        latitude: 52.516000,
        longitude: 13.330000,
        severity: 1,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e10",
        user: None,
        violation_type: 10,
        time: 1_627_930_800, // 2021-08-02 19:00 UTC
        latitude: 52.510000,
        longitude: 13.324000,
        severity: 2,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e11",
        user: None,
        violation_type: 5,
        time: 1_628_535_600, // 2021-08-09 19:00 UTC
        latitude: 52.520000,
        longitude: 13.335000,
        severity: 3,
        image_token: None,
    },
    SeedReport {
        id: "1d4c2a9e-0b7f-4e2a-9c1d-3f5a8b6c0e12",
        user: Some(SEED_USER_ID),
        violation_type: 2,
        time: 1_629_098_100, // 2021-08-16 07:15 UTC
        latitude: 52.512950,
        longitude: 13.326900,
        severity: 1,
        image_token: Some("seed-token-12"),
    },
];

#[derive(Debug, Clone, Copy)]
pub struct SeedResult {
    pub reports_seeded: u64,
}

pub struct SeedDataset;

impl SeedDataset {
    /// Reference point the dataset clusters around (Berlin, Ernst-Reuter-
    /// Platz area).
    pub const ANCHOR: (f64, f64) = (52.512852, 13.326802);

    /// Upserts the seed reports. Safe to run repeatedly; rows are keyed by
    /// fixed ids.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, StoreError> {
        for seed in SEED_REPORTS {
            sqlx::query(
                "INSERT OR REPLACE INTO reports
                    (id, user_id, violation_type, time, latitude, longitude, severity, image_token)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(seed.id)
            .bind(seed.user)
            .bind(i64::from(seed.violation_type))
            .bind(seed.time)
            .bind(seed.latitude)
            .bind(seed.longitude)
            .bind(i64::from(seed.severity))
            .bind(seed.image_token)
            .execute(pool)
            .await
            .map_err(|error| StoreError::Query(error.to_string()))?;
        }

        Ok(SeedResult { reports_seeded: SEED_REPORTS.len() as u64 })
    }

    /// Number of seed rows currently present.
    pub async fn verify(pool: &DbPool) -> Result<u64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS present FROM reports WHERE id LIKE '1d4c2a9e-0b7f-4e2a-9c1d-%'",
        )
        .fetch_one(pool)
        .await
        .map_err(|error| StoreError::Query(error.to_string()))?;

        let present: i64 = row.try_get("present").map_err(|error| {
            StoreError::Query(error.to_string())
        })?;
        Ok(present as u64)
    }

    pub fn expected_reports() -> u64 {
        SEED_REPORTS.len() as u64
    }
}
