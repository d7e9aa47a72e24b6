use uuid::Uuid;

use curbreport_core::config::DatabaseConfig;
use curbreport_core::domain::Location;
use curbreport_core::recommender::Recommender;
use curbreport_core::store::ReportStore;
use curbreport_core::Report;
use curbreport_db::fixtures::{SeedDataset, SEED_USER_ID};
use curbreport_db::{connect, migrations, SqlReportStore};

// In-memory SQLite is per-connection, so the pool is pinned to one.
async fn seeded_store() -> SqlReportStore {
    let database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        timeout_secs: 5,
    };
    let pool = connect(&database).await.unwrap();
    migrations::run_pending(&pool).await.unwrap();
    SeedDataset::load(&pool).await.unwrap();
    SqlReportStore::new(pool)
}

fn anchor() -> Location {
    let (latitude, longitude) = SeedDataset::ANCHOR;
    Location::new(latitude, longitude).unwrap()
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let store = seeded_store().await;
    SeedDataset::load(store.pool()).await.unwrap();

    let present = SeedDataset::verify(store.pool()).await.unwrap();
    assert_eq!(present, SeedDataset::expected_reports());
}

#[tokio::test]
async fn near_count_and_knn_respect_radii() {
    let store = seeded_store().await;
    let anchor = anchor();

    assert_eq!(store.count_near_reports(&anchor, 50.0).await.unwrap(), 6);

    let nearby = store.k_nearest_reports(&anchor, 100, 300.0).await.unwrap();
    assert_eq!(nearby.len(), 9, "reports beyond 300 m must be excluded, not padded");
    for pair in nearby.windows(2) {
        assert!(pair[0].distance_m <= pair[1].distance_m, "knn must order closest first");
    }
    assert_eq!(nearby[0].violation_type, 2);

    let capped = store.k_nearest_reports(&anchor, 3, 300.0).await.unwrap();
    assert_eq!(capped.len(), 3);
}

#[tokio::test]
async fn frequency_ranking_is_descending_with_stable_ties() {
    let store = seeded_store().await;
    let ranked = store.most_common_violations().await.unwrap();
    assert_eq!(ranked, vec![2, 0, 1, 10, 5]);
}

#[tokio::test]
async fn modal_severities_match_the_dataset() {
    let store = seeded_store().await;
    let modal = store.most_common_severities().await.unwrap();

    assert_eq!(modal[&2], 1);
    assert_eq!(modal[&10], 2);
    assert_eq!(modal[&5], 3);
    assert_eq!(modal[&0], 1);
    assert_eq!(modal[&1], 0);
}

#[tokio::test]
async fn user_history_returns_only_that_users_reports() {
    let store = seeded_store().await;
    let seed_user = Uuid::parse_str(SEED_USER_ID).unwrap();

    let history = store.user_report_history(&seed_user).await.unwrap();
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|report| [2, 10].contains(&report.violation_type)));

    let stranger = Uuid::new_v4();
    assert!(store.user_report_history(&stranger).await.unwrap().is_empty());
}

#[tokio::test]
async fn report_writes_round_trip() {
    let store = seeded_store().await;
    let reporter = Uuid::new_v4();
    let location = Location::new(52.5200, 13.4050).unwrap();

    let report = Report::create(
        Some(reporter),
        7,
        1_630_000_000,
        location,
        2,
        Some("fresh-token".to_string()),
    );
    store.insert_report(&report).await.unwrap();

    let history = store.user_report_history(&reporter).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].violation_type, 7);

    let tokens = store.user_report_image_tokens(&reporter).await.unwrap();
    assert_eq!(tokens, vec!["fresh-token".to_string()]);

    assert_eq!(store.delete_user_reports(&reporter).await.unwrap(), 1);
    assert!(store.user_report_history(&reporter).await.unwrap().is_empty());
}

#[tokio::test]
async fn seed_user_image_tokens_skip_reports_without_one() {
    let store = seeded_store().await;
    let seed_user = Uuid::parse_str(SEED_USER_ID).unwrap();

    let mut tokens = store.user_report_image_tokens(&seed_user).await.unwrap();
    tokens.sort();
    assert_eq!(tokens, vec!["seed-token-01", "seed-token-02", "seed-token-12"]);
}

#[tokio::test]
async fn seeded_recommendations_favor_the_local_morning_pattern() {
    let store = seeded_store().await;
    let recommender = Recommender::new(store);
    let seed_user = Uuid::parse_str(SEED_USER_ID).unwrap();

    // 2021-09-01 08:30 UTC, matching the seed user's morning reports.
    let result = recommender
        .recommendations(&anchor(), Some(seed_user), Some(1_630_485_000))
        .await
        .unwrap();

    assert_eq!(result[0].violation_type, 2);
    assert_eq!(result[0].severity, 1);
    // Every type with a known severity shows up as a candidate.
    assert_eq!(result.len(), 5);

    // Without user context the location and frequency signals still agree.
    let anonymous = recommender.recommendations(&anchor(), None, None).await.unwrap();
    assert_eq!(anonymous[0].violation_type, 2);
}
