use uuid::Uuid;

use curbreport_core::domain::Location;
use curbreport_core::recommender::Recommender;
use curbreport_core::{Recommendation, Report};
use curbreport_db::InMemoryReportStore;

fn location(latitude: f64, longitude: f64) -> Location {
    Location::new(latitude, longitude).unwrap()
}

// Two type-4 reports sit within meters of the query point; the reporter's
// only prior report is a type 8, filed kilometers away but at the same time
// of day as the query.
fn dataset(reporter: Uuid) -> Vec<Report> {
    vec![
        Report::create(None, 4, 1_625_000_000, location(52.512900, 13.326800), 2, None),
        Report::create(None, 4, 1_625_100_000, location(52.513000, 13.326900), 2, None),
        Report::create(Some(reporter), 8, 1_622_536_200, location(52.520000, 13.405000), 1, None),
    ]
}

#[tokio::test]
async fn engine_ranks_over_the_in_memory_store() {
    let reporter = Uuid::new_v4();
    let recommender = Recommender::new(InMemoryReportStore::with_reports(dataset(reporter)));
    let query = location(52.512852, 13.326802);

    // 2021-09-01 08:30 UTC, the reporter's usual time of day.
    let result = recommender
        .recommendations(&query, Some(reporter), Some(1_630_485_000))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    // Proximity puts type 4 on top despite the reporter's type-8 history.
    assert_eq!(result[0].violation_type, 4);
    assert_eq!(result[0].severity, 2);
    assert_eq!(result[1].violation_type, 8);
    assert_eq!(result[1].severity, 1);
}

#[tokio::test]
async fn user_history_lifts_the_users_type_when_context_is_given() {
    let reporter = Uuid::new_v4();
    let recommender = Recommender::new(InMemoryReportStore::with_reports(dataset(reporter)));
    let query = location(52.512852, 13.326802);

    let anonymous = recommender.recommendations(&query, None, None).await.unwrap();
    let with_history = recommender
        .recommendations(&query, Some(reporter), Some(1_630_485_000))
        .await
        .unwrap();

    let type_eight_score = |rows: &[Recommendation]| {
        rows.iter().find(|row| row.violation_type == 8).map(|row| row.score)
    };
    assert!(type_eight_score(&with_history).unwrap() > type_eight_score(&anonymous).unwrap());
}
