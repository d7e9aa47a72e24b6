pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod store;

pub use connection::{connect, DbPool};
pub use fixtures::{SeedDataset, SeedResult};
pub use store::{InMemoryReportStore, SqlReportStore};
