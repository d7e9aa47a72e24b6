pub mod config;
pub mod domain;
pub mod errors;
pub mod recommender;
pub mod store;

pub use config::{AppConfig, ConfigError, LoadOptions};
pub use domain::{Location, NearbyReport, Recommendation, Report, UserReport};
pub use domain::{SeverityType, ViolationType};
pub use errors::{DomainError, RecommendationError, StoreError};
pub use recommender::{Recommender, Tuning};
pub use store::ReportStore;
