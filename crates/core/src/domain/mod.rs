pub mod location;
pub mod report;

pub use location::Location;
pub use report::{
    NearbyReport, Recommendation, Report, SeverityType, UserReport, ViolationType,
};
