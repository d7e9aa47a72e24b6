use curbreport_core::domain::Location;
use curbreport_core::errors::RecommendationError;
use curbreport_core::recommender::Recommender;
use curbreport_db::{connect, SqlReportStore};

use crate::commands::{command_context, CommandResult, StageFailure};
use crate::RecommendArgs;

pub fn run(args: &RecommendArgs) -> CommandResult {
    // Coordinates are validated before anything touches the database.
    let location = match Location::new(args.latitude, args.longitude) {
        Ok(location) => location,
        Err(error) => {
            return CommandResult::failure("recommend", "input_validation", error.to_string(), 2);
        }
    };

    let (config, runtime) = match command_context("recommend") {
        Ok(context) => context,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| StageFailure::new("db_connectivity", error.to_string(), 4))?;

        let recommender =
            Recommender::with_tuning(SqlReportStore::new(pool.clone()), config.recommender);
        let recommendations = recommender
            .recommendations(&location, args.user_id, args.time)
            .await
            .map_err(|error| match error {
                RecommendationError::Domain(_) => {
                    StageFailure::new("input_validation", error.to_string(), 2)
                }
                RecommendationError::Store(_) => {
                    StageFailure::new("store_query", error.to_string(), 5)
                }
            })?;

        pool.close().await;

        serde_json::to_string_pretty(&recommendations)
            .map_err(|error| StageFailure::new("serialization", error.to_string(), 6))
    });

    match result {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(failure) => CommandResult::from_stage("recommend", failure),
    }
}
