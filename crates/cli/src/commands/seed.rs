use curbreport_db::{connect, migrations, SeedDataset};

use crate::commands::{command_context, CommandResult, StageFailure};

pub fn run() -> CommandResult {
    let (config, runtime) = match command_context("seed") {
        Ok(context) => context,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| StageFailure::new("db_connectivity", error.to_string(), 4))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| StageFailure::new("migration", error.to_string(), 5))?;

        let seeded = SeedDataset::load(&pool)
            .await
            .map_err(|error| StageFailure::new("seed_execution", error.to_string(), 5))?;

        let present = SeedDataset::verify(&pool)
            .await
            .map_err(|error| StageFailure::new("seed_verification", error.to_string(), 6))?;

        pool.close().await;

        if present != SeedDataset::expected_reports() {
            return Err(StageFailure::new(
                "seed_verification",
                format!(
                    "expected {} seed reports, found {present}",
                    SeedDataset::expected_reports()
                ),
                6,
            ));
        }

        Ok(seeded.reports_seeded)
    });

    match result {
        Ok(reports_seeded) => {
            CommandResult::success("seed", format!("seeded {reports_seeded} demo reports"))
        }
        Err(failure) => CommandResult::from_stage("seed", failure),
    }
}
