use curbreport_db::{connect, migrations};

use crate::commands::{command_context, CommandResult, StageFailure};

pub fn run() -> CommandResult {
    let (config, runtime) = match command_context("migrate") {
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
        pool.close().await;
        Ok::<(), StageFailure>(())
    });

    match result {
        Ok(()) => {
            let embedded = migrations::MIGRATOR.iter().len();
            let version = migrations::MIGRATOR
                .iter()
                .map(|migration| migration.version)
                .max()
                .unwrap_or(0);
            CommandResult::success(
                "migrate",
                format!("schema current at version {version} ({embedded} embedded migrations)"),
            )
        }
        Err(failure) => CommandResult::from_stage("migrate", failure),
    }
}
