use serde::Serialize;
use sqlx::Row;

use curbreport_core::config::{AppConfig, LoadOptions};
use curbreport_db::connect;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config_ok: bool,
    database_ok: bool,
    report_count: Option<i64>,
    notes: Vec<String>,
}

pub fn run(json: bool) -> CommandResult {
    let mut report = DoctorReport {
        config_ok: false,
        database_ok: false,
        report_count: None,
        notes: Vec::new(),
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            report.config_ok = true;
            Some(config)
        }
        Err(error) => {
            report.notes.push(format!("config: {error}"));
            None
        }
    };

    if let Some(config) = config {
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(async {
                match connect(&config.database).await {
                    Ok(pool) => {
                        report.database_ok = true;
                        match sqlx::query("SELECT COUNT(*) AS total FROM reports")
                            .fetch_one(&pool)
                            .await
                        {
                            Ok(row) => report.report_count = row.try_get("total").ok(),
                            Err(error) => {
                                report.notes.push(format!(
                                    "reports table not readable (run `curbreport migrate`?): {error}"
                                ));
                            }
                        }
                        pool.close().await;
                    }
                    Err(error) => report.notes.push(format!("database: {error}")),
                }
            }),
            Err(error) => report.notes.push(format!("runtime: {error}")),
        }
    }

    let healthy = report.config_ok && report.database_ok;
    let output = if json {
        serde_json::to_string_pretty(&report)
            .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"))
    } else {
        let mut lines = vec![
            format!("config:   {}", if report.config_ok { "ok" } else { "failed" }),
            format!("database: {}", if report.database_ok { "ok" } else { "failed" }),
        ];
        if let Some(count) = report.report_count {
            lines.push(format!("reports:  {count}"));
        }
        lines.extend(report.notes.iter().map(|note| format!("note:     {note}")));
        lines.join("\n")
    };

    CommandResult { exit_code: if healthy { 0 } else { 1 }, output }
}
