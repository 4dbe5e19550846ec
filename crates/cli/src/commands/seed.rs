use crate::commands::CommandResult;
use hrflow_core::config::{AppConfig, LoadOptions};
use hrflow_db::{connect_with_settings, migrations, seed_demo_data, SeedResult};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seeded = seed_demo_data(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<SeedResult, (&'static str, String, u8)>(seeded)
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", render_summary(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn render_summary(seeded: &SeedResult) -> String {
    format!(
        "demo dataset loaded: tenants={} employees={} requests={} decision_seats={}",
        seeded.tenants, seeded.employees, seeded.requests, seeded.decisions
    )
}

#[cfg(test)]
mod tests {
    use super::render_summary;
    use hrflow_db::SeedResult;

    #[test]
    fn summary_reports_every_entity_count() {
        let summary =
            render_summary(&SeedResult { tenants: 1, employees: 4, requests: 1, decisions: 3 });
        assert_eq!(
            summary,
            "demo dataset loaded: tenants=1 employees=4 requests=1 decision_seats=3"
        );
    }
}
