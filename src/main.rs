//! Batch runner: evaluates every configured tank from its feed export and
//! prints one JSON report per tank. With `TANKMON_EXPORT_DIR` set, each
//! tank's CSV export is also written there.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use tankmon_service::alert::staleness;
use tankmon_service::config::MonitorConfig;
use tankmon_service::export;
use tankmon_service::ingest::feed::parse_feed_csv;
use tankmon_service::logging::{self, LogLevel, Stage};
use tankmon_service::pipeline::{TankFeed, evaluate_fleet};
use tankmon_service::tanks::TankRegistry;

fn load_feeds(registry: &TankRegistry, config: &MonitorConfig) -> (Vec<TankFeed>, usize) {
    let offset = config.pipeline.feed_offset();
    let mut feeds = Vec::new();
    let mut failed = 0;

    for tank in registry.tanks() {
        let Some(path) = registry.feed_path(tank.id()) else {
            logging::warn(Stage::Ingest, Some(tank.id()), "no feed_path configured, skipping");
            failed += 1;
            continue;
        };
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| parse_feed_csv(&text, offset).map_err(|e| e.to_string()));
        match parsed {
            Ok(feed) => {
                if feed.skipped_rows > 0 {
                    logging::warn(
                        Stage::Ingest,
                        Some(tank.id()),
                        &format!("{} row(s) with unreadable timestamps skipped", feed.skipped_rows),
                    );
                }
                feeds.push(TankFeed {
                    tank: tank.clone(),
                    readings: feed.readings,
                });
            }
            Err(e) => {
                logging::error(
                    Stage::Ingest,
                    Some(tank.id()),
                    &format!("reading {} failed: {}", path.display(), e),
                );
                failed += 1;
            }
        }
    }

    (feeds, failed)
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = MonitorConfig::load()?;
    let registry = TankRegistry::from_config(&config)?;
    logging::info(
        Stage::Config,
        None,
        &format!(
            "Monitoring {} tank(s) [{}], {:.0} L total capacity",
            registry.len(),
            registry.ids().join(", "),
            registry.total_capacity_liters()
        ),
    );
    let export_dir = std::env::var_os("TANKMON_EXPORT_DIR").map(PathBuf::from);

    let (feeds, failed) = load_feeds(&registry, &config);
    let reports = evaluate_fleet(&feeds, &config.pipeline);

    for report in &reports {
        if staleness::is_stale(report.last_reading_at, config.pipeline.stale_after_minutes) {
            logging::warn(
                Stage::Ingest,
                Some(&report.tank_id),
                &format!(
                    "feed is stale (no reading in the last {} minutes)",
                    config.pipeline.stale_after_minutes
                ),
            );
        }
        if let Some(dir) = &export_dir {
            match export::write_csv(report, dir) {
                Ok(path) => logging::info(
                    Stage::System,
                    Some(&report.tank_id),
                    &format!("CSV written to {}", path.display()),
                ),
                Err(e) => logging::error(
                    Stage::System,
                    Some(&report.tank_id),
                    &format!("CSV export to {} failed: {}", dir.display(), e),
                ),
            }
        }
        println!("{}", export::to_json(report)?);
    }

    logging::log_run_summary(registry.len(), reports.len(), failed);
    Ok(())
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let json_logs = std::env::var("TANKMON_LOG_JSON").is_ok_and(|v| v == "1");
    logging::init_logger(LogLevel::Info, json_logs);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Stage::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}
