use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_catalog::config::CatalogConfig;
use course_catalog::media::FfprobeProbe;
use course_catalog::services::CatalogService;
use course_catalog::{db, Result};

fn main() -> ExitCode {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "course_catalog=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  match run() {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      tracing::error!("Scan failed: {}", e);
      ExitCode::FAILURE
    }
  }
}

/// One-shot scan of the configured courses root.
fn run() -> Result<()> {
  let config = CatalogConfig::load()?;
  let pool = db::init_db(&config.database_path)?;

  let service = CatalogService::new(pool, config.courses_root, FfprobeProbe::default());
  let scan = service.scan()?;

  let lessons: usize = scan.lessons.iter().map(|r| r.inserted).sum();
  tracing::info!(
    "Scan of {} complete: {} new courses, {} new lessons",
    service.courses_root().display(),
    scan.registered.len(),
    lessons
  );
  Ok(())
}
