//! Test helpers: throwaway SQLite databases and contexts with injected
//! clocks and seeded RNGs.

use crate::config::EngineConfig;
use crate::context::ServiceContext;
use bankbot_core::{Clock, ManualClock, SystemClock};
use bankbot_persistence::Database;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) async fn ctx_with(
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    seed: u64,
) -> (TempDir, ServiceContext) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let db = Database::init(&url).await.expect("test db");
    let ctx = ServiceContext::with_clock_and_seed(&db, config, clock, Some(seed));
    (dir, ctx)
}

/// Default config, system clock, fixed seed.
pub(crate) async fn test_context() -> (TempDir, ServiceContext) {
    ctx_with(EngineConfig::default(), Arc::new(SystemClock), 42).await
}

/// Default config and a manual clock the test controls.
pub(crate) async fn test_context_manual_clock() -> (TempDir, Arc<ManualClock>, ServiceContext) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).single().expect("start time"),
    ));
    let (dir, ctx) = ctx_with(EngineConfig::default(), clock.clone(), 42).await;
    (dir, clock, ctx)
}
