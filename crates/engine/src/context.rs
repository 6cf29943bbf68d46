//! Service context
//!
//! Shared state for all engine services: the connection pool, the global
//! write lock that serializes mutating operations, the clock, and the RNG.
//! One context per process; services borrow it per call.

use crate::config::EngineConfig;
use bankbot_core::{Clock, SystemClock};
use bankbot_persistence::Database;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, MutexGuard};

/// Context for engine operations.
///
/// Mutating operations take the write lock for their whole
/// validate-mutate-append transaction, so no two of them can pass a funds
/// check against the same stale balance. Reads bypass the lock.
pub struct ServiceContext {
    pool: SqlitePool,
    write_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
    rng: StdMutex<StdRng>,
    config: EngineConfig,
}

impl ServiceContext {
    /// Production context: system clock, entropy-seeded RNG.
    pub fn new(db: &Database, config: EngineConfig) -> Self {
        Self::with_clock_and_seed(db, config, Arc::new(SystemClock), None)
    }

    /// Context with an injected clock and an optional fixed RNG seed.
    pub fn with_clock_and_seed(
        db: &Database,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        rng_seed: Option<u64>,
    ) -> Self {
        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            pool: db.pool().clone(),
            write_lock: Mutex::new(()),
            clock,
            rng: StdMutex::new(rng),
            config,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Serialize a mutating operation against all others.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Uniform draw in `[0, 1)`.
    pub fn random_unit(&self) -> f64 {
        self.rng.lock().expect("rng lock").gen_range(0.0..1.0)
    }

    /// Bernoulli draw with probability `p`.
    pub fn random_win(&self, p: f64) -> bool {
        self.rng.lock().expect("rng lock").gen_bool(p.clamp(0.0, 1.0))
    }
}
