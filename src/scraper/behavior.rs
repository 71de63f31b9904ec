//! Human-behavior simulation and request pacing.
//!
//! Neither affects extraction correctness: the pointer jitter reduces the
//! automated-traffic signature of a fresh page, and the randomized
//! inter-request delay is the system's only defense against rate-based
//! blocking — it runs unconditionally between lookups, success or not.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::browser::PageHandle;
use crate::config::ScrapeConfig;

const POINTER_X: Range<f64> = 100.0..800.0;
const POINTER_Y: Range<f64> = 100.0..600.0;
const POINTER_PAUSE_SECS: (f64, f64) = (0.5, 1.5);

/// Small randomized pointer motion plus a short pause. Failures are logged
/// and swallowed — simulation must never fail a lookup.
pub async fn simulate_human(page: &dyn PageHandle) {
    let (x, y) = {
        let mut rng = rand::rng();
        (rng.random_range(POINTER_X), rng.random_range(POINTER_Y))
    };
    if let Err(e) = page.move_mouse(x, y).await {
        debug!("Pointer simulation failed: {e}");
    }
    pause(POINTER_PAUSE_SECS.0, POINTER_PAUSE_SECS.1).await;
}

/// Sleep a uniformly random number of seconds in `[min_secs, max_secs]`.
pub async fn pause(min_secs: f64, max_secs: f64) {
    tokio::time::sleep(sample_delay(min_secs, max_secs)).await;
}

/// Mandatory pacing delay between per-item lookups.
pub async fn pace(config: &ScrapeConfig) {
    let delay = sample_delay(config.delay_min_secs, config.delay_max_secs);
    debug!(?delay, "Pacing before next lookup");
    tokio::time::sleep(delay).await;
}

pub fn sample_delay(min_secs: f64, max_secs: f64) -> Duration {
    let min_secs = min_secs.max(0.0);
    let secs = if max_secs > min_secs {
        rand::rng().random_range(min_secs..max_secs)
    } else {
        min_secs
    };
    Duration::from_secs_f64(secs)
}
