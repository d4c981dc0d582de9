//! Connectivity probe: the cheapest real call in the capability set,
//! interpreted as a usable/unusable verdict.

use std::time::Duration;

use crate::backend::Stylist;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(20);

/// Ask a backend whether it is usable right now by requesting
/// recommendations over an empty closet.
///
/// Never returns an error: any failure means "not usable" and is logged.
/// A geographic block gets its own log line so operators can tell "this
/// region cannot use the backend" from a transient outage, but the verdict
/// is the same.
pub async fn is_usable(stylist: &dyn Stylist) -> bool {
    let outcome = tokio::time::timeout(PROBE_TIMEOUT, stylist.recommend_styles(&[], None)).await;

    match outcome {
        Ok(Ok(_)) => {
            tracing::info!(backend = stylist.name(), "connectivity probe passed");
            true
        }
        Ok(Err(e)) if e.is_geo_restricted() => {
            tracing::warn!(
                backend = stylist.name(),
                "backend is blocked by a regional restriction"
            );
            false
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = stylist.name(), "connectivity probe failed: {e}");
            false
        }
        Err(_) => {
            tracing::warn!(
                backend = stylist.name(),
                timeout_s = PROBE_TIMEOUT.as_secs(),
                "connectivity probe timed out"
            );
            false
        }
    }
}
