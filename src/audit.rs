//! Best-effort audit trail. A failed audit write must never fail the
//! business operation it describes; it is logged and dropped.

use tracing::warn;

use crate::repository::Repository;

pub fn record<R: Repository>(repository: &R, action: &str, details: &str) {
    if let Err(error) = repository.append_audit(action, details) {
        warn!(%action, %error, "audit write failed");
    }
}
