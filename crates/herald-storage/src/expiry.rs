//! Deadlines for the in-process backends.

use std::time::Duration;

use tokio::time::Instant;

/// When an entry written at `now` with `ttl` stops being readable.
///
/// `None` means the deadline lies beyond what `Instant` can represent, so the
/// entry never expires.
pub(crate) fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    now.checked_add(ttl)
}

pub(crate) fn is_live(expires_at: Option<Instant>, now: Instant) -> bool {
    expires_at.is_none_or(|at| at > now)
}
