use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Limiter map entries beyond which idle clients are pruned.
const PRUNE_THRESHOLD: usize = 1000;

/// Check the sliding-window limit for one client. Returns true if the
/// request is allowed. Prunes expired entries and records the new request if
/// allowed.
pub fn check_rate_limit(entries: &mut Vec<Instant>, now: Instant, max_per_window: usize) -> bool {
    if let Some(cutoff) = now.checked_sub(RATE_LIMIT_WINDOW) {
        entries.retain(|t| *t > cutoff);
    }
    if entries.len() >= max_per_window {
        return false;
    }
    entries.push(now);
    true
}

/// Drop clients with no requests inside the window.
pub fn prune_empty_entries(limiter: &mut HashMap<IpAddr, Vec<Instant>>, now: Instant) {
    let cutoff = now.checked_sub(RATE_LIMIT_WINDOW);
    limiter.retain(|_, entries| {
        if let Some(cutoff) = cutoff {
            entries.retain(|t| *t > cutoff);
        }
        !entries.is_empty()
    });
}

/// Record a request from `ip` against the shared limiter map.
pub fn admit(
    limiter: &mut HashMap<IpAddr, Vec<Instant>>,
    ip: IpAddr,
    now: Instant,
    max_per_window: usize,
) -> bool {
    if limiter.len() > PRUNE_THRESHOLD {
        prune_empty_entries(limiter, now);
    }
    check_rate_limit(limiter.entry(ip).or_default(), now, max_per_window)
}
