//! Creature visibility deadlines.
//!
//! The API reports how long a creature stays visible (`time_till_hidden_ms`)
//! relative to the sighting timestamp. Values outside `0..=max_hidden_ms`
//! are corrupt or missing upstream; for those the creature is assumed to
//! last exactly `fallback_lifetime` from its last modification.

use chrono::{DateTime, Utc};

use crate::config::ExpiryConfig;

/// Largest plausible `time_till_hidden_ms` (15 minutes).
pub const DEFAULT_MAX_HIDDEN_MS: i64 = 900_000;

/// Assumed lifetime when the reported value is implausible (15 minutes).
pub const DEFAULT_FALLBACK_LIFETIME_SECS: u64 = 900;

/// Smallest TTL written to the store. Redis rejects `EX 0`.
const MIN_TTL_SECS: u64 = 1;

/// Deadline and store TTL computed for one creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    /// When the creature stops being visible.
    pub disappear_time: DateTime<Utc>,
    /// Seconds the store should keep the record.
    pub ttl_seconds: u64,
    /// Whether the reported value was rejected in favor of the fallback.
    pub used_fallback: bool,
}

/// Computes [`Expiry`] values from raw sighting timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    max_hidden_ms: i64,
    fallback_lifetime_secs: u64,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HIDDEN_MS, DEFAULT_FALLBACK_LIFETIME_SECS)
    }
}

impl ExpiryPolicy {
    /// Create a policy with explicit thresholds.
    pub const fn new(max_hidden_ms: i64, fallback_lifetime_secs: u64) -> Self {
        Self {
            max_hidden_ms,
            fallback_lifetime_secs,
        }
    }

    /// Create a policy from the `expiry` config section.
    pub const fn from_config(config: &ExpiryConfig) -> Self {
        Self::new(config.max_hidden_ms, config.fallback_lifetime_secs)
    }

    /// Whether a reported `time_till_hidden_ms` can be trusted.
    pub const fn is_plausible(&self, time_till_hidden_ms: i64) -> bool {
        time_till_hidden_ms >= 0 && time_till_hidden_ms <= self.max_hidden_ms
    }

    /// Compute the deadline for a sighting.
    ///
    /// Plausible values give `last_modified + time_till_hidden` (in ms) and a
    /// TTL of `time_till_hidden / 1000` seconds. Implausible values give
    /// `last_modified / 1000 + fallback_lifetime` (in seconds) and a TTL of
    /// the fallback lifetime. The TTL is never below one second.
    ///
    /// Returns `None` if the timestamps fall outside the representable range.
    pub fn compute(&self, time_till_hidden_ms: i64, last_modified_ms: i64) -> Option<Expiry> {
        if self.is_plausible(time_till_hidden_ms) {
            let deadline_ms = last_modified_ms.checked_add(time_till_hidden_ms)?;
            let ttl_seconds = u64::try_from(time_till_hidden_ms.div_euclid(1000)).ok()?;
            return Some(Expiry {
                disappear_time: DateTime::from_timestamp_millis(deadline_ms)?,
                ttl_seconds: ttl_seconds.max(MIN_TTL_SECS),
                used_fallback: false,
            });
        }

        let lifetime = i64::try_from(self.fallback_lifetime_secs).ok()?;
        let deadline_secs = last_modified_ms.div_euclid(1000).checked_add(lifetime)?;
        Some(Expiry {
            disappear_time: DateTime::from_timestamp(deadline_secs, 0)?,
            ttl_seconds: self.fallback_lifetime_secs.max(MIN_TTL_SECS),
            used_fallback: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: i64 = 1_469_000_123_456;

    #[test]
    fn plausible_value_is_added_to_last_modified() {
        let expiry = ExpiryPolicy::default().compute(60_000, T);
        assert_eq!(
            expiry.map(|e| (e.disappear_time.timestamp_millis(), e.ttl_seconds, e.used_fallback)),
            Some((T + 60_000, 60, false))
        );
    }

    #[test]
    fn negative_value_falls_back_to_fifteen_minutes() {
        let expiry = ExpiryPolicy::default().compute(-5, T);
        assert_eq!(
            expiry.map(|e| (e.disappear_time.timestamp(), e.ttl_seconds, e.used_fallback)),
            Some((T / 1000 + 900, 900, true))
        );
    }

    #[test]
    fn oversized_value_falls_back() {
        let expiry = ExpiryPolicy::default().compute(900_001, T);
        assert!(expiry.is_some_and(|e| e.used_fallback));
    }

    #[test]
    fn boundary_values_are_plausible() {
        let policy = ExpiryPolicy::default();
        assert!(policy.is_plausible(0));
        assert!(policy.is_plausible(900_000));
        assert!(!policy.is_plausible(-1));
        assert!(!policy.is_plausible(900_001));
    }

    #[test]
    fn sub_second_ttl_is_clamped() {
        let expiry = ExpiryPolicy::default().compute(400, T);
        assert_eq!(expiry.map(|e| e.ttl_seconds), Some(1));
    }

    #[test]
    fn custom_thresholds() {
        let policy = ExpiryPolicy::new(1_800_000, 60);
        assert!(policy.compute(1_000_000, T).is_some_and(|e| !e.used_fallback));
        assert_eq!(policy.compute(-1, T).map(|e| e.ttl_seconds), Some(60));
    }

    #[test]
    fn unrepresentable_timestamps_are_rejected() {
        assert!(ExpiryPolicy::default().compute(1, i64::MAX).is_none());
    }
}
