//! Per-entry refresh decision.
//!
//! The rules are evaluated in order and the first match wins. The function
//! is pure: callers act on the returned [`Decision`].

use crate::model::AutoLoadEntry;

const ONE_HOUR_MS: i64 = 3_600_000;

/// Why an entry was left alone this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Never requested or never loaded yet.
    NotEligible,
    /// Another refresh of the same key is in flight.
    Loading,
    /// Last load is younger than the refresh threshold.
    Fresh,
}

/// Why an entry lost background refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoteReason {
    /// No foreground request within the policy's request timeout.
    RequestTimeout,
    /// Over 100 loads averaging under 10ms.
    CheapLoad,
    /// Alive for over an hour with fewer than 60 requests per hour.
    SparseUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Demote(DemoteReason),
    Refresh { threshold_ms: i64 },
}

/// Age after which a value with `expire` seconds of TTL gets reloaded.
pub fn refresh_threshold_ms(expire: u64) -> i64 {
    let expire = expire as i64;
    if expire >= 600 {
        (expire - 120) * 1000
    } else {
        (expire - 60) * 1000
    }
}

pub fn decide(entry: &AutoLoadEntry, now_ms: i64) -> Decision {
    let last_request = entry.last_request_time();
    let last_load = entry.last_load_time();
    if last_request <= 0 || last_load <= 0 {
        return Decision::Skip(SkipReason::NotEligible);
    }

    let policy = entry.policy();
    let request_timeout_ms = (policy.request_timeout as i64).saturating_mul(1000);
    if request_timeout_ms > 0 && now_ms - last_request >= request_timeout_ms {
        return Decision::Demote(DemoteReason::RequestTimeout);
    }

    let average = entry.average_use_time();
    if entry.load_cnt() > 100 && average < 10 {
        return Decision::Demote(DemoteReason::CheapLoad);
    }

    let alive = now_ms - entry.first_request_time();
    if alive > ONE_HOUR_MS && average < 1000 && entry.request_times() / (alive / ONE_HOUR_MS) < 60 {
        return Decision::Demote(DemoteReason::SparseUsage);
    }

    if entry.is_loading() {
        return Decision::Skip(SkipReason::Loading);
    }

    let threshold_ms = refresh_threshold_ms(policy.expire);
    if now_ms - last_load < threshold_ms {
        return Decision::Skip(SkipReason::Fresh);
    }
    Decision::Refresh { threshold_ms }
}
