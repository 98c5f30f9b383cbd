//! Daily analytics over memos.
//!
//! Snapshots are computed from the memos dated today and appended to the
//! `analytics` table; the read path serves the newest one.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memo::{day_prefix, format_timestamp};
use crate::records::{Memo, PaymentStatus};

/// Breakdown key for violation references that carry no name.
pub const UNNAMED_VIOLATION: &str = "Unknown";

/// Paid/pending counts for a day's memos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStats {
    pub paid: u64,
    pub pending: u64,
    pub total: u64,
}

/// One computed analytics aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// Day the snapshot covers, `YYYY-MM-DD`.
    pub date: String,
    /// Number of memos issued that day.
    pub today_violations: u64,
    pub total_fines: i64,
    /// Distinct officer ids among the day's memos.
    pub active_officers: u64,
    /// Violation name → number of references.
    pub violation_breakdown: BTreeMap<String, u64>,
    pub payment_stats: PaymentStats,
    pub last_updated: String,
}

/// Aggregate `memos` into a snapshot for the day of `now`.
///
/// The caller selects which memos belong to the day; this function only
/// aggregates.
#[must_use]
pub fn compute(memos: &[Memo], now: DateTime<Utc>) -> AnalyticsSnapshot {
    let mut officers = HashSet::new();
    let mut breakdown = BTreeMap::new();
    let mut payment_stats = PaymentStats::default();
    let mut total_fines: i64 = 0;

    for memo in memos {
        total_fines = total_fines.saturating_add(memo.total_fine);
        officers.insert(memo.officer_id.as_str());

        for v in &memo.violations {
            let name = v.violation.as_deref().unwrap_or(UNNAMED_VIOLATION);
            *breakdown.entry(name.to_string()).or_insert(0) += 1;
        }

        match memo.payment_status {
            PaymentStatus::Paid => payment_stats.paid += 1,
            PaymentStatus::Pending => payment_stats.pending += 1,
        }
        payment_stats.total += 1;
    }

    AnalyticsSnapshot {
        date: day_prefix(now),
        today_violations: payment_stats.total,
        total_fines,
        active_officers: officers.len() as u64,
        violation_breakdown: breakdown,
        payment_stats,
        last_updated: format_timestamp(now),
    }
}
