// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Merging harvested records and deriving personal bests.

use std::collections::HashSet;

use crate::models::{EventKey, PersonalBest, SwimRecord};

/// Deduplicate on [`SwimRecord::merge_key`], keeping the first occurrence,
/// then order newest meet first. The sort is stable, so records from the
/// same day keep their harvest order.
pub fn reconcile(records: Vec<SwimRecord>) -> Vec<SwimRecord> {
    let before = records.len();
    let mut merged: Vec<SwimRecord> = {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|r| {
                let (key, time, date, meet) = r.merge_key();
                seen.insert((key, time.to_string(), date, meet.to_string()))
            })
            .collect()
    };
    merged.sort_by(|a, b| b.meet_date.cmp(&a.meet_date));

    tracing::debug!(before, after = merged.len(), "Reconciled records");
    merged
}

/// One best per event, in the order events first appear.
///
/// Records without a numeric time never count. On equal times the earlier
/// record is kept.
pub fn compute_personal_bests(records: &[SwimRecord]) -> Vec<PersonalBest> {
    let mut bests: Vec<(EventKey, &SwimRecord, f64)> = Vec::new();
    for record in records {
        let Some(seconds) = record.time_seconds else {
            continue;
        };
        let key = record.event_key();
        match bests.iter_mut().find(|(k, _, _)| *k == key) {
            Some(entry) if seconds < entry.2 => *entry = (key, record, seconds),
            Some(_) => {}
            None => bests.push((key, record, seconds)),
        }
    }

    bests
        .into_iter()
        .filter_map(|(_, record, _)| PersonalBest::from_record(record))
        .collect()
}
