// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and server-assigned timestamps.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Format a UTC timestamp as RFC3339 with microsecond precision and a `Z`
/// suffix. Fixed precision keeps lexicographic order equal to chronological
/// order, which the feed's ordered scan relies on.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

static LAST_MICROS: AtomicI64 = AtomicI64::new(0);

/// Server-assigned creation timestamp, strictly increasing per process.
///
/// Wall-clock time can repeat or step backwards (NTP); `created_at` values are
/// used as pagination keys, so each call bumps past the last issued value.
pub fn monotonic_now() -> DateTime<Utc> {
    let now = Utc::now().timestamp_micros();
    let mut last = LAST_MICROS.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_MICROS.compare_exchange_weak(
            last,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => {
                return DateTime::from_timestamp_micros(candidate).unwrap_or_else(Utc::now)
            }
            Err(observed) => last = observed,
        }
    }
}
