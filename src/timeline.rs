use chrono::{DateTime, DurationRound, FixedOffset, Local, TimeDelta};

use crate::model::TimelineBucket;

/// Number of hourly buckets the chart always shows.
pub const TIMELINE_HOURS: usize = 24;

/// Backfills `timeline` to `TIMELINE_HOURS` hourly buckets, anchored on the
/// current hour when there is nothing to anchor on.
pub fn normalize(timeline: Vec<TimelineBucket>) -> Vec<TimelineBucket> {
    normalize_at(timeline, Local::now().fixed_offset())
}

/// Same as [`normalize`] with an explicit wall clock.
///
/// Inputs that already hold `TIMELINE_HOURS` or more buckets are returned as-is.
/// Otherwise zero buckets are prepended, each one hour before its successor,
/// until the length is reached. Existing buckets are never touched. The
/// prepended buckets stand for hours with no data, which is rendered the same
/// as an hour with zero queries.
pub fn normalize_at(
    timeline: Vec<TimelineBucket>,
    now: DateTime<FixedOffset>,
) -> Vec<TimelineBucket> {
    if timeline.len() >= TIMELINE_HOURS {
        return timeline;
    }

    let hour = TimeDelta::hours(1);
    let mut out = Vec::with_capacity(TIMELINE_HOURS);

    // Walk backwards from the oldest existing bucket, or from the current
    // hour which then becomes the newest bucket.
    let mut cursor = match timeline.first() {
        Some(first) => first.start - hour,
        None => now.duration_trunc(hour).unwrap_or(now),
    };
    for _ in timeline.len()..TIMELINE_HOURS {
        out.push(TimelineBucket::empty(cursor));
        cursor -= hour;
    }
    out.reverse();
    out.extend(timeline);
    out
}
