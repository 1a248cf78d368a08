use chrono::Duration;

use crate::models::{PeriodBucket, ReportRange, ReportWindow};

/// Number of buckets covering `range`, inclusive on both ends: the last
/// bucket may start exactly on `to`. Depends only on the range, never on how
/// much underlying data exists.
pub fn expected_period_count(range: &ReportRange) -> usize {
    let span_days = (range.to() - range.from()).num_days();
    (span_days / range.granularity().step_days()) as usize + 1
}

/// Builds the canonical gap-free bucket sequence for `range`. Pure and
/// deterministic; the first bucket starts exactly at `from` and consecutive
/// buckets are contiguous.
pub fn generate(range: &ReportRange) -> Vec<PeriodBucket> {
    let step = Duration::days(range.granularity().step_days());
    let count = expected_period_count(range);

    let mut buckets = Vec::with_capacity(count);
    let mut start = range.from();
    while start <= range.to() {
        buckets.push(PeriodBucket {
            period_start: start,
            period_end: start + step,
        });
        start = start + step;
    }
    buckets
}

/// The half-open window `[from, last_bucket_end)` that every storage read
/// filters on. Using the last bucket's exclusive end (rather than `to`) keeps
/// the summary consistent with the series when a weekly bucket overhangs `to`.
pub fn window(range: &ReportRange) -> ReportWindow {
    let step_days = range.granularity().step_days();
    let count = expected_period_count(range) as i64;
    ReportWindow {
        start: range.from(),
        end_exclusive: range.from() + Duration::days(count * step_days),
        step_days,
    }
}
