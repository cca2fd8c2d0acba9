//! Conversion between `HH:MM:SS` text and millisecond counts.
//!
//! Parsing is deliberately lenient: components are read left to right as
//! hours, minutes, seconds. Missing components count as zero, so `"1:30"` is
//! one hour and thirty minutes rather than ninety seconds. Components that are
//! not whole numbers count as zero, a negative total clamps to zero and totals
//! past [`MAX_DURATION_MS`] clamp to it. The group builder relies on this to
//! reject anything that parses to `0`.

const MS_PER_SEC: u64 = 1000;
const SECS_PER_MIN: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;

/// Longest duration a task can hold: `999:59:59`.
pub const MAX_DURATION_MS: u64 = (999 * SECS_PER_HOUR + 59 * SECS_PER_MIN + 59) * MS_PER_SEC;

/// Weights applied to the first three components, in order.
const POSITIONAL_WEIGHTS_SECS: [i128; 3] = [SECS_PER_HOUR as i128, SECS_PER_MIN as i128, 1];

/// Parse `HH:MM:SS` text into milliseconds.
pub fn parse_duration(text: &str) -> u64 {
    let total_secs: i128 = text
        .split(':')
        .zip(POSITIONAL_WEIGHTS_SECS)
        .map(|(part, weight)| i128::from(parse_component(part)) * weight)
        .sum();

    if total_secs <= 0 {
        return 0;
    }
    let total_ms = total_secs.saturating_mul(i128::from(MS_PER_SEC));
    u64::try_from(total_ms).map_or(MAX_DURATION_MS, |ms| ms.min(MAX_DURATION_MS))
}

fn parse_component(part: &str) -> i64 {
    part.trim().parse::<i64>().unwrap_or(0)
}

/// Render milliseconds as zero-padded `HH:MM:SS`, rounded to the nearest second.
///
/// Hours are not wrapped, so very long durations render with more than two
/// hour digits.
pub fn format_duration(ms: u64) -> String {
    let secs = ms.saturating_add(MS_PER_SEC / 2) / MS_PER_SEC;
    let hours = secs / SECS_PER_HOUR;
    let minutes = (secs % SECS_PER_HOUR) / SECS_PER_MIN;
    let seconds = secs % SECS_PER_MIN;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
