//! Human-readable duration rendering for channel notices.

use crate::time_utils::{SECONDS_PER_DAY, SECONDS_PER_HOUR};

/// Renders a duration as `"N days, M hours"`, dropping minutes and seconds.
pub fn render_days_hours(seconds: u64) -> String {
    let days = seconds / SECONDS_PER_DAY;
    let hours = (seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
    format!("{days} days, {hours} hours")
}

/// Renders a policy threshold in the coarsest whole unit that represents it exactly.
pub fn render_threshold(seconds: u64) -> String {
    if seconds >= SECONDS_PER_DAY && seconds % SECONDS_PER_DAY == 0 {
        return plural(seconds / SECONDS_PER_DAY, "day");
    }
    if seconds >= SECONDS_PER_HOUR && seconds % SECONDS_PER_HOUR == 0 {
        return plural(seconds / SECONDS_PER_HOUR, "hour");
    }
    if seconds >= 60 && seconds % 60 == 0 {
        return plural(seconds / 60, "minute");
    }
    plural(seconds, "second")
}

fn plural(value: u64, unit: &str) -> String {
    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::{render_days_hours, render_threshold};

    #[test]
    fn unit_render_days_hours_truncates_sub_hour_remainder() {
        assert_eq!(render_days_hours(0), "0 days, 0 hours");
        assert_eq!(render_days_hours(5 * 86_400 + 3 * 3_600 + 59), "5 days, 3 hours");
        assert_eq!(render_days_hours(3_599), "0 days, 0 hours");
    }

    #[test]
    fn unit_render_threshold_prefers_coarsest_exact_unit() {
        assert_eq!(render_threshold(21 * 86_400), "21 days");
        assert_eq!(render_threshold(2 * 3_600), "2 hours");
        assert_eq!(render_threshold(86_400), "1 day");
        assert_eq!(render_threshold(90), "90 seconds");
        assert_eq!(render_threshold(25 * 3_600), "25 hours");
    }
}
