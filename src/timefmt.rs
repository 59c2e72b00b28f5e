//! Display formatting for in-game-time millisecond values.
//!
//! Split fields use `0` as a "not reached" sentinel, so zero (and any
//! corrupt negative value) renders as [`NOT_REACHED`] instead of a real
//! duration. Durations truncate toward zero so a cell never shows more
//! time than actually elapsed.

pub const NOT_REACHED: &str = "-";

/// Primary table label, zero-padded `MM:SS`. Minutes are unbounded.
pub fn format_split(ms: i64) -> String {
    if ms <= 0 {
        return NOT_REACHED.to_string();
    }
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

/// Millisecond-precise variant (`MM:SS.mmm`) for the detail pane.
pub fn format_split_detail(ms: i64) -> String {
    if ms <= 0 {
        return NOT_REACHED.to_string();
    }
    let millis = ms % 1000;
    format!("{}.{millis:03}", format_split(ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_the_not_reached_sentinel() {
        assert_eq!(format_split(0), "-");
        assert_eq!(format_split_detail(0), "-");
    }

    #[test]
    fn negative_values_render_as_sentinel_instead_of_panicking() {
        assert_eq!(format_split(-1), "-");
        assert_eq!(format_split_detail(-500), "-");
    }

    #[test]
    fn minutes_and_seconds_are_zero_padded() {
        assert_eq!(format_split(65_000), "01:05");
        assert_eq!(format_split(5_000), "00:05");
        assert_eq!(format_split(600_000), "10:00");
    }

    #[test]
    fn truncates_instead_of_rounding_up() {
        assert_eq!(format_split(1_999), "00:01");
        assert_eq!(format_split_detail(1_999), "00:01.999");
        assert_eq!(format_split(59_999), "00:59");
    }

    #[test]
    fn millisecond_detail_is_three_digits() {
        assert_eq!(format_split_detail(61_005), "01:01.005");
        assert_eq!(format_split_detail(60_050), "01:00.050");
    }

    #[test]
    fn multi_hour_durations_do_not_wrap() {
        // 2h02m = 122 minutes; stays in minutes rather than wrapping at 60
        assert_eq!(format_split(7_320_000), "122:00");
        assert_eq!(format_split_detail(7_320_001), "122:00.001");
    }
}
