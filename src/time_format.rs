/// Format a position in seconds as `M:SS`.
///
/// Minutes are not padded and keep growing past an hour (`3600.0` is
/// `60:00`). Negative and non-finite input is clamped to `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a `start-end` range, e.g. `0:12-0:15`
pub fn format_time_range(start: f64, end: f64) -> String {
    format!("{}-{}", format_time(start), format_time(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_formatting() {
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(59.0), "0:59");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(12.5), "0:12");
        assert_eq!(format_time(59.999), "0:59");
    }

    #[test]
    fn test_out_of_range_input() {
        assert_eq!(format_time(-5.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
        assert_eq!(format_time(f64::NEG_INFINITY), "0:00");
    }

    #[test]
    fn test_range_formatting() {
        assert_eq!(format_time_range(12.5, 15.0), "0:12-0:15");
        assert_eq!(format_time_range(61.0, 66.2), "1:01-1:06");
    }
}
