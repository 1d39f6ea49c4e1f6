//! Countdown display formatting.

/// Format a round countdown as `m:ss` (e.g. `75` → `"1:15"`).
pub fn countdown(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Format a break countdown (e.g. `30` → `"Next game starts in: 30s"`).
pub fn break_countdown(secs: u32) -> String {
    format!("Next game starts in: {secs}s")
}

/// Dispatch between round and break formatting.
pub fn format(secs: u32, is_break: bool) -> String {
    if is_break {
        break_countdown(secs)
    } else {
        countdown(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_countdown_pads_seconds() {
        assert_eq!(format(75, false), "1:15");
        assert_eq!(format(5, false), "0:05");
        assert_eq!(format(0, false), "0:00");
        assert_eq!(format(600, false), "10:00");
    }

    #[test]
    fn break_countdown_text() {
        assert_eq!(format(30, true), "Next game starts in: 30s");
        assert_eq!(format(0, true), "Next game starts in: 0s");
    }
}
