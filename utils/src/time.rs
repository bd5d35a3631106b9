//! Time formatting helpers for console rendering.

/// Format a duration in seconds to a compact human-readable string.
///
/// Sub-minute durations print raw seconds; everything longer prints the two
/// most significant units, which is what the voting-window countdown shows.
pub fn format_duration(secs: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 3_600;
    const DAY: u64 = 86_400;

    if secs < MINUTE {
        format!("{}s", secs)
    } else if secs < HOUR {
        format!("{}m {}s", secs / MINUTE, secs % MINUTE)
    } else if secs < DAY {
        format!("{}h {}m", secs / HOUR, (secs % HOUR) / MINUTE)
    } else {
        format!("{}d {}h", secs / DAY, (secs % DAY) / HOUR)
    }
}
