use std::time::Duration;

/// Formats a duration as `HH:MM:SS`.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Bytes to megabytes, rounded to two decimals.
pub fn megabytes(bytes: u64) -> f64 {
    let mb = bytes as f64 / 1_048_576.0;
    (mb * 100.0).round() / 100.0
}
