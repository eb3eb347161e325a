use chrono::{DateTime, Utc};

use crate::model::Count;

pub const UNKNOWN: &str = "-";

/// Integer count with thousands separators; unknown renders as a dash.
pub fn format_count(count: Count) -> String {
    let Some(value) = count else {
        return UNKNOWN.to_string();
    };
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Short form used by the info boxes, e.g. `+1.2k`, `+3.4m`.
pub fn format_compact(count: Count) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "t"), (1e9, "b"), (1e6, "m"), (1e3, "k")];

    let Some(value) = count else {
        return UNKNOWN.to_string();
    };
    if value < 1_000 {
        return format!("+{value}");
    }
    let value = value as f64;
    for (idx, (scale, suffix)) in UNITS.iter().enumerate() {
        if value < *scale {
            continue;
        }
        let scaled = value / scale;
        // 999_960 would print as "1000.0k"; promote to the next unit instead.
        if scaled >= 999.95 && idx > 0 {
            let (bigger, bigger_suffix) = UNITS[idx - 1];
            return format!("+{:.1}{bigger_suffix}", value / bigger);
        }
        return format!("+{scaled:.1}{suffix}");
    }
    format!("+{value}")
}

pub fn format_updated(updated_ms: Option<i64>) -> String {
    updated_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}
