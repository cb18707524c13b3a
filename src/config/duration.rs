//! Duration strings used by the scheduler configuration and by the
//! metrics backend query window (`"2m"`, `"90s"`, `"1h30m"`).

use std::time::Duration;

/// Parse a duration string made of one or more `<number><unit>` segments.
///
/// Supported units are `ns`, `us`, `µs`, `ms`, `s`, `m` and `h`. Numbers may
/// carry a fraction (`"1.5m"`). A bare `"0"` is accepted.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty duration".to_string());
    }
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = trimmed;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(format!("invalid duration '{input}': expected a number"));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration '{input}': bad number"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let multiplier = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            "" => return Err(format!("invalid duration '{input}': missing unit")),
            other => return Err(format!("invalid duration '{input}': unknown unit '{other}'")),
        };
        total_nanos += value * multiplier;
        rest = &rest[unit_len..];
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(format!("invalid duration '{input}': out of range"));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Render a duration as whole seconds, preferring minutes when exact.
///
/// `300s` becomes `"5m"`, `330s` stays `"330s"`. Sub-second remainders are
/// truncated.
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    if seconds >= 60 && seconds % 60 == 0 {
        format!("{}m", seconds / 60)
    } else {
        format!("{seconds}s")
    }
}
