//! Per-resource tolerance overrides carried in a resource annotation.
//!
//! Format: `code,degraded,failure,protocol,direction` entries separated by
//! `;`, for example `5XX,5,10,http,inbound;4XX,10,20,http,outbound`.

use tracing::warn;

use crate::config::Tolerance;

/// Annotation key recognised on apps, services and workloads
pub const RATE_HEALTH_ANNOTATION: &str = "health.kiali.io/rate";

const FIELDS_PER_ENTRY: usize = 5;

/// Parse an annotation value into tolerances.
///
/// Returns `None` for an empty value. Malformed entries are dropped with a
/// warning without affecting their siblings, so the result may be an empty
/// list when nothing in the value was usable.
pub fn parse_health_annotation(value: &str) -> Option<Vec<Tolerance>> {
    if value.trim().is_empty() {
        return None;
    }

    let tolerances = value
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match parse_entry(entry) {
            Ok(tolerance) => Some(tolerance),
            Err(reason) => {
                warn!(entry = entry, reason = %reason, "Ignoring malformed health annotation entry");
                None
            }
        })
        .collect();

    Some(tolerances)
}

fn parse_entry(entry: &str) -> Result<Tolerance, String> {
    let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
    if fields.len() != FIELDS_PER_ENTRY {
        return Err(format!("expected {FIELDS_PER_ENTRY} fields, found {}", fields.len()));
    }

    let degraded: f64 = fields[1]
        .parse()
        .map_err(|_| format!("degraded threshold '{}' is not a number", fields[1]))?;
    let failure: f64 = fields[2]
        .parse()
        .map_err(|_| format!("failure threshold '{}' is not a number", fields[2]))?;

    let tolerance = Tolerance::new(fields[0], degraded, failure, fields[3], fields[4]);
    tolerance.validate()?;
    Ok(tolerance)
}
