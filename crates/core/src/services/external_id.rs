//! Identifiers of collaborators this service does not own (users).

use serde_json::Value;

/// Largest magnitude below which every integral `f64` is exact (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Normalize an identifier sent by a client.
///
/// Clients send user IDs either as strings or as JSON numbers. Integral
/// numbers are written in integer form, so `1`, `1.0` and `1e0` name the
/// same user. Empty or blank strings, `0`, fractional numbers, `null`,
/// booleans and structured values count as missing.
#[must_use]
pub fn external_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return (i != 0).then(|| i.to_string());
            }
            if let Some(u) = n.as_u64() {
                return Some(u.to_string());
            }
            let f = n.as_f64()?;
            (f.is_finite() && f.fract() == 0.0 && f != 0.0 && f.abs() <= MAX_EXACT_FLOAT)
                .then(|| format!("{f:.0}"))
        }
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}
