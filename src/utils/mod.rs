use serde_json::Value;

/// 2^53: past this, f64 no longer holds every integer exactly.
const MAX_EXACT_F64: f64 = 9_007_199_254_740_992.0;

/// A formatted table cell. `Invalid` keeps the raw JSON text of a value that
/// could not be formatted as a number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Ok(String),
    Invalid(String),
}

impl Cell {
    pub fn text(&self) -> &str {
        match self {
            Cell::Ok(s) | Cell::Invalid(s) => s,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Cell::Invalid(_))
    }
}

/// `186` -> `186%`. Any JSON value is printed as-is, mirroring string
/// interpolation, so this never fails.
pub fn format_percentage(value: &Value) -> Cell {
    let plain = match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format_plain_number(f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Cell::Ok(format!("{plain}%"))
}

/// `15283` -> `$15,283`. Non-numeric values are reported as `Invalid`.
pub fn format_amount(value: &Value) -> Cell {
    match value.as_f64() {
        Some(f) if f.is_finite() => Cell::Ok(format!("${}", group_thousands(f))),
        _ => Cell::Invalid(value.to_string()),
    }
}

fn format_plain_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < MAX_EXACT_F64 {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

/// Groups the integer part with commas and keeps at most three decimals.
pub fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}
