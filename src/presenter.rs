//! # Result Presenter
//!
//! Turns a raw value into the one-line message shown to users and written to
//! host logs, e.g. `MD: Mode: 3. (Winter: WP aus) `.

use crate::registry;
use crate::wr3223::serial::QueryResult;

/// Formats `"{code}: {description}: {raw}"`, followed by `" ({label})"` when
/// the value maps to a label and by `" {unit}"`.
///
/// The unit segment is always appended, so commands without a unit end in a
/// single space. Unknown codes get an empty description and unit.
pub fn format_result(code: &str, raw: &str) -> String {
    let spec = registry::lookup(code);
    let description = spec.map_or("", |s| s.description);
    let unit = spec.map_or("", |s| s.unit_or_empty());

    let mut message = format!("{code}: {description}: {raw}");
    if let Some(label) = spec.and_then(|s| s.label_for(raw)) {
        message.push_str(" (");
        message.push_str(label);
        message.push(')');
    }
    message.push(' ');
    message.push_str(unit);
    message
}

/// Requested codes that have no entry in `results`, in request order.
pub fn missing_codes<'a>(requested: &[&'a str], results: &QueryResult) -> Vec<&'a str> {
    requested
        .iter()
        .copied()
        .filter(|code| !results.contains_key(*code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_unit() {
        assert_eq!(format_result("T3", "12.5"), "T3: Aussentemperatur: 12.5 [°C]");
    }

    #[test]
    fn test_format_with_label() {
        assert_eq!(format_result("MD", "-125."), "MD: Mode: -125. (Winter: WP an) ");
    }

    #[test]
    fn test_format_unmapped_value() {
        assert_eq!(format_result("MD", "99."), "MD: Mode: 99. ");
    }

    #[test]
    fn test_format_unknown_code() {
        assert_eq!(format_result("??", "1"), "??: : 1 ");
    }

    #[test]
    fn test_missing_codes() {
        let mut results = QueryResult::new();
        results.insert("T1".into(), "1.0".into());
        assert_eq!(missing_codes(&["T1", "T2", "MD"], &results), vec!["T2", "MD"]);
    }
}
