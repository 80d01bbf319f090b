//! Display helpers for column names and values.

use crate::data::model::PropertyValue;

/// `accident_severity` → `Accident Severity`.
pub fn humanize(name: &str) -> String {
    name.split('_')
        .map(|frag| {
            let mut chars = frag.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shorten a value for narrow labels.
///
/// Numbers are rounded to two decimals. Text longer than `max_len` keeps its
/// first ten characters followed by `...` and, when it looks like a file name,
/// its extension.
pub fn shorten_name(value: &PropertyValue, max_len: usize) -> String {
    let text = match value {
        PropertyValue::Number(v) => {
            return PropertyValue::Number((v * 100.0).round() / 100.0).to_string()
        }
        PropertyValue::String(s) => s.trim(),
        other => return other.to_string(),
    };
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let extension = text
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.len() < 10)
        .unwrap_or("");
    let head: String = text.chars().take(10).collect();
    format!("{head}...{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("foo"), "Foo");
        assert_eq!(humanize("accident_severity"), "Accident Severity");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_shorten_name() {
        assert_eq!(shorten_name(&PropertyValue::Number(3.14159), 26), "3.14");
        assert_eq!(shorten_name(&"short".into(), 26), "short");
        assert_eq!(
            shorten_name(&"a_really_long_dataset_name_2019.geojson".into(), 26),
            "a_really_l...geojson"
        );
        assert_eq!(
            shorten_name(&"no extension in this very long label".into(), 26),
            "no extensi..."
        );
    }
}
