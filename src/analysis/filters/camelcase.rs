use crate::analysis::filter::CharFilter;

/// Inserts a space at camelCase boundaries.
///
/// `aB` becomes `a B`, and an uppercase run followed by a capitalized word
/// is split before the last capital (`XMLParser` becomes `XML Parser`).
pub struct CamelCaseFilter;

impl CamelCaseFilter {
    pub fn split(text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::with_capacity(text.len() + 8);

        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_ascii_uppercase() {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                if prev.is_ascii_lowercase() || (prev.is_ascii_uppercase() && next_lower) {
                    out.push(' ');
                }
            }
            out.push(c);
        }

        out
    }
}

impl CharFilter for CamelCaseFilter {
    fn apply(&self, text: &str) -> String {
        CamelCaseFilter::split(text)
    }

    fn name(&self) -> &str {
        "camelcase"
    }

    fn clone_box(&self) -> Box<dyn CharFilter> {
        Box::new(CamelCaseFilter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_lower_upper_boundary() {
        assert_eq!(CamelCaseFilter::split("camelCaseWord"), "camel Case Word");
    }

    #[test]
    fn test_splits_acronym_before_word() {
        assert_eq!(CamelCaseFilter::split("XMLParser"), "XML Parser");
        assert_eq!(CamelCaseFilter::split("ABC"), "ABC");
    }
}
