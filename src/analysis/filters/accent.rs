use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use crate::analysis::filter::CharFilter;

/// Canonical decomposition with combining marks dropped
pub struct AccentFilter;

impl AccentFilter {
    pub fn strip(text: &str) -> String {
        text.nfd().filter(|c| !is_combining_mark(*c)).collect()
    }
}

impl CharFilter for AccentFilter {
    fn apply(&self, text: &str) -> String {
        AccentFilter::strip(text)
    }

    fn name(&self) -> &str {
        "accent"
    }

    fn clone_box(&self) -> Box<dyn CharFilter> {
        Box::new(AccentFilter)
    }
}
