use std::collections::BTreeMap;
use chrono::{DateTime, Datelike, NaiveDate};
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use crate::index::inverted::InvertedIndex;
use crate::search::results::FacetValue;

pub const DEFAULT_FACET_SIZE: usize = 10;

/// Half-open numeric bucket `[from, to)`. A missing bound is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBucket {
    pub label: Option<String>,  // Defaults to `< to`, `>= from` or `from-to`
    pub from: Option<f64>,
    pub to: Option<f64>,
}

impl RangeBucket {
    pub fn new(from: Option<f64>, to: Option<f64>) -> Self {
        RangeBucket { label: None, from, to }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match (self.from, self.to) {
            (None, Some(to)) => format!("< {}", format_bound(to)),
            (Some(from), None) => format!(">= {}", format_bound(from)),
            (Some(from), Some(to)) => format!("{}-{}", format_bound(from), format_bound(to)),
            (None, None) => "*".to_string(),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.from.is_none_or(|from| value >= from) && self.to.is_none_or(|to| value < to)
    }
}

fn format_bound(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Bucket width of a date histogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateInterval {
    Year,
    #[default]
    Month,
    Day,
}

impl DateInterval {
    fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            DateInterval::Year => format!("{}", date.year()),
            DateInterval::Month => format!("{}-{:02}", date.year(), date.month()),
            DateInterval::Day => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Value counts of each field among `matched`, most frequent first, ties by
/// value, at most `size` per field. Fields with no values among the matches
/// map to an empty list.
pub fn compute_facets(
    index: &InvertedIndex,
    matched: &RoaringBitmap,
    fields: &[String],
    size: usize,
) -> BTreeMap<String, Vec<FacetValue>> {
    let mut facets = BTreeMap::new();

    for field in fields {
        let mut values: Vec<FacetValue> = index
            .field_values(field)
            .map(|buckets| {
                buckets
                    .iter()
                    .filter_map(|(value, postings)| {
                        let count = postings.intersection_len(matched) as usize;
                        (count > 0).then(|| FacetValue { value: value.clone(), count })
                    })
                    .collect()
            })
            .unwrap_or_default();

        values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        values.truncate(size);
        facets.insert(field.clone(), values);
    }

    facets
}

/// Matched documents per bucket, in bucket order. A value falls into the
/// first bucket containing it; empty buckets and non-numeric values are
/// left out.
pub fn compute_range_facet(
    index: &InvertedIndex,
    matched: &RoaringBitmap,
    field: &str,
    buckets: &[RangeBucket],
) -> Vec<FacetValue> {
    let mut counts = vec![0usize; buckets.len()];

    if let Some(values) = index.field_values(field) {
        for (value, postings) in values {
            let Ok(number) = value.trim().parse::<f64>() else {
                continue;
            };
            if let Some(slot) = buckets.iter().position(|b| b.contains(number)) {
                counts[slot] += postings.intersection_len(matched) as usize;
            }
        }
    }

    buckets
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(bucket, count)| FacetValue { value: bucket.label(), count })
        .collect()
}

/// Matched documents per calendar bucket, oldest first. Values that are not
/// RFC 3339 timestamps, `YYYY-MM-DD` dates or bare years are skipped.
pub fn compute_date_histogram(
    index: &InvertedIndex,
    matched: &RoaringBitmap,
    field: &str,
    interval: DateInterval,
) -> Vec<FacetValue> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();

    if let Some(values) = index.field_values(field) {
        for (value, postings) in values {
            let Some(date) = parse_date(value) else {
                continue;
            };
            let count = postings.intersection_len(matched) as usize;
            if count > 0 {
                *buckets.entry(interval.bucket_key(date)).or_default() += count;
            }
        }
    }

    buckets.into_iter().map(|(value, count)| FacetValue { value, count }).collect()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.date_naive());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if value.len() == 4 && value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Document;

    #[test]
    fn test_counts_only_matched_documents() {
        let mut index = InvertedIndex::new();
        let a = index.insert("a", Document::new().with_field("entry_type", "article")).unwrap();
        let b = index.insert("b", Document::new().with_field("entry_type", "article")).unwrap();
        index.insert("c", Document::new().with_field("entry_type", "book")).unwrap();

        let matched: RoaringBitmap = [a.0, b.0].into_iter().collect();
        let facets = compute_facets(&index, &matched, &["entry_type".to_string()], 10);
        assert_eq!(
            facets["entry_type"],
            vec![FacetValue { value: "article".into(), count: 2 }]
        );
    }

    #[test]
    fn test_list_fields_and_truncation() {
        let mut index = InvertedIndex::new();
        let tags = |t: &[&str]| t.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        index.insert("a", Document::new().with_field("keywords_list", tags(&["ml", "nlp"]))).unwrap();
        index.insert("b", Document::new().with_field("keywords_list", tags(&["ml", "cv"]))).unwrap();

        let all = index.all_docs().clone();
        let facets = compute_facets(&index, &all, &["keywords_list".to_string()], 2);
        let values = &facets["keywords_list"];
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], FacetValue { value: "ml".into(), count: 2 });
        assert_eq!(values[1].value, "cv");
    }

    fn year_index() -> (InvertedIndex, RoaringBitmap) {
        let mut index = InvertedIndex::new();
        for (key, year) in [("a", 1998i64), ("b", 2015), ("c", 2017), ("d", 2023), ("e", 2024)] {
            index.insert(key, Document::new().with_field("year", year)).unwrap();
        }
        index.insert("f", Document::new().with_field("year", "unknown")).unwrap();
        let all = index.all_docs().clone();
        (index, all)
    }

    #[test]
    fn test_range_facet_buckets() {
        let (index, all) = year_index();
        let buckets = vec![
            RangeBucket::new(None, Some(2000.0)),
            RangeBucket::new(Some(2000.0), Some(2020.0)),
            RangeBucket::new(Some(2020.0), None).labelled("recent"),
            RangeBucket::new(Some(3000.0), None),
        ];
        let values = compute_range_facet(&index, &all, "year", &buckets);
        assert_eq!(
            values,
            vec![
                FacetValue { value: "< 2000".into(), count: 1 },
                FacetValue { value: "2000-2020".into(), count: 2 },
                FacetValue { value: "recent".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_range_facet_counts_only_matched() {
        let (index, _) = year_index();
        let matched: RoaringBitmap = [index.doc_id("d").unwrap().0].into_iter().collect();
        let values = compute_range_facet(&index, &matched, "year", &[RangeBucket::new(Some(2020.0), None)]);
        assert_eq!(values, vec![FacetValue { value: ">= 2020".into(), count: 1 }]);
    }

    #[test]
    fn test_date_histogram_intervals() {
        let mut index = InvertedIndex::new();
        index.insert("a", Document::new().with_field("added", "2024-03-05T10:00:00+00:00")).unwrap();
        index.insert("b", Document::new().with_field("added", "2024-03-20")).unwrap();
        index.insert("c", Document::new().with_field("added", "2023-11-01T08:30:00Z")).unwrap();
        index.insert("d", Document::new().with_field("added", "someday")).unwrap();
        let all = index.all_docs().clone();

        let months = compute_date_histogram(&index, &all, "added", DateInterval::Month);
        assert_eq!(
            months,
            vec![
                FacetValue { value: "2023-11".into(), count: 1 },
                FacetValue { value: "2024-03".into(), count: 2 },
            ]
        );

        let years = compute_date_histogram(&index, &all, "added", DateInterval::Year);
        assert_eq!(years.iter().map(|f| f.count).collect::<Vec<_>>(), vec![1, 2]);

        let days = compute_date_histogram(&index, &all, "added", DateInterval::Day);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].value, "2023-11-01");
    }
}
