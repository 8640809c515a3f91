use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::StudentResult;

/// All results recorded for one term label, plus their average.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TermSummary {
    pub term: String,
    pub results: Vec<StudentResult>,
    /// Mean of the numeric marks, one decimal. Absent when no mark parsed.
    pub overall_average: Option<f64>,
}

/// Reads a free-text mark as a percentage. `" 92% "` and `"88.5"` parse;
/// letter grades and anything else do not.
pub fn parse_marks(marks: &str) -> Option<f64> {
    let trimmed = marks.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);

    number.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn average(results: &[StudentResult]) -> Option<f64> {
    let (sum, count) = results
        .iter()
        .filter_map(|r| parse_marks(&r.marks))
        .fold((0.0, 0usize), |(sum, count), mark| (sum + mark, count + 1));

    (count > 0).then(|| round_one_decimal(sum / count as f64))
}

/// Groups results by exact term label and averages each group. Terms come
/// out in descending label order; results keep their input order.
pub fn aggregate_by_term(results: &[StudentResult]) -> Vec<TermSummary> {
    let mut groups: BTreeMap<&str, Vec<StudentResult>> = BTreeMap::new();
    for result in results {
        groups
            .entry(result.term.as_str())
            .or_default()
            .push(result.clone());
    }

    groups
        .into_iter()
        .rev()
        .map(|(term, results)| TermSummary {
            term: term.to_string(),
            overall_average: average(&results),
            results,
        })
        .collect()
}
