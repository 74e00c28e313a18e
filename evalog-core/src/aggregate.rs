//! Read-side aggregation over evaluation history.
//!
//! Every function here is pure over the slice it is given. Empty or fully-null
//! input produces empty results, never an error. Functions accept any slice of
//! `EvaluationRecord` or `&EvaluationRecord`, so filtered views can be passed on
//! without cloning.

use crate::record::{Accuracy, EvaluationRecord, MetricColumn};
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Added to response time before dividing, so instant answers stay finite.
pub const EFFICIENCY_TIME_OFFSET: f64 = 0.1;

/// Records whose accuracy equals `level`; `None` keeps everything.
pub fn filter_by_accuracy<R: Borrow<EvaluationRecord>>(
    records: &[R],
    level: Option<Accuracy>,
) -> Vec<&EvaluationRecord> {
    records
        .iter()
        .map(Borrow::borrow)
        .filter(|r| level.is_none() || r.is_correct == level)
        .collect()
}

/// Records that carry a human accuracy judgement.
pub fn evaluable<R: Borrow<EvaluationRecord>>(records: &[R]) -> Vec<&EvaluationRecord> {
    records
        .iter()
        .map(Borrow::borrow)
        .filter(|r| r.is_evaluable())
        .collect()
}

/// One 1-indexed page of `items`. Pages outside `1..=total_pages` are empty.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed for `count` items.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// Clamp a requested page into `[1, total]` (page 1 when there are no pages).
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

/// Count of evaluable records per accuracy label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccuracyDistribution {
    counts: BTreeMap<Accuracy, usize>,
}

impl AccuracyDistribution {
    pub fn get(&self, accuracy: Accuracy) -> usize {
        self.counts.get(&accuracy).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Labels with a non-zero count, in accuracy order.
    pub fn iter(&self) -> impl Iterator<Item = (Accuracy, usize)> + '_ {
        self.counts.iter().map(|(a, c)| (*a, *c))
    }
}

pub fn accuracy_distribution<R: Borrow<EvaluationRecord>>(records: &[R]) -> AccuracyDistribution {
    let mut counts = BTreeMap::new();
    for accuracy in records.iter().filter_map(|r| r.borrow().is_correct) {
        *counts.entry(accuracy).or_insert(0) += 1;
    }
    AccuracyDistribution { counts }
}

/// Descriptive statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: MetricColumn,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Count, mean, std, min, quartiles and max per column over its non-null
/// values. Columns without any value are left out.
pub fn describe_metrics<R: Borrow<EvaluationRecord>>(
    records: &[R],
    columns: &[MetricColumn],
) -> Vec<ColumnSummary> {
    columns
        .iter()
        .filter_map(|&column| {
            let values = column_values(records, column);
            summarize(column, values)
        })
        .collect()
}

fn column_values<R: Borrow<EvaluationRecord>>(records: &[R], column: MetricColumn) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| column.value(r.borrow()))
        .collect()
}

fn summarize(column: MetricColumn, values: Vec<f64>) -> Option<ColumnSummary> {
    let mean = mean(&values)?;
    let count = values.len();
    let std = (count > 1).then(|| {
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (count - 1) as f64).sqrt()
    });

    let mut sorted = values;
    sorted.sort_by(f64::total_cmp);

    Some(ColumnSummary {
        column,
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated quantile of non-empty sorted data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Per-accuracy-level column means.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMeans {
    pub accuracy: Accuracy,
    pub count: usize,
    /// `None` when no record in the group has a value for the column.
    pub means: Vec<(MetricColumn, Option<f64>)>,
}

impl GroupMeans {
    pub fn mean(&self, column: MetricColumn) -> Option<f64> {
        self.means
            .iter()
            .find(|(c, _)| *c == column)
            .and_then(|(_, m)| *m)
    }
}

/// Group evaluable records by accuracy and average each column per group.
pub fn means_by_accuracy_level<R: Borrow<EvaluationRecord>>(
    records: &[R],
    columns: &[MetricColumn],
) -> Vec<GroupMeans> {
    let mut groups: BTreeMap<Accuracy, Vec<&EvaluationRecord>> = BTreeMap::new();
    for record in records.iter().map(Borrow::borrow) {
        if let Some(accuracy) = record.is_correct {
            groups.entry(accuracy).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(accuracy, members)| GroupMeans {
            accuracy,
            count: members.len(),
            means: columns
                .iter()
                .map(|&column| (column, mean(&column_values(&members, column))))
                .collect(),
        })
        .collect()
}

/// A record's accuracy per unit of response time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyEntry {
    pub id: i64,
    pub accuracy: Accuracy,
    pub response_time: Option<f64>,
    pub efficiency: f64,
}

/// Top `top_n` evaluable records by `accuracy / (response_time + 0.1)`.
///
/// Missing response times count as zero. The sort is stable, so ties keep
/// their input order.
pub fn efficiency_ranking<R: Borrow<EvaluationRecord>>(
    records: &[R],
    top_n: usize,
) -> Vec<EfficiencyEntry> {
    let mut entries: Vec<EfficiencyEntry> = records
        .iter()
        .map(Borrow::borrow)
        .filter_map(|r| {
            let accuracy = r.is_correct?;
            let response_time = r.response_time.filter(|t| t.is_finite());
            Some(EfficiencyEntry {
                id: r.id,
                accuracy,
                response_time,
                efficiency: accuracy.score()
                    / (response_time.unwrap_or(0.0) + EFFICIENCY_TIME_OFFSET),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
    entries.truncate(top_n);
    entries
}

/// One point of a response-time versus metric scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimePoint {
    pub id: i64,
    pub response_time: f64,
    pub value: f64,
    pub accuracy: Accuracy,
}

/// Evaluable records that have both a response time and a `column` value.
pub fn response_time_pairs<R: Borrow<EvaluationRecord>>(
    records: &[R],
    column: MetricColumn,
) -> Vec<ResponseTimePoint> {
    records
        .iter()
        .map(Borrow::borrow)
        .filter_map(|r| {
            Some(ResponseTimePoint {
                id: r.id,
                response_time: r.response_time.filter(|t| !t.is_nan())?,
                value: column.value(r)?,
                accuracy: r.is_correct?,
            })
        })
        .collect()
}

/// The requested columns that have at least one non-null value.
pub fn available_columns<R: Borrow<EvaluationRecord>>(
    records: &[R],
    columns: &[MetricColumn],
) -> Vec<MetricColumn> {
    columns
        .iter()
        .copied()
        .filter(|c| records.iter().any(|r| c.value(r.borrow()).is_some()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;
    use pretty_assertions::assert_eq;

    fn with_scores(
        id: i64,
        is_correct: Option<f64>,
        bleu: Option<f64>,
        word_count: u64,
    ) -> EvaluationRecord {
        let mut r = record(id, is_correct, Some(1.0));
        r.bleu_score = bleu;
        r.word_count = word_count;
        r
    }

    #[test]
    fn test_filter_by_accuracy() {
        let records = vec![
            record(1, Some(1.0), None),
            record(2, Some(0.5), None),
            record(3, None, None),
            record(4, Some(1.0), None),
        ];
        let ids = |v: Vec<&EvaluationRecord>| v.iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(ids(filter_by_accuracy(&records, None)), vec![1, 2, 3, 4]);
        assert_eq!(
            ids(filter_by_accuracy(&records, Some(Accuracy::Accurate))),
            vec![1, 4]
        );
        assert!(filter_by_accuracy(&records, Some(Accuracy::Inaccurate)).is_empty());
    }

    #[test]
    fn test_paginate() {
        let items: Vec<usize> = (0..12).collect();
        assert_eq!(paginate(&items, 5, 1), &[0, 1, 2, 3, 4]);
        assert_eq!(paginate(&items, 5, 3), &[10, 11]);
        assert!(paginate(&items, 5, 4).is_empty());
        assert!(paginate(&items, 5, 0).is_empty());
        assert!(paginate(&items, 0, 1).is_empty());
    }

    #[test]
    fn test_page_helpers() {
        assert_eq!(total_pages(12, 5), 3);
        assert_eq!(total_pages(10, 5), 2);
        assert_eq!(total_pages(0, 5), 0);
        assert_eq!(clamp_page(9, 3), 3);
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(4, 0), 1);
    }

    #[test]
    fn test_accuracy_distribution_excludes_unjudged() {
        let records = vec![
            record(1, Some(1.0), None),
            record(2, Some(1.0), None),
            record(3, Some(0.5), None),
            record(4, None, None),
        ];
        let dist = accuracy_distribution(&records);
        assert_eq!(dist.get(Accuracy::Accurate), 2);
        assert_eq!(dist.get(Accuracy::Partial), 1);
        assert_eq!(dist.get(Accuracy::Inaccurate), 0);
        assert_eq!(dist.total(), 3);
        assert_eq!(
            dist.iter().collect::<Vec<_>>(),
            vec![(Accuracy::Accurate, 2), (Accuracy::Partial, 1)]
        );
    }

    #[test]
    fn test_describe_metrics() {
        let records = vec![
            with_scores(1, Some(1.0), Some(0.2), 10),
            with_scores(2, Some(0.5), None, 20),
            with_scores(3, Some(0.0), Some(0.4), 30),
            with_scores(4, None, Some(0.6), 40),
        ];
        let summary = describe_metrics(&records, &[MetricColumn::BleuScore, MetricColumn::WordCount]);
        assert_eq!(summary.len(), 2);

        let bleu = &summary[0];
        assert_eq!(bleu.column, MetricColumn::BleuScore);
        assert_eq!(bleu.count, 3);
        assert!((bleu.mean - 0.4).abs() < 1e-12);
        assert!((bleu.std.unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(bleu.min, 0.2);
        assert!((bleu.q25 - 0.3).abs() < 1e-12);
        assert!((bleu.median - 0.4).abs() < 1e-12);
        assert!((bleu.q75 - 0.5).abs() < 1e-12);
        assert_eq!(bleu.max, 0.6);

        let words = &summary[1];
        assert_eq!(words.count, 4);
        assert_eq!(words.mean, 25.0);
        assert_eq!(words.q25, 17.5);
    }

    #[test]
    fn test_describe_omits_all_null_column() {
        let records = vec![record(1, Some(1.0), None), record(2, None, None)];
        let summary = describe_metrics(
            &records,
            &[MetricColumn::SimilarityScore, MetricColumn::WordCount],
        );
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].column, MetricColumn::WordCount);
        assert_eq!(summary[0].std, Some(0.0));
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let records = vec![record(1, Some(1.0), Some(2.5))];
        let summary = describe_metrics(&records, &[MetricColumn::ResponseTime]);
        assert_eq!(summary[0].std, None);
        assert_eq!(summary[0].median, 2.5);
    }

    #[test]
    fn test_means_by_accuracy_level() {
        let records = vec![
            with_scores(1, Some(1.0), Some(0.8), 10),
            with_scores(2, Some(1.0), None, 30),
            with_scores(3, Some(0.0), None, 5),
            with_scores(4, None, Some(0.1), 100),
        ];
        let groups =
            means_by_accuracy_level(&records, &[MetricColumn::BleuScore, MetricColumn::WordCount]);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].accuracy, Accuracy::Accurate);
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].mean(MetricColumn::BleuScore), Some(0.8));
        assert_eq!(groups[0].mean(MetricColumn::WordCount), Some(20.0));

        assert_eq!(groups[1].accuracy, Accuracy::Inaccurate);
        assert_eq!(groups[1].mean(MetricColumn::BleuScore), None);
        assert_eq!(groups[1].mean(MetricColumn::WordCount), Some(5.0));
    }

    #[test]
    fn test_efficiency_ranking_prefers_fast_answers() {
        let records = vec![record(1, Some(1.0), Some(0.9)), record(2, Some(0.5), Some(0.0))];
        let ranking = efficiency_ranking(&records, 10);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].id, 2);
        assert!((ranking[0].efficiency - 5.0).abs() < 1e-12);
        assert_eq!(ranking[1].id, 1);
        assert!((ranking[1].efficiency - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_ranking_missing_time_and_ties() {
        let records = vec![
            record(1, Some(0.5), Some(1.9)),
            record(2, None, Some(0.1)),
            record(3, Some(1.0), None),
            record(4, Some(0.5), Some(1.9)),
        ];
        let ranking = efficiency_ranking(&records, 3);
        let ids: Vec<i64> = ranking.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 4]);
        assert!((ranking[0].efficiency - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_ranking_top_n_truncates() {
        let records: Vec<_> = (1..=5).map(|i| record(i, Some(1.0), Some(i as f64))).collect();
        assert_eq!(efficiency_ranking(&records, 2).len(), 2);
        assert!(efficiency_ranking(&records, 0).is_empty());
    }

    #[test]
    fn test_response_time_pairs() {
        let records = vec![
            with_scores(1, Some(1.0), Some(0.3), 1),
            with_scores(2, Some(1.0), None, 1),
            with_scores(3, None, Some(0.5), 1),
        ];
        let points = response_time_pairs(&records, MetricColumn::BleuScore);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].id, 1);
        assert_eq!(points[0].value, 0.3);
    }

    #[test]
    fn test_available_columns() {
        let records = vec![with_scores(1, Some(1.0), Some(0.3), 1)];
        assert_eq!(
            available_columns(&records, &MetricColumn::SCORES),
            vec![MetricColumn::BleuScore, MetricColumn::WordCount]
        );
    }

    #[test]
    fn test_empty_input() {
        let records: Vec<EvaluationRecord> = Vec::new();
        assert!(accuracy_distribution(&records).is_empty());
        assert!(describe_metrics(&records, &MetricColumn::ALL).is_empty());
        assert!(means_by_accuracy_level(&records, &MetricColumn::ALL).is_empty());
        assert!(efficiency_ranking(&records, 10).is_empty());
        assert!(paginate(&records, 5, 1).is_empty());
    }

    #[test]
    fn test_accepts_filtered_views() {
        let records = vec![record(1, Some(1.0), Some(1.0)), record(2, Some(0.0), Some(1.0))];
        let accurate = filter_by_accuracy(&records, Some(Accuracy::Accurate));
        let dist = accuracy_distribution(&accurate);
        assert_eq!(dist.total(), 1);
    }
}
