//! Plain-text rendering of records, metrics and statistics.

use evalog_core::aggregate::{
    AccuracyDistribution, ColumnSummary, EfficiencyEntry, GroupMeans, ResponseTimePoint,
};
use evalog_core::descriptions::MetricDescription;
use evalog_core::record::{EvaluationRecord, MetricColumn, TIMESTAMP_FORMAT};
use evalog_core::Metrics;
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

const BAR_WIDTH: usize = 40;
const WRAP_WIDTH: usize = 88;
const HEADING_CHARS: usize = 50;

pub fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

/// `"start - end / total"` for a 1-indexed page.
pub fn page_caption(page: usize, page_size: usize, shown: usize, total: usize) -> String {
    let start = (page - 1) * page_size + 1;
    format!("{} - {} / {}", start, start + shown - 1, total)
}

fn truncate_chars(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn wrapped(label: &str, text: &str) -> String {
    let options = textwrap::Options::new(WRAP_WIDTH)
        .initial_indent("    ")
        .subsequent_indent("    ");
    format!("  {label}\n{}\n", textwrap::fill(text, options))
}

pub fn history_entry(record: &EvaluationRecord) -> String {
    let mut out = String::new();
    let question = if record.question.is_empty() {
        "N/A".to_string()
    } else {
        truncate_chars(&record.question, HEADING_CHARS)
    };
    let _ = writeln!(
        out,
        "#{} {} - Q: {}",
        record.id,
        record.timestamp.format(TIMESTAMP_FORMAT),
        question
    );
    out.push_str(&wrapped("Q:", &record.question));
    out.push_str(&wrapped("A:", &record.answer));
    out.push_str(&wrapped("Feedback:", &record.feedback));
    if let Some(reference) = &record.correct_answer {
        out.push_str(&wrapped("Correct A:", reference));
    }
    let _ = writeln!(
        out,
        "  Accuracy {}  Response time {}s  Words {}",
        record
            .is_correct
            .map_or_else(|| "-".to_string(), |a| format!("{:.1}", a.score())),
        record
            .response_time
            .map_or_else(|| "-".to_string(), |t| format!("{t:.2}")),
        record.word_count
    );
    let _ = writeln!(
        out,
        "  BLEU {}  Similarity {}  Relevance {}",
        score(record.bleu_score),
        score(record.similarity_score),
        score(record.relevance_score)
    );
    out
}

pub fn metrics(metrics: &Metrics) -> String {
    format!(
        "BLEU        {:.4}\nSimilarity  {:.4}\nRelevance   {:.4}\nWord count  {}\n",
        metrics.bleu, metrics.similarity, metrics.relevance, metrics.word_count
    )
}

fn bar(value: f64, max: f64) -> String {
    let len = if max > 0.0 {
        ((value / max) * BAR_WIDTH as f64).round() as usize
    } else {
        0
    };
    "█".repeat(len.max(usize::from(value > 0.0)))
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

pub fn distribution(dist: &AccuracyDistribution) -> String {
    let max = dist.iter().map(|(_, c)| c).max().unwrap_or(0) as f64;
    let mut out = String::new();
    for (accuracy, count) in dist.iter() {
        let _ = writeln!(
            out,
            "{} {:>4} {}",
            pad(accuracy.label(), 10),
            count,
            bar(count as f64, max)
        );
    }
    out
}

/// Build an aligned table: first column left-aligned, the rest right-aligned.
fn table(header: &[String], rows: &[Vec<String>]) -> String {
    let columns = header.len();
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .chain(std::iter::once(&header[i]))
                .map(|c| c.width())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == 0 {
                    pad(cell, widths[i])
                } else {
                    let fill = widths[i].saturating_sub(cell.width());
                    format!("{}{cell}", " ".repeat(fill))
                }
            })
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

pub fn summary(summaries: &[ColumnSummary]) -> String {
    let mut header = vec![String::new()];
    header.extend(summaries.iter().map(|s| s.column.name().to_string()));

    let rows = vec![
        stat_row("count", summaries, |s| s.count.to_string()),
        stat_row("mean", summaries, |s| format!("{:.4}", s.mean)),
        stat_row("std", summaries, |s| score(s.std)),
        stat_row("min", summaries, |s| format!("{:.4}", s.min)),
        stat_row("25%", summaries, |s| format!("{:.4}", s.q25)),
        stat_row("50%", summaries, |s| format!("{:.4}", s.median)),
        stat_row("75%", summaries, |s| format!("{:.4}", s.q75)),
        stat_row("max", summaries, |s| format!("{:.4}", s.max)),
    ];
    table(&header, &rows)
}

fn stat_row(
    name: &str,
    summaries: &[ColumnSummary],
    value: impl Fn(&ColumnSummary) -> String,
) -> Vec<String> {
    let mut row = vec![name.to_string()];
    row.extend(summaries.iter().map(value));
    row
}

pub fn group_means(groups: &[GroupMeans], columns: &[MetricColumn]) -> String {
    let mut header = vec!["accuracy".to_string(), "n".to_string()];
    header.extend(columns.iter().map(|c| c.name().to_string()));

    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|g| {
            let mut row = vec![g.accuracy.label().to_string(), g.count.to_string()];
            row.extend(columns.iter().map(|&c| score(g.mean(c))));
            row
        })
        .collect();
    table(&header, &rows)
}

pub fn efficiency(entries: &[EfficiencyEntry]) -> String {
    let max = entries.first().map_or(0.0, |e| e.efficiency);
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "#{:<5} {:>8.4} {}",
            entry.id,
            entry.efficiency,
            bar(entry.efficiency, max)
        );
    }
    out
}

pub fn response_time_pairs(column: MetricColumn, points: &[ResponseTimePoint]) -> String {
    let header = vec![
        "id".to_string(),
        "response_time".to_string(),
        column.name().to_string(),
        "accuracy".to_string(),
    ];
    let rows: Vec<Vec<String>> = points
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                format!("{:.2}", p.response_time),
                format!("{:.4}", p.value),
                p.accuracy.label().to_string(),
            ]
        })
        .collect();
    table(&header, &rows)
}

pub fn descriptions(items: &[MetricDescription]) -> String {
    items
        .iter()
        .map(|d| wrapped(&format!("{} ({})", d.title, d.key), d.description))
        .collect::<Vec<_>>()
        .join("\n")
}
