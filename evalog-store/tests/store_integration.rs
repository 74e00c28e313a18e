//! On-disk store tests: persistence across reopen and aggregation over seeded data.

use evalog_core::ScoreCalculator;
use evalog_core::aggregate::{
    accuracy_distribution, describe_metrics, efficiency_ranking, evaluable, filter_by_accuracy,
    means_by_accuracy_level,
};
use evalog_core::record::{Accuracy, MetricColumn, NewRecord};
use evalog_store::{EvalStore, create_sample_data};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("chat_feedback.db");
    let calc = ScoreCalculator::default();

    {
        let store = EvalStore::open(&path).unwrap();
        store
            .insert(
                &NewRecord {
                    question: "q".into(),
                    answer: "rust is fast".into(),
                    feedback: "correct".into(),
                    correct_answer: Some("rust is fast and safe".into()),
                    is_correct: Some(Accuracy::Accurate),
                    response_time: Some(0.4),
                },
                &calc,
            )
            .unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
    }

    let reopened = EvalStore::open(&path).unwrap();
    let records = reopened.select_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].answer, "rust is fast");
    assert_eq!(records[0].relevance_score, Some(0.6));
}

#[test]
fn seeded_history_aggregates() {
    let store = EvalStore::open_in_memory().unwrap();
    let calc = ScoreCalculator::default();
    create_sample_data(&store, &calc).unwrap();

    let records = store.select_all().unwrap();
    let judged = evaluable(&records);
    assert_eq!(judged.len(), 10);

    let dist = accuracy_distribution(&judged);
    assert_eq!(dist.get(Accuracy::Accurate), 4);
    assert_eq!(dist.get(Accuracy::Partial), 6);
    assert_eq!(dist.get(Accuracy::Inaccurate), 0);

    let summary = describe_metrics(&judged, &MetricColumn::ALL);
    assert_eq!(summary.len(), MetricColumn::ALL.len());
    for column in &summary {
        assert_eq!(column.count, 10);
        assert!(column.min <= column.median && column.median <= column.max);
    }

    let groups = means_by_accuracy_level(&judged, &MetricColumn::SCORES);
    assert_eq!(groups.len(), 2);

    let top = efficiency_ranking(&judged, 3);
    assert_eq!(top.len(), 3);
    // 1.0 / (0.9 + 0.1) is the best ratio in the sample set.
    let streamlit = records
        .iter()
        .find(|r| r.question == "What is Streamlit?")
        .unwrap();
    assert_eq!(top[0].id, streamlit.id);

    assert_eq!(filter_by_accuracy(&records, Some(Accuracy::Accurate)).len(), 4);
}

#[test]
fn clear_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clear.db");
    let calc = ScoreCalculator::default();

    let mut store = EvalStore::open(&path).unwrap();
    create_sample_data(&store, &calc).unwrap();
    assert!(!store.clear_all().unwrap());
    assert!(store.clear_all().unwrap());
    drop(store);

    assert_eq!(EvalStore::open(&path).unwrap().count().unwrap(), 0);
}
