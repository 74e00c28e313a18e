//! Subcommand handlers.

use crate::render;
use crate::session::{Feedback, Session};
use crate::{Commands, ConfigAction};
use anyhow::Context as _;
use dialoguer::{Confirm, Input, Select};
use evalog_core::aggregate::{
    self, AccuracyDistribution, ColumnSummary, EfficiencyEntry, GroupMeans, ResponseTimePoint,
};
use evalog_core::config::GenerationConfig;
use evalog_core::descriptions::METRIC_DESCRIPTIONS;
use evalog_core::record::{Accuracy, EvaluationRecord, MetricColumn};
use evalog_core::{EvalogConfig, OpenAiCompatibleGenerator, ScoreCalculator, TextGenerator};
use evalog_store::{EvalStore, create_sample_data, ensure_initial_data};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static GENERATOR: OnceLock<OpenAiCompatibleGenerator> = OnceLock::new();

/// The process-wide generation client, built on first use.
fn generator(config: &GenerationConfig) -> anyhow::Result<&'static OpenAiCompatibleGenerator> {
    if let Some(generator) = GENERATOR.get() {
        return Ok(generator);
    }
    let generator = OpenAiCompatibleGenerator::new(config)?;
    Ok(GENERATOR.get_or_init(|| generator))
}

/// History filter choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HistoryFilter {
    All,
    Correct,
    Partial,
    Incorrect,
}

impl HistoryFilter {
    pub fn accuracy(self) -> Option<Accuracy> {
        match self {
            HistoryFilter::All => None,
            HistoryFilter::Correct => Some(Accuracy::Accurate),
            HistoryFilter::Partial => Some(Accuracy::Partial),
            HistoryFilter::Incorrect => Some(Accuracy::Inaccurate),
        }
    }
}

/// Resolved configuration shared by every handler.
pub struct Context {
    config: EvalogConfig,
    workspace: PathBuf,
}

impl Context {
    pub fn new(config: EvalogConfig, workspace: PathBuf) -> Self {
        Self { config, workspace }
    }

    fn db_path(&self) -> PathBuf {
        resolve_path(&self.workspace, &self.config.store.db_path)
    }

    fn open_store(&self) -> anyhow::Result<EvalStore> {
        let path = self.db_path();
        EvalStore::open(&path)
            .with_context(|| format!("Failed to open database {}", path.display()))
    }

    fn calculator(&self) -> anyhow::Result<ScoreCalculator> {
        let mut scoring = self.config.scoring.clone();
        scoring.lexicon_path = scoring
            .lexicon_path
            .map(|p| resolve_path(&self.workspace, &p));
        ScoreCalculator::from_config(&scoring).context("Failed to set up the scorer")
    }

    /// Seed an empty store when configured to.
    fn seed_if_empty(&self, store: &EvalStore) -> anyhow::Result<()> {
        if !self.config.history.seed_when_empty {
            return Ok(());
        }
        let added = ensure_initial_data(store, &self.calculator()?)?;
        if added > 0 {
            println!("The database was empty; added {added} sample evaluations.\n");
        }
        Ok(())
    }
}

fn resolve_path(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

pub async fn handle_command(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Ask { question, once } => handle_ask(ctx, question, once).await,
        Commands::Score {
            candidate,
            reference,
            json,
        } => handle_score(ctx, &candidate, reference.as_deref(), json),
        Commands::History { filter, page } => handle_history(ctx, filter, page),
        Commands::Stats { top, metric, json } => handle_stats(ctx, top, metric, json),
        Commands::Seed => handle_seed(ctx),
        Commands::Clear { yes } => handle_clear(ctx, yes),
        Commands::Count => handle_count(ctx),
        Commands::Metrics => {
            println!("{}", render::descriptions(METRIC_DESCRIPTIONS));
            Ok(())
        }
        Commands::Config { action } => handle_config(ctx, action),
    }
}

async fn handle_ask(ctx: &Context, question: Option<String>, once: bool) -> anyhow::Result<()> {
    let calc = ctx.calculator()?;
    let store = ctx.open_store()?;
    ctx.seed_if_empty(&store)?;
    let generator = generator(&ctx.config.generation)?;

    let mut session = Session::new();
    let mut pending = question;
    loop {
        let question = match pending.take() {
            Some(q) => q,
            None => Input::<String>::new()
                .with_prompt("Question")
                .interact_text()?,
        };
        if let Err(e) = session.submit_question(&question) {
            println!("  {e}");
            continue;
        }

        println!("\n  Generating response from {}...", generator.model_name());
        let generation = generator.generate(&question).await;
        println!("\nResponse:\n{}", textwrap::fill(&generation.text, 88));
        println!("Response time: {:.2} seconds\n", generation.elapsed_secs);
        session.receive_response(generation)?;

        let record = session.submit_feedback(prompt_feedback()?)?;
        let stored = store.insert(&record, &calc)?;
        session.mark_saved(stored.id)?;
        println!("\nFeedback has been saved (#{}).", stored.id);
        println!(
            "  BLEU {}  Similarity {}  Relevance {}  Words {}\n",
            render::score(stored.bleu_score),
            render::score(stored.similarity_score),
            render::score(stored.relevance_score),
            stored.word_count
        );

        if once
            || !Confirm::new()
                .with_prompt("Next question?")
                .default(true)
                .interact()?
        {
            return Ok(());
        }
        session.next_question()?;
    }
}

fn prompt_feedback() -> anyhow::Result<Feedback> {
    let options: Vec<&str> = Accuracy::ALL.iter().map(|a| a.feedback_option()).collect();
    let selection = Select::new()
        .with_prompt("How was the answer?")
        .items(&options)
        .default(0)
        .interact()?;
    let correct_answer: String = Input::new()
        .with_prompt("More accurate answer (optional)")
        .allow_empty(true)
        .interact_text()?;
    let comment: String = Input::new()
        .with_prompt("Comment (optional)")
        .allow_empty(true)
        .interact_text()?;

    Ok(Feedback {
        accuracy: Accuracy::ALL[selection],
        correct_answer: Some(correct_answer),
        comment: Some(comment),
    })
}

fn handle_score(
    ctx: &Context,
    candidate: &str,
    reference: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let metrics = ctx.calculator()?.compute_metrics(candidate, reference);
    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print!("{}", render::metrics(&metrics));
    }
    Ok(())
}

fn handle_history(ctx: &Context, filter: HistoryFilter, page: usize) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    ctx.seed_if_empty(&store)?;
    let records = store.select_all()?;
    if records.is_empty() {
        println!("There is no chat history yet.");
        return Ok(());
    }

    let filtered = aggregate::filter_by_accuracy(&records, filter.accuracy());
    if filtered.is_empty() {
        println!("No history matches the selected criteria.");
        return Ok(());
    }

    let page_size = ctx.config.history.page_size.max(1);
    let pages = aggregate::total_pages(filtered.len(), page_size);
    let current = aggregate::clamp_page(page, pages);
    if current != page {
        tracing::debug!(requested = page, shown = current, "Page clamped");
    }

    let items = aggregate::paginate(&filtered, page_size, current);
    for record in items {
        println!("{}", render::history_entry(record));
    }
    println!(
        "{}  (page {current}/{pages})",
        render::page_caption(current, page_size, items.len(), filtered.len())
    );
    Ok(())
}

/// Everything the stats command reports.
#[derive(Debug, Serialize)]
struct StatsReport {
    evaluable: usize,
    distribution: AccuracyDistribution,
    columns: Vec<MetricColumn>,
    summary: Vec<ColumnSummary>,
    means_by_accuracy: Vec<GroupMeans>,
    efficiency: Vec<EfficiencyEntry>,
    response_time_pairs: Vec<(MetricColumn, Vec<ResponseTimePoint>)>,
}

fn stats_report(
    records: &[EvaluationRecord],
    top_n: usize,
    metric: Option<MetricColumn>,
) -> StatsReport {
    let judged = aggregate::evaluable(records);
    let columns = aggregate::available_columns(&judged, &MetricColumn::ALL);
    let scatter_columns = match metric {
        Some(column) => vec![column],
        None => aggregate::available_columns(&judged, &MetricColumn::SCORES),
    };

    StatsReport {
        evaluable: judged.len(),
        distribution: aggregate::accuracy_distribution(&judged),
        summary: aggregate::describe_metrics(&judged, &columns),
        means_by_accuracy: aggregate::means_by_accuracy_level(&judged, &columns),
        efficiency: aggregate::efficiency_ranking(&judged, top_n),
        response_time_pairs: scatter_columns
            .into_iter()
            .map(|c| (c, aggregate::response_time_pairs(&judged, c)))
            .collect(),
        columns,
    }
}

fn handle_stats(
    ctx: &Context,
    top: Option<usize>,
    metric: Option<MetricColumn>,
    json: bool,
) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    ctx.seed_if_empty(&store)?;
    let records = store.select_all()?;
    let report = stats_report(
        &records,
        top.unwrap_or(ctx.config.history.efficiency_top_n),
        metric,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    if report.evaluable == 0 {
        println!("No evaluable data available.");
        return Ok(());
    }

    println!("Accuracy distribution ({} judged)", report.evaluable);
    println!("{}", render::distribution(&report.distribution));

    for (column, points) in &report.response_time_pairs {
        println!("Response time vs {column}");
        if points.is_empty() {
            println!("  No records have both values.\n");
        } else {
            println!("{}", render::response_time_pairs(*column, points));
        }
    }

    if !report.summary.is_empty() {
        println!("Metric statistics");
        println!("{}", render::summary(&report.summary));
        println!("Mean by accuracy level");
        println!(
            "{}",
            render::group_means(&report.means_by_accuracy, &report.columns)
        );
    }

    println!("Efficiency: accuracy / (response time + 0.1)");
    print!("{}", render::efficiency(&report.efficiency));
    Ok(())
}

fn handle_seed(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let added = create_sample_data(&store, &ctx.calculator()?)?;
    println!(
        "{added} sample evaluations added (total: {}).",
        store.count()?
    );
    Ok(())
}

fn handle_clear(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    let mut store = ctx.open_store()?;
    let count = store.count()?;
    if count == 0 {
        println!("The database is already empty.");
        return Ok(());
    }

    // First call only arms the store.
    store.clear_all()?;
    println!("This deletes all {count} records.");
    let confirmed = yes
        || Confirm::new()
            .with_prompt("Delete everything?")
            .default(false)
            .interact()?;
    if !confirmed {
        store.cancel_clear();
        println!("Nothing was deleted.");
        return Ok(());
    }

    if store.clear_all()? {
        println!("The database has been cleared.");
    }
    Ok(())
}

fn handle_count(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    println!(
        "{} records in {}",
        store.count()?,
        ctx.db_path().display()
    );
    Ok(())
}

fn handle_config(ctx: &Context, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = ctx.workspace.join(".evalog");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&EvalogConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(&ctx.config)?);
            Ok(())
        }
    }
}
