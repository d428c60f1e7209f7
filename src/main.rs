use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use tracing::{Level, error, info};

use message_disentangler::DisentanglerConfig;
use message_disentangler::display::ui::{Display, render_score};
use message_disentangler::features::{FeatureGroup, FeatureSet};
use message_disentangler::models::{Community, Stats};
use message_disentangler::processing::{Disentangler, score_communities};
use message_disentangler::utils::file::{get_output_path, get_report_path, load_community, save_community};

const CONCURRENT_VALIDATIONS: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "message_disentangler")]
#[command(about = "Split chat channels into conversation threads")]
struct Cli {
    /// Log verbosity (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on a labelled community and label the messages of another.
    Predict {
        #[arg(long)]
        training: PathBuf,
        #[arg(long)]
        input: PathBuf,
        /// Defaults to `<input stem>_disentangled_<timestamp>.json`.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Evaluate feature groups against gold-labelled communities.
    Validate {
        #[arg(long)]
        training: PathBuf,
        #[arg(long, num_args = 1.., required = true)]
        input: Vec<PathBuf>,
        /// Comma separated: content, discourse, chat.
        #[arg(long, value_delimiter = ',')]
        groups: Vec<FeatureGroup>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Clustering F-score between two labelled copies of a community.
    Score {
        #[arg(long)]
        gold: PathBuf,
        #[arg(long)]
        predicted: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<DisentanglerConfig> {
    match path {
        Some(path) => DisentanglerConfig::load(path).with_context(|| format!("Invalid config {}", path.display())),
        None => Ok(DisentanglerConfig::default()),
    }
}

async fn predict(training: PathBuf, input: PathBuf, output: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let output = output.unwrap_or_else(|| get_output_path(&input));
    info!(input = %input.display(), output = %output.display(), "Starting prediction");

    let task_output = output.clone();
    let channel_stats = tokio::task::spawn_blocking(move || -> Result<_> {
        let training = load_community(&training)?;
        let mut community = load_community(&input)?;

        let mut disentangler = Disentangler::new(config)?;
        let train_time = disentangler.train(&training, FeatureSet::all()).context("Training failed")?;
        info!(seconds = train_time.as_secs_f64(), "Classifier trained");

        let channel_stats = disentangler.predict(&mut community).context("Prediction failed")?;
        save_community(&community, &task_output)?;
        Ok(channel_stats)
    })
    .await??;

    let mut stats = Stats::new(output.display().to_string());
    for channel in channel_stats {
        stats.add_channel_stats(channel);
    }
    stats.print_stats();
    println!("💾 Labelled community saved to: {}", output.display());
    Ok(())
}

async fn validate(training: PathBuf, inputs: Vec<PathBuf>, groups: Vec<FeatureGroup>, config: Option<PathBuf>) -> Result<()> {
    let config = Arc::new(load_config(config.as_deref())?);
    let training = Arc::new(load_community(&training)?);
    let groups = Arc::new(groups);
    info!(files = inputs.len(), groups = ?groups, "Starting validation");

    let results: Vec<(PathBuf, Result<Community>)> = stream::iter(inputs)
        .map(|input| {
            let config = Arc::clone(&config);
            let training = Arc::clone(&training);
            let groups = Arc::clone(&groups);
            async move {
                let path = input.clone();
                let result = tokio::task::spawn_blocking(move || -> Result<Community> {
                    let mut community = load_community(&input)?;
                    let mut disentangler = Disentangler::new((*config).clone())?;
                    disentangler
                        .validate(&training, &mut community, &groups)
                        .with_context(|| format!("Validation of {} failed", input.display()))?;
                    save_community(&community, &get_report_path(&input))?;
                    Ok(community)
                })
                .await
                .map_err(anyhow::Error::from)
                .and_then(|r| r);
                (path, result)
            }
        })
        .buffer_unordered(CONCURRENT_VALIDATIONS)
        .collect()
        .await;

    let mut failures = 0;
    for (path, result) in results {
        match result {
            Ok(community) => {
                Display::new(path.display().to_string(), &community).print()?;
                println!("💾 Report saved to: {}", get_report_path(&path).display());
            }
            Err(e) => {
                failures += 1;
                error!(file = %path.display(), "{e:#}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} validation run(s) failed");
    }
    Ok(())
}

fn score(gold: &Path, predicted: &Path) -> Result<()> {
    let gold_community = load_community(gold)?;
    let predicted_community = load_community(predicted)?;
    let score = score_communities(&gold_community, &predicted_community).context("Scoring failed")?;
    render_score(
        &mut std::io::stdout(),
        &gold.display().to_string(),
        &predicted.display().to_string(),
        score,
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_max_level(cli.log_level).init();

    match cli.command {
        Command::Predict {
            training,
            input,
            output,
            config,
        } => predict(training, input, output, config).await,
        Command::Validate {
            training,
            input,
            groups,
            config,
        } => validate(training, input, groups, config).await,
        Command::Score { gold, predicted } => score(&gold, &predicted),
    }
}
