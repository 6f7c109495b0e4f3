//! clusterlens - cluster quality metrics and keyword rankings from the command line

use anyhow::bail;
use clap::Parser;
use clusterlens::{
    compute_cluster_metrics, compute_top_keywords,
    config::{load_labels_file, AppConfig},
    loader::{
        create_feature_source, load_division_rows, load_item_keywords, AssignmentSource,
        FeatureSourceKind, JsonAssignmentSource,
    },
    logging,
    metrics::count_unlisted,
    report::{render_keyword_table, render_metrics_table, to_json, OutputFormat},
    Database,
};
use std::path::PathBuf;

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Compute intra-cluster dispersion, inter-cluster distance and size per label
    Metrics {
        /// Single JSON document with user_id, user_latent_feature and user_interest
        #[arg(long, conflicts_with_all = ["features", "from_db"])]
        input: Option<PathBuf>,
        /// JSON document with user_id and user_latent_feature
        #[arg(long, requires = "predictions", conflicts_with = "from_db")]
        features: Option<PathBuf>,
        /// JSON object mapping user_id to {user_interest}
        #[arg(long, requires = "features")]
        predictions: Option<PathBuf>,
        /// Read items from the user_division table
        #[arg(long)]
        from_db: bool,
        /// JSON array of labels (overrides the configured labels)
        #[arg(long)]
        labels_file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Replace the cluster_metrics table with the results
        #[arg(long)]
        persist: bool,
    },
    /// Rank the most frequent keywords per cluster index
    Keywords {
        /// JSON document with user_id, top_words and top_words_counts
        #[arg(long)]
        keywords: PathBuf,
        /// JSON document with user_id and user_interest_index
        #[arg(long, conflicts_with = "from_db")]
        assignments: Option<PathBuf>,
        /// Read assignments from the user_division table
        #[arg(long)]
        from_db: bool,
        /// Keywords kept per cluster
        #[arg(long)]
        top_n: Option<usize>,
        /// Number of cluster indices
        #[arg(long)]
        cluster_count: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Replace the top_keywords table with the results
        #[arg(long)]
        persist: bool,
    },
    /// Load a division JSON document into the user_division table
    Import {
        /// JSON document with user_id, user_latent_feature, user_interest
        /// and optional user_interest_index
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Parser, Debug)]
#[command(name = "clusterlens")]
#[command(version)]
#[command(about = "Cluster quality metrics and per-cluster keyword rankings", long_about = None)]
struct Args {
    /// Configuration file path (overrides defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database path (default: platform data dir/clusterlens.db)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write logs to the default log file
    #[arg(long)]
    log: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(path) = args.db_path {
        config.database_path = path;
    }

    let log_file = args
        .log_file
        .or_else(|| config.log_file.clone())
        .or_else(|| args.log.then(logging::default_log_path));
    logging::init_logging(args.verbose, config.debug, log_file.as_deref())?;

    match &args.config {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::debug!("Using config from {:?} or defaults", AppConfig::config_dir()),
    }
    tracing::debug!(
        "{} labels, cluster_count {}, top_n {}",
        config.labels.len(),
        config.cluster_count,
        config.top_n
    );

    match args.command {
        Command::Metrics {
            input,
            features,
            predictions,
            from_db,
            labels_file,
            format,
            persist,
        } => {
            let kind = match (input, features, predictions) {
                (Some(input), _, _) => FeatureSourceKind::Json(input),
                (None, Some(features), Some(predictions)) => FeatureSourceKind::Paired {
                    features,
                    predictions,
                },
                _ if from_db => FeatureSourceKind::Database,
                _ => bail!("no feature source: use --input, --features/--predictions or --from-db"),
            };
            let labels = match labels_file {
                Some(path) => load_labels_file(path)?,
                None => config.labels.clone(),
            };
            run_metrics(&config, kind, labels, format, persist).await
        }
        Command::Keywords {
            keywords,
            assignments,
            from_db,
            top_n,
            cluster_count,
            format,
            persist,
        } => {
            if let Some(n) = top_n {
                config.top_n = n;
            }
            if let Some(count) = cluster_count {
                config.cluster_count = count;
            }
            config.validate()?;
            config.warn_on_namespace_mismatch();

            run_keywords(&config, keywords, assignments, from_db, format, persist).await
        }
        Command::Import { input } => {
            let rows = load_division_rows(&input).await?;
            let db = Database::new(&config.database_path).await?;
            db.insert_user_division(&rows).await?;
            tracing::info!(
                "Imported {} items into {:?}",
                rows.len(),
                config.database_path
            );
            Ok(())
        }
    }
}

async fn run_metrics(
    config: &AppConfig,
    kind: FeatureSourceKind,
    labels: Vec<String>,
    format: OutputFormat,
    persist: bool,
) -> anyhow::Result<()> {
    let needs_db = persist || matches!(kind, FeatureSourceKind::Database);
    let db = if needs_db {
        tracing::info!("Opening database at {:?}", config.database_path);
        Some(Database::new(&config.database_path).await?)
    } else {
        None
    };

    let source = create_feature_source(kind, db.clone())?;
    tracing::info!("Loading features from {}", source.describe());
    let records = source.load_features().await?;

    let unlisted = count_unlisted(&records, &labels);
    if unlisted > 0 {
        tracing::warn!(
            "{} of {} records carry a label outside the label list and are ignored",
            unlisted,
            records.len()
        );
    }

    let metrics = compute_cluster_metrics(&records, &labels)?;

    match format {
        OutputFormat::Table => print!("{}", render_metrics_table(&metrics)),
        OutputFormat::Json => println!("{}", to_json(&metrics)?),
    }

    if let (true, Some(db)) = (persist, db) {
        db.replace_cluster_metrics(&metrics).await?;
    }

    Ok(())
}

async fn run_keywords(
    config: &AppConfig,
    keywords: PathBuf,
    assignments: Option<PathBuf>,
    from_db: bool,
    format: OutputFormat,
    persist: bool,
) -> anyhow::Result<()> {
    let db = if from_db || persist {
        tracing::info!("Opening database at {:?}", config.database_path);
        Some(Database::new(&config.database_path).await?)
    } else {
        None
    };

    let source: Box<dyn AssignmentSource> = match (assignments, &db) {
        (Some(path), _) => Box::new(JsonAssignmentSource::new(path)),
        (None, Some(db)) if from_db => Box::new(db.clone()),
        _ => bail!("no assignment source: use --assignments or --from-db"),
    };
    tracing::info!("Loading assignments from {}", source.describe());
    let item_cluster_index = source.load_assignments().await?;
    let item_keywords = load_item_keywords(&keywords).await?;

    let rankings = compute_top_keywords(
        &item_cluster_index,
        &item_keywords,
        config.cluster_count,
        config.top_n,
    )?;

    match format {
        OutputFormat::Table => print!(
            "{}",
            render_keyword_table(&rankings, &config.labels, config.top_n)
        ),
        OutputFormat::Json => println!("{}", to_json(&rankings)?),
    }

    if let (true, Some(db)) = (persist, db) {
        db.replace_top_keywords(&rankings).await?;
    }

    Ok(())
}
