//! Command line front end for the legality pipeline.
//!
//! ```text
//! legality enumerate --output classes.jsonl
//! legality sample --input classes.jsonl --output results.jsonl --workers 8
//! legality merge --input-dir legality_parts --output results.jsonl
//! legality analyze --material-file classes.jsonl --results-file results.jsonl
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use legality::SamplingRun;
use legality_config::{SamplingConfig, WorkerCount};
use legality_core::{ClassEnumerator, Material, Profile};
use legality_sampler::table::{read_material_table, MaterialRecord, TableWriter};
use legality_sampler::{analyze_files, merge_dir, select_classes, Analysis, MergeReport};
use tracing::info;

/// Classes between two `enumerate_progress` events.
const PROGRESS_EVERY: usize = 500;

#[derive(Parser, Debug)]
#[command(
    name = "legality",
    author,
    version,
    about = "Estimate how many chess diagrams are legal positions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enumerate material classes with their diagram counts
    Enumerate(EnumerateArgs),

    /// Estimate legality ratios for a range of material classes
    Sample(SampleArgs),

    /// Merge partial observation tables found under a directory
    Merge(MergeArgs),

    /// Combine classes and observations into global estimates
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug)]
pub struct EnumerateArgs {
    /// Material table to write
    #[arg(short, long, value_name = "FILE", default_value = "material_classes.jsonl")]
    pub output: PathBuf,

    /// Per-side piece limits as a compact code, e.g. K1Q1R2B2N2P8
    #[arg(long, value_name = "CODE", conflicts_with = "promotions")]
    pub limits: Option<Material>,

    /// Stop after this many classes
    #[arg(long, value_name = "INT")]
    pub max_classes: Option<usize>,

    /// Use the promotion-extended limits (Q9 R10 B10 N10)
    #[arg(long)]
    pub promotions: bool,

    /// Cap on the combined piece count
    #[arg(long, value_name = "INT")]
    pub total_cap: Option<u32>,

    /// Cap on each side's piece count
    #[arg(long, value_name = "INT")]
    pub per_side_cap: Option<u32>,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// Material table produced by `enumerate`
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Merged observation table
    #[arg(short, long, value_name = "FILE", default_value = "legality_results.jsonl")]
    pub output: PathBuf,

    /// Directory holding per-shard artifacts
    #[arg(long, value_name = "DIR", default_value = "legality_parts")]
    pub work_dir: PathBuf,

    /// First class index, after ordering by diagram count
    #[arg(long, value_name = "INT", default_value_t = 0)]
    pub start_id: usize,

    /// One past the last class index; the whole table when absent
    #[arg(long, value_name = "INT")]
    pub end_id: Option<usize>,

    /// Number of shards
    #[arg(long, value_name = "INT")]
    pub shards: Option<usize>,

    /// Worker threads
    #[arg(short, long, value_name = "INT")]
    pub workers: Option<usize>,

    /// Sample at most this many classes
    #[arg(long, value_name = "INT")]
    pub max_classes: Option<usize>,

    /// Random seed for reproducible runs
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Sampling configuration (TOML, or YAML by extension)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Reject pawns on the first or last rank
    #[arg(long)]
    pub strict_backrank: bool,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Directory searched recursively for partial tables
    #[arg(long, value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Merged observation table
    #[arg(short, long, value_name = "FILE", default_value = "legality_results.jsonl")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[arg(long, value_name = "FILE", default_value = "material_classes.jsonl")]
    pub material_file: PathBuf,

    #[arg(long, value_name = "FILE", default_value = "legality_results.jsonl")]
    pub results_file: PathBuf,

    /// Per-class analysis table
    #[arg(short, long, value_name = "FILE", default_value = "legality_analysis.jsonl")]
    pub output: PathBuf,
}

/// Dispatches a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Enumerate(args) => {
            enumerate(&args)?;
        }
        Commands::Sample(args) => {
            // Completed shards are already merged; failed ones resume on rerun.
            let run = sample(&args)?;
            run.summary.check().wrap_err_with(|| {
                format!(
                    "{} shard(s) failed; rerun with --work-dir {} to resume",
                    run.summary.failed(),
                    args.work_dir.display()
                )
            })?;
        }
        Commands::Merge(args) => {
            merge(&args)?;
        }
        Commands::Analyze(args) => {
            let analysis = analyze(&args)?;
            println!("{}", analysis.summary);
        }
    }
    Ok(())
}

/// Writes the material table and returns the number of classes written.
pub fn enumerate(args: &EnumerateArgs) -> Result<usize> {
    let mut enumerator = match (args.limits, args.promotions) {
        (Some(limits), _) => ClassEnumerator::new(limits),
        (None, true) => ClassEnumerator::for_profile(Profile::PromotionExtended),
        (None, false) => ClassEnumerator::for_profile(Profile::NoPromotion),
    };
    if let Some(cap) = args.total_cap {
        enumerator = enumerator.with_total_cap(cap);
    }
    if let Some(cap) = args.per_side_cap {
        enumerator = enumerator.with_per_side_cap(cap);
    }

    let mut writer = TableWriter::create(&args.output)?;
    let limit = args.max_classes.unwrap_or(usize::MAX);
    for class in enumerator.iter().take(limit) {
        writer.write(&MaterialRecord::from(&class))?;
        if writer.rows() % PROGRESS_EVERY == 0 {
            info!(event = "enumerate_progress", classes = writer.rows());
        }
    }
    let classes = writer.finish()?;
    info!(
        event = "enumerate_end",
        classes,
        output = %args.output.display(),
    );
    Ok(classes)
}

/// Samples the selected classes and merges the shard artifacts.
pub fn sample(args: &SampleArgs) -> Result<SamplingRun> {
    let config = sampling_config(args)?;
    let classes = read_material_table(&args.input)
        .wrap_err_with(|| format!("cannot read material table {}", args.input.display()))?;
    let classes = select_classes(classes, args.start_id, args.end_id, args.max_classes)?;
    let run = legality::sample_and_merge(config, &classes, &args.work_dir, &args.output)?;
    Ok(run)
}

pub fn merge(args: &MergeArgs) -> Result<MergeReport> {
    Ok(merge_dir(&args.input_dir, &args.output)?)
}

pub fn analyze(args: &AnalyzeArgs) -> Result<Analysis> {
    let analysis = analyze_files(&args.material_file, &args.results_file, &args.output)
        .wrap_err_with(|| {
            format!(
                "cannot analyze material table {}",
                args.material_file.display()
            )
        })?;
    Ok(analysis)
}

/// Loads the configuration file, if any, and applies command line overrides.
fn sampling_config(args: &SampleArgs) -> Result<SamplingConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SamplingConfig::default(),
    };
    if let Some(seed) = args.seed {
        config = config.with_random_seed(seed);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(WorkerCount::Count(workers));
    }
    if let Some(shards) = args.shards {
        config = config.with_shards(shards);
    }
    if args.strict_backrank {
        config = config.with_tolerate_backrank_pawns(false);
    }
    Ok(config)
}

fn load_config(path: &Path) -> Result<SamplingConfig> {
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let config = if yaml {
        SamplingConfig::from_yaml_file(path)
    } else {
        SamplingConfig::from_toml_file(path)
    };
    config.wrap_err_with(|| format!("invalid sampling config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_sample_overrides() {
        let cli = Cli::try_parse_from([
            "legality",
            "sample",
            "--input",
            "classes.jsonl",
            "--start-id",
            "3",
            "--end-id",
            "9",
            "--workers",
            "2",
            "--seed",
            "42",
            "--strict-backrank",
        ])
        .unwrap();
        let Commands::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(args.start_id, 3);
        assert_eq!(args.end_id, Some(9));
        assert_eq!(args.work_dir, PathBuf::from("legality_parts"));

        let config = sampling_config(&args).unwrap();
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.workers, WorkerCount::Count(2));
        assert!(!config.tolerate_backrank_pawns);
    }

    #[test]
    fn test_parses_compact_limits() {
        let cli = Cli::try_parse_from(["legality", "enumerate", "--limits", "K1Q1R2"]).unwrap();
        let Commands::Enumerate(args) = cli.command else {
            panic!("expected enumerate");
        };
        let limits = args.limits.unwrap();
        assert_eq!(limits.total(), 4);
    }

    #[test]
    fn test_limits_conflict_with_promotions() {
        let parsed = Cli::try_parse_from([
            "legality",
            "enumerate",
            "--limits",
            "K1Q1",
            "--promotions",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_sample_requires_input() {
        assert!(Cli::try_parse_from(["legality", "sample"]).is_err());
    }

    #[test]
    fn test_yaml_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sampling.yaml");
        std::fs::write(&path, "initial_sizes: [10, 20]\nmax_sample: 80\n").unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.initial_sizes, vec![10, 20]);
        assert_eq!(config.max_sample, 80);
    }
}
