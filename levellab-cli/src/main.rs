//! LevelLab CLI: parameter search, signal and feature export, synthetic data.
//!
//! Commands:
//! - `search`: run a search from a TOML config and save its artifacts
//! - `signals`: classify and score one parameter pair, write the run as CSV
//! - `features`: compute registered features and write them as CSV
//! - `synth`: generate a synthetic series as CSV

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use levellab_core::data::{write_bars, SyntheticShape, SyntheticSource};
use levellab_core::domain::{PriceBar, ValidationMode};
use levellab_core::features::{self, FeatureOptions, SupportResistanceOptions, FEATURES};
use levellab_core::levels::PriceField;
use levellab_core::objective::{Objective, PipelineConfig};
use levellab_core::scoring::ScoreMethod;
use levellab_core::signals::{ClassifierKind, TieBreak};
use levellab_runner::{
    export_signals_csv, run_search, save_artifacts, DataConfig, SearchConfig, SearchReport,
    SyntheticConfig,
};

#[derive(Parser)]
#[command(
    name = "levellab",
    about = "LevelLab CLI: support/resistance signal search"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a parameter search from a TOML config file.
    Search {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the config's output directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the report without writing artifacts.
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },
    /// Classify and score one parameter pair; write the signalled run as CSV.
    Signals {
        #[command(flatten)]
        data: DataArgs,

        /// Rolling window size.
        #[arg(long)]
        window: f64,

        /// Level shift in bars.
        #[arg(long, default_value_t = 1.0)]
        bias: f64,

        /// breakout or rebound.
        #[arg(long, default_value = "breakout")]
        classifier: String,

        /// prefer_sell, prefer_buy or hold.
        #[arg(long, default_value = "prefer_sell")]
        tie_break: String,

        /// percentage or accumulated_price_change.
        #[arg(long, default_value = "percentage")]
        score: String,

        /// Reject non-integer or out-of-range parameters instead of coercing.
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Output CSV path. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compute registered features and write bars plus feature columns as CSV.
    Features {
        #[command(flatten)]
        data: DataArgs,

        /// Features to compute. Defaults to all registered features.
        #[arg(long = "feature")]
        selected: Vec<String>,

        /// List registered features and exit.
        #[arg(long, default_value_t = false)]
        list: bool,

        #[command(flatten)]
        support_resistance: SupportResistanceArgs,

        /// Output CSV path. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a synthetic OHLC series as CSV.
    Synth {
        /// random_walk or sine.
        #[arg(long, default_value = "random_walk")]
        shape: String,

        #[arg(long, default_value_t = 500)]
        bars: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        /// Random-walk step volatility.
        #[arg(long, default_value_t = 0.02)]
        volatility: f64,

        /// Sine period in bars.
        #[arg(long, default_value_t = 50.0)]
        period: f64,

        /// Sine amplitude.
        #[arg(long, default_value_t = 10.0)]
        amplitude: f64,

        /// Output CSV path. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Where bars come from: a CSV file or directory, else a synthetic series.
#[derive(Args)]
struct DataArgs {
    /// CSV file, or a directory holding `<symbol>.csv`.
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long, default_value = "SYNTH")]
    symbol: String,

    /// Keep only the last N bars.
    #[arg(long)]
    count: Option<usize>,

    /// Field delimiter, e.g. ";" or "\t".
    #[arg(long)]
    delimiter: Option<String>,

    /// Synthetic bar count when no CSV is given.
    #[arg(long, default_value_t = 500)]
    synthetic_bars: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Lookback periods `start..stop step` and source fields of the
/// support_resistance feature.
#[derive(Args)]
struct SupportResistanceArgs {
    #[arg(long, default_value_t = 100)]
    sr_start: usize,

    /// Exclusive upper bound.
    #[arg(long, default_value_t = 250)]
    sr_stop: usize,

    #[arg(long, default_value_t = 50)]
    sr_step: usize,

    /// Field the support line takes the rolling min of.
    #[arg(long, default_value = "high")]
    sr_support_field: String,

    /// Field the resistance line takes the rolling max of.
    #[arg(long, default_value = "low")]
    sr_resistance_field: String,
}

impl SupportResistanceArgs {
    fn options(&self) -> Result<SupportResistanceOptions> {
        if self.sr_step == 0 {
            bail!("--sr-step must be >= 1");
        }
        if self.sr_start == 0 {
            bail!("--sr-start must be >= 1");
        }
        Ok(SupportResistanceOptions {
            start: self.sr_start,
            stop: self.sr_stop,
            step: self.sr_step,
            support_field: parse_price_field(&self.sr_support_field)?,
            resistance_field: parse_price_field(&self.sr_resistance_field)?,
        })
    }
}

impl DataArgs {
    fn load(&self) -> Result<Vec<PriceBar>> {
        let config = DataConfig {
            symbol: self.symbol.clone(),
            path: self.data.clone(),
            count: self.count,
            delimiter: self.delimiter.clone(),
            synthetic: Some(SyntheticConfig {
                shape: SyntheticShape::default(),
                bars: self.synthetic_bars,
                seed: self.seed,
            }),
        };
        let source = config.source()?;
        let bars = source
            .fetch(&config.request())
            .with_context(|| format!("failed to load bars for {}", self.symbol))?;
        info!(source = source.name(), bars = bars.len(), "bars loaded");
        Ok(bars)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Search {
            config,
            output_dir,
            no_save,
        } => run_search_cmd(config, output_dir, no_save),
        Commands::Signals {
            data,
            window,
            bias,
            classifier,
            tie_break,
            score,
            strict,
            out,
        } => {
            let pipeline = PipelineConfig {
                classifier: parse_classifier(&classifier)?,
                tie_break: parse_tie_break(&tie_break)?,
                score: parse_score(&score)?,
                validation: if strict {
                    ValidationMode::Strict
                } else {
                    ValidationMode::Coerce
                },
            };
            run_signals(&data, pipeline, window, bias, out)
        }
        Commands::Features {
            data,
            selected,
            list,
            support_resistance,
            out,
        } => {
            let options = FeatureOptions {
                support_resistance: support_resistance.options()?,
            };
            run_features(&data, &selected, list, &options, out)
        }
        Commands::Synth {
            shape,
            bars,
            seed,
            symbol,
            volatility,
            period,
            amplitude,
            out,
        } => {
            let shape = match shape.as_str() {
                "random_walk" => SyntheticShape::RandomWalk { volatility },
                "sine" => SyntheticShape::Sine { period, amplitude },
                other => bail!("unknown shape '{other}'. Valid: random_walk, sine"),
            };
            let series = SyntheticSource::new(shape, bars, seed).generate(&symbol);
            write_bars(output(out.as_ref())?, &series)?;
            Ok(())
        }
    }
}

/// Default level `info`; `-v` raises it to `debug`; `RUST_LOG` overrides both.
fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn run_search_cmd(config_path: PathBuf, output_dir: Option<PathBuf>, no_save: bool) -> Result<()> {
    let mut config = SearchConfig::from_file(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }

    let run = run_search(&config)?;
    print_summary(&run.report);

    if !no_save {
        let run_dir = save_artifacts(&run.report, run.best_run.as_ref(), &config.output.dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_signals(
    data: &DataArgs,
    pipeline: PipelineConfig,
    window: f64,
    bias: f64,
    out: Option<PathBuf>,
) -> Result<()> {
    let bars = data.load()?;
    let objective = Objective::new(pipeline);
    let params = objective.params(window, bias)?;
    let run = objective.scored_run(&bars, params);

    match run.score {
        Some(s) => eprintln!(
            "{params} {}: buy {:.4}  sell {:.4}  combined {:.4}  ({} signalled bars)",
            pipeline.score.name(),
            s.buy,
            s.sell,
            s.combined,
            run.rows.len()
        ),
        None => eprintln!("{params}: no signals, unscored"),
    }

    let csv = export_signals_csv(&run)?;
    output(out.as_ref())?.write_all(csv.as_bytes())?;
    Ok(())
}

fn run_features(
    data: &DataArgs,
    selected: &[String],
    list: bool,
    options: &FeatureOptions,
    out: Option<PathBuf>,
) -> Result<()> {
    if list {
        for feature in FEATURES {
            println!("{:<20} {}", feature.name, feature.description);
        }
        return Ok(());
    }

    for name in selected {
        if features::find(name).is_none() {
            let known: Vec<&str> = FEATURES.iter().map(|f| f.name).collect();
            bail!("unknown feature '{name}'. Valid: {}", known.join(", "));
        }
    }

    let bars = data.load()?;
    let selected: Vec<&str> = selected.iter().map(String::as_str).collect();
    let columns = features::compute_with(&bars, &selected, options);
    features::write_feature_table(output(out.as_ref())?, &bars, &columns)?;
    Ok(())
}

/// File at `path`, or stdout.
fn output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

fn parse_classifier(name: &str) -> Result<ClassifierKind> {
    match name {
        "breakout" => Ok(ClassifierKind::Breakout),
        "rebound" => Ok(ClassifierKind::Rebound),
        _ => bail!("unknown classifier '{name}'. Valid: breakout, rebound"),
    }
}

fn parse_tie_break(name: &str) -> Result<TieBreak> {
    match name {
        "prefer_sell" => Ok(TieBreak::PreferSell),
        "prefer_buy" => Ok(TieBreak::PreferBuy),
        "hold" => Ok(TieBreak::Hold),
        _ => bail!("unknown tie break '{name}'. Valid: prefer_sell, prefer_buy, hold"),
    }
}

fn parse_score(name: &str) -> Result<ScoreMethod> {
    match name {
        "percentage" => Ok(ScoreMethod::Percentage),
        "accumulated_price_change" => Ok(ScoreMethod::AccumulatedPriceChange),
        _ => bail!("unknown score '{name}'. Valid: percentage, accumulated_price_change"),
    }
}

fn parse_price_field(name: &str) -> Result<PriceField> {
    match name {
        "open" => Ok(PriceField::Open),
        "high" => Ok(PriceField::High),
        "low" => Ok(PriceField::Low),
        "close" => Ok(PriceField::Close),
        _ => bail!("unknown price field '{name}'. Valid: open, high, low, close"),
    }
}

fn print_summary(report: &SearchReport) {
    println!("=== LevelLab Search ===");
    println!("Symbol:     {}", report.symbol);
    println!("Strategy:   {}", report.strategy);
    println!(
        "Pipeline:   {} / {}",
        report.pipeline.classifier.name(),
        report.pipeline.score.name()
    );
    if let (Some(first), Some(last)) = (report.first_bar, report.last_bar) {
        println!("Period:     {first} to {last} ({} bars)", report.bar_count);
    }
    println!("Evaluated:  {} candidates", report.candidates_evaluated);
    println!("Config:     {}", &report.config_hash[..12.min(report.config_hash.len())]);
    println!();

    match &report.best {
        Some(best) => {
            println!(
                "Best:       window_size={} bias={} score={:.4}",
                best.window_size, best.bias, best.score
            );
            if let Some(b) = &report.best_breakdown {
                println!("            buy {:.4}  sell {:.4}", b.buy, b.sell);
            }
        }
        None => println!("Best:       none (no candidate produced a score)"),
    }

    if report.top.len() > 1 {
        println!();
        println!("Top {}:", report.top.len());
        for (rank, r) in report.top.iter().enumerate() {
            println!(
                "  {:>2}. window_size={:<4} bias={:<3} score={:.4}",
                rank + 1,
                r.window_size,
                r.bias,
                r.score
            );
        }
    }
}
