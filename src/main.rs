use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cee_spring_stats::bundle::{load_bundle, write_jsonl};
use cee_spring_stats::parallel::{extract_all, ExtractContext, ParallelConfig, Stats};
use cee_spring_stats::pipeline::{build_index, generate_reports};
use cee_spring_stats::report::summary;
use cee_spring_stats::{validate_articles, ContestConfig, ValidationOutcome};

/// Warnings echoed to the console; the full list goes to the validation report.
const WARNINGS_SHOWN: usize = 10;

#[derive(Parser)]
#[command(name = "cee-spring-stats")]
#[command(about = "CEE Spring contest statistics from an offline page bundle")]
struct Args {
    /// Page bundle (.jsonl or .jsonl.bz2)
    input: PathBuf,

    /// Directory for the report files
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Contest config YAML (default: config/contest.yaml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Pages per parallel batch
    #[arg(long, default_value_t = 200)]
    batch_size: usize,

    /// Also dump the merged article records as JSONL
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// Print the console summary without writing report files
    #[arg(long)]
    summary_only: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_stats(stats: &Stats) {
    println!();
    println!("============================================================");
    println!("Pages processed: {}", stats.pages_processed);
    println!("Articles with contest template: {}", stats.articles);
    println!("From suggested lists: {}", stats.from_suggested);
    println!("------------------------------------------------------------");
    println!("Missing talk page: {}", stats.no_talk_page);
    println!("Template not found: {}", stats.no_template);
    if stats.dropped > 0 {
        println!("Dropped after worker failure: {}", stats.dropped);
    }
    println!("Time: {:.2}s", stats.elapsed.as_secs_f64());
    println!("============================================================");
}

fn print_validation(outcome: &ValidationOutcome) {
    if !outcome.errors.is_empty() {
        println!("Validation errors found:");
        for error in &outcome.errors {
            println!("  ❌ {}", error);
        }
    }

    if !outcome.warnings.is_empty() {
        println!("Validation warnings:");
        for warning in outcome.warnings.iter().take(WARNINGS_SHOWN) {
            println!("  ⚠️  {}", warning);
        }
        if outcome.warnings.len() > WARNINGS_SHOWN {
            println!(
                "  ... and {} more warnings",
                outcome.warnings.len() - WARNINGS_SHOWN
            );
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);

    let config = ContestConfig::resolve(args.config.as_deref()).context("loading contest config")?;

    if !args.quiet {
        println!("Starting CEE Spring {} statistics collection...", config.year);
        println!("Input: {}", args.input.display());
        println!("Template: {}", config.template_name());
        println!();
    }

    let bundle = load_bundle(&args.input)
        .with_context(|| format!("reading bundle {}", args.input.display()))?;

    let index = build_index(&bundle.structures, &config)?;
    if !args.quiet {
        println!(
            "Found {} suggested Wikidata IDs on {} structure pages",
            index.total_ids(),
            index.countries().len()
        );
    }

    let mut parallel = ParallelConfig::default();
    if args.threads > 0 {
        parallel.num_threads = args.threads;
    }
    parallel.batch_size = args.batch_size;

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(bundle.articles.len() as u64);
        pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} articles {msg}")?);
        pb
    };

    let ctx = ExtractContext {
        config: &config,
        index: &index,
    };
    let (records, stats) = extract_all(&bundle.articles, ctx, &parallel, |n| pb.inc(n as u64));
    pb.finish_and_clear();

    if !args.quiet {
        print_stats(&stats);
    }

    if let Some(path) = &args.jsonl {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        write_jsonl(&records, file)?;
        if !args.quiet {
            println!("Article records saved to: {}", path.display());
        }
    }

    if !args.quiet {
        println!("Validating data...");
    }
    let outcome = validate_articles(records);
    if !args.quiet {
        print_validation(&outcome);
    }

    if !args.summary_only {
        let written = generate_reports(&outcome, &index, &config, &args.output_dir)
            .with_context(|| format!("writing reports to {}", args.output_dir.display()))?;
        match written {
            Some(paths) if !args.quiet => {
                println!("Reports generated successfully!");
                for path in &paths {
                    println!("  {}", path.display());
                }
            }
            None => println!("Data validation failed. Reports not written."),
            _ => {}
        }
    }

    if !args.quiet || args.summary_only {
        print!("{}", summary(&outcome.articles));
    }

    if !outcome.is_ok() {
        std::process::exit(1);
    }
    Ok(())
}
