//! Downloads the images referenced by a product manifest CSV.

use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use product_prep::acquire::{self, AcquireOptions, AcquireProgress, AcquireSummary, HttpFetcher, ReplicationMode};
use product_prep::config::{self, PrepConfig};
use product_prep::logging::{self, LogOutput};
use product_prep::manifest::Manifest;

#[derive(Default)]
struct CliArgs {
    manifest: Option<PathBuf>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
    sequential: bool,
    limit_per_group: Option<usize>,
    retries: Option<usize>,
    retry_delay_secs: Option<u64>,
    timeout_secs: Option<u64>,
    workers: Option<usize>,
    seed: Option<u64>,
    replicate: bool,
    json: bool,
    no_log_file: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(args) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let output = if args.no_log_file {
        LogOutput::ConsoleOnly
    } else {
        LogOutput::ConsoleAndFile
    };
    if let Err(err) = logging::init_with(output) {
        eprintln!("Logging disabled: {err}");
    }

    let config = load_config(args.config.as_deref())?;
    let manifest_path = args
        .manifest
        .as_deref()
        .ok_or_else(|| "--manifest is required".to_string())?;
    let out = args
        .out
        .as_deref()
        .ok_or_else(|| "--out is required".to_string())?;
    let options = resolve_options(&config, &args, out.to_path_buf());

    let manifest = Manifest::from_csv_path(manifest_path).map_err(|err| err.to_string())?;
    let fetcher = HttpFetcher::new(options.request_timeout);

    let bar = if args.json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .map_err(|err| err.to_string())?
            .progress_chars("#>-"),
        );
        bar
    };
    let mut on_progress = |update: AcquireProgress| {
        bar.set_length(update.total as u64);
        bar.set_position(update.processed as u64);
    };
    let mut progress: Option<&mut dyn FnMut(AcquireProgress)> = Some(&mut on_progress);
    let summary = acquire::acquire_with(&manifest, &options, &fetcher, &mut progress)
        .map_err(|err| err.to_string())?;
    bar.finish_and_clear();

    if args.json {
        let text = serde_json::to_string_pretty(&summary).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        print_summary(&summary, &options);
    }
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<PrepConfig, String> {
    let loaded = match path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    };
    loaded.map_err(|err| err.to_string())
}

fn resolve_options(config: &PrepConfig, args: &CliArgs, out: PathBuf) -> AcquireOptions {
    let mut options = config.acquire.to_options(&out);
    if args.sequential {
        options.parallel = false;
    }
    if let Some(limit) = args.limit_per_group {
        options.limit_per_group = limit.max(1);
    }
    if let Some(retries) = args.retries {
        options.retries = retries.max(1);
    }
    if let Some(secs) = args.retry_delay_secs {
        options.retry_delay = Duration::from_secs(secs);
    }
    if let Some(secs) = args.timeout_secs {
        options.request_timeout = Duration::from_secs(secs);
    }
    if let Some(workers) = args.workers {
        options.worker_count = Some(workers.max(1));
    }
    if args.replicate {
        options.replication = ReplicationMode::HardLinkOrCopy;
    }
    options.seed = args.seed;
    options
}

fn print_summary(summary: &AcquireSummary, options: &AcquireOptions) {
    println!(
        "Processed {} unique images from {} sampled rows ({} in manifest) into {}",
        summary.tasks,
        summary.sampled_rows,
        summary.manifest_rows,
        options.download_folder.display()
    );
    println!("  downloaded:        {}", summary.downloaded);
    println!("  already present:   {}", summary.skipped_existing);
    println!("  placeholders:      {}", summary.placeholders);
    if summary.placeholder_failures > 0 {
        println!("  no file written:   {}", summary.placeholder_failures);
    }
    if summary.unusable_key > 0 {
        println!("  unusable folder:   {}", summary.unusable_key);
    }
    if summary.no_link > 0 {
        println!("  rows without link: {}", summary.no_link);
    }
    if options.replication == ReplicationMode::HardLinkOrCopy {
        println!("  replicated:        {}", summary.replicated);
        if summary.replication_failures > 0 {
            println!("  replication failed: {}", summary.replication_failures);
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<Option<CliArgs>, String> {
    let mut parsed = CliArgs::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--manifest" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--manifest requires a value".to_string())?;
                parsed.manifest = Some(PathBuf::from(value));
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                parsed.out = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--sequential" => parsed.sequential = true,
            "--replicate" => parsed.replicate = true,
            "--json" => parsed.json = true,
            "--no-log-file" => parsed.no_log_file = true,
            "--limit-per-group" => {
                idx += 1;
                parsed.limit_per_group = Some(parse_number(&args, idx, "--limit-per-group")?);
            }
            "--retries" => {
                idx += 1;
                parsed.retries = Some(parse_number(&args, idx, "--retries")?);
            }
            "--retry-delay-secs" => {
                idx += 1;
                parsed.retry_delay_secs = Some(parse_number(&args, idx, "--retry-delay-secs")?);
            }
            "--timeout-secs" => {
                idx += 1;
                parsed.timeout_secs = Some(parse_number(&args, idx, "--timeout-secs")?);
            }
            "--workers" => {
                idx += 1;
                parsed.workers = Some(parse_number(&args, idx, "--workers")?);
            }
            "--seed" => {
                idx += 1;
                parsed.seed = Some(parse_number(&args, idx, "--seed")?);
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }

    Ok(Some(parsed))
}

fn parse_number<T: std::str::FromStr>(args: &[String], idx: usize, flag: &str) -> Result<T, String> {
    let value = args
        .get(idx)
        .ok_or_else(|| format!("{flag} requires a value"))?;
    value
        .parse::<T>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "product-prep-download",
        "",
        "Downloads manifest images into <out>/<group_id>/<entity_name>/<index>_<basename>.",
        "",
        "Usage:",
        "  product-prep-download --manifest <csv> --out <dir> [options]",
        "",
        "Options:",
        "  --manifest <csv>          Manifest with group_id, entity_name, image_link columns (required).",
        "  --out <dir>               Download folder (required).",
        "  --config <toml>           Config file (defaults to the app config.toml).",
        "  --sequential              Fetch one image at a time.",
        "  --limit-per-group <n>     Rows sampled per (group_id, entity_name) (default: 5000).",
        "  --retries <n>             Attempts per URL before a placeholder (default: 3).",
        "  --retry-delay-secs <n>    Pause after a failed attempt (default: 3).",
        "  --timeout-secs <n>        Request timeout (default: 10).",
        "  --workers <n>             Worker threads (default: available cores).",
        "  --seed <u64>              Fix the sampling RNG.",
        "  --replicate               Link or copy shared images under every referencing row.",
        "  --json                    Print the summary as JSON.",
        "  --no-log-file             Log to the console only.",
    ]
    .join("\n")
}
