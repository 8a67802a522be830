//! Command-line entry point.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use lfs_reconcile::{
    report, Error, GcsBucket, GitRepo, Manifest, MissingIndex, OidMapper, ReconciliationChecker,
    Remediator, Result, Runner, S3Bucket, Verbosity,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reconcile Git LFS objects across legacy and target stores"
)]
struct Cli {
    /// Suppress all output below error level (wins over --debug)
    #[arg(short, long, global = true, env = "LFS_RECONCILE_QUIET")]
    quiet: bool,
    /// Enable per-file and per-object detail
    #[arg(short, long, global = true, env = "LFS_RECONCILE_DEBUG")]
    debug: bool,
    /// Log copies without writing to the target store
    #[arg(short = 'x', long, global = true, env = "LFS_RECONCILE_DRY_RUN")]
    dry_run: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map LFS OIDs for one already-cloned repository
    Map(MapArgs),
    /// Check manifests against the target store and remediate
    Check(CheckArgs),
    /// Map every repository in a source list, then check and remediate
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct MapperFlags {
    /// Directory receiving OID manifest files
    #[arg(
        short = 'm',
        long,
        default_value = ".",
        env = "LFS_RECONCILE_MAP_DIRECTORY"
    )]
    map_directory: PathBuf,
    /// Branch pattern to match, anchored at the start of the short name
    #[arg(
        long,
        default_value = r"v\d.*",
        env = "LFS_RECONCILE_BRANCH_PATTERN"
    )]
    branch_pattern: String,
    /// Also write the full checkout -> file -> OID map per repository
    #[arg(long, env = "LFS_RECONCILE_FULL_MAP")]
    full_map: bool,
}

#[derive(Args, Debug)]
struct MapArgs {
    #[command(flatten)]
    mapper: MapperFlags,
    /// Directory of the repository clone to map
    #[arg(short = 'r', long, env = "LFS_RECONCILE_REPO_DIRECTORY")]
    repo_directory: PathBuf,
    /// Owner (usually organization) of the repository
    #[arg(short = 'u', long, env = "LFS_RECONCILE_OWNER")]
    owner: Option<String>,
    /// Repository name
    #[arg(short = 'n', long, env = "LFS_RECONCILE_REPOSITORY")]
    repository: Option<String>,
}

#[derive(Args, Debug)]
struct StoreFlags {
    /// GCP project owning the target bucket
    #[arg(short = 'p', long, env = "LFS_RECONCILE_PROJECT")]
    project: String,
    /// Target GCS bucket
    #[arg(short = 'b', long, env = "LFS_RECONCILE_BUCKET")]
    bucket: String,
    /// Legacy S3 bucket holding the original objects
    #[arg(short = 'o', long, env = "LFS_RECONCILE_ORIGINAL_BUCKET")]
    original_bucket: String,
    /// Bearer token for target-store requests
    #[arg(long, env = "LFS_RECONCILE_GCS_TOKEN", hide_env_values = true)]
    gcs_token: Option<String>,
}

#[derive(Args, Debug)]
struct CheckFlags {
    /// Glob matching OID manifest file names
    #[arg(
        short = 'g',
        long,
        default_value = "oids--*.json",
        env = "LFS_RECONCILE_INPUT_GLOB"
    )]
    input_glob: String,
    /// Load the missing set from this checkpoint instead of probing
    #[arg(long, env = "LFS_RECONCILE_REMEDIATION_INPUT_FILE")]
    remediation_input_file: Option<PathBuf>,
    /// Write the missing set to this checkpoint file
    #[arg(long, env = "LFS_RECONCILE_REMEDIATION_OUTPUT_FILE")]
    remediation_output_file: Option<PathBuf>,
    /// Detect only; skip remediation
    #[arg(long, env = "LFS_RECONCILE_STOP_AFTER_CHECK")]
    stop_after_check: bool,
    #[command(flatten)]
    stores: StoreFlags,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Directory containing OID manifest files
    #[arg(
        short = 'm',
        long,
        default_value = ".",
        env = "LFS_RECONCILE_MAP_DIRECTORY"
    )]
    map_directory: PathBuf,
    #[command(flatten)]
    check: CheckFlags,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Newline-delimited file of repository URLs
    #[arg(
        short = 'f',
        long,
        default_value = "lfsrepos.txt",
        env = "LFS_RECONCILE_INPUT_FILE"
    )]
    input_file: PathBuf,
    #[command(flatten)]
    mapper: MapperFlags,
    /// Map only; skip checking and remediation
    #[arg(long, env = "LFS_RECONCILE_STOP_AFTER_SCAN")]
    stop_after_scan: bool,
    #[command(flatten)]
    check: CheckFlags,
}

fn main() {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.debug, cli.quiet);
    init_tracing(verbosity);

    if let Err(err) = execute(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: Verbosity) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(verbosity.filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Map(args) => map(args),
        Command::Check(args) => check(&args.map_directory, &args.check, cli.dry_run),
        Command::Run(args) => run(args, cli.dry_run),
    }
}

fn map(args: MapArgs) -> Result<()> {
    let (Some(owner), Some(repository)) = (args.owner, args.repository) else {
        return Err(Error::Validation(
            "both owner and repository must be specified".into(),
        ));
    };
    OidMapper::new(
        GitRepo::open(&args.repo_directory),
        args.mapper.map_directory,
        owner,
        repository,
        args.mapper.branch_pattern,
        args.mapper.full_map,
    )
    .execute()
}

fn check(map_directory: &Path, args: &CheckFlags, dry_run: bool) -> Result<()> {
    let mut target = GcsBucket::new(&args.stores.project, &args.stores.bucket);
    if let Some(token) = &args.stores.gcs_token {
        target = target.with_token(token);
    }

    let missing = match &args.remediation_input_file {
        Some(path) => {
            info!("loading missing oids from file '{}'", path.display());
            MissingIndex::from_manifest(&Manifest::load(path)?)
        }
        None => {
            ReconciliationChecker::new(map_directory.to_path_buf(), &args.input_glob, &target)
                .check()?
        }
    };

    if missing.is_empty() {
        info!("no objects missing from bucket {}", args.stores.bucket);
        return Ok(());
    }
    report(&missing)?;
    if let Some(path) = &args.remediation_output_file {
        missing.to_manifest().save(path)?;
        info!("wrote missing set to {}", path.display());
    }
    if args.stop_after_check {
        return Ok(());
    }

    let legacy = S3Bucket::new(&args.stores.original_bucket)?;
    let failures = Remediator::new(&legacy, &target, dry_run).remediate(&missing)?;
    if failures > 0 {
        return Err(Error::Transport(format!(
            "{} oids failed remediation",
            failures
        )));
    }
    Ok(())
}

fn run(args: RunArgs, dry_run: bool) -> Result<()> {
    let failures = Runner::new(
        args.input_file,
        args.mapper.map_directory.clone(),
        args.mapper.branch_pattern,
        args.mapper.full_map,
    )
    .map_all()?;
    if failures > 0 {
        info!("{} repositories failed mapping; continuing", failures);
    }
    if args.stop_after_scan {
        return Ok(());
    }
    check(&args.mapper.map_directory, &args.check, dry_run)
}
