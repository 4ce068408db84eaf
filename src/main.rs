use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use hpfold::config::ExperimentConfig;
use hpfold::error::HpResult;
use hpfold::experiment::Workspace;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about = "3D HP lattice folding: MC vs Forgetting Engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Study directory holding results/, instances/ and manuscript_outputs/
    #[arg(global = true, short, long, default_value = ".")]
    workdir: PathBuf,

    /// JSON config file (defaults to <workdir>/config.json when present)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Phase A: pilot trials that lock the success thresholds
    Pilot(cmd::run::RunArgs),
    /// Phase B: main trials scored against the locked thresholds
    Main(cmd::run::RunArgs),
    /// Pilot, main and analysis in one go
    All(cmd::run::RunArgs),
    /// Statistics over a finished phase
    Analyze(cmd::analyze::AnalyzeArgs),
    /// One optimizer run on an explicit sequence, printed as JSON
    Trial(cmd::trial::TrialArgs),
}

fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(
    explicit: Option<&Path>,
    workdir: &Path,
    cli_config: &ExperimentConfig,
    sub_matches: &clap::ArgMatches,
) -> HpResult<ExperimentConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let default = workdir.join("config.json");
            default.exists().then_some(default)
        }
    };

    match path {
        Some(path) => {
            info!("📂 Loading config: {}", path.display());
            let mut config = ExperimentConfig::load_from_file(&path)?;
            // Arguments typed on the command line win over the file.
            config.merge_from_cli(cli_config, sub_matches);
            Ok(config)
        }
        None => Ok(cli_config.clone()),
    }
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_tracing(cli.debug);

    // Config flags live inside the subcommand's matches, not the root.
    let Some((_, sub_matches)) = matches.subcommand() else {
        error!("No subcommand given");
        process::exit(2);
    };
    let cli_config = match &cli.command {
        Commands::Pilot(args) | Commands::Main(args) | Commands::All(args) => &args.config,
        Commands::Analyze(args) => &args.config,
        Commands::Trial(args) => &args.config,
    };

    let config = resolve_config(cli.config.as_deref(), &cli.workdir, cli_config, sub_matches)
        .unwrap_or_else(|e| {
            error!("{}", e);
            process::exit(1);
        });
    let ws = Workspace::new(&cli.workdir);

    let outcome = match &cli.command {
        Commands::Pilot(args) => cmd::run::pilot(&ws, &config, args.length),
        Commands::Main(args) => cmd::run::main_phase(&ws, &config, args.length),
        Commands::All(args) => cmd::run::all(&ws, &config, args.length),
        Commands::Analyze(args) => cmd::analyze::run(&ws, &config, args.phase),
        Commands::Trial(args) => cmd::trial::run(args, &config),
    };

    if let Err(e) = outcome {
        error!("❌ {}", e);
        process::exit(1);
    }
}
