use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use std::path::PathBuf;

use toxhub::posthoc::Procedure;
use toxhub::session::{Session, UserDirectory};
use toxhub::store::StudyStore;

mod admin;
mod analyze;
mod config;
mod inspect;
mod studies;

pub use config::Config;

/// Environment variable consulted when `--password` is not given
pub const PASSWORD_ENV: &str = "TOXHUB_PASSWORD";

/// Data directory used when neither the flag nor the config file sets one
pub const DEFAULT_DATA_DIR: &str = "data";

/// toxhub - Post-hoc analysis of toxicology study data
#[derive(Parser)]
#[command(name = "toxhub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file (storage, users, analysis defaults)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Login id
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Login password (falls back to $TOXHUB_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    /// Directory holding the study files
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Post-hoc procedure selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProcedureArg {
    /// Dunnett's test against the control group
    Dunnett,
    /// Tukey's HSD over every pair
    Tukey,
    /// Bonferroni-corrected pairwise t-tests
    Scheffe,
}

impl From<ProcedureArg> for Procedure {
    fn from(arg: ProcedureArg) -> Self {
        match arg {
            ProcedureArg::Dunnett => Procedure::Dunnett,
            ProcedureArg::Tukey => Procedure::Tukey,
            ProcedureArg::Scheffe => Procedure::Scheffe,
        }
    }
}

/// Column, filter and procedure flags of `analyze`
#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Study file name
    #[arg(value_name = "STUDY")]
    study: String,

    /// Column holding the group labels
    #[arg(long)]
    group_column: Option<String>,

    /// Column holding the time points
    #[arg(long)]
    time_column: Option<String>,

    /// Column holding the measurement
    #[arg(short, long)]
    measurement_column: Option<String>,

    /// Time point for the statistics ("pooled" uses every time point)
    #[arg(short = 't', long, value_name = "N|pooled")]
    time_point: Option<String>,

    /// Control group for Dunnett's test
    #[arg(short, long)]
    control: Option<String>,

    /// Groups to include (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    groups: Option<Vec<String>>,

    /// Start of the time window
    #[arg(long, allow_negative_numbers = true)]
    from: Option<f64>,

    /// End of the time window
    #[arg(long, allow_negative_numbers = true)]
    to: Option<f64>,

    /// Procedure to run (repeatable; default: all)
    #[arg(short, long = "procedure", value_enum)]
    procedures: Vec<ProcedureArg>,

    /// Run every procedure
    #[arg(short, long)]
    all: bool,

    /// Write the XLSX report to this path
    #[arg(short, long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Print the analysis as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the studies visible to the user
    Studies,

    /// Show the columns, groups and time points of a study
    Inspect {
        /// Study file name
        #[arg(value_name = "STUDY")]
        study: String,
    },

    /// Summarize a study and run post-hoc comparisons
    Analyze(AnalyzeArgs),

    /// Add a study file to the data directory (administrators only)
    Upload {
        /// File to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Name to store the study under (default: the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove a study file (administrators only)
    Delete {
        /// Study file name
        #[arg(value_name = "STUDY")]
        study: String,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

/// Shared state of one command invocation
pub struct Context {
    pub config: Config,
    pub store: StudyStore,
    pub session: Session,
}

impl Context {
    fn open(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        let directory = UserDirectory::new(config.users.clone());
        if directory.is_empty() {
            bail!("No user accounts configured; add [[users]] entries to the config file");
        }

        let user = cli
            .user
            .as_deref()
            .context("Missing --user")?;
        let password = match &cli.password {
            Some(password) => password.clone(),
            None => std::env::var(PASSWORD_ENV)
                .with_context(|| format!("Missing --password (or ${})", PASSWORD_ENV))?,
        };
        let session = Session::login(&directory, user, &password)?;

        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| config.storage.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let mut store = StudyStore::open(&data_dir)
            .with_context(|| format!("Failed to open data directory: {}", data_dir.display()))?;
        if let Some(extensions) = &config.storage.extensions {
            store = store.with_extensions(extensions.iter().cloned());
        }
        debug!("Using data directory {}", store.root().display());

        Ok(Self {
            config,
            store,
            session,
        })
    }
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let mut ctx = Context::open(&cli)?;
    let outcome = match cli.command {
        Commands::Studies => studies::run(&ctx),
        Commands::Inspect { study } => inspect::run(&ctx, &study),
        Commands::Analyze(args) => analyze::run(&mut ctx, args),
        Commands::Upload { file, name } => admin::upload(&ctx, file, name),
        Commands::Delete { study } => admin::delete(&ctx, &study),
    };
    ctx.session.logout();
    outcome
}
