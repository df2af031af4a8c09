//! 命令行参数.

use crate::case::CaseFile;
use crate::error::{Result, ToolError};
use crate::runner::Runner;
use clap::{Args, Parser, Subcommand};
use log::{info, warn, LevelFilter};
use simple_logger::SimpleLogger;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use utils::loader::{self, DATA_DIR_ENV};

#[derive(Debug, Parser)]
#[command(
    name = "reconstruct",
    about = "Reconstruct electrode grids from corner points and write marker volumes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconstruct every case in a case file.
    Run(RunArgs),

    /// Validate a case file without reading any volume.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// JSON case file.
    #[arg(long)]
    pub cases: PathBuf,

    /// Root of the relative volume paths. Defaults to `$ELEC_DATA_DIR`, then `$HOME/dataset/electrode`.
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Where to write `<case>_interpol.nii.gz`. Defaults to the data directory.
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,

    /// Process cases one at a time.
    #[arg(long)]
    pub sequential: bool,

    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// JSON case file.
    #[arg(long)]
    pub cases: PathBuf,

    /// Log level: off, error, warn, info, debug, trace.
    #[arg(long = "log-level", default_value = "warn")]
    pub log_level: LevelFilter,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match &self.command {
            Commands::Run(a) => a.log_level,
            Commands::Check(a) => a.log_level,
        }
    }
}

/// 解析命令行, 初始化日志并运行. 全部病例成功时返回 `true`.
pub fn run_from_env() -> Result<bool> {
    let cli = Cli::parse();
    SimpleLogger::new().with_level(cli.log_level()).init()?;
    run(cli)
}

pub fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Run(args) => run_cases(args),
        Commands::Check(args) => check_cases(args),
    }
}

fn run_cases(args: RunArgs) -> Result<bool> {
    let file = CaseFile::open(&args.cases)?;
    let data_dir = match args.data_dir {
        Some(d) => d,
        None => loader::data_dir_from_env_or_home().ok_or(ToolError::NoDataDir(DATA_DIR_ENV))?,
    };
    let out_dir = args.out_dir.unwrap_or_else(|| data_dir.clone());
    fs::create_dir_all(&out_dir)?;
    info!(
        "{} cases, data from {}, output to {}, {} threads",
        file.cases.len(),
        data_dir.display(),
        out_dir.display(),
        if args.sequential { 1 } else { utils::cpus() }
    );

    let runner = Runner::new(data_dir, out_dir, !args.sequential);
    let summary = runner.run_all(&file);
    if summary.is_empty() {
        warn!("no cases in {}", args.cases.display());
    }
    summary.describe(&mut io::stdout().lock())?;
    summary.write_json(BufWriter::new(File::create(
        runner.out_dir().join("summary.json"),
    )?))?;
    Ok(summary.failed() == 0)
}

fn check_cases(args: CheckArgs) -> Result<bool> {
    let file = CaseFile::open(&args.cases)?;
    let mut ok = true;
    utils::sep();
    for case in file.cases.iter() {
        match case.plan(&file.config_for(case)) {
            Ok(plan) => println!(
                "{}: {:?}, {} corners, {:?}",
                case.name,
                plan.mode,
                plan.corners.len(),
                plan.spec
            ),
            Err(e) => {
                ok = false;
                println!("{e}");
            }
        }
    }
    utils::sep();
    Ok(ok)
}
