//! Interview coach CLI.
//!
//! Runs an interactive technical interview on the console, or writes a
//! default `coach.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use coach::io::config::{ApiKeys, CoachConfig, DEFAULT_CONFIG_PATH, load_config, write_config};
use coach::io::console::Console;
use coach::session::{InterruptFlag, Session, SessionEnd, build_agents, run_interactive};
use rustyline::DefaultEditor;

/// Conventional exit status for termination by SIGINT.
const INTERRUPT_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(
    name = "coach",
    version,
    about = "Multi-agent technical interview coach"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run an interactive interview session (default).
    Interview(InterviewArgs),
    /// Write the default config file.
    InitConfig {
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Default)]
struct InterviewArgs {
    /// Config file; defaults apply when it does not exist.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override `logs_dir` from the config.
    #[arg(long)]
    logs_dir: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Err(err) = coach::logging::init() {
        eprintln!("{:#}", err);
    }
    match cli.command {
        None => cmd_interview(InterviewArgs::default()),
        Some(Command::Interview(args)) => cmd_interview(args),
        Some(Command::InitConfig { config, force }) => cmd_init_config(&config, force),
    }
}

fn cmd_init_config(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &CoachConfig::default())?;
    println!("{}", path.display());
    Ok(())
}

fn cmd_interview(args: InterviewArgs) -> Result<()> {
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = load_config(&config_path)?;
    if let Some(logs_dir) = args.logs_dir {
        config.logs_dir = logs_dir;
    }
    let keys = ApiKeys::from_env()?;
    let agents = build_agents(&config, &keys)?;

    let interrupted = Arc::new(InterruptFlag::new());
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        if !flag.signal() {
            eprintln!("\nInterrupted, exiting without saving.");
            std::process::exit(INTERRUPT_EXIT_CODE);
        }
    })
    .context("install ctrl-c handler")?;

    let editor = DefaultEditor::new().context("create line editor")?;
    let mut console = Console::new(editor, std::io::stdout());
    console.header()?;
    let Some(profile) = console.read_profile()? else {
        console.system("Interview cancelled.")?;
        return Ok(());
    };

    let mut session = Session::new(profile, agents, config.logs_dir.clone());
    console.system("Interview is ready.")?;
    console.system("Start the dialogue. To finish, type 'стоп' or ask for 'фидбэк'.\n")?;

    match run_interactive(&mut console, &mut session, &interrupted)? {
        SessionEnd::Completed(Some(paths)) | SessionEnd::Interrupted(Some(paths)) => {
            console.system(&format!(
                "Interview finished. Logs saved to {}",
                paths.log_path.display()
            ))?;
        }
        SessionEnd::Completed(None) | SessionEnd::Interrupted(None) => {
            console.system("Interview finished. Logs were not saved.")?;
        }
        SessionEnd::InputClosed => console.system("Input closed. Logs were not saved.")?,
    }
    Ok(())
}
