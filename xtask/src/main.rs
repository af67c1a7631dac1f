use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest across the workspace
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Run the checks CI runs: fmt, clippy, nextest
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Ci => run_ci()?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut args = vec!["nextest".to_string(), "run".to_string()];
    if let Some(profile) = profile {
        args.push("--profile".to_string());
        args.push(profile);
    }
    if release {
        args.push("--release".to_string());
    }
    run_cargo(&args)
}

fn run_ci() -> Result<()> {
    run_cargo(&["fmt".into(), "--all".into(), "--".into(), "--check".into()])?;
    run_cargo(&[
        "clippy".into(),
        "--workspace".into(),
        "--all-targets".into(),
        "--".into(),
        "-D".into(),
        "warnings".into(),
    ])?;
    run_cargo(&["nextest".into(), "run".into()])
}

fn run_cargo(args: &[String]) -> Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}
