use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use casectl::app::resolve::{Collaborators, Invoker, Resolution};
use casectl::app::scan::{SegmentScanner, render_overview};
use casectl::domain::collab::{Console, ConfigurationStore, DocumentSource};
use casectl::domain::model::{InvocationRequest, InvocationTarget, LaunchReport, RunConfiguration};
use casectl::infra::build::CommandBuild;
use casectl::infra::config::{self, Settings};
use casectl::infra::console::StderrConsole;
use casectl::infra::document::{FsDocuments, is_test_file};
use casectl::infra::exec::ProcessHost;
use casectl::infra::paths;
use casectl::infra::store::FileStore;

#[derive(Parser, Debug)]
#[command(
    name = "casectl",
    version,
    about = "Run individual cases of delimiter-structured system-test files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the addressable case segments of a test file
    List(ListArgs),
    /// Run a whole test file or a single case of it
    Run(RunArgs),
    /// Register or update the base run configuration
    Register(RegisterArgs),
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Path to the test file
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the test file
    file: PathBuf,
    /// 1-based case index; omit to run every case in the file
    #[arg(long)]
    case: Option<usize>,
    /// Launch under the configured debugger
    #[arg(long)]
    debug: bool,
}

#[derive(Parser, Debug)]
struct RegisterArgs {
    /// Configuration name; defaults to the configured base name
    #[arg(long)]
    name: Option<String>,
    /// Path to the runner executable
    #[arg(long)]
    executable: PathBuf,
    /// Build target that produces the executable
    #[arg(long)]
    build_target: String,
    /// Build profile the target is built with
    #[arg(long)]
    profile: Option<String>,
    /// Default program arguments for the runner
    #[arg(long, default_value = "")]
    args: String,
}

fn main() -> ExitCode {
    casectl::init();
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::List(args) => cmd_list(args),
        Commands::Run(args) => cmd_run(args),
        Commands::Register(args) => cmd_register(args),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "casectl", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn cmd_list(args: ListArgs) -> Result<ExitCode> {
    let file = resolve_file(&args.file)?;
    let document = FsDocuments.snapshot(&file)?;
    let map = SegmentScanner::new().scan(&document);
    print!("{}", render_overview(&document, &map));
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(args: RunArgs) -> Result<ExitCode> {
    let settings = Settings::load()?;
    let console: Arc<dyn Console> = Arc::new(StderrConsole);

    let file = resolve_file(&args.file)?;
    if !is_test_file(&file) {
        console.info(&format!(
            "note: '{}' does not use a known test extension (.test, .test_disabled, .test.disabled)",
            args.file.display()
        ));
    }

    let root = config::workspace_root()?;
    let store: Arc<dyn ConfigurationStore> = Arc::new(FileStore::open(&root)?);
    let documents: Arc<dyn DocumentSource> = Arc::new(FsDocuments);
    let invoker = Invoker::new(
        Collaborators {
            documents,
            build: Arc::new(CommandBuild::from_config(&settings)?),
            store,
            host: Arc::new(ProcessHost::from_config(&settings)?),
            console: console.clone(),
            mapper: paths::from_config(&settings)?,
        },
        &settings,
    )?;

    let request = InvocationRequest {
        path: file,
        case: args.case.unwrap_or(0),
        debug: args.debug,
    };

    match invoker.invoke(request) {
        Ok(Resolution::Launched(report)) => Ok(exit_code_for(&report)),
        Ok(Resolution::Deferred(pending)) => match pending.wait() {
            Ok(report) => Ok(exit_code_for(&report)),
            // Failures on the resumed path have already been reported
            // through the console.
            Err(_) => Ok(ExitCode::FAILURE),
        },
        Err(err) => {
            console.error(&format!("{err:#}"));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_register(args: RegisterArgs) -> Result<ExitCode> {
    let settings = Settings::load()?;
    let root = config::workspace_root()?;
    let store = FileStore::open(&root)?;

    let name = args
        .name
        .unwrap_or_else(|| settings.runner.base_configuration.clone());
    let configuration = RunConfiguration {
        name: name.clone(),
        target: InvocationTarget {
            build_target: args.build_target,
            profile: args.profile,
            executable: args.executable,
        },
        program_args: args.args,
    };
    store.upsert(configuration);

    println!("registered '{name}' in {}", store.path().display());
    Ok(ExitCode::SUCCESS)
}

fn resolve_file(file: &Path) -> Result<PathBuf> {
    file.canonicalize()
        .with_context(|| format!("cannot resolve test file {}", file.display()))
}

/// The runner's exit code becomes ours; a signal death maps to failure.
fn exit_code_for(report: &LaunchReport) -> ExitCode {
    match report.exit_code {
        Some(code) => ExitCode::from(code.clamp(0, 255) as u8),
        None => ExitCode::FAILURE,
    }
}
