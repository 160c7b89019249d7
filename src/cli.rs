use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::interpreter::executor::{run, run_streaming, OutputSink, RunOptions};
use crate::interpreter::loader::ProgramCache;
use crate::interpreter::types::{InputRequest, Program, Val};

#[derive(Parser)]
#[command(name = "mdscript")]
#[command(about = "mdscript - run markdown documents as programs", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a function of a program
    Run {
        /// Program file
        file: PathBuf,

        /// Function to start in (default from settings, normally "main")
        #[arg(short = 'e', long = "entry")]
        entry: Option<String>,

        /// Argument for the entry function; JSON scalars keep their type,
        /// anything else is a string
        #[arg(short = 'a', long = "arg")]
        args: Vec<String>,

        /// Value for the next input read, as a string
        #[arg(short = 'i', long = "input")]
        inputs: Vec<String>,

        /// Read each input from stdin as it is needed
        #[arg(long)]
        interactive: bool,

        /// Print the output as one JSON array once the run ends
        #[arg(long)]
        json: bool,

        /// Largest number of nested calls
        #[arg(long)]
        max_call_depth: Option<usize>,

        /// Give every call its own frame, even in tail position
        #[arg(long)]
        no_tail_calls: bool,
    },

    /// Parse a program and list its functions
    Check {
        /// Program file
        file: PathBuf,

        /// Print the parsed program as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    let settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&settings.log_level);

    match cli.command {
        Commands::Run {
            file,
            entry,
            args,
            inputs,
            interactive,
            json,
            max_call_depth,
            no_tail_calls,
        } => {
            let cache = Arc::new(ProgramCache::new());
            let program = load(&cache, &file)?;

            let mut vm = settings.vm_options();
            if let Some(depth) = max_call_depth {
                vm.max_call_depth = depth;
            }
            if no_tail_calls {
                vm.tail_calls = false;
            }

            let options = RunOptions {
                entry: entry.unwrap_or(settings.entry),
                args: args.iter().map(|arg| parse_arg(arg)).collect(),
                inputs: inputs.into_iter().map(Val::from).collect(),
                vm,
                cache: Some(cache),
            };

            let sink: Option<OutputSink> = if json {
                None
            } else {
                Some(Box::new(|value: &Val| println!("{}", value)))
            };

            let outcome = if interactive {
                let sink = sink.unwrap_or_else(|| Box::new(|_: &Val| {}));
                run_streaming(program, options, sink, stdin_provider()).await
            } else {
                run(program, options, sink)
            };

            match outcome {
                Ok(output) => {
                    if json {
                        print_json(&output)?;
                    }
                    Ok(())
                }
                Err(failure) => {
                    if json {
                        print_json(&failure.output)?;
                    }
                    Err(failure.into())
                }
            }
        }

        Commands::Check { file, json } => {
            let program = load(&Arc::new(ProgramCache::new()), &file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(program.as_ref())?);
                return Ok(());
            }

            let mut functions: Vec<_> = program.functions.values().collect();
            functions.sort_by(|a, b| a.name.cmp(&b.name));
            for function in functions {
                println!(
                    "{}({}) - {} statement(s)",
                    function.name,
                    function.params.join(", "),
                    function.body.len()
                );
            }
            Ok(())
        }
    }
}

/* ===================== Helpers ===================== */

/// Install the stderr log subscriber; `RUST_LOG` wins over the settings
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(cache: &ProgramCache, file: &Path) -> Result<Arc<Program>> {
    let program = cache
        .load_path(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    info!(file = %file.display(), "program ready");
    Ok(program)
}

/// Command-line argument value: a JSON scalar, else the raw string
fn parse_arg(raw: &str) -> Val {
    serde_json::from_str(raw)
        .ok()
        .and_then(Val::from_json)
        .unwrap_or_else(|| Val::from(raw))
}

fn print_json(output: &[Val]) -> Result<()> {
    let values: Vec<_> = output.iter().map(Val::to_json).collect();
    println!("{}", serde_json::to_string(&values)?);
    Ok(())
}

type StdinLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;
type InputFuture = Pin<Box<dyn Future<Output = Val> + Send>>;

/// Prompt on stderr and read one line of stdin per input; end of input reads `null`
fn stdin_provider() -> impl FnMut(InputRequest) -> InputFuture {
    let lines: StdinLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));
    move |request: InputRequest| -> InputFuture {
        let lines = Arc::clone(&lines);
        Box::pin(async move {
            eprint!("{}> ", request.variable);
            let _ = std::io::stderr().flush();
            match lines.lock().await.next_line().await {
                Ok(Some(line)) => Val::Str(line),
                Ok(None) | Err(_) => Val::Null,
            }
        })
    }
}
