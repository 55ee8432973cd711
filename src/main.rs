use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rsuwu::config::{Config, DEFAULT_MAX_CALL_DEPTH};
use rsuwu::init_tracing;
use rsuwu::prompt::{describe, run_prompt};
use rsuwu::runfile::{file_tree, run_file};

#[derive(Parser, Debug)]
#[command(name = "rsuwu", version, about = "Wuns UwU pwogwams, ow stawts a pwompt without one")]
struct Args {
    /// Script to run
    script: Option<PathBuf>,

    /// Directory searched by `woad *#name*`
    #[arg(long)]
    stdlib: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Print the script's syntax tree instead of running it
    #[arg(long, requires = "script")]
    tree: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();
    let mut config = Config { max_call_depth: args.max_call_depth, ..Config::default() };
    if let Some(stdlib) = args.stdlib {
        config.stdlib_dir = stdlib;
    }
    match args.script {
        Some(script) if args.tree => match file_tree(&script) {
            Ok(tree) => {
                println!("{}", tree);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", describe(&e));
                ExitCode::FAILURE
            }
        },
        Some(script) => match run_file(&script, config) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", describe(&e));
                ExitCode::FAILURE
            }
        },
        None => match run_prompt(config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
    }
}
