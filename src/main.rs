use std::fs;
use std::io::{self, Stdout};
use std::process;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use oc_lang::config::{EXIT_IO_ERROR, EXIT_OK, EXIT_USAGE, HISTORY_FILE, PROMPT, USAGE};
use oc_lang::interpreter::Interpreter;
use oc_lang::keywords::{load_keywords, Keywords};
use oc_lang::runner::{self, Outcome};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(ClapParser)]
#[command(name = "oc")]
#[command(about = "The Oc programming language")]
struct Cli {
    /// Script file to run (omit for REPL)
    scripts: Vec<String>,

    /// Path to keywords JSON file
    #[arg(short, long)]
    keywords: Option<String>,

    /// Print each parsed statement to stderr before running it
    #[arg(long)]
    dump_ast: bool,
}

fn main() {
    init_tracing();

    let code = match try_main() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            EXIT_IO_ERROR
        }
    };
    process::exit(code);
}

// Silent unless RUST_LOG is set.
fn init_tracing() {
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn try_main() -> Result<i32> {
    let cli = Cli::parse();

    if cli.scripts.len() > 1 {
        println!("{}", USAGE);
        return Ok(EXIT_USAGE);
    }

    let keywords = load_keywords(cli.keywords.as_deref())?;
    let mut interpreter = Interpreter::new();

    match cli.scripts.first() {
        None => {
            run_prompt(&keywords, &mut interpreter, cli.dump_ast)?;
            Ok(EXIT_OK)
        }
        Some(path) => run_file(path, &keywords, &mut interpreter, cli.dump_ast),
    }
}

fn run_prompt(
    keywords: &Keywords,
    interpreter: &mut Interpreter<Stdout>,
    dump_ast: bool,
) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    let history_path = dirs::home_dir().map(|p| p.join(HISTORY_FILE));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                // errors are reported, the session keeps going
                run(&line, keywords, interpreter, dump_ast);
            }
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }

    Ok(())
}

fn run_file(
    path: &str,
    keywords: &Keywords,
    interpreter: &mut Interpreter<Stdout>,
    dump_ast: bool,
) -> Result<i32> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("could not read script '{}'", path))?;
    let outcome = run(&contents, keywords, interpreter, dump_ast);
    Ok(outcome.exit_code())
}

fn run(
    source: &str,
    keywords: &Keywords,
    interpreter: &mut Interpreter<Stdout>,
    dump_ast: bool,
) -> Outcome {
    let outcome = runner::run_with(source, keywords, interpreter, |program| {
        if dump_ast {
            program
                .statements
                .iter()
                .for_each(|statement| eprintln!("{}", statement));
        }
    });

    match &outcome {
        Outcome::Ok => {}
        Outcome::StaticErrors(diagnostics) => {
            diagnostics.iter().for_each(|e| eprintln!("{}", e));
        }
        Outcome::RuntimeError(e) => eprintln!("{}", e),
    }

    outcome
}
