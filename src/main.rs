use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rox::ast_printer::AstPrinter;
use rox::error::LoxError;
use rox::host::Console;
use rox::lox::Lox;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::token::Token;

/// Exit code for lexical, syntax and resolution errors.
const EXIT_STATIC_ERROR: i32 = 65;

/// Exit code for runtime errors.
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to rox.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the tokens as a JSON array instead
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints the AST of each statement
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a Lox program
    Run { filename: Option<PathBuf> },

    /// Starts an interactive session
    Repl,
}

/// Reads the contents of a file into a String
fn read_file(filename: PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let source = std::fs::read_to_string(&filename)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("rox.log").context("Failed to create rox.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG overrides
        .init();

    info!("Logger initialized, writing to rox.log");
    Ok(())
}

fn exit_code(diagnostics: &[LoxError]) -> i32 {
    if diagnostics.is_empty() {
        0
    } else if diagnostics.iter().any(LoxError::is_runtime) {
        EXIT_RUNTIME_ERROR
    } else {
        EXIT_STATIC_ERROR
    }
}

fn tokenize(source: &str, json: bool) -> Result<i32> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut tokenized = true;

    for item in Scanner::new(source) {
        match item {
            Ok(token) => {
                if !json {
                    println!("{}", token);
                }
                tokens.push(token);
            }
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?;
        println!("{}", rendered);
    }

    Ok(if tokenized { 0 } else { EXIT_STATIC_ERROR })
}

fn parse(source: &str) -> i32 {
    let mut tokens: Vec<Token> = Vec::new();
    let mut code = 0;

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(e) => {
                eprintln!("{}", e);
                code = EXIT_STATIC_ERROR;
            }
        }
    }

    match Parser::new(&tokens).parse() {
        Ok(statements) => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
        }
        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            code = EXIT_STATIC_ERROR;
        }
    }

    code
}

fn repl() -> Result<()> {
    let mut lox = Lox::new(Console);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        // Ctrl‑D
        if read == 0 {
            println!();
            break;
        }

        // Errors were already reported; the session carries on.
        let diagnostics = lox.run(&line);
        debug!("REPL line produced {} diagnostic(s)", diagnostics.len());
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.commands {
        Commands::Repl => {
            repl()?;
            0
        }

        Commands::Tokenize { filename: None, .. }
        | Commands::Parse { filename: None }
        | Commands::Run { filename: None } => {
            println!("No input filepath was provided. Exiting...");
            0
        }

        Commands::Tokenize {
            filename: Some(filename),
            json,
        } => tokenize(&read_file(filename)?, json)?,

        Commands::Parse {
            filename: Some(filename),
        } => parse(&read_file(filename)?),

        Commands::Run {
            filename: Some(filename),
        } => {
            let source = read_file(filename)?;
            let mut lox = Lox::new(Console);
            exit_code(&lox.run(&source))
        }
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
