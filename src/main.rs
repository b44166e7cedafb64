use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use mython::error::MythonError;
use mython::interpreter::Interpreter;
use mython::lexer::tokenize;
use mython::parser::Parser;
use mython::value::{Context, SimpleContext};

#[derive(ClapParser, Debug)]
#[command(version, about = "Mython language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file (or stdin), printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Print the token stream as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file (or stdin) and prints its syntax tree
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file (or stdin) as a Mython program
    Run { filename: Option<PathBuf> },
}

/// Reads the whole program text from `filename`, or from stdin when absent.
fn read_source(filename: Option<PathBuf>) -> Result<String> {
    let mut buf: Vec<u8> = Vec::new();

    match filename {
        Some(filename) => {
            info!("Reading file: {:?}", filename);
            let file = File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
            let mut reader = BufReader::new(file);

            reader
                .read_to_end(&mut buf)
                .context(format!("Failed to read file {:?}", filename))?;
        }
        None => {
            info!("Reading program from stdin");
            io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
        }
    }

    info!("Read {} bytes", buf.len());

    String::from_utf8(buf).context("Program text is not valid UTF-8")
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'mython::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("mython::")
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn fail(err: MythonError) -> ! {
    debug!("Failure: {:?}", err);
    eprintln!("{}", err);

    std::process::exit(err.exit_code());
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => {
            info!("Running Tokenize subcommand");
            let source: String = read_source(filename)?;

            let tokens = match tokenize(&source) {
                Ok(tokens) => tokens,
                Err(e) => fail(e.into()),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&tokens)?);
            } else {
                for token in &tokens {
                    println!("{}", token);
                }
            }

            info!("Tokenization completed successfully");
        }

        Commands::Parse { filename } => {
            info!("Running Parse subcommand");
            let source: String = read_source(filename)?;

            match Parser::new(&source).and_then(Parser::parse) {
                Ok(program) => println!("{:#?}", program),
                Err(e) => fail(e),
            }

            info!("Parse subcommand completed");
        }

        Commands::Run { filename } => {
            info!("Running Run subcommand");
            let source: String = read_source(filename)?;

            let stdout = io::stdout();
            let mut ctx = SimpleContext::new(BufWriter::new(stdout.lock()));
            let mut interpreter = Interpreter::new();

            let result = interpreter.run_source(&source, &mut ctx);
            ctx.output().flush().context("Failed to flush stdout")?;

            if let Err(e) = result {
                fail(e);
            }

            info!("Program executed successfully");
        }
    }

    Ok(())
}
