use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use unmangle::{
    formatter::format_program,
    lexer::Lexer,
    parser::parse_program,
    transform::{transform, DEFAULT_TEMP_PREFIX},
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// The JavaScript file to deobfuscate.
    file: PathBuf,

    /// The prefix to use when creating temporary identifiers. There
    /// should be no identifiers that consist of this prefix followed by
    /// a sequence of digits in the input code.
    #[arg(short, long, default_value = DEFAULT_TEMP_PREFIX)]
    prefix: String,

    /// Output a JSON representation of the AST instead of JS.
    #[arg(short = 'a', long)]
    ast: bool,

    /// Output additional messages to standard error.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let level = if args.verbose {
        log::Level::Info
    } else {
        log::Level::Warn
    };
    simple_logger::init_with_level(level)?;

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("could not read file '{}'", args.file.to_string_lossy()))?;

    info!("Parsing...");
    let tokens = Lexer::new(&source).lex()?;
    let mut program = parse_program(tokens)?;

    info!("Deobfuscating...");
    transform(&mut program, &args.prefix)?;

    if args.ast {
        info!("Printing AST...");
        println!("{}", serde_json::to_string(&program)?);
    } else {
        info!("Formatting code...");
        print!("{}", format_program(&program)?);
    }

    Ok(())
}
