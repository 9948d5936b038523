//! `prism-diff`: print the delta between two object documents.
//!
//! Usage:
//!   prism-diff [--config <file>] [--schema <file>]... <old.json> <new.json>
//!
//! The delta document is written to stdout.

use std::io::{self, Write};

use prism::cli::{diff_documents, init_tracing, load_context, read_file, CliError, CliOptions};

const USAGE: &str = "prism-diff [--config <file>] [--schema <file>]... <old.json> <new.json>";

fn run() -> Result<String, CliError> {
    let options = CliOptions::parse(std::env::args().skip(1))?;
    let (old, new) = options.two_files(USAGE)?;
    let ctx = load_context(&options)?;
    diff_documents(&ctx, &read_file(old)?, &read_file(new)?)
}

fn main() {
    init_tracing();
    match run() {
        Ok(result) => {
            let mut out = io::stdout();
            if writeln!(out, "{result}").is_err() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
