//! `prism-apply`: apply a delta document to an object document.
//!
//! Usage:
//!   prism-apply [--config <file>] [--schema <file>]... <object.json> <delta.json>
//!
//! The resulting object is written to stdout, or `null` after a delete. An
//! object file containing `null` stands for a missing object, so an add
//! delta can be applied to it.

use std::io::{self, Write};

use prism::cli::{apply_document, init_tracing, load_context, read_file, CliError, CliOptions};

const USAGE: &str = "prism-apply [--config <file>] [--schema <file>]... <object.json> <delta.json>";

fn run() -> Result<String, CliError> {
    let options = CliOptions::parse(std::env::args().skip(1))?;
    let (object, delta) = options.two_files(USAGE)?;
    let ctx = load_context(&options)?;
    apply_document(&ctx, &read_file(object)?, &read_file(delta)?)
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
