use std::{cmp::Ordering, fs, process::exit};

use lox::scanner::{ScanError, Scanner};
use owo_colors::OwoColorize;

mod repl;

fn main() {
    let mut args = std::env::args();
    match args.len().cmp(&2) {
        Ordering::Greater => {
            println!("Usage: lox [script]");
            exit(64);
        }
        Ordering::Equal => {
            let path = args.nth(1).unwrap_or_default();
            run_file(&path);
        }
        Ordering::Less => repl::run(),
    }
}

fn run_file(path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: {}: {}", "error".red().bold(), path, err);
            exit(65);
        }
    };

    let mut scanner = Scanner::new(source.clone());
    match scanner.scan_tokens() {
        Ok(tokens) => {
            for token in tokens {
                println!("{}", token);
            }
        }
        Err(err) => {
            report(&source, &err);
            exit(65);
        }
    }
}

/// Echo the offending line with a caret under the failing column.
fn report(source: &str, err: &ScanError) {
    match source.lines().nth(err.line() as usize - 1) {
        Some(line) => {
            eprintln!("{}", line);
            eprintln!("{}^-- {}", " ".repeat(err.column() as usize), err.red());
        }
        None => eprintln!("{}", err.red()),
    }
}
