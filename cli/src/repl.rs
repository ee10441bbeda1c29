//! Interactive read-loop: one scan per line, tokens printed as they come.
//!
//! Each line gets a fresh `Scanner`, so a lexical error on one line never
//! leaks state into the next.

use std::process::exit;

use lox::scanner::Scanner;
use owo_colors::OwoColorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

const PROMPT: &str = ">> ";

pub fn run() {
    let mut editor = match editor() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("{}: {}", "error".red().bold(), err);
            exit(1);
        }
    };

    println!("lox REPL");
    println!();

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                run_line(&line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("   Goodbye!");
                exit(64);
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}: {}", "error".red().bold(), err);
                break;
            }
        }
    }
}

fn editor() -> rustyline::Result<Editor<(), DefaultHistory>> {
    let config = Config::builder()
        .history_ignore_dups(true)?
        .auto_add_history(true)
        .build();
    Editor::with_config(config)
}

fn run_line(line: &str) {
    let mut scanner = Scanner::new(line.to_string());
    match scanner.scan_tokens() {
        Ok(tokens) => {
            for token in tokens {
                println!("{}", token);
            }
        }
        Err(err) => {
            eprintln!("{}^-- {}", caret_padding(err.column()), err.red());
        }
    }
}

/// Align the caret with the failing column, accounting for the prompt width.
fn caret_padding(column: u32) -> String {
    " ".repeat(column as usize + PROMPT.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caret_padding_offsets_by_prompt_width() {
        assert_eq!(caret_padding(0), "   ");
        assert_eq!(caret_padding(4).len(), 4 + PROMPT.len());
    }
}
