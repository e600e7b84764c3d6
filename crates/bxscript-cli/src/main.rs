//! `bx`: run a script file, or start the interactive REPL.

use std::{
    env, fs,
    io::{self, BufRead, Write},
    process::ExitCode,
};

use bxscript::{ReplSession, Runner, StdPrint};

const CYAN: &str = "\x1b[1;36m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.get(1) {
        Some(path) => run_file(path),
        None => run_repl(),
    }
}

fn run_file(path: &str) -> ExitCode {
    let code = match fs::read_to_string(path) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{RED}[error]{RESET} cannot read {path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let runner = match Runner::new(code, path) {
        Ok(runner) => runner,
        Err(err) => {
            eprintln!("{RED}[error]{RESET} {err}");
            return ExitCode::FAILURE;
        }
    };
    match runner.run_to_completion(&mut StdPrint) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{RED}[error]{RESET} {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_repl() -> ExitCode {
    let mut session = ReplSession::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{CYAN}>> {RESET}");
        let _ = io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "exit" || input == "quit" {
            break;
        }
        match session.execute(input, &mut StdPrint) {
            Ok(result) => {
                if !result.is_null() {
                    println!("{GREEN}=> {result}{RESET}");
                }
            }
            Err(err) => eprintln!("{RED}[error]{RESET} {err}"),
        }
        session.drain_events(&mut StdPrint);
    }
    ExitCode::SUCCESS
}
