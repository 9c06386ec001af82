use std::{env, fs, io::Write as _, process::ExitCode};

use triad::{Runner, Version};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let mut version = Version::V5;
    let mut file_path = None;
    for a in args.iter().skip(1) {
        match a.as_str() {
            "--v1" => version = Version::V1,
            "--v3" => version = Version::V3,
            "--v5" => version = Version::V5,
            other => file_path = Some(other.to_string()),
        }
    }

    match file_path {
        Some(path) => run_file(version, &path),
        None => run_repl(version),
    }
}

fn run_file(version: Version, path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error reading {path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut runner = Runner::new(version, path.to_string());
    match runner.run(&source) {
        Ok(outcome) => {
            println!("{}", outcome.display);
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("{failure}");
            ExitCode::FAILURE
        }
    }
}

/// A line-at-a-time REPL over a single persistent [`Runner`], so top-level
/// `var`/`function` bindings from one line stay visible to the next.
fn run_repl(version: Version) -> ExitCode {
    let mut runner = Runner::new(version, "<repl>");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        if std::io::stdout().flush().is_err() {
            return ExitCode::FAILURE;
        }
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS,
            Ok(_) => {}
            Err(err) => {
                eprintln!("error reading stdin: {err}");
                return ExitCode::FAILURE;
            }
        }
        if line.trim().is_empty() {
            continue;
        }
        match runner.run(&line) {
            Ok(outcome) => println!("{}", outcome.display),
            Err(failure) => eprintln!("{failure}"),
        }
    }
}
