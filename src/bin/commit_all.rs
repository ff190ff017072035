use badge_tracker::commit::{commit_all, CommitOutcome, CHECKOUTS};
use badge_tracker::init_logger;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;

const AFTER_HELP: &str = "\
Directories that are missing or not git checkouts are skipped silently and \
checkouts with nothing staged are reported without committing. Unlike a plain \
shell loop, the exit status of every `git commit` is checked: the remaining \
checkouts are still committed, but commit-all exits with status 1 if any \
commit failed.";

/// Stage and commit every checkout in the current directory
#[derive(Parser, Debug)]
#[command(name = "commit-all", after_help = AFTER_HELP)]
struct Args {
    /// Message used for every commit
    message: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if args.message.trim().is_empty() {
        eprintln!("error: the commit message must not be empty\n");
        eprintln!("{}", Args::command().render_usage());
        return ExitCode::from(2);
    }

    init_logger();

    let root = match std::env::current_dir() {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error: unable to read the current directory: {err}");
            return ExitCode::FAILURE;
        }
    };

    let reports = commit_all(&root, CHECKOUTS, &args.message).await;
    for report in &reports {
        let name = report
            .path
            .strip_prefix(&root)
            .ok()
            .filter(|relative| !relative.as_os_str().is_empty())
            .map(|relative| relative.display().to_string())
            .unwrap_or_else(|| ".".to_string());
        match &report.outcome {
            Ok(CommitOutcome::Skipped(_)) => {}
            Ok(outcome) => println!("{name}: {outcome}"),
            Err(err) => println!("{name}: {err}"),
        }
    }

    let failures = reports.iter().filter(|report| report.is_failure()).count();
    if failures > 0 {
        println!("Done with {failures} failed checkout(s)");
        return ExitCode::FAILURE;
    }
    println!("Done");
    ExitCode::SUCCESS
}
