mod console;

use std::sync::Arc;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use log::warn;

use hasher::cli::Arguments;
use hasher::hash::{CompareResolver, HashEngine, JobRequest};
use hasher::settings::Settings;

use console::{ClipboardSource, ConsoleObserver};

const EXIT_USAGE: i32 = 2;
const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("HASHER_LOG", "warn")).init();

    let args = Arguments::parse();
    if args.list {
        console::print_algorithms();
        return Ok(());
    }

    let errors = args.errors();
    if !errors.is_empty() {
        usage_error(&errors);
    }

    let mut settings = Settings::load();
    args.apply_to(&mut settings);

    let resolver = CompareResolver::new(ClipboardSource);
    settings.compare_to = resolver.resolve(&settings.compare_to);

    let Some(file) = settings.file.clone() else {
        usage_error(&["A file to hash must be specified.".to_string()]);
    };

    if !args.start {
        console::print_request(&file, &settings.algorithm, &settings.compare_to);
        if !console::confirm_start().await? {
            return Ok(());
        }
    }

    let engine = HashEngine::new();
    let request = JobRequest::new(&file, settings.algorithm.as_str())
        .compare_to(settings.compare_to.clone());
    let handle = engine.start(request, Arc::new(ConsoleObserver::new(&file)))?;

    // Ctrl-C cancels the job; the outcome still arrives through `wait`.
    let canceller = handle.canceller();
    let wait = handle.wait();
    tokio::pin!(wait);
    let outcome = loop {
        tokio::select! {
            outcome = &mut wait => break outcome,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                canceller.cancel();
            }
        }
    };

    if let Err(e) = settings.save() {
        warn!("{}", e.summary());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        console::print_outcome(&outcome);
    }

    if outcome.is_failure() {
        std::process::exit(EXIT_FAILURE);
    }
    Ok(())
}

fn usage_error(errors: &[String]) -> ! {
    for error in errors {
        eprintln!("{}", error.red());
    }
    eprintln!("{}", Arguments::command().render_usage());
    std::process::exit(EXIT_USAGE);
}
