// Terminal presentation for a hashing job

use std::path::{Path, PathBuf};

use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use tokio::io::{AsyncBufReadExt, BufReader};

use hasher::hash::{HashOutcome, HashRegistry, HexSource, JobObserver};

/// Shows a progress bar while a job runs
pub struct ConsoleObserver {
    path: PathBuf,
    bar: ProgressBar,
}

impl ConsoleObserver {
    pub fn new(path: &Path) -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg}\n[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}%")
        {
            bar.set_style(style.progress_chars("#>-"));
        }

        Self {
            path: path.to_path_buf(),
            bar,
        }
    }
}

impl JobObserver for ConsoleObserver {
    fn on_started(&self, total_bytes: u64) {
        self.bar.set_message(format!(
            "Hashing: {} ({}) - Ctrl-C to cancel",
            self.path.display(),
            format_size(total_bytes, BINARY)
        ));
    }

    fn on_progress(&self, percent: f64) {
        self.bar.set_position(percent as u64);
    }

    fn on_finished(&self, _outcome: &HashOutcome) {
        self.bar.finish_and_clear();
    }
}

/// Reads the compare value from the system clipboard
pub struct ClipboardSource;

impl HexSource for ClipboardSource {
    fn read_text(&self) -> Option<String> {
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.get_text()) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Clipboard unavailable: {}", e);
                None
            }
        }
    }
}

pub fn print_algorithms() {
    println!("{:<14} {:>6}  {}", "ALGORITHM", "BITS", "POST-QUANTUM");
    for info in HashRegistry::list_algorithms() {
        let pq = if info.post_quantum { "yes" } else { "no" };
        println!("{:<14} {:>6}  {}", info.name, info.output_bits, pq);
    }
}

pub fn print_request(file: &Path, algorithm: &str, compare_to: &str) {
    println!("File:       {}", file.display());
    println!("Algorithm:  {}", algorithm);
    if compare_to.is_empty() {
        println!("Compare To: (none)");
    } else {
        println!("Compare To: {}", compare_to);
    }
}

/// Wait for Enter; false on end of input
pub async fn confirm_start() -> std::io::Result<bool> {
    println!("Press Enter to start hashing.");
    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(read > 0)
}

pub fn print_outcome(outcome: &HashOutcome) {
    match outcome {
        HashOutcome::Success { .. } => println!("{}", outcome),
        HashOutcome::Match { .. } => println!("{}", outcome.to_string().green()),
        HashOutcome::Mismatch { .. } => println!("{}", outcome.to_string().red()),
        HashOutcome::Canceled => println!("{}", outcome.to_string().yellow()),
        HashOutcome::ValidationFailed { messages } => {
            for message in messages {
                eprintln!("{}", message.red());
            }
        }
        HashOutcome::RuntimeError { message } => eprintln!("{}", message.red()),
    }
}
