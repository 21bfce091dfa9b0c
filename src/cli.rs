//! Command-line arguments for the hasher binary.

use std::path::PathBuf;

use clap::Parser;

use crate::hash::HashRegistry;
use crate::settings::Settings;

#[derive(Parser, Debug, Default)]
#[command(
    name = "hasher",
    version,
    about = "Compute a file's digest and compare it to an expected value"
)]
pub struct Arguments {
    /// The full path to a file to hash
    pub file: Option<PathBuf>,

    /// The name of a hash algorithm to use (see --list)
    #[arg(long, short = 'a')]
    pub algorithm: Option<String>,

    /// The hash value to compare to, or "empty" to skip, or "clipboard"
    #[arg(long, short = 'c')]
    pub compare_to: Option<String>,

    /// Begin hashing immediately instead of waiting for Enter
    #[arg(long, short = 's')]
    pub start: bool,

    /// List the available algorithms and exit
    #[arg(long)]
    pub list: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}

impl Arguments {
    /// Problems that make the arguments unusable, in argument order
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(file) = &self.file {
            if !file.is_file() {
                errors.push(format!("File \"{}\" does not exist.", file.display()));
            }
        }

        if let Some(algorithm) = &self.algorithm {
            if HashRegistry::get_algorithm(algorithm).is_err() {
                errors.push(format!("Unable to find hash algorithm {}.", algorithm));
            }
        }

        errors
    }

    /// Overlay explicit arguments on previously saved settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(file) = &self.file {
            settings.file = Some(file.clone());
        }
        if let Some(algorithm) = &self.algorithm {
            settings.algorithm = algorithm.clone();
        }
        if let Some(compare_to) = &self.compare_to {
            settings.compare_to = compare_to.clone();
        }
    }
}
