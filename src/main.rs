// NOTE: partitions only change how work is split, never the ranks

#[macro_use]
extern crate slog;
extern crate wikirank;

use slog::Level;

use std::process;

use wikirank::cli::{self, Job};
use wikirank::link_state::new_logger_at;

fn main() {
    let args = cli::app().get_matches();
    let job = match Job::from_args(&args) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, args.usage());
            process::exit(1);
        }
    };

    let level = if job.verbose { Level::Debug } else { Level::Info };
    let log = new_logger_at(level);
    info!(log, "Ranking {}", job.input.display();
          "output" => %job.output.display(),
          "iterations" => job.iterations);

    if let Err(e) = cli::run(&job, log.clone()) {
        crit!(log, "Run failed: {}", e);
        process::exit(1);
    }
}
