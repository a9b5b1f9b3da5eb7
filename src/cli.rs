use clap::{App, Arg, ArgMatches};
use slog::Logger;

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::RankConfig;
use crate::error::{RankError, Result};
use crate::link_state::{LinkState, LinkData, ProcData, RankData, CsvSink};

fn is_count(s: String) -> std::result::Result<(), String> {
    s.parse::<usize>().map(|_| ()).map_err(|_| format!("`{}` is not a non-negative integer", s))
}

fn is_float(s: String) -> std::result::Result<(), String> {
    s.parse::<f64>().map(|_| ()).map_err(|_| format!("`{}` is not a number", s))
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new(crate_name!()).about(crate_description!())
        .author(crate_authors!()).version(crate_version!())

        .arg(Arg::with_name("input")
             .required(true)
             .index(1)
             .help("Dump with one page per line"))
        .arg(Arg::with_name("output")
             .required(true)
             .index(2)
             .help("Directory to write ranks.csv and manifest.json to"))
        .arg(Arg::with_name("iterations")
             .required(true)
             .index(3)
             .validator(is_count)
             .help("Number of rounds of propagation"))

        .arg(Arg::with_name("damping")
             .long("damping")
             .takes_value(true)
             .validator(is_float)
             .help("Share of rank that follows links [default: 0.8]"))
        .arg(Arg::with_name("partitions")
             .long("partitions")
             .takes_value(true)
             .validator(is_count)
             .help("Partitions of the graph and rank tables [default: 2]"))
        .arg(Arg::with_name("input_partitions")
             .long("input-partitions")
             .takes_value(true)
             .validator(is_count)
             .help("Chunks the input is parsed in [default: 2]"))
        .arg(Arg::with_name("threads")
             .long("threads")
             .takes_value(true)
             .validator(is_count)
             .help("Worker threads; 0 means one per cpu [default: 0]"))
        .arg(Arg::with_name("scope")
             .long("scope")
             .takes_value(true)
             .possible_values(&["text", "record"])
             .help("Scan links inside <text> only, or in the whole record [default: text]"))
        .arg(Arg::with_name("epsilon")
             .long("epsilon")
             .takes_value(true)
             .validator(is_float)
             .help("Stop early once no rank changes by more than this"))
        .arg(Arg::with_name("top")
             .long("top")
             .takes_value(true)
             .validator(is_count)
             .help("Log the best ranked pages when done"))
        .arg(Arg::with_name("config")
             .long("config")
             .takes_value(true)
             .help("JSON file with defaults; flags override it"))
        .arg(Arg::with_name("verbose")
             .short("v")
             .long("verbose")
             .help("Log every iteration"))
}

/// Everything needed for one run, taken from the command line
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub iterations: usize,
    pub config: RankConfig,
    pub verbose: bool,
}

fn parse_opt<T>(args: &ArgMatches, name: &str) -> Result<Option<T>>
    where T: FromStr, T::Err: Display
{
    match args.value_of(name) {
        Some(v) => v.parse().map(Some).map_err(|e| {
            RankError::Usage(format!("invalid value for --{}: {}", name, e))
        }),
        None => Ok(None),
    }
}

impl Job {
    pub fn from_args(args: &ArgMatches) -> Result<Job> {
        let mut config = match args.value_of("config") {
            Some(p) => RankConfig::from_file(Path::new(p))?,
            None => RankConfig::default(),
        };
        if let Some(d) = parse_opt(args, "damping")? {
            config.damping = d;
        }
        if let Some(p) = parse_opt(args, "partitions")? {
            config.partitions = p;
        }
        if let Some(p) = parse_opt(args, "input_partitions")? {
            config.input_partitions = p;
        }
        if let Some(t) = parse_opt(args, "threads")? {
            config.threads = t;
        }
        if let Some(s) = parse_opt(args, "scope")? {
            config.scope = s;
        }
        if let Some(e) = parse_opt(args, "epsilon")? {
            config.epsilon = Some(e);
        }
        if let Some(k) = parse_opt(args, "top")? {
            config.top = k;
        }
        config.validate()?;

        let iterations = parse_opt(args, "iterations")?
            .ok_or_else(|| RankError::Usage("missing iteration count".into()))?;
        // clap makes these impossible to omit
        let input = args.value_of("input").map(PathBuf::from)
            .ok_or_else(|| RankError::Usage("missing input path".into()))?;
        let output = args.value_of("output").map(PathBuf::from)
            .ok_or_else(|| RankError::Usage("missing output path".into()))?;

        Ok(Job {
            input, output, iterations, config,
            verbose: args.is_present("verbose"),
        })
    }
}

/// Load, propagate, sort and save
pub fn run(job: &Job, log: Logger) -> Result<LinkState<RankData>> {
    let ls_ld = LinkState::<LinkData>::load(&job.input, job.config.clone(), log)?;
    let mut ls_pd: LinkState<ProcData> = ls_ld.into();
    ls_pd.run(job.iterations)?;

    let ls_rd: LinkState<RankData> = ls_pd.into();
    ls_rd.save(&mut CsvSink::new(&job.output))?;
    ls_rd.data();
    Ok(ls_rd)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::link_state::parse::LinkScope;

    fn matches(argv: &[&str]) -> std::result::Result<ArgMatches<'static>, clap::Error> {
        let mut full = vec!["wikirank"];
        full.extend_from_slice(argv);
        app().get_matches_from_safe(full)
    }

    #[test]
    fn needs_exactly_three_positionals() {
        assert!(matches(&[]).is_err());
        assert!(matches(&["in.txt", "out"]).is_err());
        assert!(matches(&["in.txt", "out", "5", "extra"]).is_err());
        assert!(matches(&["in.txt", "out", "5"]).is_ok());
    }

    #[test]
    fn iteration_count_must_be_a_count() {
        assert!(matches(&["in.txt", "out", "-1"]).is_err());
        assert!(matches(&["in.txt", "out", "ten"]).is_err());
        assert!(matches(&["in.txt", "out", "0"]).is_ok());
    }

    #[test]
    fn defaults() {
        let job = Job::from_args(&matches(&["in.txt", "out", "10"]).unwrap()).unwrap();
        assert_eq!(job.input, PathBuf::from("in.txt"));
        assert_eq!(job.output, PathBuf::from("out"));
        assert_eq!(job.iterations, 10);
        assert_eq!(job.config, RankConfig::default());
        assert!(!job.verbose);
    }

    #[test]
    fn flags_override_config() {
        let m = matches(&["in.txt", "out", "3",
                          "--damping", "0.85", "--partitions", "8", "--scope", "record",
                          "--epsilon", "1e-9", "--threads", "2", "-v"]).unwrap();
        let job = Job::from_args(&m).unwrap();
        assert_eq!(job.config.damping, 0.85);
        assert_eq!(job.config.partitions, 8);
        assert_eq!(job.config.scope, LinkScope::Record);
        assert_eq!(job.config.epsilon, Some(1e-9));
        assert_eq!(job.config.threads, 2);
        assert!(job.verbose);
    }

    #[test]
    fn bad_values_are_usage_errors() {
        let m = matches(&["in.txt", "out", "3", "--damping", "2"]).unwrap();
        match Job::from_args(&m) {
            Err(RankError::Usage(_)) => (),
            other => panic!("expected a usage error, got {:?}", other.map(|j| j.iterations)),
        }
        let m = matches(&["in.txt", "out", "3", "--partitions", "0"]).unwrap();
        assert!(Job::from_args(&m).is_err());
    }
}
