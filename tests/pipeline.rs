#[macro_use]
extern crate slog;
extern crate tempfile;
extern crate wikirank;

use slog::Logger;
use tempfile::tempdir;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use wikirank::cli::{self, Job};
use wikirank::link_state::rank_data::sink::{read_manifest, read_ranks};
use wikirank::link_state::parse::LinkScope;
use wikirank::RankConfig;

const DUMP: &str = "\
<page><title>Alpha</title><text xml:space=\"preserve\">see [[Beta]] and [[Gamma]]</text></page>
<page><title>Beta</title><text>back to [[Alpha]] and off to [[Nowhere]]</text></page>

<page><title>Gamma</title><text>[[Alpha]]</text></page>
<page><title>Delta</title><text>no links here</text></page>
<page><title>Beta</title><text>[[Delta]] from a duplicate</text></page>
";

fn quiet() -> Logger {
    Logger::root(slog::Discard, o!())
}

fn job(input: &Path, output: PathBuf, iterations: usize, config: RankConfig) -> Job {
    Job {
        input: input.to_path_buf(),
        output,
        iterations,
        config,
        verbose: false,
    }
}

fn write_dump(dir: &Path, body: &str) -> PathBuf {
    let input = dir.join("dump.txt");
    fs::write(&input, body).unwrap();
    input
}

#[test]
fn ranks_a_small_dump() {
    let dir = tempdir().unwrap();
    let input = write_dump(dir.path(), DUMP);
    let out = dir.path().join("out");

    let ls = cli::run(&job(&input, out.clone(), 10, RankConfig::default()), quiet()).unwrap();
    assert_eq!(ls.size(), 4);

    let ranks = read_ranks(&out).unwrap();
    let mut titles: Vec<&str> = ranks.iter().map(|&(ref t, _)| t.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Alpha", "Beta", "Delta", "Gamma"]);

    assert!(ranks.windows(2).all(|w| w[0].1 >= w[1].1));
    assert_eq!(ranks[0].0, "Alpha");
    let sum: f64 = ranks.iter().map(|&(_, r)| r).sum();
    assert!(sum <= 1.0 + 1e-12);
    assert!(ranks.iter().all(|&(_, r)| r > 0.0));

    let m = read_manifest(&out).unwrap();
    assert_eq!(m.nodes, 4);
    assert_eq!(m.iterations, 10);
    assert!(!m.converged);
    assert_eq!(m.scope, LinkScope::Text);
    assert!((m.rank_sum - sum).abs() < 1e-9);
}

#[test]
fn first_duplicate_wins() {
    let dir = tempdir().unwrap();
    let input = write_dump(dir.path(), DUMP);
    let out = dir.path().join("out");

    cli::run(&job(&input, out.clone(), 1, RankConfig::default()), quiet()).unwrap();
    let ranks: HashMap<String, f64> = read_ranks(&out).unwrap().into_iter().collect();

    // Delta is only linked from the dropped duplicate of Beta
    let floor = (1.0 - 0.8) / 4.0;
    assert!((ranks["Delta"] - floor).abs() < 1e-12);
}

#[test]
fn partition_count_does_not_change_ranks() {
    let dir = tempdir().unwrap();
    let input = write_dump(dir.path(), DUMP);

    let mut results = Vec::new();
    for &(partitions, threads) in &[(1, 1), (2, 2), (7, 3)] {
        let out = dir.path().join(format!("out-{}", partitions));
        let mut config = RankConfig::default();
        config.partitions = partitions;
        config.input_partitions = partitions;
        config.threads = threads;
        cli::run(&job(&input, out.clone(), 6, config), quiet()).unwrap();
        let ranks: HashMap<String, f64> = read_ranks(&out).unwrap().into_iter().collect();
        results.push(ranks);
    }
    for other in &results[1..] {
        assert_eq!(other.len(), results[0].len());
        for (title, r) in &results[0] {
            assert!((other[title] - r).abs() < 1e-12, "{} moved", title);
        }
    }
}

#[test]
fn converges_early_with_threshold() {
    let dir = tempdir().unwrap();
    let input = write_dump(dir.path(), DUMP);
    let out = dir.path().join("out");

    let mut config = RankConfig::default();
    config.epsilon = Some(1e-6);
    let ls = cli::run(&job(&input, out.clone(), 1000, config), quiet()).unwrap();
    assert!(ls.run_state().converged());
    assert!(ls.run_state().iterations() < 1000);

    let m = read_manifest(&out).unwrap();
    assert!(m.converged);
    assert_eq!(m.iterations, ls.run_state().iterations());
}

#[test]
fn record_scope_sees_links_outside_text() {
    let dir = tempdir().unwrap();
    let body = "<page><title>A</title>[[B]]<text>plain</text></page>\n\
                <page><title>B</title><text>plain</text></page>\n";
    let input = write_dump(dir.path(), body);

    let mut by_scope = Vec::new();
    for &scope in &[LinkScope::Text, LinkScope::Record] {
        let out = dir.path().join(scope.to_string());
        let mut config = RankConfig::default();
        config.scope = scope;
        cli::run(&job(&input, out.clone(), 1, config), quiet()).unwrap();
        let ranks: HashMap<String, f64> = read_ranks(&out).unwrap().into_iter().collect();
        by_scope.push(ranks);
    }
    assert!((by_scope[0]["B"] - 0.1).abs() < 1e-12);
    assert!(by_scope[1]["B"] > by_scope[0]["B"]);
}

#[test]
fn empty_dump_writes_empty_ranks() {
    let dir = tempdir().unwrap();
    let input = write_dump(dir.path(), "\n\n");
    let out = dir.path().join("out");

    let ls = cli::run(&job(&input, out.clone(), 3, RankConfig::default()), quiet()).unwrap();
    assert_eq!(ls.size(), 0);
    assert!(read_ranks(&out).unwrap().is_empty());
    assert_eq!(read_manifest(&out).unwrap().nodes, 0);
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let res = cli::run(&job(&dir.path().join("nope.txt"), out.clone(), 3, RankConfig::default()),
                       quiet());
    assert!(res.is_err());
    assert!(!out.exists());
}
