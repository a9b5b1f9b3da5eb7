use rayon::prelude::*;
use rayon::ThreadPool;
use slog::Logger;

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::AddAssign;
use std::path::Path;
use std::str::FromStr;

use crate::article::Page;
use crate::error::{RankError, Result};

mod regexes;
use self::regexes::*;

// Parsing Note:
//  Records are never rejected. A line without markers still becomes a page,
//  possibly with an empty or truncated title and no links, so one bad line
//  can't take down a run over millions of good ones. Bytes that aren't utf8
//  are replaced with U+FFFD via String::from_utf8_lossy().

// how many degenerate records per chunk get their own warning before we only count them
const MAX_WARNINGS: usize = 5;


/// Which part of a record is scanned for `[[links]]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScope {
    /// only the section between `<text` and `</text>`
    Text,
    /// the whole record, title and metadata included
    Record,
}

impl FromStr for LinkScope {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(LinkScope::Text),
            "record" => Ok(LinkScope::Record),
            _ => Err(format!("unknown link scope `{}` (expected `text` or `record`)", s)),
        }
    }
}

impl fmt::Display for LinkScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LinkScope::Text => write!(f, "text"),
            LinkScope::Record => write!(f, "record"),
        }
    }
}


/// Counters collected while loading; none of these stop a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub records:    usize,
    pub blank:      usize,  // empty lines, not treated as records
    pub untitled:   usize,  // records with no `<title>` marker
    pub duplicates: usize,  // records whose title was already taken
    pub links:      usize,
}

impl AddAssign for LoadStats {
    fn add_assign(&mut self, other: LoadStats) {
        self.records += other.records;
        self.blank += other.blank;
        self.untitled += other.untitled;
        self.duplicates += other.duplicates;
        self.links += other.links;
    }
}


/// Slice `s` between the first `open` and the first `close`
/// Missing `open` starts at the beginning, missing `close` runs to the end,
/// and a `close` that comes before the end of `open` gives an empty slice.
fn between<'a>(s: &'a str, open: &str, close: &str) -> &'a str {
    let begin = s.find(open).map(|i| i + open.len()).unwrap_or(0);
    let end = s.find(close).unwrap_or_else(|| s.len());
    if end < begin {
        ""
    } else {
        &s[begin..end]
    }
}

pub fn extract_title(record: &str) -> &str {
    between(record, TITLE_OPEN, TITLE_CLOSE)
}

pub fn extract_links(record: &str, scope: LinkScope) -> Vec<String> {
    let haystack = match scope {
        LinkScope::Text => between(record, TEXT_OPEN, TEXT_CLOSE),
        LinkScope::Record => record,
    };
    LINK_RE.captures_iter(haystack)
        .filter_map(|c| c.get(1))
        .map(|m| String::from(m.as_str()))
        .collect()
}

/// Turn one raw record into a page; never fails
pub fn parse_record(record: &str, scope: LinkScope) -> Page {
    Page::new(extract_title(record), extract_links(record, scope))
}

fn parse_chunk(lines: &[String], scope: LinkScope, log: &Logger) -> (Vec<Page>, LoadStats) {
    let mut stats = LoadStats::default();
    let mut pages = Vec::with_capacity(lines.len());
    for line in lines {
        if !line.contains(TITLE_OPEN) {
            stats.untitled += 1;
            if stats.untitled <= MAX_WARNINGS {
                let preview: String = line.chars().take(60).collect();
                warn!(log, "Record has no title marker"; "record" => preview);
            }
        }
        let page = parse_record(line, scope);
        stats.records += 1;
        stats.links += page.links.len();
        pages.push(page);
    }
    if stats.untitled > MAX_WARNINGS {
        warn!(log, "{} more records had no title marker", stats.untitled - MAX_WARNINGS);
    }
    (pages, stats)
}

/// Read every non-blank line of `path`
/// Returns the lines and the number of blank ones that were skipped.
pub fn read_records(path: &Path) -> Result<(Vec<String>, usize)> {
    let f = File::open(path).map_err(RankError::io(path))?;
    let mut reader = BufReader::new(f);
    let mut buffer = Vec::<u8>::new();
    let mut lines = Vec::new();
    let mut blank = 0usize;
    loop {
        buffer.clear();
        let len = reader.read_until(b'\n', &mut buffer).map_err(RankError::io(path))?;
        if len == 0 {
            break;
        }
        while let Some(&b) = buffer.last() {
            if b == b'\n' || b == b'\r' {
                buffer.pop();
            } else {
                break;
            }
        }
        let s: Cow<str> = String::from_utf8_lossy(&buffer);
        if s.trim().is_empty() {
            blank += 1;
        } else {
            lines.push(s.into_owned());
        }
    }
    Ok((lines, blank))
}

/// Split records into `n` contiguous chunks, keeping their order
pub fn split_chunks(lines: Vec<String>, n: usize) -> Vec<Vec<String>> {
    let n = n.max(1);
    let size = lines.len() / n + 1;
    let mut chunks: Vec<Vec<String>> = (0..n).map(|_| Vec::with_capacity(size)).collect();
    for (i, line) in lines.into_iter().enumerate() {
        chunks[i / size].push(line);
    }
    chunks
}

/// Load and parse `path` as `chunks` input partitions on `pool`
/// The outer vector keeps input order: chunk 0 holds the first records.
pub fn load_pages(path: &Path,
                  scope: LinkScope,
                  chunks: usize,
                  pool: &ThreadPool,
                  log: &Logger) -> Result<(Vec<Vec<Page>>, LoadStats)>
{
    let (lines, blank) = read_records(path)?;
    info!(log, "Read {} records ({} blank lines skipped)", lines.len(), blank);
    let chunks = split_chunks(lines, chunks);

    let parsed: Vec<(Vec<Page>, LoadStats)> = pool.install(|| {
        chunks.par_iter()
            .enumerate()
            .map(|(i, c)| parse_chunk(c, scope, &log.new(o!("chunk" => i))))
            .collect()
    });

    let mut stats = LoadStats { blank, ..LoadStats::default() };
    let mut pages = Vec::with_capacity(parsed.len());
    for (p, s) in parsed {
        stats += s;
        pages.push(p);
    }
    Ok((pages, stats))
}
