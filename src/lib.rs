// NOTE: links are scanned inside `<text>…</text>` by default;
// run with `--scope record` to scan whole records instead

// LOGGING
#[macro_use] extern crate slog;
extern crate slog_term;
// SERIALIZING
#[macro_use] extern crate serde_derive;
extern crate serde_json;
extern crate csv;
// MISC
#[macro_use] extern crate clap;
#[macro_use] extern crate lazy_static;
extern crate fnv;
extern crate chrono;
extern crate rayon;
extern crate regex;

// COMPONENTS
pub mod article;
pub mod cli;
pub mod config;
pub mod error;
pub mod link_state;

pub use crate::config::RankConfig;
pub use crate::error::{RankError, Result};
