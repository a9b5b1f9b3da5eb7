use regex::Regex;

// NOTE about markers:
//  The dump puts one page per line. Only the first occurrence of each marker
//  counts; anything after the first `</title>` or `</text>` is ignored.
//  `<text` is left open because the tag usually carries attributes,
//  e.g. `<text xml:space="preserve">`, which then become part of the section.

pub const TITLE_OPEN: &str = "<title>";
pub const TITLE_CLOSE: &str = "</title>";
pub const TEXT_OPEN: &str = "<text";
pub const TEXT_CLOSE: &str = "</text>";

pub fn link_regex() -> String {
    // `[[` then anything but `]` then `]]`; the body is captured raw, so
    // `[[Target|shown text]]` yields `Target|shown text`
    String::from(r"\[\[([^\]]*)\]\]")
}

lazy_static! {
    pub static ref LINK_RE: Regex = Regex::new(&link_regex())
        .expect("link regex is a valid literal");
}
