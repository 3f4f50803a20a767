//! Parses content source files into [`ContentRecord`]s: filename-derived
//! date and slug, the leading `<!-- key : value -->` header block, and the
//! (optionally Markdown-converted) body.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};

use crate::util;

/// Placeholder date for content whose filename carries no date prefix.
pub const EPOCH_DATE: &str = "1970-01-01";

/// One content file's parsed representation. Created once per source file
/// per run; immutable afterwards except for the one-shot self-referential
/// content re-render performed by page generation when [`render`] is set.
///
/// [`render`]: ContentRecord::render
#[derive(Clone, Debug, PartialEq)]
pub struct ContentRecord {
    /// Calendar date (`YYYY-MM-DD`), from the filename prefix or a `date`
    /// header; [`EPOCH_DATE`] when neither is present.
    pub date: String,

    /// Year-month grouping key (`YYYY/MM`), derived from the filename date.
    pub subdir: String,

    /// Filename stem with any leading date prefix stripped. Never empty.
    pub slug: String,

    pub title: Option<String>,

    /// Raw whitespace-separated tag list from the `tags` header.
    pub tags: Option<String>,

    /// True when the file opted into the self-referential content render
    /// with a `render: yes` header.
    pub render: bool,

    /// The post-header body, HTML after any Markdown conversion.
    pub content: String,

    /// [`date`](ContentRecord::date) reformatted per RFC 2822, for feeds.
    pub rfc_2822_date: String,

    /// Header keys the generator never inspects, kept for templates.
    pub extra: BTreeMap<String, String>,
}

impl ContentRecord {
    /// The template-visible `(key, value)` pairs of this record, core
    /// fields first so a stray `extra` key cannot shadow them.
    pub fn fields(&self) -> Vec<(&str, &str)> {
        let mut fields = vec![
            ("date", self.date.as_str()),
            ("subdir", self.subdir.as_str()),
            ("slug", self.slug.as_str()),
            ("content", self.content.as_str()),
            ("rfc_2822_date", self.rfc_2822_date.as_str()),
        ];
        if let Some(title) = &self.title {
            fields.push(("title", title));
        }
        if let Some(tags) = &self.tags {
            fields.push(("tags", tags));
        }
        if self.render {
            fields.push(("render", "yes"));
        }
        for (key, value) in &self.extra {
            fields.push((key.as_str(), value.as_str()));
        }
        fields
    }

    /// True when `tag` appears in this record's whitespace-delimited tag
    /// list.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags
            .as_deref()
            .map_or(false, |tags| tags.split_whitespace().any(|t| t == tag))
    }
}

/// Reads one content file. Returns `Ok(None)` ("not applicable") for
/// directories and for paths without a recognized content extension; an
/// unreadable file is an error, which the caller treats as fatal.
pub fn read_content(path: &Path) -> io::Result<Option<ContentRecord>> {
    if path.is_dir() {
        return Ok(None);
    }
    let file_name = match path.file_name().and_then(|name| name.to_str()) {
        Some(name) => name,
        None => return Ok(None),
    };
    let is_markup = file_name.ends_with(".md");
    if !is_markup && !file_name.ends_with(".html") {
        return Ok(None);
    }

    // Stem is everything up to the first dot.
    let stem = file_name.split('.').next().unwrap_or("");
    if stem.is_empty() {
        return Ok(None);
    }

    let text = util::read_file(path)?;

    let (date, slug) = split_date_slug(stem);
    // `date` here always has the fixed 10-byte YYYY-MM-DD shape.
    let subdir = format!("{}/{}", &date[..4], &date[5..7]);

    // Headers may overwrite any derived field; `subdir` is not recomputed
    // from a header-supplied date.
    let (mut meta, body_start) = read_headers(&text);
    let date = meta.remove("date").unwrap_or(date);
    let subdir = meta.remove("subdir").unwrap_or(subdir);
    let slug = meta.remove("slug").unwrap_or(slug);
    let title = meta.remove("title");
    let tags = meta.remove("tags");
    let render = meta.remove("render").map_or(false, |value| value == "yes");

    let body = &text[body_start..];
    let content = if is_markup {
        convert_markup(path, body)
    } else {
        body.to_string()
    };

    Ok(Some(ContentRecord {
        rfc_2822_date: rfc_2822(&date),
        date,
        subdir,
        slug,
        title,
        tags,
        render,
        content,
        extra: meta,
    }))
}

/// Splits a filename stem into its date prefix and slug. A stem without a
/// `YYYY-MM-DD-` prefix (including one whose prefix would leave an empty
/// slug) dates to [`EPOCH_DATE`] and keeps the whole stem as the slug. The
/// prefix is matched by shape only; no calendar validation.
fn split_date_slug(stem: &str) -> (String, String) {
    let bytes = stem.as_bytes();
    let has_prefix = bytes.len() > 11
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
        && bytes[10] == b'-';

    if has_prefix {
        (stem[..10].to_string(), stem[11..].to_string())
    } else {
        (EPOCH_DATE.to_string(), stem.to_string())
    }
}

/// Scans the leading header block: a contiguous run of
/// `<!-- key : value -->` lines (whitespace around the delimiters and the
/// colon is insignificant; key and value are single-line and non-empty).
/// Returns the parsed pairs, later duplicates overwriting earlier ones, and
/// the byte offset where body content begins: immediately after the last
/// header line and any whitespace following it. Zero headers leaves the
/// offset at 0, making the entire file body content.
fn read_headers(text: &str) -> (BTreeMap<String, String>, usize) {
    let mut meta = BTreeMap::new();
    let mut body_start = 0;
    let mut pos = 0;

    loop {
        let rest = &text[pos..];
        let at = pos + (rest.len() - rest.trim_start().len());
        let rest = &text[at..];
        if !rest.starts_with("<!--") {
            break;
        }
        let close = match rest.find("-->") {
            Some(close) => close,
            None => break,
        };
        let inner = &rest[4..close];
        if inner.contains('\n') {
            break;
        }
        let colon = match inner.find(':') {
            Some(colon) => colon,
            None => break,
        };
        let key = inner[..colon].trim();
        let value = inner[colon + 1..].trim();
        if key.is_empty() || value.is_empty() {
            break;
        }
        meta.insert(key.to_string(), value.to_string());

        pos = at + close + 3;
        let rest = &text[pos..];
        pos += rest.len() - rest.trim_start().len();
        body_start = pos;
    }

    (meta, body_start)
}

/// Reformats a `YYYY-MM-DD` date as RFC 2822 at midnight UTC. A date that
/// does not parse (possible only via a `date` header, since
/// filename-derived dates are shape-checked) falls back to the epoch.
fn rfc_2822(date: &str) -> String {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap_or_default();
    date.and_time(NaiveTime::MIN)
        .format("%a, %d %b %Y %H:%M:%S +0000")
        .to_string()
}

#[cfg(feature = "markdown")]
fn convert_markup(_path: &Path, body: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(body, options));
    out
}

#[cfg(not(feature = "markdown"))]
fn convert_markup(path: &Path, body: &str) -> String {
    log::warn!(
        "cannot render Markdown in {}: built without the `markdown` feature",
        path.display()
    );
    body.to_string()
}
