//! Listing generation: aggregate pages built from already-generated
//! records.
//!
//! Every variant renders one item fragment per record, concatenates the
//! fragments in input order (no independent sorting happens here), embeds
//! the result into the list layout under `content`, and writes the page.
//! The feed is the same machinery with feed templates. The consolidated
//! tag index is the one exception: its body is emitted directly and
//! wrapped in the page layout.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;

use crate::content::ContentRecord;
use crate::tags::TagIndex;
use crate::template::{self, Context};
use crate::util;

/// Maximum number of words in an item summary.
pub const SUMMARY_WORDS: usize = 25;

/// Generates listing pages from a sorted record slice. One instance is
/// configured per list/item layout pair (index, archive, feed).
pub struct ListGenerator<'a> {
    /// Output tree root; destination paths are resolved beneath it.
    pub site_dir: &'a Path,

    /// The layout wrapping the concatenated items.
    pub list_layout: &'a str,

    /// The layout rendered once per record.
    pub item_layout: &'a str,

    /// Global + collection context.
    pub ctx: &'a Context,
}

impl ListGenerator<'_> {
    /// Index-style listing (also the feed): one item per record, in input
    /// order.
    pub fn generate(&self, records: &[ContentRecord], dst_template: &str) -> Result<()> {
        let body: String = records.iter().map(|record| self.render_item(record)).collect();
        self.write_list(&body, dst_template, self.ctx)
    }

    /// Chronological archive: like [`generate`](ListGenerator::generate)
    /// but a month/year heading is prepended whenever the year-month group
    /// changes. Assumes `records` is already date-sorted descending.
    pub fn generate_grouped(&self, records: &[ContentRecord], dst_template: &str) -> Result<()> {
        let mut body = String::new();
        let mut group: Option<&str> = None;
        for record in records {
            if group != Some(record.subdir.as_str()) {
                body.push_str(&month_heading(record));
                group = Some(&record.subdir);
            }
            body.push_str(&self.render_item(record));
        }
        self.write_list(&body, dst_template, self.ctx)
    }

    /// One listing per tag known to `tags`, at
    /// `{collection_dir}/tag_{tag}.html`, containing the records whose tag
    /// list includes that tag.
    pub fn generate_by_tag(
        &self,
        records: &[ContentRecord],
        tags: &TagIndex,
        collection_dir: &str,
    ) -> Result<()> {
        for tag in tags.tags() {
            let body: String = records
                .iter()
                .filter(|record| record.has_tag(tag))
                .map(|record| self.render_item(record))
                .collect();
            let mut ctx = self.ctx.clone();
            ctx.set("title", format!("Posts tagged {}", tag));
            let dst = format!("{}/tag_{}.html", collection_dir, tag);
            self.write_list(&body, &dst, &ctx)?;
        }
        Ok(())
    }

    fn render_item(&self, record: &ContentRecord) -> String {
        let mut ctx = self.ctx.clone();
        for (key, value) in record.fields() {
            ctx.set(key, value);
        }
        ctx.set("summary", truncate(&record.content, SUMMARY_WORDS));
        template::render(self.item_layout, &ctx)
    }

    fn write_list(&self, body: &str, dst_template: &str, ctx: &Context) -> Result<()> {
        let mut ctx = ctx.clone();
        ctx.set("content", body);
        let dst = template::render(dst_template, &ctx);
        let output = template::render(self.list_layout, &ctx);
        let dst_path = self.site_dir.join(&dst);
        info!("Rendering list => {} ...", dst_path.display());
        util::write_file(&dst_path, &output).map_err(|err| Error::WriteOutput {
            path: dst_path,
            err,
        })
    }
}

/// Writes the consolidated tag index (`{collection_dir}/alltags.html`):
/// one line per tag with its post count, linking to the tag's listing
/// page, wrapped directly in the page layout.
pub fn generate_tag_index(
    site_dir: &Path,
    page_layout: &str,
    ctx: &Context,
    tags: &TagIndex,
    collection_dir: &str,
) -> Result<()> {
    let mut body = String::from("<ul class=\"alltags\">\n");
    for (name, entry) in tags.iter() {
        body.push_str(&format!(
            "<li><a href=\"{}\">{}</a> ({})</li>\n",
            entry.url,
            name,
            entry.count(),
        ));
    }
    body.push_str("</ul>\n");

    let mut page_ctx = ctx.clone();
    page_ctx.set("content", body);
    page_ctx.set("title", "All tags");
    let output = template::render(page_layout, &page_ctx);
    let dst_path = site_dir.join(collection_dir).join("alltags.html");
    info!("Rendering tag index => {} ...", dst_path.display());
    util::write_file(&dst_path, &output).map_err(|err| Error::WriteOutput {
        path: dst_path,
        err,
    })
}

/// Strips markup tags (each replaced by a space, as a word boundary) and
/// truncates to at most `words` words.
pub fn truncate(text: &str, words: usize) -> String {
    strip_markup(text)
        .split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => {
                out.push(' ');
                rest = &rest[open + close + 1..];
            }
            // A `<` with no closing `>` is ordinary text.
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

fn month_heading(record: &ContentRecord) -> String {
    let label = NaiveDate::parse_from_str(&record.date, "%Y-%m-%d")
        .map(|date| date.format("%B %Y").to_string())
        .unwrap_or_else(|_| record.subdir.clone());
    format!("<h2>{}</h2>\n", label)
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing listing pages.
#[derive(Debug)]
pub enum Error {
    /// Returned when an output file cannot be written.
    WriteOutput { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::WriteOutput { path, err } => {
                write!(f, "Writing output file '{}': {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WriteOutput { path: _, err } => Some(err),
        }
    }
}
