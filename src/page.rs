//! Page generation: one output file per matching content source file.
//!
//! This is the first phase of a collection build. Besides writing the
//! individual pages it returns the parsed records, sorted most recent
//! first, and registers every tagged page into the collection's
//! [`TagIndex`] so the listing phase can build tag pages afterward.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::content::{self, ContentRecord};
use crate::glob::Pattern;
use crate::tags::TagIndex;
use crate::template::{self, Context};
use crate::util;

/// Generates individual pages. One instance is configured per
/// page-generation call site (standalone pages, or one collection's
/// posts); [`PageGenerator::generate`] does the work.
pub struct PageGenerator<'a> {
    /// Project root; source patterns are resolved beneath it.
    pub root: &'a Path,

    /// Output tree root; destination paths are resolved beneath it.
    pub site_dir: &'a Path,

    /// The layout applied to every matched file.
    pub layout: &'a str,

    /// Global + collection context, merged under each page's own fields.
    pub ctx: &'a Context,
}

impl PageGenerator<'_> {
    /// Builds one page per content file matching `pattern`. `dst_template`
    /// is rendered against each page's context to derive that page's
    /// output path relative to the site root. When `tags` is supplied,
    /// every record carrying a `tags` field is registered into it.
    ///
    /// Returns the parsed records sorted by date descending; the sort is
    /// stable, so records sharing a date keep enumeration order.
    pub fn generate(
        &self,
        pattern: &str,
        dst_template: &str,
        mut tags: Option<&mut TagIndex>,
    ) -> Result<Vec<ContentRecord>> {
        let mut records = Vec::new();

        for src_path in Pattern::new(pattern).glob(self.root)? {
            let mut record = match content::read_content(&src_path) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) => {
                    return Err(Error::ReadSource {
                        path: src_path,
                        err,
                    })
                }
            };

            let mut ctx = self.ctx.clone();
            for (key, value) in record.fields() {
                ctx.set(key, value);
            }

            // Opt-in self-referential render: exactly one extra pass over
            // the body with the page's own context. A placeholder
            // introduced by this pass stays literal.
            if record.render {
                let expanded = template::render(&record.content, &ctx);
                ctx.set("content", expanded.as_str());
                record.content = expanded;
            }

            let dst = template::render(dst_template, &ctx);

            match tags.as_deref_mut() {
                Some(tags) => register_tags(tags, &mut ctx, &record, &dst),
                None => ctx.set("tags_html", ""),
            }

            let output = template::render(self.layout, &ctx);
            let dst_path = self.site_dir.join(&dst);
            info!("Rendering {} => {} ...", src_path.display(), dst_path.display());
            util::write_file(&dst_path, &output).map_err(|err| Error::WriteOutput {
                path: dst_path,
                err,
            })?;

            records.push(record);
        }

        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }
}

/// Registers `record` under each of its tags and injects the `tags_html`
/// navigation fragment into `ctx`. The tag listing URL is derived from the
/// destination path's collection-directory component; a destination with
/// no such component (a root-level page) is left unregistered.
fn register_tags(tags: &mut TagIndex, ctx: &mut Context, record: &ContentRecord, dst: &str) {
    ctx.set("tags_html", "");
    let tag_list = match record.tags.as_deref() {
        Some(tag_list) => tag_list,
        None => return,
    };
    let mut parts = dst.split('/');
    let collection_dir = match (parts.next(), parts.next()) {
        (Some(dir), Some(_)) => dir,
        _ => return,
    };

    let base_path = ctx.get("base_path").unwrap_or("").to_string();
    let title = record.title.clone().unwrap_or_default();

    let mut nav = String::new();
    for tag in tag_list.split_whitespace() {
        let url = format!("{}/{}/tag_{}.html", base_path, collection_dir, tag);
        tags.register(tag, &url, dst, &title);
        nav.push_str(&format!("<a href=\"{}\">{}</a> ", url, tag));
    }
    if !nav.is_empty() {
        ctx.set(
            "tags_html",
            format!("<p class=\"tags\">Tags: {}</p>", nav.trim_end()),
        );
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error generating pages.
#[derive(Debug)]
pub enum Error {
    /// Returned when a source file cannot be read.
    ReadSource { path: PathBuf, err: io::Error },

    /// Returned when an output file cannot be written.
    WriteOutput { path: PathBuf, err: io::Error },

    /// Returned for I/O problems while enumerating source files.
    Walk(walkdir::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadSource { path, err } => {
                write!(f, "Reading source file '{}': {}", path.display(), err)
            }
            Error::WriteOutput { path, err } => {
                write!(f, "Writing output file '{}': {}", path.display(), err)
            }
            Error::Walk(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadSource { path: _, err } => Some(err),
            Error::WriteOutput { path: _, err } => Some(err),
            Error::Walk(err) => Some(err),
        }
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator when enumerating source files.
    fn from(err: walkdir::Error) -> Error {
        Error::Walk(err)
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    const LAYOUT: &str = "<title>{{ title }}</title><main>{{ content }}</main>{{ tags_html }}";

    fn write_source(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn base_context() -> Context {
        let mut ctx = Context::new();
        ctx.set("base_path", "");
        ctx
    }

    #[test]
    fn test_generate_writes_pages_and_sorts_descending() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let site_dir = root.join("_site");
        write_source(
            root,
            "content/blog/2024-01-05-first.html",
            "<!-- title: First -->\none",
        );
        write_source(
            root,
            "content/blog/2024-01-20-second.html",
            "<!-- title: Second -->\ntwo",
        );

        let ctx = base_context();
        let pages = PageGenerator {
            root,
            site_dir: &site_dir,
            layout: LAYOUT,
            ctx: &ctx,
        };
        let records = pages
            .generate(
                "content/blog/**/*",
                "blog/{{ subdir }}/{{ slug }}/index.html",
                None,
            )
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].slug, "second");
        assert_eq!(records[1].slug, "first");

        let first = site_dir.join("blog/2024/01/first/index.html");
        let text = fs::read_to_string(first).unwrap();
        assert!(text.contains("<title>First</title>"));
        assert!(text.contains("<main>one</main>"));
    }

    #[test]
    fn test_generate_stable_sort_on_equal_dates() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let site_dir = root.join("_site");
        write_source(root, "content/blog/2024-01-05-aaa.html", "a");
        write_source(root, "content/blog/2024-01-05-bbb.html", "b");

        let ctx = base_context();
        let pages = PageGenerator {
            root,
            site_dir: &site_dir,
            layout: LAYOUT,
            ctx: &ctx,
        };
        let records = pages
            .generate("content/blog/**/*", "blog/{{ slug }}/index.html", None)
            .unwrap();

        // Equal dates keep enumeration (file-name) order.
        assert_eq!(records[0].slug, "aaa");
        assert_eq!(records[1].slug, "bbb");
    }

    #[test]
    fn test_generate_registers_tags() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let site_dir = root.join("_site");
        write_source(
            root,
            "content/blog/2024-01-05-tagged.html",
            "<!-- title: Tagged -->\n<!-- tags: news updates -->\nx",
        );
        write_source(root, "content/blog/2024-01-06-plain.html", "y");

        let ctx = base_context();
        let mut tags = TagIndex::new();
        let pages = PageGenerator {
            root,
            site_dir: &site_dir,
            layout: LAYOUT,
            ctx: &ctx,
        };
        pages
            .generate(
                "content/blog/**/*",
                "blog/{{ subdir }}/{{ slug }}/index.html",
                Some(&mut tags),
            )
            .unwrap();

        let entries: Vec<_> = tags.iter().collect();
        assert_eq!(entries.len(), 2);
        let (name, news) = entries[0];
        assert_eq!(name, "news");
        assert_eq!(news.url, "/blog/tag_news.html");
        assert_eq!(news.count(), 1);
        assert_eq!(
            news.pages().next().unwrap(),
            ("blog/2024/01/tagged/index.html", "Tagged")
        );

        let tagged = site_dir.join("blog/2024/01/tagged/index.html");
        let text = fs::read_to_string(tagged).unwrap();
        assert!(text.contains("<a href=\"/blog/tag_news.html\">news</a>"));

        // The untagged page gets an empty fragment, not a literal
        // placeholder.
        let plain = site_dir.join("blog/2024/01/plain/index.html");
        let text = fs::read_to_string(plain).unwrap();
        assert!(!text.contains("{{ tags_html }}"));
    }

    #[test]
    fn test_generate_self_render_is_single_pass() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let site_dir = root.join("_site");
        write_source(
            root,
            "content/2024-01-05-self.html",
            "<!-- render: yes -->\n<!-- intro: from {{ date }} -->\n{{ intro }} and {{ slug }}",
        );

        let ctx = base_context();
        let pages = PageGenerator {
            root,
            site_dir: &site_dir,
            layout: "{{ content }}",
            ctx: &ctx,
        };
        let records = pages
            .generate("content/[!_]*.html", "{{ slug }}/index.html", None)
            .unwrap();

        // One pass: `{{ intro }}` expands, and the `{{ date }}` its value
        // introduced stays literal.
        assert_eq!(records[0].content, "from {{ date }} and self");
        let text = fs::read_to_string(site_dir.join("self/index.html")).unwrap();
        assert_eq!(text, "from {{ date }} and self");
    }

    #[test]
    fn test_generate_skips_not_applicable() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let site_dir = root.join("_site");
        write_source(root, "content/blog/notes.txt", "skip me");
        write_source(root, "content/blog/2024-01-05-keep.html", "x");

        let ctx = base_context();
        let pages = PageGenerator {
            root,
            site_dir: &site_dir,
            layout: LAYOUT,
            ctx: &ctx,
        };
        let records = pages
            .generate("content/blog/**/*", "blog/{{ slug }}/index.html", None)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].slug, "keep");
    }

    #[test]
    fn test_destination_template_resolution() {
        let mut ctx = Context::new();
        ctx.set("subdir", "2024/03");
        ctx.set("slug", "hello");
        assert_eq!(
            template::render("{{ subdir }}/{{ slug }}/index.html", &ctx),
            "2024/03/hello/index.html"
        );
    }
}
