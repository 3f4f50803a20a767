//! Exports the [`build_site`] function which stitches together the
//! high-level steps of building the output static site: verifying the
//! project layout, resetting the output tree from the static assets,
//! loading and composing the layout templates, and running the two-phase
//! build (generate-and-index, then list-and-aggregate) for standalone
//! pages and for every configured collection.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::warn;

use crate::config::{Collection, SiteConfig};
use crate::list::{self, ListGenerator};
use crate::page::{self, PageGenerator};
use crate::tags::TagIndex;
use crate::template::{self, Context};
use crate::util;

/// Name of the output directory under the project root.
pub const SITE_DIR: &str = "_site";

/// Builds the site at `root` from a [`SiteConfig`]. The output tree is
/// recreated from scratch on every run.
pub fn build_site(root: &Path, config: &SiteConfig) -> Result<()> {
    for required in ["content", "layout", "static"] {
        let dir = root.join(required);
        if !dir.is_dir() {
            return Err(Error::MissingDirectory(dir));
        }
    }

    let site_dir = root.join(SITE_DIR);
    rmdir(&site_dir)?;
    copy_dir(&root.join("static"), &site_dir)?;

    let layouts = Layouts::load(&root.join("layout"))?;
    let ctx = config.context();

    // Standalone pages: the designated home page, then every top-level
    // content file not reserved with a leading underscore.
    let pages = PageGenerator {
        root,
        site_dir: &site_dir,
        layout: &layouts.page,
        ctx: &ctx,
    };
    pages.generate("content/_index.html", "index.html", None)?;
    pages.generate("content/[!_]*.html", "{{ slug }}/index.html", None)?;

    for collection in config.blogs.values() {
        build_collection(root, &site_dir, &layouts, &ctx, collection)?;
    }

    Ok(())
}

/// Builds one collection. Phase 1 generates every post page and populates
/// the collection's [`TagIndex`]; only once it has returned does phase 2
/// read the records and the index to produce the aggregate pages, so the
/// listing pass always sees complete tag data.
fn build_collection(
    root: &Path,
    site_dir: &Path,
    layouts: &Layouts,
    ctx: &Context,
    collection: &Collection,
) -> Result<()> {
    if !root.join("content").join(&collection.dir).is_dir() {
        warn!("directory does not exist: content/{}", collection.dir);
    }

    let mut ctx = ctx.clone();
    ctx.set("blog", &collection.dir);

    // Phase 1: generate-and-index.
    let mut tags = TagIndex::new();
    let posts = PageGenerator {
        root,
        site_dir,
        layout: &layouts.post,
        ctx: &ctx,
    }
    .generate(
        &format!("content/{}/**/*", collection.dir),
        &format!("{}/{{{{ subdir }}}}/{{{{ slug }}}}/index.html", collection.dir),
        Some(&mut tags),
    )?;

    // Phase 2: list-and-aggregate, over the sorted records and the
    // now-complete tag index.
    ctx.set("title", &collection.name);

    let lists = ListGenerator {
        site_dir,
        list_layout: &layouts.list,
        item_layout: &layouts.item,
        ctx: &ctx,
    };
    lists.generate(&posts, &format!("{}/index.html", collection.dir))?;
    lists.generate_by_tag(&posts, &tags, &collection.dir)?;

    let archive = ListGenerator {
        site_dir,
        list_layout: &layouts.list,
        item_layout: &layouts.item_allposts,
        ctx: &ctx,
    };
    archive.generate_grouped(&posts, &format!("{}/allposts.html", collection.dir))?;

    list::generate_tag_index(site_dir, &layouts.page, &ctx, &tags, &collection.dir)?;

    let feed = ListGenerator {
        site_dir,
        list_layout: &layouts.feed,
        item_layout: &layouts.feed_item,
        ctx: &ctx,
    };
    feed.generate(&posts, &format!("{}/rss.xml", collection.dir))?;

    Ok(())
}

/// The layout templates a build requires, loaded once. The post and list
/// layouts are pre-composed into the page shell; single-pass rendering
/// keeps their own placeholders intact for the per-page pass.
struct Layouts {
    page: String,
    post: String,
    list: String,
    item: String,
    item_allposts: String,
    feed: String,
    feed_item: String,
}

impl Layouts {
    fn load(dir: &Path) -> Result<Layouts> {
        let read = |name: &str| {
            util::read_file(&dir.join(name)).map_err(|err| Error::ReadLayout {
                path: dir.join(name),
                err,
            })
        };
        let page = read("page.html")?;
        let post = compose(&page, &read("post.html")?);
        let list = compose(&page, &read("list.html")?);
        Ok(Layouts {
            post,
            list,
            item: read("item.html")?,
            item_allposts: read("item_allposts.html")?,
            feed: read("feed.xml")?,
            feed_item: read("item.xml")?,
            page,
        })
    }
}

/// Embeds an inner layout into the page shell's `content` slot.
fn compose(page_layout: &str, inner: &str) -> String {
    let mut ctx = Context::new();
    ctx.set("content", inner);
    template::render(page_layout, &ctx)
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dst.join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.join(entry.file_name()))?;
        }
    }
    Ok(())
}

fn rmdir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) => match e.kind() {
            io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug)]
pub enum Error {
    /// Returned when a required root subdirectory is missing.
    MissingDirectory(PathBuf),

    /// Returned for I/O problems while loading layout templates.
    ReadLayout { path: PathBuf, err: io::Error },

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: io::Error },

    /// Returned for errors during page generation.
    Page(page::Error),

    /// Returned for errors during listing generation.
    List(list::Error),

    /// Returned for other I/O errors.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingDirectory(path) => {
                write!(f, "Missing required directory '{}'", path.display())
            }
            Error::ReadLayout { path, err } => {
                write!(f, "Reading layout file '{}': {}", path.display(), err)
            }
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Page(err) => err.fmt(f),
            Error::List(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingDirectory(_) => None,
            Error::ReadLayout { path: _, err } => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Page(err) => Some(err),
            Error::List(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts [`io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator for the remaining I/O.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<page::Error> for Error {
    /// Converts [`page::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator around page generation.
    fn from(err: page::Error) -> Error {
        Error::Page(err)
    }
}

impl From<list::Error> for Error {
    /// Converts [`list::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator around listing generation.
    fn from(err: list::Error) -> Error {
        Error::List(err)
    }
}
