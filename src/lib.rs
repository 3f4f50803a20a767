//! The library code for the `sitewright` static site generator. A build
//! can be generally broken down into two distinct phases, run once for
//! standalone pages and once per configured content collection:
//!
//! 1. Generating individual pages from content source files
//!    ([`crate::page`]), which parses each file ([`crate::content`]),
//!    renders it through its layout ([`crate::template`]), and registers
//!    tagged pages into the collection's tag index ([`crate::tags`])
//! 2. Generating aggregate pages from the sorted records the first phase
//!    returned ([`crate::list`]): the collection index, the chronological
//!    archive, one listing per tag, the consolidated tag index, and the
//!    RSS feed
//!
//! The ordering between the phases matters: the listing phase reads tag
//! data the page phase populates, so a collection's pages are always fully
//! generated before its first listing is built. [`crate::build`] owns that
//! sequencing, along with the single-shot I/O around it (output-tree
//! reset, static-assets copy, layout loading).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod content;
pub mod glob;
pub mod list;
pub mod page;
pub mod tags;
pub mod template;
pub mod util;
