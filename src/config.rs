//! Site configuration: compiled-in defaults merged with an optional
//! `params.json` override file at the project root.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{Datelike, Local};
use serde::Deserialize;

use crate::template::Context;

/// One configured content collection (a blog-like section).
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Collection {
    /// Display name, used as the collection's listing title.
    pub name: String,

    /// Directory name, both under `content/` for sources and under the
    /// site root for output.
    pub dir: String,
}

/// Global parameters for one run. Immutable once loaded.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    pub base_path: String,
    pub subtitle: String,
    pub author: String,
    pub site_url: String,

    /// Collection id to collection, in id order.
    pub blogs: BTreeMap<String, Collection>,

    pub current_year: i32,

    /// Template-only keys passed through verbatim from `params.json`.
    pub extra: BTreeMap<String, String>,
}

/// The subset of [`SiteConfig`] an override file may set. Unknown keys
/// land in `extra` rather than being rejected.
#[derive(Deserialize)]
struct ConfigFile {
    base_path: Option<String>,
    subtitle: Option<String>,
    author: Option<String>,
    site_url: Option<String>,
    blogs: Option<BTreeMap<String, Collection>>,

    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl Default for SiteConfig {
    fn default() -> SiteConfig {
        let mut blogs = BTreeMap::new();
        blogs.insert(
            "1".to_string(),
            Collection {
                name: "Blog".to_string(),
                dir: "blog".to_string(),
            },
        );
        blogs.insert(
            "2".to_string(),
            Collection {
                name: "News".to_string(),
                dir: "news".to_string(),
            },
        );
        SiteConfig {
            base_path: String::new(),
            subtitle: "Lorem Ipsum".to_string(),
            author: "Admin".to_string(),
            site_url: "http://localhost:8000".to_string(),
            blogs,
            current_year: Local::now().year(),
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Loads the configuration for the project at `root`: the defaults,
    /// overridden key-by-key from `params.json` when that file exists.
    pub fn load(root: &Path) -> Result<SiteConfig> {
        let mut config = SiteConfig::default();
        let path = root.join("params.json");
        if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file `{}`", path.display()))?;
            let file: ConfigFile = serde_json::from_str(&text)
                .with_context(|| format!("parsing config file `{}`", path.display()))?;
            config.apply(file);
        }
        Ok(config)
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(base_path) = file.base_path {
            self.base_path = base_path;
        }
        if let Some(subtitle) = file.subtitle {
            self.subtitle = subtitle;
        }
        if let Some(author) = file.author {
            self.author = author;
        }
        if let Some(site_url) = file.site_url {
            self.site_url = site_url;
        }
        if let Some(blogs) = file.blogs {
            self.blogs = blogs;
        }
        for (key, value) in file.extra {
            self.extra.insert(key, json_to_string(value));
        }
    }

    /// The global template context every render call starts from.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.set("base_path", &self.base_path);
        ctx.set("subtitle", &self.subtitle);
        ctx.set("author", &self.author);
        ctx.set("site_url", &self.site_url);
        ctx.set("current_year", self.current_year.to_string());
        for (key, value) in &self.extra {
            ctx.set(key.clone(), value.clone());
        }
        ctx
    }
}

fn json_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::default();
        assert_eq!(config.base_path, "");
        assert_eq!(config.subtitle, "Lorem Ipsum");
        assert_eq!(config.author, "Admin");
        assert_eq!(config.site_url, "http://localhost:8000");
        assert_eq!(config.blogs.len(), 2);
        assert_eq!(config.blogs["1"].dir, "blog");
        assert_eq!(config.blogs["2"].name, "News");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SiteConfig::load(dir.path()).unwrap();
        assert_eq!(config.subtitle, "Lorem Ipsum");
    }

    #[test]
    fn test_load_overrides_and_extras() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("params.json"),
            r#"{
                "subtitle": "My Site",
                "site_url": "https://example.org",
                "blogs": {"1": {"name": "Notes", "dir": "notes"}},
                "twitter": "@me",
                "columns": 2
            }"#,
        )
        .unwrap();

        let config = SiteConfig::load(dir.path()).unwrap();
        assert_eq!(config.subtitle, "My Site");
        assert_eq!(config.author, "Admin");
        assert_eq!(config.blogs.len(), 1);
        assert_eq!(config.blogs["1"].dir, "notes");
        assert_eq!(config.extra["twitter"], "@me");
        assert_eq!(config.extra["columns"], "2");

        let ctx = config.context();
        assert_eq!(ctx.get("twitter"), Some("@me"));
        assert_eq!(ctx.get("site_url"), Some("https://example.org"));
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("params.json"), "{nope").unwrap();
        assert!(SiteConfig::load(dir.path()).is_err());
    }
}
