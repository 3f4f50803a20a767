//! Minimal glob matching for content source patterns.
//!
//! Supports `*`, `?`, and character classes (`[abc]`, `[a-z]`, `[!abc]`)
//! within a path segment, and `**` as a whole segment matching any number
//! of directories, including zero. Wildcards do not match names beginning
//! with a dot; hidden files require a literal leading dot. Enumeration
//! walks only beneath the pattern's literal leading directories and is
//! sorted by file name, so within-run order is deterministic even though
//! the underlying directory listing is platform-dependent.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A parsed glob pattern. Patterns use `/` separators and are matched
/// against paths relative to the base directory passed to
/// [`Pattern::glob`].
pub struct Pattern {
    segments: Vec<Segment>,
}

enum Segment {
    Literal(String),
    Wildcard(Vec<char>),

    /// `**`
    Any,
}

impl Segment {
    fn matches(&self, name: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == name,
            Segment::Wildcard(pattern) => match_name(pattern, name),
            Segment::Any => true,
        }
    }
}

impl Pattern {
    pub fn new(pattern: &str) -> Pattern {
        let segments = pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                if segment == "**" {
                    Segment::Any
                } else if segment.contains(|c| matches!(c, '*' | '?' | '[')) {
                    Segment::Wildcard(segment.chars().collect())
                } else {
                    Segment::Literal(segment.to_string())
                }
            })
            .collect();
        Pattern { segments }
    }

    /// True when the relative path `rel` matches this pattern.
    pub fn matches(&self, rel: &Path) -> bool {
        let components: Vec<&str> = rel
            .components()
            .filter_map(|component| component.as_os_str().to_str())
            .collect();
        match_segments(&self.segments, &components)
    }

    /// Enumerates every path under `base` matching the pattern, files and
    /// directories alike, sorted by file name. A missing directory yields
    /// no matches rather than an error.
    pub fn glob(&self, base: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
        let mut literal_len = 0;
        while literal_len < self.segments.len() {
            match &self.segments[literal_len] {
                Segment::Literal(_) => literal_len += 1,
                _ => break,
            }
        }

        let mut walk_root = base.to_path_buf();
        for segment in &self.segments[..literal_len] {
            if let Segment::Literal(name) = segment {
                walk_root.push(name);
            }
        }

        // Fully literal pattern: the path either exists or it doesn't.
        if literal_len == self.segments.len() {
            return Ok(if walk_root.exists() {
                vec![walk_root]
            } else {
                Vec::new()
            });
        }

        if !walk_root.is_dir() {
            return Ok(Vec::new());
        }

        let tail = &self.segments[literal_len..];
        let mut paths = Vec::new();
        for entry in WalkDir::new(&walk_root).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            // strip_prefix can't fail: every entry is under walk_root
            let rel = entry.path().strip_prefix(&walk_root).unwrap();
            let components: Vec<&str> = rel
                .components()
                .filter_map(|component| component.as_os_str().to_str())
                .collect();
            if match_segments(tail, &components) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }
}

fn match_segments(segments: &[Segment], components: &[&str]) -> bool {
    match segments.split_first() {
        None => components.is_empty(),
        Some((Segment::Any, rest)) => {
            (0..=components.len()).any(|skip| match_segments(rest, &components[skip..]))
        }
        Some((segment, rest)) => match components.split_first() {
            Some((component, remaining)) => {
                segment.matches(component) && match_segments(rest, remaining)
            }
            None => false,
        },
    }
}

/// Matches one path segment against a wildcard pattern, honoring the
/// hidden-file rule.
fn match_name(pattern: &[char], name: &str) -> bool {
    if name.starts_with('.') && pattern.first() != Some(&'.') {
        return false;
    }
    let name: Vec<char> = name.chars().collect();
    match_chars(pattern, &name)
}

fn match_chars(pattern: &[char], name: &[char]) -> bool {
    match pattern.first() {
        None => name.is_empty(),
        Some('*') => (0..=name.len()).any(|skip| match_chars(&pattern[1..], &name[skip..])),
        Some('?') => !name.is_empty() && match_chars(&pattern[1..], &name[1..]),
        Some('[') => match_class(pattern, name),
        Some(c) => name.first() == Some(c) && match_chars(&pattern[1..], &name[1..]),
    }
}

fn match_class(pattern: &[char], name: &[char]) -> bool {
    let (negate, set_start) = if pattern.get(1) == Some(&'!') {
        (true, 2)
    } else {
        (false, 1)
    };
    match pattern[set_start..].iter().position(|&c| c == ']') {
        // No closing bracket: `[` is an ordinary character.
        None => name.first() == Some(&'[') && match_chars(&pattern[1..], &name[1..]),
        Some(offset) => {
            let close = set_start + offset;
            match name.first() {
                Some(&c) => {
                    class_contains(&pattern[set_start..close], c) != negate
                        && match_chars(&pattern[close + 1..], &name[1..])
                }
                None => false,
            }
        }
    }
}

fn class_contains(set: &[char], c: char) -> bool {
    let mut i = 0;
    while i < set.len() {
        if i + 2 < set.len() && set[i + 1] == '-' {
            if set[i] <= c && c <= set[i + 2] {
                return true;
            }
            i += 3;
        } else {
            if set[i] == c {
                return true;
            }
            i += 1;
        }
    }
    false
}
