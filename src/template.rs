//! Placeholder substitution for layouts, content bodies, and destination
//! paths.
//!
//! A template is a plain string containing `{{ key }}` placeholders.
//! Rendering replaces each placeholder whose key is present in the
//! [`Context`] with that key's value; a placeholder whose key is absent is
//! left verbatim. Leaving unknown keys untouched is deliberate: layouts are
//! composed in layers (the post layout is rendered *into* the page layout
//! before any page is built), and a key meaningful to an outer layer must
//! survive an inner pass.
//!
//! Substitution is single-pass and non-recursive: a substituted value that
//! itself contains `{{ }}` syntax is not re-scanned within the same call.
//! Callers wanting a second pass (the opt-in `render` header flag on a
//! post) invoke [`render`] again, exactly once.

use std::collections::BTreeMap;

/// The key/value mapping a template is rendered against: the union of
/// global configuration, per-collection overrides, and the current page's
/// fields. Later [`Context::set`] calls overwrite earlier ones.
#[derive(Clone, Debug, Default)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// A run of literal text or a single placeholder.
#[derive(Debug, PartialEq)]
enum Token<'a> {
    Literal(&'a str),

    /// `raw` is the full `{{ ... }}` source text, kept so an unresolved
    /// placeholder can be emitted unchanged.
    Placeholder { raw: &'a str, key: &'a str },
}

/// Splits a template into literal runs and placeholder tokens. A `{{` with
/// no well-formed closing `}}`, or with whitespace or braces inside the
/// would-be key, is literal text.
fn tokenize(template: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut scan = 0;

    while let Some(found) = template[scan..].find("{{") {
        let open = scan + found;
        match placeholder_at(&template[open..]) {
            Some((len, key)) => {
                if open > literal_start {
                    tokens.push(Token::Literal(&template[literal_start..open]));
                }
                tokens.push(Token::Placeholder {
                    raw: &template[open..open + len],
                    key,
                });
                literal_start = open + len;
                scan = literal_start;
            }
            // Not a placeholder; resume one byte further so an
            // overlapping `{{` can still match.
            None => scan = open + 1,
        }
    }

    if literal_start < template.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }
    tokens
}

/// Parses a placeholder at the start of `input` (which begins with `{{`),
/// returning its byte length and key.
fn placeholder_at(input: &str) -> Option<(usize, &str)> {
    let close = input.find("}}")?;
    let key = input[2..close].trim();
    if key.is_empty()
        || key
            .chars()
            .any(|c| c.is_whitespace() || c == '{' || c == '}')
    {
        return None;
    }
    Some((close + 2, key))
}

/// Renders `template` against `ctx`. Evaluation is left-to-right, first
/// match per scan; see the module docs for the single-pass and
/// unresolved-key guarantees.
pub fn render(template: &str, ctx: &Context) -> String {
    let mut out = String::with_capacity(template.len());
    for token in tokenize(template) {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Placeholder { raw, key } => match ctx.get(key) {
                Some(value) => out.push_str(value),
                None => out.push_str(raw),
            },
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> Context {
        let mut ctx = Context::new();
        for (key, value) in pairs {
            ctx.set(*key, *value);
        }
        ctx
    }

    #[test]
    fn test_render_all_keys_present() {
        let ctx = context(&[("title", "Hello"), ("author", "Admin")]);
        let out = render("<h1>{{ title }}</h1> by {{author}}", &ctx);
        assert_eq!(out, "<h1>Hello</h1> by Admin");
        assert!(!out.contains("{{"));
    }

    #[test]
    fn test_render_missing_key_left_verbatim() {
        let ctx = context(&[("title", "Hello")]);
        assert_eq!(
            render("{{ title }} {{ missing }}", &ctx),
            "Hello {{ missing }}"
        );
    }

    #[test]
    fn test_render_idempotent_without_referenced_keys() {
        let ctx = context(&[("unrelated", "x")]);
        let template = "a {{ one }} b {{ two }} c";
        assert_eq!(render(template, &ctx), template);
    }

    #[test]
    fn test_render_single_pass_not_recursive() {
        let ctx = context(&[("a", "{{ b }}"), ("b", "deep")]);
        assert_eq!(render("{{ a }}", &ctx), "{{ b }}");
    }

    #[test]
    fn test_render_whitespace_in_delimiters_insignificant() {
        let ctx = context(&[("key", "v")]);
        assert_eq!(render("{{key}} {{  key  }}", &ctx), "v v");
    }

    #[test]
    fn test_render_malformed_placeholder_is_literal() {
        let ctx = context(&[("a", "x"), ("b c", "y")]);
        assert_eq!(render("{{ b c }}", &ctx), "{{ b c }}");
        assert_eq!(render("{{ unclosed", &ctx), "{{ unclosed");
        assert_eq!(render("}} {{ a }}", &ctx), "}} x");
    }

    #[test]
    fn test_render_overlapping_braces() {
        let ctx = context(&[("x", "v")]);
        assert_eq!(render("{{{{ x }}", &ctx), "{{v");
    }

    #[test]
    fn test_layout_composition_preserves_inner_placeholders() {
        // The page shell's `content` slot is filled with the post layout
        // source; the post layout's own placeholders must survive for the
        // per-page pass.
        let post_layout = "<article>{{ title }}{{ content }}</article>";
        let mut ctx = Context::new();
        ctx.set("content", post_layout);
        let composed = render("<body>{{ content }}</body>", &ctx);
        assert_eq!(
            composed,
            "<body><article>{{ title }}{{ content }}</article></body>"
        );
    }

    #[test]
    fn test_tokenize_classification() {
        let tokens = tokenize("a{{ k }}b");
        assert_eq!(
            tokens,
            vec![
                Token::Literal("a"),
                Token::Placeholder {
                    raw: "{{ k }}",
                    key: "k"
                },
                Token::Literal("b"),
            ]
        );
    }
}
