//! Heuristic text rewrites for judge-rendering artifacts.
//!
//! Each [`Rule`] is independent and carries the quirk it compensates for.
//! Rule lists are applied front to back; a later rule sees the output of the
//! earlier ones, so order within a list is part of its meaning.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

pub struct Rule {
    pub quirk: &'static str,
    re: Regex,
    rewrite: Rewrite,
}

enum Rewrite {
    Template(&'static str),
    With(fn(&Captures) -> String),
}

impl Rule {
    fn template(quirk: &'static str, pattern: &str, template: &'static str) -> Self {
        Rule {
            quirk,
            re: Regex::new(pattern).unwrap(),
            rewrite: Rewrite::Template(template),
        }
    }

    fn with(quirk: &'static str, pattern: &str, f: fn(&Captures) -> String) -> Self {
        Rule {
            quirk,
            re: Regex::new(pattern).unwrap(),
            rewrite: Rewrite::With(f),
        }
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.rewrite {
            Rewrite::Template(template) => self.re.replace_all(text, template),
            Rewrite::With(f) => self.re.replace_all(text, f),
        }
    }
}

pub fn apply_rules(rules: &[Rule], text: &str) -> String {
    rules
        .iter()
        .fold(text.to_string(), |acc, rule| match rule.apply(&acc) {
            Cow::Borrowed(_) => acc,
            Cow::Owned(changed) => changed,
        })
}

/// Boilerplate cleaner for text flattened out of a single DOM subtree.
pub static TEXT_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::template(
            "collapsed MathJax spans leave a stray `s`/`ss` token before the first word",
            r"^(?i:ss?)\s+",
            "",
        ),
        Rule::template(
            "the same stray token glued directly onto a capitalised first word",
            r"^(?i:ss?)([A-Z])",
            "${1}",
        ),
        Rule::template(
            "the stray `s` glued onto the memory-limit banner",
            r"^(?i:smemory)\s+",
            "memory ",
        ),
        Rule::template(
            "Polygon statements delimit inline math with `$$$` (and sometimes `$$`)",
            r"\$\$\$?",
            "",
        ),
        Rule::with(
            "unrendered LaTeX relation/operator macros",
            r"\\([A-Za-z]+)",
            latex_symbol,
        ),
        Rule::template(
            "unrendered braced superscripts such as `N^{20}`",
            r"\^\{(\d+)\}",
            "^${1}",
        ),
        Rule::template(
            "subscripts whose underscore was eaten by the renderer, e.g. `a{i+1}`",
            r"([a-zA-Z])\{([^}]+)\}",
            "${1}${2}",
        ),
        Rule::template(
            "header property banners leaking into statement text",
            r"(?im)^time limit per test\s*\d+\s*seconds?.*?\n",
            "",
        ),
        Rule::template(
            "header property banners leaking into statement text",
            r"(?im)^memory limit per test\s*\d+\s*(?:megabytes?|mb).*?\n",
            "",
        ),
        Rule::template(
            "header property banners leaking into statement text",
            r"(?im)^input\s*standard input.*?\n",
            "",
        ),
        Rule::template(
            "header property banners leaking into statement text",
            r"(?im)^output\s*standard output.*?\n",
            "",
        ),
    ]
});

/// Applied to each description fragment after extraction.
pub static FRAGMENT_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![Rule::template(
        "a lone `s` left in front of a paragraph by an empty math span",
        r"^\s*[sS]\s+",
        "",
    )]
});

/// Applied once to the joined description. Artifacts recur after
/// whitespace normalisation, so each position gets its own pass.
pub static DESCRIPTION_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::template(
            "header banners folded into the first fragment",
            r"(?i)time limit per test\s*\d+\s*seconds?",
            "",
        ),
        Rule::template(
            "header banners folded into the first fragment",
            r"(?i)memory limit per test\s*\d+\s*(?:megabytes?|mb)",
            "",
        ),
        Rule::template(
            "header banners folded into the first fragment",
            r"(?i)input\s*standard input",
            "",
        ),
        Rule::template(
            "header banners folded into the first fragment",
            r"(?i)output\s*standard output",
            "",
        ),
        Rule::template(
            "stray `s`/`ss` at the very start, followed by spaces",
            r"^[sS]{1,2}[ \t]+",
            "",
        ),
        Rule::template(
            "stray `s`/`ss` at the very start, followed by a line break",
            r"^[sS]{1,2}\n+",
            "",
        ),
        Rule::template(
            "stray `s`/`ss` after leading whitespace left by banner removal",
            r"^\s+[sS]{1,2}\s+",
            "",
        ),
        Rule::template(
            "stray `s`/`ss` opening a later paragraph",
            r"\n\s*[sS]{1,2}\s+",
            "\n",
        ),
    ]
});

fn latex_symbol(caps: &Captures) -> String {
    let symbol = match &caps[1] {
        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "neq" => "≠",
        "times" => "×",
        "cdot" => "·",
        "sum" => "∑",
        "prod" => "∏",
        "ldots" | "dots" => "...",
        _ => return caps[0].to_string(),
    };
    symbol.to_string()
}

/// Drop a lone leading `s`/`ss` that survived every rule pass.
pub fn strip_lone_artifact(text: &str) -> &str {
    if text.chars().count() <= 2 {
        return text;
    }
    let bytes = text.as_bytes();
    let is_s = |b: u8| b.eq_ignore_ascii_case(&b's');
    let rest = if is_s(bytes[0]) && is_s(bytes[1]) {
        &text[2..]
    } else if is_s(bytes[0]) && bytes[1].is_ascii_whitespace() {
        &text[1..]
    } else {
        return text;
    };
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c.is_ascii_uppercase() => rest.trim(),
        _ => text,
    }
}

// ── Tests ──
