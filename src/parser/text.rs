use scraper::node::Element;
use scraper::{ElementRef, Node};

use super::cleanup::{apply_rules, TEXT_RULES};
use super::notation::normalize;

/// Flatten one subtree into clean, single-spaced text.
///
/// `sub` content is glued to the preceding run, `sup` content is glued as
/// `^content`; other text runs are trimmed and joined with one space. The
/// tree is only read, never rewritten. Returns an empty string for `None`.
pub fn extract_text(node: Option<ElementRef<'_>>) -> String {
    match node {
        Some(node) => clean(&flatten(node)),
        None => String::new(),
    }
}

/// Boilerplate cleanup, notation normalization, whitespace collapse.
pub fn clean(raw: &str) -> String {
    let cleaned = apply_rules(&TEXT_RULES, raw);
    collapse_whitespace(&normalize(&cleaned))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed text runs of a subtree joined with single spaces, no cleanup.
pub fn plain_text(node: ElementRef<'_>) -> String {
    node.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn flatten(node: ElementRef<'_>) -> String {
    let mut runs = Runs::default();
    walk(node, &mut runs);
    runs.0.join(" ")
}

#[derive(Default)]
struct Runs(Vec<String>);

impl Runs {
    fn push(&mut self, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.0.push(text.to_string());
        }
    }

    /// Append to the previous run without a separator.
    fn glue(&mut self, text: &str) {
        match self.0.last_mut() {
            Some(last) => last.push_str(text),
            None => self.0.push(text.to_string()),
        }
    }
}

fn walk(node: ElementRef<'_>, runs: &mut Runs) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => runs.push(text),
            Node::Element(element) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                match element.name() {
                    "sub" => {
                        let inner = plain_text(child);
                        if !inner.is_empty() {
                            runs.glue(&inner);
                        }
                    }
                    "sup" => {
                        let inner = plain_text(child);
                        if !inner.is_empty() {
                            runs.glue(&format!("^{inner}"));
                        }
                    }
                    "script" if is_math_source(element) => runs.push(&plain_text(child)),
                    "script" | "style" | "noscript" => {}
                    _ if is_rendered_math(element) => {}
                    _ => walk(child, runs),
                }
            }
            _ => {}
        }
    }
}

// <script type="math/tex"> holds the LaTeX source MathJax renders from.
fn is_math_source(element: &Element) -> bool {
    element
        .attr("type")
        .is_some_and(|t| t.contains("math/tex"))
}

fn is_rendered_math(element: &Element) -> bool {
    element.classes().any(|c| c.contains("MathJax"))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn text_of(html: &str) -> String {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse("#root").unwrap();
        extract_text(doc.select(&sel).next())
    }

    #[test]
    fn none_is_empty() {
        assert_eq!(extract_text(None), "");
    }

    #[test]
    fn runs_joined_with_single_space() {
        assert_eq!(
            text_of("<div id=root><p>Given  an\n array</p><p>of integers.</p></div>"),
            "Given an array of integers."
        );
    }

    #[test]
    fn sub_glued_to_base() {
        assert_eq!(text_of("<div id=root>a<sub>i</sub> and b<sub> 2 </sub></div>"), "ai and b2");
    }

    #[test]
    fn sup_becomes_caret() {
        assert_eq!(text_of("<div id=root>up to 10<sup>9</sup> + 7</div>"), "up to 10^9 + 7");
    }

    #[test]
    fn latex_and_glyphs_normalized() {
        assert_eq!(
            text_of(r"<div id=root><p>$$$1 \le a_i \le 10^{9}$$$, 𝑛 items</p></div>"),
            "1 ≤ ai ≤ 10^9, n items"
        );
    }

    #[test]
    fn scripts_and_styles_skipped() {
        assert_eq!(
            text_of("<div id=root>keep<script>var x = 1;</script><style>p{}</style> this</div>"),
            "keep this"
        );
    }

    #[test]
    fn mathjax_source_kept_rendering_dropped() {
        let html = r#"<div id=root>Let <span class="MathJax_Preview">junk</span><span class="MathJax">a i</span><script type="math/tex">a_i</script> be positive.</div>"#;
        assert_eq!(text_of(html), "Let ai be positive.");
    }

    #[test]
    fn leading_artifact_stripped() {
        assert_eq!(text_of("<div id=root><span>ss</span> You are given</div>"), "You are given");
    }

    #[test]
    fn collapse() {
        assert_eq!(collapse_whitespace("  a \n\n\n\n b\t c "), "a b c");
    }
}
