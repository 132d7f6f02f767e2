use std::sync::LazyLock;

use scraper::{ElementRef, Node, Selector};

use super::record::ExamplePair;

static SAMPLE_TEST: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".sample-test").unwrap());
static INPUT_PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".input pre").unwrap());
static OUTPUT_PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".output pre").unwrap());

/// Pair up sample input/output blocks across every `.sample-test` container.
///
/// A container yields `max(inputs, outputs)` pairs so a block dropped by
/// broken markup leaves an empty side instead of shifting later pairs.
/// Pairs with both sides empty are skipped; indices stay contiguous from 1.
pub fn extract_samples(statement: ElementRef<'_>) -> Vec<ExamplePair> {
    let mut pairs = Vec::new();

    for container in statement.select(&SAMPLE_TEST) {
        let inputs: Vec<Vec<String>> = container.select(&INPUT_PRE).map(block_lines).collect();
        let outputs: Vec<Vec<String>> = container.select(&OUTPUT_PRE).map(block_lines).collect();

        for i in 0..inputs.len().max(outputs.len()) {
            let input = inputs.get(i).cloned().unwrap_or_default();
            let output = outputs.get(i).cloned().unwrap_or_default();
            if input.is_empty() && output.is_empty() {
                continue;
            }
            pairs.push(ExamplePair {
                index: pairs.len() as u32 + 1,
                input,
                output,
            });
        }
    }

    pairs
}

/// Lines of one `<pre>` block.
///
/// Standard renders wrap every line in its own `div`; older or hand-written
/// statements put raw text (sometimes with `<br>`) straight into the `pre`.
fn block_lines(pre: ElementRef<'_>) -> Vec<String> {
    let wrapped: Vec<String> = pre
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "div")
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    if !wrapped.is_empty() {
        return wrapped;
    }

    let mut raw = String::new();
    raw_text(pre, &mut raw);
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn raw_text(node: ElementRef<'_>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    raw_text(child, out);
                }
            }
            _ => {}
        }
    }
}

// ── Tests ──
