use std::sync::LazyLock;

use regex::{Captures, Regex};

static SUB_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-zA-Z])_(\d+)").unwrap());
static SUB_LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z])_([a-zA-Z])").unwrap());
static SUB_BRACED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z])_\{([^}]+)\}").unwrap());
// Boundary set: whitespace, end of text, or one of − + × / ≤ ≥ < > = , . )
static EXPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|[^0-9])([0-9]{1,3})([kmnKM])(\s|$|[−+×/≤≥<>=,.)])").unwrap()
});

const EXPONENT_MAX: u32 = 100;

// Mathematical Italic block. U+1D455 (italic h) is unassigned; renderers
// use U+210E PLANCK CONSTANT in its place.
const ITALIC_CAPITAL_A: u32 = 0x1D434;
const ITALIC_SMALL_A: u32 = 0x1D44E;
const PLANCK_CONSTANT: char = '\u{210E}';

/// Flatten math notation into underscore-free ASCII-ish text.
///
/// Runs three stages in a fixed order: italic glyphs to ASCII, subscript
/// collapsing, then small exponent shorthand (`2k` → `2^k`). Total and
/// idempotent; anything it does not recognise passes through untouched.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let ascii = map_italic_glyphs(text);
    let flat = collapse_subscripts(ascii);
    rewrite_exponents(flat)
}

fn map_italic_glyphs(text: &str) -> String {
    text.chars().map(|c| italic_to_ascii(c).unwrap_or(c)).collect()
}

fn italic_to_ascii(c: char) -> Option<char> {
    if c == PLANCK_CONSTANT {
        return Some('h');
    }
    let code = c as u32;
    let (base, ascii) = match code {
        ITALIC_CAPITAL_A..=0x1D44D => (ITALIC_CAPITAL_A, b'A'),
        ITALIC_SMALL_A..=0x1D467 => (ITALIC_SMALL_A, b'a'),
        _ => return None,
    };
    Some(char::from(ascii + (code - base) as u8))
}

/// `a_1` → `a1`, `s_i` → `si`, `a_{i+1}` → `ai+1`.
///
/// The three rewrites run in that order and repeat until nothing changes,
/// since a single non-overlapping pass leaves chains like `a_b_c` half done.
fn collapse_subscripts(mut text: String) -> String {
    loop {
        let next = SUB_DIGITS_RE.replace_all(&text, "${1}${2}");
        let next = SUB_LETTER_RE.replace_all(&next, "${1}${2}");
        let next = SUB_BRACED_RE.replace_all(&next, "${1}${2}").into_owned();
        if next == text {
            return text;
        }
        text = next;
    }
}

/// `2k` → `2^k`, `10n` → `10^n`, only for values up to 100 ("2019m" is a
/// year, not a power).
fn rewrite_exponents(mut text: String) -> String {
    loop {
        let next = EXPONENT_RE
            .replace_all(&text, |caps: &Captures| {
                let value: u32 = caps[2].parse().unwrap_or(u32::MAX);
                if value <= EXPONENT_MAX {
                    format!("{}{}^{}{}", &caps[1], &caps[2], caps[3].to_lowercase(), &caps[4])
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned();
        if next == text {
            return text;
        }
        text = next;
    }
}

// ── Tests ──
