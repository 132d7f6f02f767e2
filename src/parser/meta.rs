use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;

use super::text::{collapse_whitespace, plain_text};

static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".title").unwrap());
static TAGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#".tag-box a, [class*="tag"]"#).unwrap());
static RATING_SELECTORS: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        Selector::parse(r#".tag-box[title*="Difficulty"]"#).unwrap(),
        Selector::parse(r#"[title*="rating"]"#).unwrap(),
    ]
});
static LIMITS: LazyLock<[Selector; 2]> = LazyLock::new(|| {
    [
        Selector::parse(".time-limit").unwrap(),
        Selector::parse(".memory-limit").unwrap(),
    ]
});

static TITLE_LETTER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-G])\.").unwrap());
static NUMERIC_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\*?\d+$").unwrap());
static PROBLEM_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(problemset/problem|contest|gym)/(\d+)(?:/problem)?/([A-Za-z]\d?)(?:[/?#]|$)").unwrap()
});

const MAX_TAGS: usize = 5;
const MAX_TAG_CHARS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Unknown,
}

impl Difficulty {
    /// Codeforces orders problems by difficulty, so the index letter in
    /// "C. Two Arrays" is a usable proxy.
    pub fn from_title(title: &str) -> Difficulty {
        let Some(caps) = TITLE_LETTER_RE.captures(title.trim()) else {
            return Difficulty::Unknown;
        };
        match &caps[1] {
            "A" | "B" => Difficulty::Easy,
            "C" | "D" => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page-level facts that live outside the statement body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub rating: String,
    pub constraints: String,
}

impl Metadata {
    pub fn collect(document: &Html, title: &str) -> Metadata {
        Metadata {
            difficulty: Difficulty::from_title(title),
            tags: tags(document),
            rating: rating(document),
            constraints: constraints(document),
        }
    }
}

pub fn title(document: &Html) -> String {
    document
        .select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

/// Topic tags in page order. Numeric entries are ratings sharing the tag
/// markup and are skipped.
pub fn tags(document: &Html) -> Vec<String> {
    document
        .select(&TAGS)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|tag| {
            !tag.is_empty() && tag.chars().count() < MAX_TAG_CHARS && !NUMERIC_TAG_RE.is_match(tag)
        })
        .take(MAX_TAGS)
        .collect()
}

pub fn rating(document: &Html) -> String {
    RATING_SELECTORS
        .iter()
        .find_map(|sel| document.select(sel).next())
        .map(|el| el.text().collect::<String>().replace('*', "").trim().to_string())
        .unwrap_or_default()
}

/// Time and memory limit lines, e.g. "time limit per test 2 seconds".
pub fn constraints(document: &Html) -> String {
    LIMITS
        .iter()
        .filter_map(|sel| document.select(sel).next())
        .map(plain_text)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Problemset,
    Contest,
    Gym,
}

/// Contest id plus problem index, parsed from a Codeforces problem URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemId {
    pub contest_id: u32,
    pub index: String,
    pub kind: ProblemKind,
}

impl ProblemId {
    pub fn from_url(url: &str) -> Option<ProblemId> {
        let caps = PROBLEM_URL_RE.captures(url)?;
        let kind = match &caps[1] {
            "contest" => ProblemKind::Contest,
            "gym" => ProblemKind::Gym,
            _ => ProblemKind::Problemset,
        };
        Some(ProblemId {
            contest_id: caps[2].parse().ok()?,
            index: caps[3].to_uppercase(),
            kind,
        })
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.contest_id, self.index)
    }
}

// ── Tests ──
