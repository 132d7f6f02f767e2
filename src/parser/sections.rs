use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::cleanup::{apply_rules, strip_lone_artifact, DESCRIPTION_RULES, FRAGMENT_RULES};
use super::text::extract_text;

static SECTION_TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".section-title").unwrap());
static INPUT_SPEC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".input-specification").unwrap());
static OUTPUT_SPEC: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".output-specification").unwrap());
static NOTE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".note").unwrap());

static INPUT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Input\s*:?\s*").unwrap());
static OUTPUT_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Output\s*:?\s*").unwrap());
static NOTE_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^Note\s*:?\s*").unwrap());

const MIN_FRAGMENT_CHARS: usize = 3;
const KEEP_FRAGMENT_ABOVE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Description,
    InputSpec,
    OutputSpec,
    Note,
    SampleTests,
    Unrecognized,
}

/// Heading keywords, checked in order against the lowercased heading text.
const HEADING_KEYWORDS: &[(&str, Section)] = &[
    ("input", Section::InputSpec),
    ("output", Section::OutputSpec),
    ("note", Section::Note),
    ("example", Section::SampleTests),
];

/// Structural class markers for children rendered without a heading.
const CLASS_MARKERS: &[(&str, Section)] = &[
    ("input-specification", Section::InputSpec),
    ("output-specification", Section::OutputSpec),
    ("note", Section::Note),
    ("sample-tests", Section::SampleTests),
];

impl Section {
    pub fn from_heading(heading: &str) -> Option<Section> {
        let lower = heading.to_lowercase();
        HEADING_KEYWORDS
            .iter()
            .find(|(kw, _)| lower.contains(kw))
            .map(|(_, section)| *section)
    }

    fn from_marker(node: ElementRef<'_>) -> Option<Section> {
        let classes: Vec<&str> = node.value().classes().collect();
        CLASS_MARKERS
            .iter()
            .find(|(marker, _)| classes.contains(marker))
            .map(|(_, section)| *section)
    }

    /// Classify a statement child: its `.section-title` heading wins, the
    /// class marker is the fallback.
    pub fn classify(node: ElementRef<'_>) -> Option<Section> {
        match node.select(&SECTION_TITLE).next() {
            Some(heading) => Section::from_heading(&heading.text().collect::<String>()),
            None => Section::from_marker(node),
        }
    }
}

/// Partition the statement's direct children into sections, in source order.
///
/// Everything before the first Input-classified child is Description; only
/// that first match is a boundary.
pub fn segment<'a>(statement: ElementRef<'a>) -> Vec<(Section, ElementRef<'a>)> {
    let mut in_description = true;
    statement
        .children()
        .filter_map(ElementRef::wrap)
        .map(|child| {
            let class = Section::classify(child);
            if in_description && class == Some(Section::InputSpec) {
                in_description = false;
            }
            let section = if in_description {
                Section::Description
            } else {
                class.unwrap_or(Section::Unrecognized)
            };
            (section, child)
        })
        .collect()
}

/// Statement prose assembled from the segmented sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementText {
    pub description: String,
    pub input_format: String,
    pub output_format: String,
}

pub fn read_statement(
    statement: ElementRef<'_>,
    segments: &[(Section, ElementRef<'_>)],
    title: &str,
) -> StatementText {
    let mut description = describe(segments, title);

    let input_format = strip_label(&INPUT_LABEL_RE, &extract_text(statement.select(&INPUT_SPEC).next()));
    let output_format =
        strip_label(&OUTPUT_LABEL_RE, &extract_text(statement.select(&OUTPUT_SPEC).next()));

    if let Some(note) = statement.select(&NOTE).next() {
        let note = strip_label(&NOTE_LABEL_RE, &extract_text(Some(note)));
        if !note.is_empty() && !description.contains("Note:") {
            description.push_str("\n\nNote: ");
            description.push_str(&note);
        }
    }

    StatementText {
        description,
        input_format,
        output_format,
    }
}

/// Join the Description region's surviving fragments and scrub the result.
pub fn describe(segments: &[(Section, ElementRef<'_>)], title: &str) -> String {
    let mut fragments = Vec::new();
    for (section, node) in segments {
        if *section != Section::Description {
            break;
        }
        // Heading order anomalies: a keyword section inside the region ends it.
        if Section::classify(*node).is_some() {
            break;
        }
        if let Some(fragment) = keep_fragment(&extract_text(Some(*node))) {
            fragments.push(fragment);
        }
    }
    tidy_description(&fragments.join("\n\n"), title)
}

fn keep_fragment(text: &str) -> Option<String> {
    let text = text.trim();
    if text.chars().count() < MIN_FRAGMENT_CHARS {
        return None;
    }
    if text.eq_ignore_ascii_case("s") || text.eq_ignore_ascii_case("ss") {
        return None;
    }
    let text = apply_rules(&FRAGMENT_RULES, text);
    (text.chars().count() > KEEP_FRAGMENT_ABOVE).then_some(text)
}

fn tidy_description(joined: &str, title: &str) -> String {
    let mut text = joined;
    if !title.is_empty() {
        if let Some(rest) = text.strip_prefix(title) {
            text = rest.trim();
        }
    }
    let scrubbed = apply_rules(&DESCRIPTION_RULES, text);
    strip_lone_artifact(scrubbed.trim()).to_string()
}

fn strip_label(re: &Regex, text: &str) -> String {
    re.replace(text, "").into_owned()
}

// ── Tests ──
