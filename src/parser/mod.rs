pub mod cleanup;
pub mod meta;
pub mod notation;
pub mod record;
pub mod samples;
pub mod sections;
pub mod text;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::debug;

use crate::error::ScrapeError;
use meta::Metadata;
use record::ProblemRecord;
use sections::Section;

static PROBLEM_STATEMENT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".problem-statement").unwrap());

/// HTML → sections → samples → metadata → record.
///
/// Pure function of its inputs. Fails only when the page has no
/// `.problem-statement`; every other missing piece becomes an empty field.
pub fn extract_problem(html: &str, url: &str) -> Result<ProblemRecord, ScrapeError> {
    let document = Html::parse_document(html);
    let statement = document
        .select(&PROBLEM_STATEMENT)
        .next()
        .ok_or_else(|| ScrapeError::Structure {
            url: url.to_string(),
        })?;

    let title = meta::title(&document);
    let segments = sections::segment(statement);
    debug!(
        url,
        children = segments.len(),
        description = count(&segments, Section::Description),
        unrecognized = count(&segments, Section::Unrecognized),
        "segmented problem statement"
    );

    let text = sections::read_statement(statement, &segments, &title);
    let examples = samples::extract_samples(statement);
    let metadata = Metadata::collect(&document, &title);

    Ok(record::assemble(url, title, text, metadata, examples))
}

fn count(segments: &[(Section, scraper::ElementRef<'_>)], kind: Section) -> usize {
    segments.iter().filter(|(s, _)| *s == kind).count()
}

// ── Tests ──
