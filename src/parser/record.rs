use serde::{Serialize, Serializer};

use super::meta::{Difficulty, Metadata};
use super::sections::StatementText;

pub const DESCRIPTION_MAX_CHARS: usize = 5000;
pub const FIELD_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamplePair {
    pub index: u32,
    #[serde(serialize_with = "join_lines")]
    pub input: Vec<String>,
    #[serde(serialize_with = "join_lines")]
    pub output: Vec<String>,
}

impl ExamplePair {
    pub fn input_text(&self) -> String {
        self.input.join("\n")
    }

    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }
}

fn join_lines<S: Serializer>(lines: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&lines.join("\n"))
}

/// The extracted problem. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    pub title: String,
    pub description: String,
    pub constraints: String,
    pub difficulty: Difficulty,
    pub problem_rating: String,
    pub tags: Vec<String>,
    pub input_format: String,
    pub output_format: String,
    pub examples: Vec<ExamplePair>,
    pub examples_count: usize,
    pub url: String,
}

impl ProblemRecord {
    pub fn tags_joined(&self) -> String {
        self.tags.join(", ")
    }

    /// Human-readable rendering for terminal output.
    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n{}\n", self.title, "=".repeat(self.title.chars().count()));
        let meta = [
            ("URL", self.url.clone()),
            ("Difficulty", self.difficulty.to_string()),
            ("Rating", self.problem_rating.clone()),
            ("Tags", self.tags_joined()),
            ("Limits", self.constraints.replace('\n', "; ")),
        ];
        for (label, value) in meta.iter().filter(|(_, v)| !v.is_empty()) {
            out.push_str(&format!("{label}: {value}\n"));
        }
        for (heading, body) in [
            ("Description", &self.description),
            ("Input", &self.input_format),
            ("Output", &self.output_format),
        ] {
            if !body.is_empty() {
                out.push_str(&format!("\n{heading}\n{body}\n"));
            }
        }
        if !self.examples.is_empty() {
            out.push_str(&format!("\n{}\n", format_examples(&self.examples)));
        }
        out
    }
}

/// Compose the record. Caps are applied here and nowhere earlier.
pub fn assemble(
    url: &str,
    title: String,
    statement: StatementText,
    metadata: Metadata,
    examples: Vec<ExamplePair>,
) -> ProblemRecord {
    ProblemRecord {
        title,
        description: cap(statement.description, DESCRIPTION_MAX_CHARS),
        constraints: cap(metadata.constraints, FIELD_MAX_CHARS),
        difficulty: metadata.difficulty,
        problem_rating: metadata.rating,
        tags: metadata.tags,
        input_format: cap(statement.input_format, FIELD_MAX_CHARS),
        output_format: cap(statement.output_format, FIELD_MAX_CHARS),
        examples_count: examples.len(),
        examples,
        url: url.to_string(),
    }
}

fn cap(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text,
    }
}

/// `Example N:` blocks with indented input/output lines.
pub fn format_examples(examples: &[ExamplePair]) -> String {
    examples
        .iter()
        .map(|ex| {
            format!(
                "Example {}:\n  Input:\n    {}\n  Output:\n    {}",
                ex.index,
                ex.input.join("\n    "),
                ex.output.join("\n    "),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(index: u32, input: &[&str], output: &[&str]) -> ExamplePair {
        ExamplePair {
            index,
            input: input.iter().map(|s| s.to_string()).collect(),
            output: output.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn metadata() -> Metadata {
        Metadata {
            difficulty: Difficulty::Easy,
            tags: vec!["math".into(), "greedy".into()],
            rating: "800".into(),
            constraints: "time limit per test 1 second".into(),
        }
    }

    #[test]
    fn description_capped_at_assembly() {
        let statement = StatementText {
            description: "x".repeat(DESCRIPTION_MAX_CHARS + 250),
            input_format: "y".repeat(FIELD_MAX_CHARS + 1),
            output_format: "short".into(),
        };
        let record = assemble("u", "A. T".into(), statement, metadata(), Vec::new());
        assert_eq!(record.description.chars().count(), DESCRIPTION_MAX_CHARS);
        assert_eq!(record.input_format.chars().count(), FIELD_MAX_CHARS);
        assert_eq!(record.output_format, "short");
    }

    #[test]
    fn cap_counts_chars_not_bytes() {
        assert_eq!(cap("≤≤≤≤".into(), 2), "≤≤");
        assert_eq!(cap("ab".into(), 5), "ab");
    }

    #[test]
    fn examples_counted() {
        let examples = vec![pair(1, &["1 2"], &["3"]), pair(2, &["4 5"], &[])];
        let record = assemble("u", String::new(), StatementText::default(), metadata(), examples);
        assert_eq!(record.examples_count, 2);
    }

    #[test]
    fn serialized_field_names_and_order() {
        let record = assemble(
            "https://codeforces.com/problemset/problem/1/A",
            "A. Sum".into(),
            StatementText::default(),
            metadata(),
            vec![pair(1, &["1", "2"], &["3"])],
        );
        let json = serde_json::to_string(&record).unwrap();
        let keys = [
            "\"title\"", "\"description\"", "\"constraints\"", "\"difficulty\"",
            "\"problemRating\"", "\"tags\"", "\"inputFormat\"", "\"outputFormat\"",
            "\"examples\"", "\"examplesCount\"", "\"url\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
        assert!(json.contains(r#""difficulty":"Easy""#));
        assert!(json.contains(r#"{"index":1,"input":"1\n2","output":"3"}"#));
    }

    #[test]
    fn examples_formatting() {
        let text = format_examples(&[pair(1, &["2", "1 2"], &["3"]), pair(2, &["0"], &[])]);
        assert_eq!(
            text,
            "Example 1:\n  Input:\n    2\n    1 2\n  Output:\n    3\n\nExample 2:\n  Input:\n    0\n  Output:\n    "
        );
    }

    #[test]
    fn text_rendering_skips_empty_fields() {
        let mut record = assemble("u", "A. Sum".into(), StatementText::default(), metadata(), Vec::new());
        record.problem_rating.clear();
        let text = record.to_text();
        assert!(text.starts_with("A. Sum\n======\n"));
        assert!(text.contains("Tags: math, greedy"));
        assert!(!text.contains("Rating:"));
        assert!(!text.contains("Description"));
    }
}
