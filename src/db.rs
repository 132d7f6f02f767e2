use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;

use crate::parser::meta::ProblemId;
use crate::parser::record::ProblemRecord;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating database directory {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS problems (
            url            TEXT PRIMARY KEY,
            problem_id     TEXT,
            title          TEXT NOT NULL,
            description    TEXT NOT NULL,
            constraints    TEXT NOT NULL,
            difficulty     TEXT NOT NULL CHECK(difficulty IN ('Easy','Medium','Hard','Unknown')),
            rating         TEXT NOT NULL,
            tags           TEXT NOT NULL,
            input_format   TEXT NOT NULL,
            output_format  TEXT NOT NULL,
            examples       TEXT NOT NULL,
            examples_count INTEGER NOT NULL,
            fetched_at     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_problems_difficulty ON problems(difficulty);

        CREATE TABLE IF NOT EXISTS failures (
            id         INTEGER PRIMARY KEY,
            url        TEXT NOT NULL,
            kind       TEXT NOT NULL,
            message    TEXT NOT NULL,
            failed_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_failures_url ON failures(url);
        ",
    )?;
    Ok(())
}

// ── Problems ──

/// Insert or replace by URL. Examples are stored as their JSON array.
pub fn save_problem(conn: &Connection, record: &ProblemRecord) -> Result<()> {
    let problem_id = ProblemId::from_url(&record.url).map(|id| id.to_string());
    let examples = serde_json::to_string(&record.examples)?;
    conn.execute(
        "INSERT OR REPLACE INTO problems
         (url, problem_id, title, description, constraints, difficulty, rating, tags,
          input_format, output_format, examples, examples_count, fetched_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13)",
        rusqlite::params![
            record.url,
            problem_id,
            record.title,
            record.description,
            record.constraints,
            record.difficulty.as_str(),
            record.problem_rating,
            record.tags_joined(),
            record.input_format,
            record.output_format,
            examples,
            record.examples_count as i64,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("saving {}", record.url))?;
    Ok(())
}

// ── Failures ──

pub fn save_failure(conn: &Connection, url: &str, kind: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO failures (url, kind, message, failed_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![url, kind, message, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

// ── Overview ──

pub struct OverviewRow {
    pub problem_id: String,
    pub title: String,
    pub difficulty: String,
    pub rating: String,
    pub tags: String,
    pub examples_count: i64,
    pub url: String,
}

pub fn fetch_overview(
    conn: &Connection,
    difficulty: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    let where_clause = match difficulty {
        Some(d) => {
            params.push(Box::new(d.to_string()));
            " WHERE difficulty = ?1 COLLATE NOCASE"
        }
        None => "",
    };

    let sql = format!(
        "SELECT COALESCE(problem_id,''), title, difficulty, rating, tags, examples_count, url
         FROM problems{}
         ORDER BY fetched_at DESC, url
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(OverviewRow {
                problem_id: row.get(0)?,
                title: row.get(1)?,
                difficulty: row.get(2)?,
                rating: row.get(3)?,
                tags: row.get(4)?,
                examples_count: row.get(5)?,
                url: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub problems: usize,
    pub by_difficulty: Vec<(String, usize)>,
    pub failures: usize,
    pub failed_urls: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let problems: usize = conn.query_row("SELECT COUNT(*) FROM problems", [], |r| r.get(0))?;
    let failures: usize = conn.query_row("SELECT COUNT(*) FROM failures", [], |r| r.get(0))?;
    let failed_urls: usize = conn.query_row(
        "SELECT COUNT(DISTINCT f.url) FROM failures f
         WHERE NOT EXISTS (SELECT 1 FROM problems p WHERE p.url = f.url)",
        [],
        |r| r.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT difficulty, COUNT(*) FROM problems
         GROUP BY difficulty
         ORDER BY CASE difficulty
             WHEN 'Easy' THEN 0 WHEN 'Medium' THEN 1 WHEN 'Hard' THEN 2 ELSE 3 END",
    )?;
    let by_difficulty = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Stats {
        problems,
        by_difficulty,
        failures,
        failed_urls,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::meta::Difficulty;
    use crate::parser::record::ExamplePair;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn record(url: &str, title: &str, difficulty: Difficulty) -> ProblemRecord {
        ProblemRecord {
            title: title.into(),
            description: "Given two integers a and b, compute a+b.".into(),
            constraints: String::new(),
            difficulty,
            problem_rating: "800".into(),
            tags: vec!["math".into(), "implementation".into()],
            input_format: "Two integers".into(),
            output_format: "Their sum".into(),
            examples: vec![ExamplePair {
                index: 1,
                input: vec!["1 2".into()],
                output: vec!["3".into()],
            }],
            examples_count: 1,
            url: url.into(),
        }
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = memory();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn save_upserts_by_url() {
        let conn = memory();
        let url = "https://codeforces.com/problemset/problem/1/A";
        save_problem(&conn, &record(url, "A. Sum", Difficulty::Easy)).unwrap();
        save_problem(&conn, &record(url, "A. Sum (fixed)", Difficulty::Easy)).unwrap();

        let rows = fetch_overview(&conn, None, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "A. Sum (fixed)");
        assert_eq!(rows[0].problem_id, "1A");
        assert_eq!(rows[0].tags, "math, implementation");
        assert_eq!(rows[0].examples_count, 1);

        let examples: String = conn
            .query_row("SELECT examples FROM problems WHERE url = ?1", [url], |r| r.get(0))
            .unwrap();
        assert_eq!(examples, r#"[{"index":1,"input":"1 2","output":"3"}]"#);
    }

    #[test]
    fn overview_filters_by_difficulty() {
        let conn = memory();
        save_problem(&conn, &record("https://codeforces.com/contest/5/problem/A", "A. X", Difficulty::Easy)).unwrap();
        save_problem(&conn, &record("https://codeforces.com/contest/5/problem/C", "C. Y", Difficulty::Medium)).unwrap();
        save_problem(&conn, &record("local.html", "Z", Difficulty::Unknown)).unwrap();

        let medium = fetch_overview(&conn, Some("medium"), 10).unwrap();
        assert_eq!(medium.len(), 1);
        assert_eq!(medium[0].problem_id, "5C");

        let unknown = fetch_overview(&conn, Some("Unknown"), 10).unwrap();
        assert_eq!(unknown[0].problem_id, "");
        assert_eq!(fetch_overview(&conn, None, 2).unwrap().len(), 2);
    }

    #[test]
    fn stats_count_problems_and_failures() {
        let conn = memory();
        let ok = "https://codeforces.com/contest/7/problem/A";
        save_problem(&conn, &record(ok, "A. X", Difficulty::Easy)).unwrap();
        save_problem(&conn, &record("https://codeforces.com/contest/7/problem/E", "E. Y", Difficulty::Hard)).unwrap();
        save_failure(&conn, ok, "fetch", "timed out").unwrap();
        save_failure(&conn, "https://codeforces.com/blog", "structure", "no statement").unwrap();
        save_failure(&conn, "https://codeforces.com/blog", "structure", "no statement").unwrap();

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.problems, 2);
        assert_eq!(stats.failures, 3);
        assert_eq!(stats.failed_urls, 1);
        assert_eq!(
            stats.by_difficulty,
            vec![("Easy".to_string(), 1), ("Hard".to_string(), 1)]
        );
    }
}
