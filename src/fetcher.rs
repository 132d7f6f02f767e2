use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::db;
use crate::error::ScrapeError;
use crate::parser::{self, record::ProblemRecord};
use crate::settings::Settings;

/// HTTP side of the scraper: one shared client, retry with exponential backoff.
pub struct Fetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff: Duration,
}

/// Batch stats returned after completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

impl Fetcher {
    pub fn new(settings: &Settings) -> reqwest::Result<Fetcher> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Fetcher {
            client,
            max_retries: settings.max_retries,
            backoff: settings.backoff(),
        })
    }

    /// Fetch and extract one problem page.
    pub async fn scrape(&self, url: &str) -> Result<ProblemRecord, ScrapeError> {
        let html = self.fetch_html(url).await?;
        let start = Instant::now();
        let record = parser::extract_problem(&html, url)?;
        debug!(url, bytes = html.len(), parse_ms = start.elapsed().as_millis() as u64, "extracted");
        Ok(record)
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = self.backoff_for(attempt);
                    warn!(
                        "{} (attempt {}/{}), backing off {:.1}s",
                        e,
                        attempt + 1,
                        self.max_retries,
                        backoff.as_secs_f64()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ScrapeError> {
        let fetch_err = |source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.text().await.map_err(fetch_err)
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Scrape URLs concurrently, saving each result to DB as it arrives.
///
/// Failures are logged and recorded in the `failures` table; only store
/// errors abort the batch.
pub async fn scrape_batch(
    conn: &Connection,
    fetcher: Arc<Fetcher>,
    urls: Vec<String>,
    concurrency: usize,
) -> Result<BatchStats> {
    let concurrency = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = urls.len();

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let (tx, mut rx) =
        mpsc::channel::<(String, Result<ProblemRecord, ScrapeError>)>(concurrency * 2);

    for url in urls {
        let fetcher = Arc::clone(&fetcher);
        let sem = Arc::clone(&semaphore);
        let tx = tx.clone();

        tokio::spawn(async move {
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };
            // Inner task so a panic while scraping still reports back.
            let worker = {
                let url = url.clone();
                tokio::spawn(async move { fetcher.scrape(&url).await })
            };
            let result = match worker.await {
                Ok(result) => result,
                Err(e) => Err(ScrapeError::Task {
                    url: url.clone(),
                    reason: e.to_string(),
                }),
            };
            let _ = tx.send((url, result)).await;
        });
    }

    // rx closes once every worker has dropped its sender
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    while let Some((url, result)) = rx.recv().await {
        match result {
            Ok(record) => {
                db::save_problem(conn, &record)?;
                ok += 1;
            }
            Err(e) => {
                warn!(url = %url, kind = e.kind(), "{}", e);
                db::save_failure(conn, &url, e.kind(), &e.to_string())?;
                errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Scraped {} problems ({} ok, {} errors)", total, ok, errors);

    Ok(BatchStats { total, ok, errors })
}

/// One URL per line; blank lines and `#` comments are ignored.
pub fn read_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP responder on a random local port; counts requests.
    async fn serve(status: &'static str, body: String) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (format!("http://{addr}/problemset/problem/1/A"), hits)
    }

    fn fetcher(max_retries: u32, backoff_ms: u64) -> Fetcher {
        let settings = Settings {
            timeout_secs: 2,
            max_retries,
            backoff_ms,
            ..Settings::default()
        };
        Fetcher::new(&settings).unwrap()
    }

    #[test]
    fn backoff_doubles() {
        let f = fetcher(3, 500);
        assert_eq!(f.backoff_for(0), Duration::from_millis(500));
        assert_eq!(f.backoff_for(1), Duration::from_millis(1000));
        assert_eq!(f.backoff_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn url_list_skips_comments_and_blanks() {
        let urls = read_url_list(
            "# round 1\nhttps://codeforces.com/contest/1/problem/A\n\n   \n  https://codeforces.com/contest/1/problem/B  \n#skip\n",
        );
        assert_eq!(
            urls,
            vec![
                "https://codeforces.com/contest/1/problem/A",
                "https://codeforces.com/contest/1/problem/B",
            ]
        );
    }

    #[tokio::test]
    async fn refused_connection_is_fetch_error() {
        let err = fetcher(0, 1).scrape("http://127.0.0.1:1/problem").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch { .. }), "{err}");
        assert_eq!(err.kind(), "fetch");
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let (url, hits) = serve("404 Not Found", String::new()).await;
        let err = fetcher(3, 1).fetch_html(&url).await.unwrap_err();
        assert!(
            matches!(err, ScrapeError::Status { status, .. } if status == reqwest::StatusCode::NOT_FOUND),
            "{err}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_retried_until_exhausted() {
        let (url, hits) = serve("503 Service Unavailable", String::new()).await;
        let err = fetcher(2, 1).fetch_html(&url).await.unwrap_err();
        assert!(err.is_retryable(), "{err}");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn served_page_is_extracted() {
        let html = std::fs::read_to_string("tests/fixtures/sum.html").unwrap();
        let (url, hits) = serve("200 OK", html).await;
        let record = fetcher(3, 1).scrape(&url).await.unwrap();
        assert_eq!(record.title, "A. Sum");
        assert_eq!(record.url, url);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn batch_records_failures() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let urls = vec!["http://127.0.0.1:1/a".to_string(), "http://127.0.0.1:1/b".to_string()];

        let stats = scrape_batch(&conn, Arc::new(fetcher(0, 1)), urls, 2).await.unwrap();
        assert_eq!(stats, BatchStats { total: 2, ok: 0, errors: 2 });
        assert_eq!(db::get_stats(&conn).unwrap().failures, 2);
    }
}
