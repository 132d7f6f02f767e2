//! Codeforces problem extractor: HTML → [`ProblemRecord`].

pub mod db;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod settings;

pub use error::ScrapeError;
pub use parser::extract_problem;
pub use parser::meta::Difficulty;
pub use parser::record::{ExamplePair, ProblemRecord};
pub use settings::Settings;
