//! Native capture of the /r/malefashionadvice "Simple Questions" and
//! "Daily Questions" threads from the Pushshift API.
//!
//! Comments are appended to a TSV file while fetching, so an interrupted run
//! resumes from the newest thread already captured; the final step writes a
//! copy deduplicated by comment id.

pub mod api;
pub mod comments;
pub mod error;
pub mod fields;
pub mod output;
pub mod scrape;
pub mod tsv;

pub use api::{HttpApi, PushshiftApi, SubmissionQuery, Thread};
pub use error::ScrapeError;
pub use scrape::{retry_with_schedule, ScrapePaths, ScrapeSettings, ScrapeSummary, Scraper, RESTART_DELAYS_SECS};
