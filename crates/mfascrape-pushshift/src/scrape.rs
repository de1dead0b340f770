//! One scrape attempt, and the restart loop wrapped around it.

use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use mfascrape_core::config::ScrapeConfig;

use crate::api::{PushshiftApi, SubmissionQuery, Thread};
use crate::comments::{comment_row, merge_thread_info, PendingComment};
use crate::error::ScrapeError;
use crate::fields::{self, COMMENT_FIELDS};
use crate::output;
use crate::tsv;

/// Sleeps before each restart, consumed from the end: 0, 10, 10, 20, 30, 60, 80.
pub const RESTART_DELAYS_SECS: [u64; 7] = [80, 60, 30, 20, 10, 10, 0];

#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub subreddit: String,
    pub author: String,
    pub search_terms: Vec<String>,
    pub start_time: i64,
    pub thread_page_size: usize,
    pub comment_batch_size: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            subreddit: fields::SUBREDDIT.to_string(),
            author: fields::AUTHOR.to_string(),
            search_terms: fields::SEARCH_TERMS.iter().map(|s| s.to_string()).collect(),
            start_time: fields::START_TIME,
            thread_page_size: fields::THREAD_PAGE_SIZE,
            comment_batch_size: fields::COMMENT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapePaths {
    pub columns: PathBuf,
    pub output: PathBuf,
    pub deduplicated: PathBuf,
}

impl From<&ScrapeConfig> for ScrapePaths {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            columns: config.columns_file.clone(),
            output: config.output_file.clone(),
            deduplicated: config.deduplicated_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeSummary {
    /// Page boundary the attempt started from.
    pub start_after: i64,
    /// Rows appended to the output file by this attempt.
    pub comments_written: usize,
    /// Rows in the deduplicated file.
    pub unique_comments: usize,
}

/// Walks the submission search for one term, one page at a time. Every
/// yielded thread moves the `after` boundary to its creation time.
struct ThreadPager<'a, A: PushshiftApi> {
    api: &'a A,
    settings: &'a ScrapeSettings,
    term: &'a str,
    after: i64,
    page: VecDeque<Thread>,
    done: bool,
}

impl<'a, A: PushshiftApi> ThreadPager<'a, A> {
    fn new(api: &'a A, settings: &'a ScrapeSettings, term: &'a str, after: i64) -> Self {
        Self {
            api,
            settings,
            term,
            after,
            page: VecDeque::new(),
            done: false,
        }
    }

    fn fetch_page(&mut self) -> Result<(), ScrapeError> {
        let query = SubmissionQuery {
            subreddit: &self.settings.subreddit,
            author: &self.settings.author,
            title: self.term,
            after: self.after,
            size: self.settings.thread_page_size,
        };
        let page = self.api.submissions(&query)?;
        if page.is_empty() {
            tracing::info!("No {} threads found after time {}", self.term, self.after);
            self.done = true;
        } else {
            tracing::info!(
                "Fetched {} {} thread IDs starting at time {}",
                page.len(),
                self.term,
                self.after
            );
            self.page.extend(page);
        }
        Ok(())
    }
}

impl<A: PushshiftApi> Iterator for ThreadPager<'_, A> {
    type Item = Result<Thread, ScrapeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page.is_empty() && !self.done {
            if let Err(e) = self.fetch_page() {
                self.done = true;
                return Some(Err(e));
            }
        }
        let thread = self.page.pop_front()?;
        self.after = thread.created_utc;
        Some(Ok(thread))
    }
}

pub struct Scraper<A: PushshiftApi> {
    api: A,
    settings: ScrapeSettings,
    paths: ScrapePaths,
}

impl<A: PushshiftApi> Scraper<A> {
    pub fn new(api: A, settings: ScrapeSettings, paths: ScrapePaths) -> Self {
        Self { api, settings, paths }
    }

    pub fn paths(&self) -> &ScrapePaths {
        &self.paths
    }

    /// Single pass: resume from the output file, append every comment of
    /// every matching thread, then rewrite the deduplicated file.
    pub fn scrape_once(&self) -> Result<ScrapeSummary, ScrapeError> {
        let paths = &self.paths;
        output::write_columns(&paths.columns)?;
        output::initialize_output_file(&paths.output)?;

        let after = output::initial_page_boundary(&paths.output, self.settings.start_time)?;
        tracing::info!("Fetching data starting at time {}", after);

        let file = OpenOptions::new()
            .append(true)
            .open(&paths.output)
            .map_err(|e| ScrapeError::io(&paths.output, e))?;
        let mut out = BufWriter::new(file);

        let mut written = 0;
        let mut batch = Vec::with_capacity(self.settings.comment_batch_size);
        for term in &self.settings.search_terms {
            for thread in ThreadPager::new(&self.api, &self.settings, term, after) {
                let thread = thread?;
                let ids = self.api.comment_ids(&thread.id)?;
                tracing::info!(
                    "Fetched {} comment IDs for thread '{}' ({}) submitted at time {}",
                    ids.len(),
                    thread.title,
                    thread.id,
                    thread.created_utc
                );
                for id in ids {
                    batch.push(PendingComment {
                        id,
                        thread: thread.clone(),
                    });
                    if batch.len() >= self.settings.comment_batch_size {
                        written += self.write_batch(&mut out, &mut batch)?;
                    }
                }
            }
        }
        if !batch.is_empty() {
            written += self.write_batch(&mut out, &mut batch)?;
        }
        drop(out);

        tracing::info!("Deduplicating results");
        let unique = output::deduplicate(&paths.output, &paths.deduplicated)?;
        tracing::info!("Wrote {} comments to {}", unique, paths.deduplicated.display());

        Ok(ScrapeSummary {
            start_after: after,
            comments_written: written,
            unique_comments: unique,
        })
    }

    /// Fetch the full comments for `batch`, append them and flush, leaving
    /// `batch` empty.
    fn write_batch<W: Write>(&self, out: &mut W, batch: &mut Vec<PendingComment>) -> Result<usize, ScrapeError> {
        let mut ids = Vec::with_capacity(batch.len());
        let mut pending = HashMap::with_capacity(batch.len());
        for comment in batch.drain(..) {
            if !pending.contains_key(&comment.id) {
                ids.push(comment.id.clone());
                pending.insert(comment.id.clone(), comment);
            }
        }

        let comments = self.api.comments(&ids, &COMMENT_FIELDS)?;
        tracing::info!("Fetched {} comments", comments.len());

        let path = &self.paths.output;
        let mut written = 0;
        for comment in comments {
            let id = comment.get("id").and_then(|v| v.as_str()).unwrap_or_default().to_string();
            let Some(info) = pending.get(&id) else {
                tracing::warn!("Skipping comment {:?} that was not requested", id);
                continue;
            };
            let row = comment_row(&merge_thread_info(comment, info));
            tsv::write_row(&mut *out, &row).map_err(|e| ScrapeError::io(path, e))?;
            written += 1;
        }
        out.flush().map_err(|e| ScrapeError::io(path, e))?;
        Ok(written)
    }
}

/// Run `attempt` until it succeeds, sleeping between failures. Delays are
/// taken from the end of `delays`; once they run out the last error is
/// returned.
pub fn retry_with_schedule<T, E, F, S>(delays: &[u64], mut attempt: F, mut sleep: S) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Result<T, E>,
    S: FnMut(Duration),
{
    let mut remaining = delays.to_vec();
    loop {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::error!("{}", e);
                let Some(delay) = remaining.pop() else {
                    return Err(e);
                };
                tracing::warn!("Restarting after {} seconds", delay);
                sleep(Duration::from_secs(delay));
            }
        }
    }
}
