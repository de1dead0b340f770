//! Pushshift endpoints used by the scraper, behind the `PushshiftApi` trait.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ScrapeError;

/// Submission metadata carried along with every comment of the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    pub id: String,
    pub created_utc: i64,
    pub title: String,
}

/// One page of the submission search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionQuery<'a> {
    pub subreddit: &'a str,
    pub author: &'a str,
    pub title: &'a str,
    pub after: i64,
    pub size: usize,
}

pub trait PushshiftApi {
    /// Submissions matching the query, ascending by creation time.
    fn submissions(&self, query: &SubmissionQuery<'_>) -> Result<Vec<Thread>, ScrapeError>;

    fn comment_ids(&self, thread_id: &str) -> Result<Vec<String>, ScrapeError>;

    /// Full comment objects restricted to `fields`.
    fn comments(&self, ids: &[String], fields: &[&str]) -> Result<Vec<Map<String, Value>>, ScrapeError>;
}

impl<A: PushshiftApi + ?Sized> PushshiftApi for &A {
    fn submissions(&self, query: &SubmissionQuery<'_>) -> Result<Vec<Thread>, ScrapeError> {
        (**self).submissions(query)
    }

    fn comment_ids(&self, thread_id: &str) -> Result<Vec<String>, ScrapeError> {
        (**self).comment_ids(thread_id)
    }

    fn comments(&self, ids: &[String], fields: &[&str]) -> Result<Vec<Map<String, Value>>, ScrapeError> {
        (**self).comments(ids, fields)
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct SubmissionRow {
    id: String,
    title: String,
    created_utc: i64,
}

/// Blocking HTTP implementation.
pub struct HttpApi {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, read_timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .timeout_read(read_timeout)
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET `path` and parse the body as JSON. Anything but a 200 with a JSON
    /// body is an error carrying the URL, params, status and body.
    fn fetch_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, ScrapeError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.agent.get(&url);
        for (key, value) in params {
            request = request.query(key, value);
        }
        tracing::debug!(url = %url, params = %render_params(params), "GET");

        let (status, body) = match request.call() {
            Ok(response) => {
                let status = response.status();
                let body = response.into_string().map_err(|e| ScrapeError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
                (status, body)
            }
            Err(ureq::Error::Status(code, response)) => (code, response.into_string().unwrap_or_default()),
            Err(ureq::Error::Transport(transport)) => {
                return Err(ScrapeError::Transport {
                    url,
                    message: transport.to_string(),
                })
            }
        };

        if status == 200 {
            if let Ok(value) = serde_json::from_str(&body) {
                return Ok(value);
            }
        }
        Err(ScrapeError::Http {
            url,
            params: render_params(params),
            status,
            body,
        })
    }

    fn fetch_data<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<T>, ScrapeError> {
        let value = self.fetch_json(path, params)?;
        let envelope: Envelope<T> = serde_json::from_value(value).map_err(|source| ScrapeError::Decode {
            url: format!("{}{}", self.base_url, path),
            source,
        })?;
        Ok(envelope.data)
    }
}

impl PushshiftApi for HttpApi {
    fn submissions(&self, query: &SubmissionQuery<'_>) -> Result<Vec<Thread>, ScrapeError> {
        let params = submission_params(query);
        let rows: Vec<SubmissionRow> = self.fetch_data("/reddit/search/submission", &params)?;
        Ok(rows
            .into_iter()
            .map(|row| Thread {
                id: row.id,
                created_utc: row.created_utc,
                title: row.title,
            })
            .collect())
    }

    fn comment_ids(&self, thread_id: &str) -> Result<Vec<String>, ScrapeError> {
        self.fetch_data(&format!("/reddit/submission/comment_ids/{}", thread_id), &[])
    }

    fn comments(&self, ids: &[String], fields: &[&str]) -> Result<Vec<Map<String, Value>>, ScrapeError> {
        let params = comment_params(ids, fields);
        self.fetch_data("/reddit/search/comment", &params)
    }
}

fn submission_params(query: &SubmissionQuery<'_>) -> Vec<(&'static str, String)> {
    vec![
        ("subreddit", query.subreddit.to_string()),
        ("author", query.author.to_string()),
        ("title", query.title.to_string()),
        ("fields", "id".to_string()),
        ("fields", "title".to_string()),
        ("fields", "created_utc".to_string()),
        ("num_comments", ">0".to_string()),
        ("sort", "asc".to_string()),
        ("sort_type", "created_utc".to_string()),
        ("size", query.size.to_string()),
        ("after", query.after.to_string()),
    ]
}

/// Ids are comma joined; each field is its own `fields` pair.
fn comment_params(ids: &[String], fields: &[&str]) -> Vec<(&'static str, String)> {
    let mut params = vec![("ids", ids.join(","))];
    params.extend(fields.iter().map(|f| ("fields", f.to_string())));
    params
}

fn render_params(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
