//! Turning Pushshift comment objects into TSV rows.

use serde_json::{Map, Value};

use crate::api::Thread;
use crate::fields::COMMENT_FIELDS;

/// Comment id waiting for its full object, tagged with the thread it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingComment {
    pub id: String,
    pub thread: Thread,
}

/// `t1_<id>` (reply to a comment) becomes `<id>`; `t3_<id>` (top level)
/// becomes null. Anything else is left alone.
pub fn correct_parent_id(comment: &mut Map<String, Value>) {
    let corrected = match comment.get("parent_id") {
        Some(Value::String(parent)) => {
            if let Some(rest) = parent.strip_prefix("t1_") {
                Value::String(rest.to_string())
            } else if parent.starts_with("t3_") {
                Value::Null
            } else {
                return;
            }
        }
        _ => return,
    };
    comment.insert("parent_id".to_string(), corrected);
}

/// Normalize the comment and overlay the thread columns.
pub fn merge_thread_info(mut comment: Map<String, Value>, pending: &PendingComment) -> Map<String, Value> {
    correct_parent_id(&mut comment);
    comment.insert("thread_id".to_string(), Value::String(pending.thread.id.clone()));
    comment.insert(
        "thread_created_utc".to_string(),
        Value::from(pending.thread.created_utc),
    );
    comment.insert("thread_title".to_string(), Value::String(pending.thread.title.clone()));
    comment.insert("id".to_string(), Value::String(pending.id.clone()));
    comment
}

/// Text of a single cell. Missing and null values are empty; nested values
/// are written as compact JSON.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// One row in column order; keys outside the column list are dropped.
pub fn comment_row(comment: &Map<String, Value>) -> Vec<String> {
    COMMENT_FIELDS.iter().map(|field| cell(comment.get(*field))).collect()
}
