//! Pushshift constants and the fixed TSV column layout.

/// 2017-05-06, the day after the Simple Questions rule was introduced.
pub const START_TIME: i64 = 1_494_028_860;

pub const SUBREDDIT: &str = "malefashionadvice";
pub const AUTHOR: &str = "AutoModerator";
pub const SEARCH_TERMS: [&str; 2] = ["Simple Questions", "Daily Questions"];

pub const THREAD_PAGE_SIZE: usize = 100;
pub const COMMENT_BATCH_SIZE: usize = 500;

/// Column order of every TSV file written by the scraper.
pub const COMMENT_FIELDS: [&str; 44] = [
    "thread_id",
    "thread_created_utc",
    "id",
    "created_utc",
    "author",
    "parent_id",
    "body",
    "all_awardings",
    "approved_at_utc",
    "associated_award",
    "author_flair_background_color",
    "author_flair_css_class",
    "author_flair_richtext",
    "author_flair_template_id",
    "author_flair_text",
    "author_flair_text_color",
    "author_flair_type",
    "author_fullname",
    "author_patreon_flair",
    "author_premium",
    "awarders",
    "banned_at_utc",
    "can_mod_post",
    "collapsed",
    "collapsed_because_crowd_control",
    "collapsed_reason",
    "comment_type",
    "distinguished",
    "edited",
    "gildings",
    "is_submitter",
    "link_id",
    "locked",
    "no_follow",
    "permalink",
    "retrieved_on",
    "score",
    "send_replies",
    "stickied",
    "subreddit",
    "subreddit_id",
    "top_awarded_type",
    "total_awards_received",
    "treatment_tags",
];

pub fn column_index(field: &str) -> Option<usize> {
    COMMENT_FIELDS.iter().position(|f| *f == field)
}

pub const THREAD_CREATED_COLUMN: usize = 1;
pub const ID_COLUMN: usize = 2;
