//! Post ordering and validation invariants.

use std::cmp::Ordering;

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use super::entities::PostRecord;
use super::error::DomainError;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// The single global ordering every timeline obeys: newest `pub_date` first,
/// equal timestamps resolved by insertion order (ascending id).
pub fn timeline_ordering(a: &PostRecord, b: &PostRecord) -> Ordering {
    b.pub_date.cmp(&a.pub_date).then(a.id.cmp(&b.id))
}

/// Sort posts into the global timeline ordering.
pub fn sort_timeline(posts: &mut [PostRecord]) {
    posts.sort_by(timeline_ordering);
}

/// Reject empty (or whitespace-only) post and comment bodies.
pub fn validate_text(text: &str) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        Err(DomainError::validation("text must not be empty"))
    } else {
        Ok(())
    }
}

pub fn format_human_date(when: OffsetDateTime) -> String {
    when.date()
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| when.date().to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn post(id: i64, pub_date: OffsetDateTime) -> PostRecord {
        PostRecord {
            id,
            text: format!("post {id}"),
            pub_date,
            author_id: 1,
            author_username: "ada".to_string(),
            group_id: None,
            group_slug: None,
            group_title: None,
            image: None,
        }
    }

    #[test]
    fn newest_first() {
        let mut posts = vec![
            post(1, datetime!(2024-01-01 10:00 UTC)),
            post(2, datetime!(2024-01-02 10:00 UTC)),
        ];
        sort_timeline(&mut posts);
        assert_eq!(posts[0].id, 2);
        assert_eq!(posts[1].id, 1);
    }

    #[test]
    fn equal_timestamps_keep_insertion_order() {
        let when = datetime!(2024-03-05 08:30 UTC);
        let mut posts = vec![post(7, when), post(3, when), post(5, when)];
        sort_timeline(&mut posts);
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 5, 7]);
    }

    #[test]
    fn whitespace_only_text_is_rejected() {
        assert!(validate_text("   \n\t").is_err());
        assert!(validate_text("").is_err());
        assert!(validate_text("hello").is_ok());
    }
}
