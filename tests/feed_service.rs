mod common;

use std::cmp::Ordering;

use rookery::application::feed::{FeedError, PostDraft};
use rookery::domain::posts::timeline_ordering;

fn draft(text: &str) -> PostDraft {
    PostDraft {
        text: text.to_string(),
        group_slug: None,
        image: None,
    }
}

fn draft_in(text: &str, slug: &str) -> PostDraft {
    PostDraft {
        text: text.to_string(),
        group_slug: Some(slug.to_string()),
        image: None,
    }
}

#[tokio::test]
async fn followed_timeline_merges_into_global_order() {
    let feed = common::feed_service(None);

    for round in 0..3 {
        for author in ["anna", "boris", "vera"] {
            feed.create_post(author, draft(&format!("{author} {round}")))
                .await
                .expect("post");
        }
    }
    feed.follow("carol", "anna").await.expect("follow anna");
    feed.follow("carol", "boris").await.expect("follow boris");

    let timeline = feed.followed_timeline("carol").await.expect("timeline");
    assert_eq!(timeline.len(), 6);
    assert!(
        timeline
            .iter()
            .all(|p| p.author_username == "anna" || p.author_username == "boris")
    );

    // The merged feed is exactly the global timeline restricted to followed
    // authors, not one author's run followed by the other's.
    let global = feed.global_timeline().await.expect("global");
    let expected: Vec<i64> = global
        .iter()
        .filter(|p| p.author_username != "vera")
        .map(|p| p.id)
        .collect();
    let actual: Vec<i64> = timeline.iter().map(|p| p.id).collect();
    assert_eq!(actual, expected);

    assert!(
        timeline
            .windows(2)
            .all(|w| timeline_ordering(&w[0], &w[1]) != Ordering::Greater)
    );
}

#[tokio::test]
async fn follow_is_idempotent() {
    let feed = common::feed_service(None);
    feed.create_post("anna", draft("hello")).await.expect("post");

    feed.follow("carol", "anna").await.expect("first follow");
    feed.follow("carol", "anna").await.expect("repeat follow");

    let followed = feed
        .relations()
        .followed_authors("carol")
        .await
        .expect("authors");
    assert_eq!(followed.len(), 1);
    assert_eq!(feed.followed_timeline("carol").await.unwrap().len(), 1);
}

#[tokio::test]
async fn self_follow_is_rejected_without_side_effects() {
    let feed = common::feed_service(None);
    feed.create_post("anna", draft("hello")).await.expect("post");

    assert!(matches!(
        feed.follow("anna", "anna").await,
        Err(FeedError::SelfFollow)
    ));
    assert!(
        feed.relations()
            .followed_authors("anna")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn follow_unknown_author_is_not_found() {
    let feed = common::feed_service(None);
    feed.create_post("carol", draft("hi")).await.expect("post");

    assert!(matches!(
        feed.follow("carol", "nobody").await,
        Err(FeedError::NotFound { .. })
    ));
}

#[tokio::test]
async fn unfollow_missing_edge_reports_not_found() {
    let feed = common::feed_service(None);
    feed.create_post("anna", draft("hello")).await.expect("post");

    assert!(matches!(
        feed.unfollow("carol", "anna").await,
        Err(FeedError::NotFound { .. })
    ));

    feed.follow("carol", "anna").await.expect("follow");
    feed.unfollow("carol", "anna").await.expect("unfollow");
    assert!(matches!(
        feed.unfollow("carol", "anna").await,
        Err(FeedError::NotFound { .. })
    ));
}

#[tokio::test]
async fn group_timeline_is_isolated() {
    let feed = common::feed_service(None);
    feed.create_group("Cats", None, "feline matters")
        .await
        .expect("group");
    feed.create_group("Dogs", None, "canine matters")
        .await
        .expect("group");

    feed.create_post("anna", draft_in("meow", "cats"))
        .await
        .expect("post");
    feed.create_post("anna", draft_in("woof", "dogs"))
        .await
        .expect("post");
    feed.create_post("anna", draft("ungrouped")).await.expect("post");

    let (group, posts) = feed.group_timeline("cats").await.expect("cats");
    assert_eq!(group.title, "Cats");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "meow");

    assert!(matches!(
        feed.group_timeline("birds").await,
        Err(FeedError::NotFound { .. })
    ));
}

#[tokio::test]
async fn create_post_rejects_unknown_group_and_empty_text() {
    let feed = common::feed_service(None);

    assert!(matches!(
        feed.create_post("anna", draft_in("text", "missing")).await,
        Err(FeedError::NotFound { .. })
    ));
    assert!(matches!(
        feed.create_post("anna", draft("   \n")).await,
        Err(FeedError::Validation(_))
    ));
    assert!(feed.global_timeline().await.unwrap().is_empty());
}

#[tokio::test]
async fn only_the_author_may_edit() {
    let feed = common::feed_service(None);
    let post = feed.create_post("anna", draft("original")).await.expect("post");

    let denied = feed
        .edit_post("boris", "anna", post.id, draft("hijacked"))
        .await;
    assert!(matches!(denied, Err(FeedError::Forbidden)));

    let (unchanged, _) = feed.post_detail("anna", post.id).await.expect("detail");
    assert_eq!(unchanged.text, "original");

    let edited = feed
        .edit_post("anna", "anna", post.id, draft("updated"))
        .await
        .expect("edit");
    assert_eq!(edited.text, "updated");
    assert_eq!(edited.pub_date, post.pub_date);
    assert_eq!(edited.author_username, "anna");
}

#[tokio::test]
async fn post_is_addressed_by_author_and_id() {
    let feed = common::feed_service(None);
    feed.create_post("boris", draft("other")).await.expect("post");
    let post = feed.create_post("anna", draft("mine")).await.expect("post");

    assert!(feed.post_detail("anna", post.id).await.is_ok());
    assert!(matches!(
        feed.post_detail("boris", post.id).await,
        Err(FeedError::NotFound { .. })
    ));
}

#[tokio::test]
async fn comments_are_validated_and_ordered() {
    let feed = common::feed_service(None);
    let post = feed.create_post("anna", draft("hello")).await.expect("post");

    assert!(matches!(
        feed.add_comment("boris", "anna", post.id, "  ").await,
        Err(FeedError::Validation(_))
    ));

    feed.add_comment("boris", "anna", post.id, "first")
        .await
        .expect("comment");
    feed.add_comment("carol", "anna", post.id, "second")
        .await
        .expect("comment");

    let (_, comments) = feed.post_detail("anna", post.id).await.expect("detail");
    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
}

#[tokio::test]
async fn group_slug_is_derived_and_unique() {
    let feed = common::feed_service(None);

    let group = feed
        .create_group("Rust Writers", None, "")
        .await
        .expect("group");
    assert_eq!(group.slug, "rust-writers");

    let duplicate = feed.create_group("Rust Writers", None, "").await;
    assert!(matches!(
        duplicate,
        Err(FeedError::Repo(
            rookery::application::repos::RepoError::Duplicate { .. }
        ))
    ));

    let explicit = feed
        .create_group("Rust Writers Too", Some("writers2"), "")
        .await
        .expect("group");
    assert_eq!(explicit.slug, "writers2");
}
