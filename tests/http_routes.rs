mod common;

use axum::http::StatusCode;
use rookery::application::feed::PostDraft;

fn draft(text: &str) -> PostDraft {
    PostDraft {
        text: text.to_string(),
        group_slug: None,
        image: None,
    }
}

#[tokio::test]
async fn index_paginates_thirteen_posts() {
    let feed = common::feed_service(None);
    for index in 0..13 {
        feed.create_post("anna", draft(&format!("entry number {index}")))
            .await
            .expect("post");
    }
    let app = common::router(feed);

    let first = common::get(&app, "/").await;
    assert_eq!(first.status(), StatusCode::OK);
    let body = common::body_text(first).await;
    assert_eq!(body.matches("<article class=\"post\"").count(), 10);
    assert!(body.contains("Page 1 of 2"));

    let second = common::get(&app, "/?page=2").await;
    let body = common::body_text(second).await;
    assert_eq!(body.matches("<article class=\"post\"").count(), 3);
    assert!(body.contains("Page 2 of 2"));

    // Stale deep links clamp instead of erroring.
    let clamped = common::get(&app, "/?page=99").await;
    let body = common::body_text(clamped).await;
    assert!(body.contains("Page 2 of 2"));
}

#[tokio::test]
async fn unknown_resources_render_404() {
    let feed = common::feed_service(None);
    feed.create_post("anna", draft("hello")).await.expect("post");
    let app = common::router(feed);

    for path in [
        "/nobody/",
        "/group/birds/",
        "/anna/999/",
        "/anna/not-a-number/",
        "/completely/unknown/route/",
    ] {
        let response = common::get(&app, path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path}");
    }
}

#[tokio::test]
async fn anonymous_writes_redirect_to_login_without_side_effects() {
    let feed = common::feed_service(None);
    feed.create_post("anna", draft("existing")).await.expect("post");
    let app = common::router(feed.clone());

    let response = common::post_form(&app, "/new/", None, "text=sneaky").await;
    assert_eq!(common::location_of(&response), "/auth/login/?next=/new/");

    let response = common::get(&app, "/anna/follow/").await;
    assert_eq!(
        common::location_of(&response),
        "/auth/login/?next=/anna/follow/"
    );

    assert_eq!(feed.global_timeline().await.unwrap().len(), 1);
    assert!(
        feed.relations()
            .followed_authors("anna")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn post_creation_flow_over_http() {
    let feed = common::feed_service(None);
    let app = common::router(feed.clone());

    let response = common::post_form(&app, "/new/", Some("anna"), "text=hello+world").await;
    assert_eq!(common::location_of(&response), "/");

    let profile = common::get(&app, "/anna/").await;
    assert_eq!(profile.status(), StatusCode::OK);
    let body = common::body_text(profile).await;
    assert!(body.contains("hello world"));

    // Whitespace-only text re-renders the form instead of redirecting.
    let invalid = common::post_form(&app, "/new/", Some("anna"), "text=+++").await;
    assert_eq!(invalid.status(), StatusCode::OK);
    let body = common::body_text(invalid).await;
    assert!(body.contains("form-error"));
    assert_eq!(feed.global_timeline().await.unwrap().len(), 1);
}

#[tokio::test]
async fn comment_flow_over_http() {
    let feed = common::feed_service(None);
    let post = feed.create_post("anna", draft("a post")).await.expect("post");
    let app = common::router(feed.clone());
    let comment_path = format!("/anna/{}/comment/", post.id);

    let anonymous = common::post_form(&app, &comment_path, None, "text=hi").await;
    assert!(common::location_of(&anonymous).starts_with("/auth/login/"));

    let created = common::post_form(&app, &comment_path, Some("boris"), "text=nice+one").await;
    assert_eq!(
        common::location_of(&created),
        format!("/anna/{}/", post.id)
    );

    let detail = common::get(&app, &format!("/anna/{}/", post.id)).await;
    let body = common::body_text(detail).await;
    assert!(body.contains("nice one"));

    // An empty comment is dropped but the redirect still happens.
    let empty = common::post_form(&app, &comment_path, Some("boris"), "text=++").await;
    assert_eq!(empty.status(), StatusCode::FOUND);
    let (_, comments) = feed.post_detail("anna", post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
}

#[tokio::test]
async fn follow_controls_on_profile() {
    let feed = common::feed_service(None);
    feed.create_post("anna", draft("post")).await.expect("post");
    let app = common::router(feed.clone());

    let before = common::body_text(common::get_as(&app, "/anna/", "boris").await).await;
    assert!(before.contains("/anna/follow/"));

    let follow = common::get_as(&app, "/anna/follow/", "boris").await;
    assert_eq!(common::location_of(&follow), "/anna/");

    let after = common::body_text(common::get_as(&app, "/anna/", "boris").await).await;
    assert!(after.contains("/anna/unfollow/"));

    // Self-view shows no follow controls.
    let own = common::body_text(common::get_as(&app, "/anna/", "anna").await).await;
    assert!(!own.contains("/anna/follow/"));

    let unfollow = common::get_as(&app, "/anna/unfollow/", "boris").await;
    assert_eq!(common::location_of(&unfollow), "/anna/");
    // Unfollowing again is swallowed into the same redirect.
    let again = common::get_as(&app, "/anna/unfollow/", "boris").await;
    assert_eq!(common::location_of(&again), "/anna/");
}

#[tokio::test]
async fn edit_is_redirected_for_non_authors() {
    let feed = common::feed_service(None);
    let post = feed.create_post("anna", draft("original")).await.expect("post");
    let app = common::router(feed.clone());
    let edit_path = format!("/anna/{}/edit/", post.id);

    let denied = common::post_form(&app, &edit_path, Some("boris"), "text=hijack").await;
    assert_eq!(common::location_of(&denied), format!("/anna/{}/", post.id));
    assert_eq!(
        feed.post_detail("anna", post.id).await.unwrap().0.text,
        "original"
    );

    let allowed = common::post_form(&app, &edit_path, Some("anna"), "text=updated").await;
    assert_eq!(common::location_of(&allowed), format!("/anna/{}/", post.id));
    assert_eq!(
        feed.post_detail("anna", post.id).await.unwrap().0.text,
        "updated"
    );
}

#[tokio::test]
async fn ops_group_creation_and_conflicts() {
    let feed = common::feed_service(None);
    let app = common::router(feed);

    let created = common::post_json(
        &app,
        "/_ops/groups/",
        r#"{"title": "Rust Writers", "description": "prose about code"}"#,
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = common::body_text(created).await;
    let group: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(group["slug"], "rust-writers");
    assert_eq!(group["title"], "Rust Writers");
    assert_eq!(group["description"], "prose about code");

    let duplicate = common::post_json(
        &app,
        "/_ops/groups/",
        r#"{"title": "Rust Writers"}"#,
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let invalid = common::post_json(&app, "/_ops/groups/", r#"{"title": "   "}"#).await;
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn ops_cache_clear_and_health() {
    let cache = common::timeline_cache(3600);
    let feed = common::feed_service(Some(cache.clone()));
    feed.create_post("anna", draft("warm me")).await.expect("post");
    let app = common::router(feed);

    let _ = common::get(&app, "/").await;
    assert!(!cache.is_empty());

    let cleared = common::post_form(&app, "/_ops/cache/clear/", None, "").await;
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);
    assert!(cache.is_empty());

    let health = common::get(&app, "/_health/db").await;
    assert_eq!(health.status(), StatusCode::OK);
}
