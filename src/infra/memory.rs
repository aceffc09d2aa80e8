//! In-process repositories backing tests and `serve --in-memory`.
//!
//! State lives behind one `RwLock`; ids are handed out from per-table
//! counters the way the database sequences would.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreateGroupParams, CreatePostParams, FollowsRepo,
    GroupsRepo, PostsRepo, RepoError, UpdatePostParams, UsersRepo,
};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{CommentRecord, FollowRecord, GroupRecord, PostRecord, UserRecord};
use crate::domain::posts::sort_timeline;

const SOURCE: &str = "infra.memory";

#[derive(Debug, Default)]
struct State {
    users: Vec<UserRecord>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: Vec<FollowRecord>,
    next_user_id: i64,
    next_group_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
    next_follow_id: i64,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

#[derive(Clone, Default)]
pub struct InMemoryRepositories {
    state: Arc<RwLock<State>>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepo for InMemoryRepositories {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "users.find");
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn ensure(&self, username: &str) -> Result<UserRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "users.ensure");
        if let Some(user) = state.users.iter().find(|u| u.username == username) {
            return Ok(user.clone());
        }
        let user = UserRecord {
            id: State::next_id(&mut state.next_user_id),
            username: username.to_string(),
        };
        state.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl GroupsRepo for InMemoryRepositories {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "groups.find");
        Ok(state.groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "groups.list");
        let mut groups = state.groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }

    async fn create_group(&self, params: CreateGroupParams) -> Result<GroupRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "groups.create");
        if state.groups.iter().any(|g| g.slug == params.slug) {
            return Err(RepoError::duplicate("groups_slug_key"));
        }
        let group = GroupRecord {
            id: State::next_id(&mut state.next_group_id),
            title: params.title,
            slug: params.slug,
            description: params.description,
        };
        state.groups.push(group.clone());
        Ok(group)
    }
}

#[async_trait]
impl PostsRepo for InMemoryRepositories {
    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "posts.list");
        let mut posts = state.posts.clone();
        sort_timeline(&mut posts);
        Ok(posts)
    }

    async fn list_for_group(&self, group_id: i64) -> Result<Vec<PostRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "posts.list_group");
        let mut posts: Vec<_> = state
            .posts
            .iter()
            .filter(|p| p.group_id == Some(group_id))
            .cloned()
            .collect();
        sort_timeline(&mut posts);
        Ok(posts)
    }

    async fn list_for_author(&self, username: &str) -> Result<Vec<PostRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "posts.list_author");
        let mut posts: Vec<_> = state
            .posts
            .iter()
            .filter(|p| p.author_username == username)
            .cloned()
            .collect();
        sort_timeline(&mut posts);
        Ok(posts)
    }

    async fn list_for_followed(&self, username: &str) -> Result<Vec<PostRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "posts.list_followed");
        let followed: BTreeSet<&str> = state
            .follows
            .iter()
            .filter(|f| f.user == username)
            .map(|f| f.author.as_str())
            .collect();
        let mut posts: Vec<_> = state
            .posts
            .iter()
            .filter(|p| followed.contains(p.author_username.as_str()))
            .cloned()
            .collect();
        sort_timeline(&mut posts);
        Ok(posts)
    }

    async fn find_by_author_and_id(
        &self,
        username: &str,
        post_id: i64,
    ) -> Result<Option<PostRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "posts.find");
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == post_id && p.author_username == username)
            .cloned())
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "posts.create");
        let author = state
            .users
            .iter()
            .find(|u| u.username == params.author)
            .cloned()
            .ok_or(RepoError::NotFound)?;
        let group = params
            .group_id
            .map(|id| {
                state
                    .groups
                    .iter()
                    .find(|g| g.id == id)
                    .cloned()
                    .ok_or_else(|| RepoError::integrity("unknown group id"))
            })
            .transpose()?;
        let post = PostRecord {
            id: State::next_id(&mut state.next_post_id),
            text: params.text,
            pub_date: OffsetDateTime::now_utc(),
            author_id: author.id,
            author_username: author.username,
            group_id: group.as_ref().map(|g| g.id),
            group_slug: group.as_ref().map(|g| g.slug.clone()),
            group_title: group.as_ref().map(|g| g.title.clone()),
            image: params.image,
        };
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "posts.update");
        let group = params
            .group_id
            .map(|id| {
                state
                    .groups
                    .iter()
                    .find(|g| g.id == id)
                    .cloned()
                    .ok_or_else(|| RepoError::integrity("unknown group id"))
            })
            .transpose()?;
        let post = state
            .posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group_id = group.as_ref().map(|g| g.id);
        post.group_slug = group.as_ref().map(|g| g.slug.clone());
        post.group_title = group.as_ref().map(|g| g.title.clone());
        post.image = params.image;
        Ok(post.clone())
    }
}

#[async_trait]
impl CommentsRepo for InMemoryRepositories {
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "comments.list");
        let mut comments: Vec<_> = state
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn create_comment(&self, params: CreateCommentParams) -> Result<CommentRecord, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "comments.create");
        if !state.posts.iter().any(|p| p.id == params.post_id) {
            return Err(RepoError::integrity("unknown post id"));
        }
        let comment = CommentRecord {
            id: State::next_id(&mut state.next_comment_id),
            post_id: params.post_id,
            author_username: params.author,
            text: params.text,
            created: OffsetDateTime::now_utc(),
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowsRepo for InMemoryRepositories {
    async fn followed_authors(&self, username: &str) -> Result<BTreeSet<String>, RepoError> {
        let state = rw_read(&self.state, SOURCE, "follows.list");
        Ok(state
            .follows
            .iter()
            .filter(|f| f.user == username)
            .map(|f| f.author.clone())
            .collect())
    }

    async fn is_following(&self, user: &str, author: &str) -> Result<bool, RepoError> {
        let state = rw_read(&self.state, SOURCE, "follows.check");
        Ok(state
            .follows
            .iter()
            .any(|f| f.user == user && f.author == author))
    }

    async fn create_follow(&self, user: &str, author: &str) -> Result<bool, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "follows.create");
        if state
            .follows
            .iter()
            .any(|f| f.user == user && f.author == author)
        {
            return Ok(false);
        }
        let follow = FollowRecord {
            id: State::next_id(&mut state.next_follow_id),
            user: user.to_string(),
            author: author.to_string(),
        };
        state.follows.push(follow);
        Ok(true)
    }

    async fn delete_follow(&self, user: &str, author: &str) -> Result<bool, RepoError> {
        let mut state = rw_write(&self.state, SOURCE, "follows.delete");
        let before = state.follows.len();
        state
            .follows
            .retain(|f| !(f.user == user && f.author == author));
        Ok(state.follows.len() != before)
    }
}
