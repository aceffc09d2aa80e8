//! Feed composition and caching for a small social-publishing service.
//!
//! Posts flow from authors (optionally into a group) through the feed
//! assembler, which merges them into timelines ordered newest-first. The
//! global timeline is paginated and cached page-by-page with a short TTL;
//! every other timeline is assembled per request.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
