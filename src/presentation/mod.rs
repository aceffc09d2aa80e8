//! View models and template rendering.

pub mod views;
