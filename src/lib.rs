//! Prompt Service Library
//!
//! Manages named prompt templates, their ordered content versions and
//! declared variables, and renders `{{variable}}` placeholders with
//! defaulting and required-variable validation.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
