// Template domain module
// Contains the template aggregate root, its versions, and value objects

#![allow(clippy::module_inception)]

pub mod template;
pub mod value_objects;
pub mod version;

// Re-export main types for convenience
pub use template::{Template, TemplateUpdate};
pub use value_objects::{TemplateStatus, Variable};
pub use version::Version;
