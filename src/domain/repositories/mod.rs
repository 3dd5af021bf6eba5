// Repository interfaces (ports)
// Implemented by adapters in the infrastructure layer

pub mod template_repository;

pub use template_repository::{Page, Pagination, TemplateFilter, TemplateRepository};
