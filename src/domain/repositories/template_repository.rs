use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::PromptResult;
use crate::domain::template::{Template, TemplateStatus, TemplateUpdate, Version};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter for listing templates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateFilter {
    /// Exact status match when set
    pub status: Option<TemplateStatus>,
    /// Templates must carry all of these tags
    pub tags: Vec<String>,
}

/// One-based page request
///
/// Non-positive inputs fall back to page 1 and a page size of 10. Values
/// beyond `u32::MAX` are clamped, so a page past the end comes back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: clamp_or(page, DEFAULT_PAGE),
            page_size: clamp_or(page_size, DEFAULT_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

fn clamp_or(value: i64, default: u32) -> u32 {
    if value <= 0 {
        default
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

/// One page of results plus the total row count matching the filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// Repository trait for the Template aggregate and its versions
///
/// Implementations must enforce unique template names and unique
/// (template, version label) pairs, and make each write atomic.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert a template; `Conflict` if the name is taken
    async fn create(&self, template: &Template) -> PromptResult<()>;

    /// Insert a template and its first version in one atomic unit
    ///
    /// The version becomes the template's current version. On any failure
    /// neither row is written.
    async fn create_with_version(&self, template: &Template, version: &Version)
        -> PromptResult<Template>;

    /// Find a template by its ID
    async fn find_by_id(&self, id: Uuid) -> PromptResult<Option<Template>>;

    /// Find a template by its unique name
    async fn find_by_name(&self, name: &str) -> PromptResult<Option<Template>>;

    /// List templates newest first, with the total count of matching rows
    async fn list(
        &self,
        filter: &TemplateFilter,
        pagination: Pagination,
    ) -> PromptResult<(Vec<Template>, u64)>;

    /// Apply a partial update; `NotFound` if the template does not exist
    async fn update(&self, id: Uuid, update: &TemplateUpdate) -> PromptResult<Template>;

    /// Delete a template and its versions; `NotFound` if absent
    async fn delete(&self, id: Uuid) -> PromptResult<()>;

    /// Insert a version and promote it to current
    ///
    /// `NotFound` if the template is missing, `Conflict` on a duplicate label.
    async fn create_version(&self, version: &Version) -> PromptResult<()>;

    /// Find a version by template and label
    async fn find_version(&self, template_id: Uuid, label: &str) -> PromptResult<Option<Version>>;

    /// Find a version by its ID
    async fn find_version_by_id(&self, id: Uuid) -> PromptResult<Option<Version>>;

    /// All versions of a template, oldest first
    async fn list_versions(&self, template_id: Uuid) -> PromptResult<Vec<Version>>;

    /// Point the template at an existing version label
    async fn set_current_version(&self, template_id: Uuid, label: &str) -> PromptResult<Template>;
}
