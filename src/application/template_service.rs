use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::{PromptError, PromptResult};
use crate::domain::rendering::{self, RenderedPrompt};
use crate::domain::repositories::{Page, Pagination, TemplateFilter, TemplateRepository};
use crate::domain::template::version::latest;
use crate::domain::template::{Template, TemplateStatus, TemplateUpdate, Variable, Version};

/// Input for creating a template, optionally with its first version
#[derive(Debug, Clone, Default)]
pub struct CreateTemplateInput {
    pub name: String,
    pub description: String,
    pub status: Option<TemplateStatus>,
    pub tags: Vec<String>,
    pub metadata: HashMap<String, String>,
    /// Label of the inline first version
    pub version: String,
    /// Content of the inline first version
    pub content: String,
    pub variables: Vec<Variable>,
}

/// Input for adding a version to an existing template
#[derive(Debug, Clone, Default)]
pub struct CreateVersionInput {
    pub version: String,
    pub content: String,
    pub variables: Vec<Variable>,
}

/// A template together with its version history, oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDetails {
    pub template: Template,
    pub versions: Vec<Version>,
}

/// Aggregated listing result
pub type TemplatePage = Page<Template>;

/// Template service (usecase layer)
///
/// Validates input, orchestrates the store, and renders prompts. Holds no
/// mutable state; the repository is the only shared resource.
#[derive(Clone)]
pub struct TemplateService {
    repo: Arc<dyn TemplateRepository>,
}

impl TemplateService {
    pub fn new(repo: Arc<dyn TemplateRepository>) -> Self {
        Self { repo }
    }

    /// Creates a template, plus its first version when both a label and
    /// content are given. Template and version are written atomically.
    pub async fn create_template(&self, input: CreateTemplateInput) -> PromptResult<TemplateDetails> {
        let template = Template::new(input.name, input.description, input.tags, input.metadata)?
            .with_status(input.status.unwrap_or_default());

        if input.version.is_empty() || input.content.is_empty() {
            self.repo.create(&template).await?;
            tracing::info!(template_id = %template.id(), name = template.name(), "Template created");
            return Ok(TemplateDetails {
                template,
                versions: vec![],
            });
        }

        let version = Version::new(template.id(), input.version, input.content, input.variables)?;
        let template = self.repo.create_with_version(&template, &version).await?;
        tracing::info!(
            template_id = %template.id(),
            name = template.name(),
            version = version.label(),
            "Template created with initial version"
        );

        Ok(TemplateDetails {
            template,
            versions: vec![version],
        })
    }

    /// Looks a template up by id or name
    ///
    /// A reference that parses as a UUID is tried as an id first and falls
    /// back to a name lookup.
    pub async fn find_template(&self, reference: &str) -> PromptResult<Template> {
        if let Ok(id) = Uuid::parse_str(reference) {
            if let Some(template) = self.repo.find_by_id(id).await? {
                return Ok(template);
            }
        }

        self.repo
            .find_by_name(reference)
            .await?
            .ok_or_else(|| PromptError::not_found("template not found"))
    }

    /// Returns a template and its versions
    pub async fn get_template(&self, reference: &str) -> PromptResult<TemplateDetails> {
        let template = self.find_template(reference).await?;
        let versions = self.repo.list_versions(template.id()).await?;
        Ok(TemplateDetails { template, versions })
    }

    pub async fn list_templates(
        &self,
        filter: TemplateFilter,
        pagination: Pagination,
    ) -> PromptResult<TemplatePage> {
        let (items, total) = self.repo.list(&filter, pagination).await?;
        tracing::debug!(count = items.len(), total, "Listed templates");

        Ok(Page {
            items,
            total,
            page: pagination.page(),
            page_size: pagination.page_size(),
        })
    }

    /// Overwrites only the fields present in `update`
    pub async fn update_template(&self, id: Uuid, update: TemplateUpdate) -> PromptResult<Template> {
        let template = self.repo.update(id, &update).await?;
        tracing::info!(template_id = %id, "Template updated");
        Ok(template)
    }

    pub async fn delete_template(&self, id: Uuid) -> PromptResult<()> {
        self.repo.delete(id).await?;
        tracing::info!(template_id = %id, "Template deleted");
        Ok(())
    }

    /// Adds a version and promotes it to the template's current version
    pub async fn create_version(
        &self,
        template_id: Uuid,
        input: CreateVersionInput,
    ) -> PromptResult<Version> {
        let version = Version::new(template_id, input.version, input.content, input.variables)?;
        self.repo.create_version(&version).await?;
        tracing::info!(template_id = %template_id, version = version.label(), "Version created");
        Ok(version)
    }

    pub async fn get_version(&self, template_id: Uuid, label: &str) -> PromptResult<Version> {
        self.repo
            .find_version(template_id, label)
            .await?
            .ok_or_else(|| PromptError::not_found("version not found"))
    }

    pub async fn list_versions(&self, template_id: Uuid) -> PromptResult<Vec<Version>> {
        self.repo.list_versions(template_id).await
    }

    /// Pins the template to an existing version
    pub async fn set_current_version(&self, template_id: Uuid, label: &str) -> PromptResult<Template> {
        let template = self.repo.set_current_version(template_id, label).await?;
        tracing::info!(template_id = %template_id, version = label, "Current version changed");
        Ok(template)
    }

    /// Renders a template version with the supplied variables
    ///
    /// # Version selection
    /// - `version` given: that exact label, `NotFound` if absent
    /// - otherwise the current version, or the most recently created one
    ///   when no current version is recorded
    ///
    /// # Errors
    /// - `NotFound` for an unknown template, label, or a template without versions
    /// - `BadRequest` when a required variable without default is missing
    pub async fn render_prompt(
        &self,
        reference: &str,
        version: Option<&str>,
        supplied: &HashMap<String, String>,
    ) -> PromptResult<RenderedPrompt> {
        let template = self.find_template(reference).await?;

        let selected = match version.filter(|label| !label.is_empty()) {
            Some(label) => self.get_version(template.id(), label).await?,
            None => self.default_version(&template).await?,
        };

        let resolved = rendering::resolve_variables(selected.variables(), supplied)?;
        let content = rendering::render(selected.content(), &resolved);
        tracing::debug!(
            template_id = %template.id(),
            version = selected.label(),
            "Rendered prompt"
        );

        Ok(RenderedPrompt {
            content,
            version: selected.label().to_string(),
            variables: resolved,
        })
    }

    async fn default_version(&self, template: &Template) -> PromptResult<Version> {
        if let Some(current) = template.current_version_id() {
            if let Some(version) = self.repo.find_version_by_id(current).await? {
                return Ok(version);
            }
            tracing::warn!(
                template_id = %template.id(),
                version_id = %current,
                "Current version pointer is dangling, falling back to latest"
            );
        }

        let versions = self.repo.list_versions(template.id()).await?;
        latest(&versions)
            .cloned()
            .ok_or_else(|| PromptError::not_found("no versions available for template"))
    }
}
