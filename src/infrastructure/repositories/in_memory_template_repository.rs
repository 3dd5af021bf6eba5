use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{PromptError, PromptResult};
use crate::domain::repositories::{Pagination, TemplateFilter, TemplateRepository};
use crate::domain::template::{Template, TemplateUpdate, Version};

#[derive(Debug, Default)]
struct Store {
    // Insertion order is kept for deterministic tie-breaking.
    templates: Vec<Template>,
    versions: Vec<Version>,
}

impl Store {
    fn template_mut(&mut self, id: Uuid) -> PromptResult<&mut Template> {
        self.templates
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| PromptError::not_found("template not found"))
    }

    fn ensure_name_free(&self, name: &str) -> PromptResult<()> {
        if self.templates.iter().any(|t| t.name() == name) {
            return Err(PromptError::conflict("template with this name already exists"));
        }
        Ok(())
    }

    fn ensure_label_free(&self, template_id: Uuid, label: &str) -> PromptResult<()> {
        if self
            .versions
            .iter()
            .any(|v| v.template_id() == template_id && v.label() == label)
        {
            return Err(PromptError::conflict(format!(
                "version {} already exists for this template",
                label
            )));
        }
        Ok(())
    }
}

/// In-memory implementation of TemplateRepository
///
/// Every write holds the store lock for its whole duration, which makes
/// each operation atomic. Used by tests and by local runs without a
/// database.
#[derive(Debug, Default)]
pub struct InMemoryTemplateRepository {
    store: RwLock<Store>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn create(&self, template: &Template) -> PromptResult<()> {
        let mut store = self.store.write().await;
        store.ensure_name_free(template.name())?;
        store.templates.push(template.clone());
        Ok(())
    }

    async fn create_with_version(
        &self,
        template: &Template,
        version: &Version,
    ) -> PromptResult<Template> {
        let mut store = self.store.write().await;
        store.ensure_name_free(template.name())?;
        if version.template_id() != template.id() {
            return Err(PromptError::internal("version belongs to another template"));
        }

        let mut template = template.clone();
        template.set_current_version(version.id());
        store.templates.push(template.clone());
        store.versions.push(version.clone());

        Ok(template)
    }

    async fn find_by_id(&self, id: Uuid) -> PromptResult<Option<Template>> {
        let store = self.store.read().await;
        Ok(store.templates.iter().find(|t| t.id() == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> PromptResult<Option<Template>> {
        let store = self.store.read().await;
        Ok(store.templates.iter().find(|t| t.name() == name).cloned())
    }

    async fn list(
        &self,
        filter: &TemplateFilter,
        pagination: Pagination,
    ) -> PromptResult<(Vec<Template>, u64)> {
        let store = self.store.read().await;

        let mut matching: Vec<&Template> = store
            .templates
            .iter()
            .rev()
            .filter(|t| filter.status.map_or(true, |s| t.status() == s))
            .filter(|t| t.has_all_tags(&filter.tags))
            .collect();
        matching.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        let total = matching.len() as u64;
        let offset = usize::try_from(pagination.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(pagination.page_size() as usize)
            .cloned()
            .collect();

        Ok((items, total))
    }

    async fn update(&self, id: Uuid, update: &TemplateUpdate) -> PromptResult<Template> {
        let mut store = self.store.write().await;
        let template = store.template_mut(id)?;
        template.apply_update(update);
        Ok(template.clone())
    }

    async fn delete(&self, id: Uuid) -> PromptResult<()> {
        let mut store = self.store.write().await;
        let before = store.templates.len();
        store.templates.retain(|t| t.id() != id);
        if store.templates.len() == before {
            return Err(PromptError::not_found("template not found"));
        }
        store.versions.retain(|v| v.template_id() != id);
        Ok(())
    }

    async fn create_version(&self, version: &Version) -> PromptResult<()> {
        let mut store = self.store.write().await;
        store.template_mut(version.template_id())?;
        store.ensure_label_free(version.template_id(), version.label())?;

        store.versions.push(version.clone());
        store
            .template_mut(version.template_id())?
            .set_current_version(version.id());
        Ok(())
    }

    async fn find_version(&self, template_id: Uuid, label: &str) -> PromptResult<Option<Version>> {
        let store = self.store.read().await;
        Ok(store
            .versions
            .iter()
            .find(|v| v.template_id() == template_id && v.label() == label)
            .cloned())
    }

    async fn find_version_by_id(&self, id: Uuid) -> PromptResult<Option<Version>> {
        let store = self.store.read().await;
        Ok(store.versions.iter().find(|v| v.id() == id).cloned())
    }

    async fn list_versions(&self, template_id: Uuid) -> PromptResult<Vec<Version>> {
        let store = self.store.read().await;
        if !store.templates.iter().any(|t| t.id() == template_id) {
            return Err(PromptError::not_found("template not found"));
        }

        let mut versions: Vec<Version> = store
            .versions
            .iter()
            .filter(|v| v.template_id() == template_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.created_at());
        Ok(versions)
    }

    async fn set_current_version(&self, template_id: Uuid, label: &str) -> PromptResult<Template> {
        let mut store = self.store.write().await;
        store.template_mut(template_id)?;

        let version_id = store
            .versions
            .iter()
            .find(|v| v.template_id() == template_id && v.label() == label)
            .map(Version::id)
            .ok_or_else(|| PromptError::not_found("version not found"))?;

        let template = store.template_mut(template_id)?;
        template.set_current_version(version_id);
        Ok(template.clone())
    }
}
