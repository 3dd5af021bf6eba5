use super::value_objects::TemplateStatus;
use crate::domain::errors::{PromptError, PromptResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Template aggregate root
///
/// A named, reusable prompt container. Content lives in its versions; the
/// template tracks metadata and which version is current.
///
/// # Invariants
/// - Name cannot be empty
/// - Name is unique across all templates (enforced by the store)
///
/// # Example
/// ```
/// use prompt_service::domain::template::Template;
///
/// let template = Template::new(
///     "greeting".to_string(),
///     "Says hello".to_string(),
///     vec!["demo".to_string()],
///     Default::default(),
/// ).expect("valid template");
///
/// assert_eq!(template.name(), "greeting");
/// assert!(template.current_version_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    id: Uuid,
    name: String,
    description: String,
    status: TemplateStatus,
    tags: Vec<String>,
    metadata: HashMap<String, String>,
    current_version_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Template {
    /// Creates a new active Template
    ///
    /// # Returns
    /// * `Err(PromptError::BadRequest)` - If the name is empty
    pub fn new(
        name: String,
        description: String,
        tags: Vec<String>,
        metadata: HashMap<String, String>,
    ) -> PromptResult<Self> {
        if name.trim().is_empty() {
            return Err(PromptError::bad_request("name is required"));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            status: TemplateStatus::Active,
            tags,
            metadata,
            current_version_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Sets the initial status before the template is persisted
    pub fn with_status(mut self, status: TemplateStatus) -> Self {
        self.status = status;
        self
    }

    /// Applies a partial update; absent fields are left untouched
    ///
    /// Always refreshes `updated_at`, even for an empty update.
    pub fn apply_update(&mut self, update: &TemplateUpdate) {
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(tags) = &update.tags {
            self.tags = tags.clone();
        }
        if let Some(metadata) = &update.metadata {
            self.metadata = metadata.clone();
        }
        self.touch();
    }

    /// Points the template at one of its versions
    pub fn set_current_version(&mut self, version_id: Uuid) {
        self.current_version_id = Some(version_id);
        self.touch();
    }

    /// True when the template carries every tag in `tags`
    pub fn has_all_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|tag| self.tags.contains(tag))
    }

    fn touch(&mut self) {
        // Keep updated_at monotonic even when the clock is coarse.
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at
        };
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> TemplateStatus {
        self.status
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn current_version_id(&self) -> Option<Uuid> {
        self.current_version_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Template from persistence layer data
    ///
    /// Bypasses validation; only repository implementations should call it.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        name: String,
        description: String,
        status: TemplateStatus,
        tags: Vec<String>,
        metadata: HashMap<String, String>,
        current_version_id: Option<Uuid>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            status,
            tags,
            metadata,
            current_version_id,
            created_at,
            updated_at,
        }
    }
}

/// Partial update of template-level metadata
///
/// `None` means "leave unchanged"; `Some` overwrites, including
/// `Some(String::new())` which clears the description.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateUpdate {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TemplateStatus>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Template {
        Template::new(
            "summary".to_string(),
            "Summarises text".to_string(),
            vec!["nlp".to_string(), "prod".to_string()],
            HashMap::from([("owner".to_string(), "ml".to_string())]),
        )
        .unwrap()
    }

    #[test]
    fn create_template_with_valid_name() {
        let template = sample();

        assert_eq!(template.name(), "summary");
        assert_eq!(template.description(), "Summarises text");
        assert_eq!(template.status(), TemplateStatus::Active);
        assert_eq!(template.metadata().get("owner").map(String::as_str), Some("ml"));
        assert_eq!(template.created_at(), template.updated_at());
    }

    #[test]
    fn create_template_with_empty_name_fails() {
        let result = Template::new(String::new(), String::new(), vec![], HashMap::new());

        assert_eq!(
            result.unwrap_err(),
            PromptError::bad_request("name is required")
        );
    }

    #[test]
    fn with_status_overrides_default() {
        let template = sample().with_status(TemplateStatus::Draft);
        assert_eq!(template.status(), TemplateStatus::Draft);
    }

    #[test]
    fn apply_update_only_touches_present_fields() {
        let mut template = sample();
        let before = template.updated_at();

        template.apply_update(&TemplateUpdate {
            status: Some(TemplateStatus::Archived),
            ..Default::default()
        });

        assert_eq!(template.status(), TemplateStatus::Archived);
        assert_eq!(template.description(), "Summarises text");
        assert_eq!(template.tags(), ["nlp".to_string(), "prod".to_string()]);
        assert!(template.updated_at() >= before);
    }

    #[test]
    fn apply_update_can_clear_description() {
        let mut template = sample();

        template.apply_update(&TemplateUpdate {
            description: Some(String::new()),
            tags: Some(vec![]),
            ..Default::default()
        });

        assert_eq!(template.description(), "");
        assert!(template.tags().is_empty());
    }

    #[test]
    fn tag_filter_requires_every_tag() {
        let template = sample();

        assert!(template.has_all_tags(&[]));
        assert!(template.has_all_tags(&["nlp".to_string()]));
        assert!(template.has_all_tags(&["prod".to_string(), "nlp".to_string()]));
        assert!(!template.has_all_tags(&["nlp".to_string(), "beta".to_string()]));
    }

    #[test]
    fn update_payload_distinguishes_absent_from_empty() {
        let update: TemplateUpdate =
            serde_json::from_str(r#"{"description":"","status":"draft"}"#).unwrap();

        assert_eq!(update.description, Some(String::new()));
        assert_eq!(update.status, Some(TemplateStatus::Draft));
        assert_eq!(update.tags, None);
        assert_eq!(update.metadata, None);
    }
}
