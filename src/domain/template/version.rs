use super::value_objects::Variable;
use crate::domain::errors::{PromptError, PromptResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// One immutable content snapshot of a template
///
/// # Invariants
/// - Label and content cannot be empty
/// - Variable names are non-empty and unique within the schema
/// - (template_id, label) is unique (enforced by the store)
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    id: Uuid,
    template_id: Uuid,
    label: String,
    content: String,
    variables: Vec<Variable>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Version {
    /// Creates a new Version owned by `template_id`
    ///
    /// # Returns
    /// * `Err(PromptError::BadRequest)` - If any invariant is violated
    pub fn new(
        template_id: Uuid,
        label: String,
        content: String,
        variables: Vec<Variable>,
    ) -> PromptResult<Self> {
        if label.trim().is_empty() {
            return Err(PromptError::bad_request("version is required"));
        }
        if content.is_empty() {
            return Err(PromptError::bad_request("content is required"));
        }
        validate_schema(&variables)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            template_id,
            label,
            content,
            variables,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn template_id(&self) -> Uuid {
        self.template_id
    }

    /// Free-form version label such as "v1"
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Reconstructs a Version from persistence layer data
    #[allow(clippy::too_many_arguments)]
    pub fn from_persistence(
        id: Uuid,
        template_id: Uuid,
        label: String,
        content: String,
        variables: Vec<Variable>,
        is_active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            template_id,
            label,
            content,
            variables,
            is_active,
            created_at,
            updated_at,
        }
    }
}

fn validate_schema(variables: &[Variable]) -> PromptResult<()> {
    let mut seen = HashSet::with_capacity(variables.len());
    for var in variables {
        if var.name.is_empty() {
            return Err(PromptError::bad_request("variable name is required"));
        }
        if !seen.insert(var.name.as_str()) {
            return Err(PromptError::bad_request(format!(
                "duplicate variable: {}",
                var.name
            )));
        }
    }
    Ok(())
}

/// Picks the most recently created version
///
/// Ties on `created_at` resolve to the later entry in `versions`.
pub fn latest(versions: &[Version]) -> Option<&Version> {
    versions.iter().max_by_key(|v| v.created_at())
}
