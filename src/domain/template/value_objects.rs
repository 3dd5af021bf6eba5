use serde::{Deserialize, Serialize};

/// Lifecycle status of a prompt template
///
/// # Status Lifecycle
/// ```text
/// Draft -> Active -> Archived
/// ```
/// Transitions are not guarded: an update may set any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "template_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    /// Template is being drafted
    Draft,
    /// Template is in use
    #[default]
    Active,
    /// Template is retired but kept for history
    Archived,
}

impl std::fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateStatus::Draft => write!(f, "draft"),
            TemplateStatus::Active => write!(f, "active"),
            TemplateStatus::Archived => write!(f, "archived"),
        }
    }
}

/// One declared substitution slot of a version's content
///
/// Pure data. `var_type` is a free-form tag (string, number, boolean, json)
/// and is not enforced during rendering.
///
/// # Example
/// ```
/// use prompt_service::domain::template::Variable;
///
/// let var = Variable::required("name").with_default("World");
/// assert!(var.required);
/// assert_eq!(var.default_value, "World");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_value: String,
    #[serde(default)]
    pub required: bool,
}

impl Variable {
    /// Declares an optional string variable
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: "string".to_string(),
            ..Default::default()
        }
    }

    /// Declares a required string variable
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            required: true,
            ..Self::optional(name)
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    /// True when a render call must supply this variable
    pub fn must_be_supplied(&self) -> bool {
        self.required && self.default_value.is_empty()
    }
}
