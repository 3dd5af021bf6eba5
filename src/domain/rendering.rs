// Rendering engine for prompt templates
//
// Substitutes literal `{{name}}` placeholders. There is no escaping, no
// whitespace tolerance inside braces and no control flow. Placeholders whose
// name is not in the resolved map are left verbatim.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::errors::{PromptError, PromptResult};
use crate::domain::template::Variable;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Result of a render call, not persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPrompt {
    /// Final text after substitution
    pub content: String,
    /// Label of the version that was rendered
    pub version: String,
    /// Variables after defaulting, as used for substitution
    pub variables: HashMap<String, String>,
}

/// Replaces every `{{name}}` whose name is a key of `variables`
///
/// Single left-to-right pass. Substituted values are copied to the output
/// and never re-scanned.
///
/// # Example
/// ```
/// use prompt_service::domain::rendering::render;
/// use std::collections::HashMap;
///
/// let vars = HashMap::from([("a".to_string(), "x".to_string())]);
/// assert_eq!(render("{{a}} {{b}}", &vars), "x {{b}}");
/// ```
pub fn render(content: &str, variables: &HashMap<String, String>) -> String {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let candidate = &rest[start + OPEN.len()..];

        let substituted = candidate.find(CLOSE).and_then(|end| {
            variables
                .get(&candidate[..end])
                .map(|value| (value, end + CLOSE.len()))
        });

        match substituted {
            Some((value, consumed)) => {
                output.push_str(value);
                rest = &candidate[consumed..];
            }
            None => {
                // Emit a single brace so "{{{name}}}" still matches at the next offset.
                output.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    output.push_str(rest);
    output
}

/// Reconciles supplied values against a version's declared schema
///
/// Supplied values win over defaults. Declared variables that were not
/// supplied take their default value, which may be empty. Undeclared extras
/// pass through unchanged.
///
/// # Returns
/// * `Err(PromptError::BadRequest)` - A required variable without default is missing
pub fn resolve_variables(
    schema: &[Variable],
    supplied: &HashMap<String, String>,
) -> PromptResult<HashMap<String, String>> {
    let mut resolved = supplied.clone();

    for var in schema {
        if resolved.contains_key(&var.name) {
            continue;
        }
        if var.must_be_supplied() {
            return Err(PromptError::bad_request(format!(
                "missing required variable: {}",
                var.name
            )));
        }
        resolved.insert(var.name.clone(), var.default_value.clone());
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_single_placeholder() {
        assert_eq!(render("Hello {{name}}", &vars(&[("name", "Alice")])), "Hello Alice");
    }

    #[test]
    fn substitutes_every_occurrence() {
        assert_eq!(
            render("{{x}}-{{x}}-{{y}}", &vars(&[("x", "1"), ("y", "2")])),
            "1-1-2"
        );
    }

    #[test]
    fn unmatched_placeholders_are_left_verbatim() {
        let out = render("{{a}} {{b}}", &vars(&[("a", "x")]));
        assert_eq!(out, "x {{b}}");
    }

    #[test]
    fn rendering_is_idempotent_on_its_output() {
        let variables = vars(&[("a", "x")]);
        let once = render("{{a}} {{b}}", &variables);
        let twice = render(&once, &variables);
        assert_eq!(once, twice);
    }

    #[test]
    fn values_are_not_expanded_recursively() {
        let variables = vars(&[("a", "{{b}}"), ("b", "nested")]);
        assert_eq!(render("{{a}}|{{b}}", &variables), "{{b}}|nested");
    }

    #[test]
    fn whitespace_inside_braces_is_not_tolerated() {
        assert_eq!(render("Hi {{ name }}", &vars(&[("name", "Bob")])), "Hi {{ name }}");
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(render("{{Name}}", &vars(&[("name", "Bob")])), "{{Name}}");
    }

    #[test]
    fn extra_braces_around_placeholder_are_kept() {
        assert_eq!(render("{{{name}}}", &vars(&[("name", "Bob")])), "{Bob}");
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        assert_eq!(render("Hello {{name", &vars(&[("name", "Bob")])), "Hello {{name");
    }

    #[test]
    fn content_without_placeholders_is_unchanged() {
        assert_eq!(render("plain text", &HashMap::new()), "plain text");
        assert_eq!(render("", &HashMap::new()), "");
    }

    #[test]
    fn multibyte_text_survives() {
        assert_eq!(
            render("héllo {{who}} ✓", &vars(&[("who", "wörld")])),
            "héllo wörld ✓"
        );
    }

    #[test]
    fn resolve_fails_on_missing_required_variable() {
        let schema = vec![Variable::required("name")];
        let result = resolve_variables(&schema, &HashMap::new());

        assert_eq!(
            result.unwrap_err(),
            PromptError::bad_request("missing required variable: name")
        );
    }

    #[test]
    fn resolve_uses_default_for_missing_optional_variable() {
        let schema = vec![Variable::optional("name").with_default("World")];
        let resolved = resolve_variables(&schema, &HashMap::new()).unwrap();

        assert_eq!(resolved, vars(&[("name", "World")]));
    }

    #[test]
    fn resolve_uses_default_for_required_variable_with_default() {
        let schema = vec![Variable::required("tone").with_default("neutral")];
        let resolved = resolve_variables(&schema, &HashMap::new()).unwrap();

        assert_eq!(resolved.get("tone").map(String::as_str), Some("neutral"));
    }

    #[test]
    fn resolve_inserts_empty_default_for_optional_variable() {
        let schema = vec![Variable::optional("suffix")];
        let resolved = resolve_variables(&schema, &HashMap::new()).unwrap();

        assert_eq!(resolved, vars(&[("suffix", "")]));
    }

    #[test]
    fn supplied_values_override_defaults_and_extras_pass_through() {
        let schema = vec![Variable::optional("name").with_default("World")];
        let supplied = vars(&[("name", "Alice"), ("extra", "kept")]);

        let resolved = resolve_variables(&schema, &supplied).unwrap();

        assert_eq!(resolved, vars(&[("name", "Alice"), ("extra", "kept")]));
    }

    #[test]
    fn supplied_empty_value_satisfies_required_variable() {
        let schema = vec![Variable::required("name")];
        let resolved = resolve_variables(&schema, &vars(&[("name", "")])).unwrap();

        assert_eq!(resolved, vars(&[("name", "")]));
    }
}
