use regex::Regex;

use libretto_core::{LibrettoError, TemplateParams, Value};

const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z_][A-Za-z0-9_]*)\}";

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Placeholder names in order of appearance, duplicates included.
    pub fn placeholders(&self) -> Result<Vec<String>, LibrettoError> {
        let pattern = placeholder_pattern()?;
        Ok(pattern
            .captures_iter(&self.template)
            .map(|caps| caps[1].to_string())
            .collect())
    }

    /// Substitutes known placeholders; unknown ones are left verbatim.
    pub fn render(&self, vars: &TemplateParams) -> Result<String, LibrettoError> {
        let pattern = placeholder_pattern()?;
        let rendered = pattern.replace_all(&self.template, |caps: &regex::Captures| {
            match vars.get(&caps[1]) {
                Some(value) => render_value(value),
                None => caps[0].to_string(),
            }
        });
        Ok(rendered.into_owned())
    }
}

fn placeholder_pattern() -> Result<Regex, LibrettoError> {
    Regex::new(PLACEHOLDER_PATTERN).map_err(|err| LibrettoError::Template(err.to_string()))
}

fn render_value(value: &Value) -> String {
    value
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| value.to_string())
}
