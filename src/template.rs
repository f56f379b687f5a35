//! Commit and tag message templates.
//!
//! Templates use `%NAME%` placeholders, e.g. `chore(release): v%NEW_VERSION%`.

use serde::Deserialize;

/// Message templates used by release mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub commit_message: String,
    pub tag_message: String,
    pub tag_body: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            commit_message: "chore(release): v%NEW_VERSION%".to_string(),
            tag_message: "v%NEW_VERSION%".to_string(),
            tag_body: "v%NEW_VERSION%".to_string(),
        }
    }
}

impl Templates {
    pub fn commit_message(&self, new_version: &str) -> String {
        format_template(&self.commit_message, &[("NEW_VERSION", new_version)])
    }

    pub fn tag_message(&self, new_version: &str) -> String {
        format_template(&self.tag_message, &[("NEW_VERSION", new_version)])
    }

    pub fn tag_body(&self, new_version: &str) -> String {
        format_template(&self.tag_body, &[("NEW_VERSION", new_version)])
    }
}

/// Replace every `%KEY%` placeholder with its value. Unknown placeholders stay.
pub fn format_template(template: &str, params: &[(&str, &str)]) -> String {
    params
        .iter()
        .fold(template.to_string(), |acc, (key, value)| {
            acc.replace(&format!("%{key}%"), value)
        })
}
