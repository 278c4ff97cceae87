//! Email templates stored as `.txt` files
//!
//! A template may carry a `Subject: ...` line; everything else is the body.
//! Both parts accept `{{ name }}` placeholders, along with the `{{{ name }}}`
//! and `{{& name }}` spellings. Files are read from disk on every use.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{Result, TemplateError};

/// File extension recognized as a template
pub const TEMPLATE_EXTENSION: &str = "txt";

/// Subject used when neither the template nor the caller provides one
pub const DEFAULT_SUBJECT: &str = "No Subject";

fn subject_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^Subject:[ \t]*(.*)$").expect("valid subject regex"))
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\{\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}\}|\{\{&?\s*([A-Za-z0-9_.\-]+)\s*\}\}",
        )
        .expect("valid placeholder regex")
    })
}

/// Directory of email templates
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sorted template names, or `None` if the directory does not exist
    pub async fn list(&self) -> Result<Option<Vec<String>>> {
        if !tokio::fs::try_exists(&self.dir).await.unwrap_or(false) {
            return Ok(None);
        }

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(Some(names))
    }

    /// Read a template by name; `None` when no such template exists
    pub async fn load(&self, name: &str) -> Result<Option<EmailTemplate>> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| TemplateError::Read {
                name: name.to_string(),
                source,
            })?;
        Ok(Some(EmailTemplate::parse(&raw)))
    }

    /// Names that could escape the directory resolve to nothing
    fn path_for(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }
        Some(self.dir.join(format!("{}.{}", name, TEMPLATE_EXTENSION)))
    }
}

/// A parsed template, before interpolation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    /// Text of the `Subject:` line, if the file had one
    pub subject: Option<String>,
    pub body: String,
}

impl EmailTemplate {
    /// Split out the first `Subject:` line. The line is removed and the rest
    /// trimmed; without one the body is the file content as-is.
    pub fn parse(raw: &str) -> Self {
        match subject_pattern().captures(raw) {
            Some(caps) => {
                let line = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                let subject = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                Self {
                    subject: Some(subject.to_string()),
                    body: raw.replacen(line, "", 1).trim().to_string(),
                }
            }
            None => Self {
                subject: None,
                body: raw.to_string(),
            },
        }
    }

    /// Interpolate subject and body. The template's subject wins over
    /// `fallback_subject`, which wins over [`DEFAULT_SUBJECT`].
    pub fn render(
        &self,
        variables: &Map<String, Value>,
        fallback_subject: Option<&str>,
    ) -> (String, String) {
        let subject = self
            .subject
            .as_deref()
            .or(fallback_subject.filter(|s| !s.is_empty()))
            .unwrap_or(DEFAULT_SUBJECT);

        (render(subject, variables), render(&self.body, variables))
    }
}

/// Replace `{{ name }}` placeholders from `variables`.
///
/// Dotted names walk nested objects. Missing and null values render empty;
/// non-string scalars render as their JSON text.
pub fn render(template: &str, variables: &Map<String, Value>) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            lookup(variables, name)
        })
        .into_owned()
}

fn lookup(variables: &Map<String, Value>, name: &str) -> String {
    let mut segments = name.split('.');
    let mut current = segments.next().and_then(|first| variables.get(first));
    for segment in segments {
        current = current.and_then(|value| value.get(segment));
    }

    match current {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_subject_line_extracted() {
        let template = EmailTemplate::parse("Subject: Hello {{name}}\nBody text {{name}}.");
        assert_eq!(template.subject.as_deref(), Some("Hello {{name}}"));

        let (subject, body) = template.render(&vars(json!({"name": "Sam"})), Some("Ignored"));
        assert_eq!(subject, "Hello Sam");
        assert_eq!(body, "Body text Sam.");
    }

    #[test]
    fn test_fallback_subject() {
        let template = EmailTemplate::parse("Just a body\n");
        assert_eq!(template.subject, None);
        assert_eq!(template.body, "Just a body\n");

        let (subject, _) = template.render(&Map::new(), Some("Fallback"));
        assert_eq!(subject, "Fallback");

        let (subject, _) = template.render(&Map::new(), None);
        assert_eq!(subject, DEFAULT_SUBJECT);

        let (subject, _) = template.render(&Map::new(), Some(""));
        assert_eq!(subject, DEFAULT_SUBJECT);
    }

    #[test]
    fn test_subject_line_not_first() {
        let template = EmailTemplate::parse("Hi {{name}},\r\nSubject: Later\r\nBye");
        assert_eq!(template.subject.as_deref(), Some("Later"));
        assert!(!template.body.contains("Subject:"));
        assert!(template.body.starts_with("Hi {{name}},"));
    }

    #[test]
    fn test_render_values() {
        let variables = vars(json!({
            "name": "Sam",
            "count": 3,
            "vip": true,
            "missing_value": null,
            "company": {"name": "Acme"}
        }));
        assert_eq!(
            render("{{ name }}/{{count}}/{{vip}}/{{missing_value}}/{{nope}}/{{company.name}}", &variables),
            "Sam/3/true///Acme"
        );
    }

    #[test]
    fn test_render_unescaped_forms() {
        let variables = vars(json!({"name": "Sam"}));
        assert_eq!(
            render("{{{name}}}|{{{ name }}}|{{& name}}|{{&name}}", &variables),
            "Sam|Sam|Sam|Sam"
        );
    }

    #[test]
    fn test_render_leaves_other_braces() {
        assert_eq!(render("{{#list}}{x}{{/list}}", &Map::new()), "{{#list}}{x}{{/list}}");
    }

    #[tokio::test]
    async fn test_store_list_and_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("welcome.txt"), "Subject: Hi\nWelcome").unwrap();
        std::fs::write(dir.path().join("followup.txt"), "Following up").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let store = TemplateStore::new(dir.path());
        let names = store.list().await.unwrap().unwrap();
        assert_eq!(names, vec!["followup".to_string(), "welcome".to_string()]);

        let template = store.load("welcome").await.unwrap().unwrap();
        assert_eq!(template.subject.as_deref(), Some("Hi"));
        assert_eq!(template.body, "Welcome");

        assert!(store.load("absent").await.unwrap().is_none());
        assert!(store.load("../welcome").await.unwrap().is_none());
    }

    #[test]
    fn test_store_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path().join("templates"));
        assert_eq!(store.dir(), dir.path().join("templates"));
        assert!(tokio_test::block_on(store.list()).unwrap().is_none());
        assert!(tokio_test::block_on(store.load("welcome")).unwrap().is_none());
    }
}
