//! Template placeholder data and path classification.

/// Values substituted for `{{TOKEN}}` markers in a freshly generated
/// template repository.
#[derive(Debug, Clone)]
pub struct TemplateData {
    pub site_name: String,
    pub description: String,
    pub author: String,
    pub github_username: String,
}

impl TemplateData {
    /// The fixed placeholder mapping. Substitution is literal global string
    /// replacement, no escaping.
    pub fn placeholders(&self) -> Vec<(&'static str, String)> {
        vec![
            ("{{SITE_NAME}}", self.site_name.clone()),
            ("{{SITE_DESCRIPTION}}", self.description.clone()),
            ("{{SITE_SLUG}}", slugify(&self.site_name)),
            ("{{AUTHOR}}", self.author.clone()),
            ("{{GITHUB_USERNAME}}", self.github_username.clone()),
        ]
    }

    /// Apply every placeholder to `content`. Returns `Some` only when at
    /// least one replacement changed the text, so callers skip no-op writes.
    pub fn apply(&self, content: &str) -> Option<String> {
        let mut result = content.to_string();
        for (token, value) in self.placeholders() {
            if result.contains(token) {
                result = result.replace(token, &value);
            }
        }
        if result == content {
            None
        } else {
            Some(result)
        }
    }
}

/// Lowercase, alphanumeric-and-hyphen slug of a site name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress leading hyphen
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Extensions considered text-like for placeholder substitution.
const TEXT_EXTENSIONS: &[&str] = &["html", "css", "js", "json", "md", "yml", "yaml", "txt"];

/// Whether a repository path should be scanned for placeholders.
pub fn is_text_path(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
