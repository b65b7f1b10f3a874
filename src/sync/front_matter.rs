//! Front matter rendering and parsing for hosted article files.
//!
//! The hosted format is a flat `key: value` block between `---` delimiters,
//! followed by the raw article body:
//!
//! ```text
//! ---
//! title: Hello
//! date: 2026-08-24
//! excerpt: Plain-text summary
//! ---
//!
//! body...
//! ```
//!
//! Parsing is deliberately flat: no nested YAML, no quoting rules.

/// Maximum excerpt length in characters.
const EXCERPT_MAX: usize = 150;

/// A word boundary is preferred for truncation only past this position.
const EXCERPT_BOUNDARY_MIN: usize = 100;

/// Metadata recognized on import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArticle {
    pub title: Option<String>,
    pub slug: Option<String>,
    /// Draft only when the front matter literally says `draft`.
    pub draft: bool,
    pub content: String,
}

/// Serialize an article into the hosted file format.
pub fn render(title: &str, date: &str, content: &str) -> String {
    format!(
        "---\ntitle: {}\ndate: {}\nexcerpt: {}\n---\n\n{}",
        title,
        date,
        derive_excerpt(content),
        content
    )
}

/// Parse a hosted markdown file. A file without a front matter block is
/// treated as all body.
pub fn parse(raw: &str) -> ParsedArticle {
    let Some(rest) = raw.strip_prefix("---\n") else {
        return ParsedArticle {
            content: raw.to_string(),
            ..Default::default()
        };
    };

    let Some((header, body)) = rest.split_once("\n---\n") else {
        return ParsedArticle {
            content: raw.to_string(),
            ..Default::default()
        };
    };

    let mut parsed = ParsedArticle {
        // The renderer emits a blank line after the closing delimiter; strip
        // it so render/parse round-trips the body exactly.
        content: body.strip_prefix('\n').unwrap_or(body).to_string(),
        ..Default::default()
    };

    for line in header.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "title" => parsed.title = Some(value.to_string()),
            "slug" => parsed.slug = Some(value.to_string()),
            "status" => parsed.draft = value == "draft",
            _ => {}
        }
    }

    parsed
}

/// Derive a plain-text excerpt from a markdown body: strip markdown syntax,
/// collapse whitespace, truncate to at most 150 characters preferring a word
/// boundary once past position 100.
pub fn derive_excerpt(content: &str) -> String {
    let plain = strip_markdown(content);

    let chars: Vec<char> = plain.chars().collect();
    if chars.len() <= EXCERPT_MAX {
        return plain;
    }

    let head = &chars[..EXCERPT_MAX];
    let cut = head
        .iter()
        .rposition(|c| *c == ' ')
        .filter(|idx| *idx > EXCERPT_BOUNDARY_MIN)
        .unwrap_or(EXCERPT_MAX);

    let mut excerpt: String = head[..cut].iter().collect();
    excerpt.push_str("...");
    excerpt
}

/// Reduce markdown to plain text: drop headers, emphasis markers, link
/// targets, inline code ticks, blockquote and list markers; collapse all
/// whitespace runs to single spaces.
fn strip_markdown(content: &str) -> String {
    let mut out = String::with_capacity(content.len());

    for line in content.lines() {
        let trimmed = line.trim_start();

        // Line-leading markers
        let trimmed = trimmed.trim_start_matches('#').trim_start();
        let trimmed = trimmed.strip_prefix("> ").unwrap_or(trimmed);
        let trimmed = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .or_else(|| trimmed.strip_prefix("+ "))
            .unwrap_or(trimmed);

        let mut chars = trimmed.chars().peekable();
        let mut in_link_target = false;
        while let Some(c) = chars.next() {
            match c {
                '*' | '_' | '`' => {}
                '[' => {}
                ']' => {
                    // Swallow the "(url)" that follows a link label.
                    if chars.peek() == Some(&'(') {
                        in_link_target = true;
                        chars.next();
                    }
                }
                ')' if in_link_target => in_link_target = false,
                _ if in_link_target => {}
                _ => out.push(c),
            }
        }
        out.push(' ');
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case a slug, used when an imported file has no front matter:
/// `my-first-post` becomes `My First Post`.
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
