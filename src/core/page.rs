/// A file opened from the tree, with its content as last loaded or saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: String,
    content: String,
    tags: Vec<String>,
    // Frontmatter lines other than `tags`, written back untouched.
    front: Vec<String>,
    saved: (String, Vec<String>),
}

impl Page {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            path: path.into(),
            saved: (content.clone(), Vec::new()),
            content,
            tags: Vec::new(),
            front: Vec::new(),
        }
    }

    /// Build a page from a file's raw text. A leading `---` block is read as
    /// frontmatter; its `tags: [a, b]` line becomes the page's tags.
    pub fn parse(path: impl Into<String>, raw: &str) -> Self {
        let Some((yaml, body)) = split_frontmatter(raw) else {
            return Self::new(path, raw);
        };

        let mut tags = Vec::new();
        let mut front = Vec::new();
        for line in yaml.lines() {
            match line.split_once(':') {
                Some((key, value)) if key.trim() == "tags" => {
                    tags = parse_inline_list(value.trim());
                }
                _ if line.trim().is_empty() => {}
                _ => front.push(line.to_string()),
            }
        }

        Self {
            path: path.into(),
            saved: (body.to_string(), tags.clone()),
            content: body.to_string(),
            tags,
            front,
        }
    }

    /// The text to write back to disk. Frontmatter is only emitted when
    /// there is something to put in it.
    pub fn to_file(&self) -> String {
        if self.tags.is_empty() && self.front.is_empty() {
            return self.content.clone();
        }
        let mut out = String::from("---\n");
        for line in &self.front {
            out.push_str(line);
            out.push('\n');
        }
        if !self.tags.is_empty() {
            out.push_str(&format!("tags: [{}]\n", self.tags.join(", ")));
        }
        out.push_str("---\n");
        out.push_str(&self.content);
        out
    }

    /// File name without its extension.
    pub fn title(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(&self.path);
        match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => name,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn edit(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Add `tag` unless it is blank or already present. Returns whether the
    /// tags changed.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    pub fn is_dirty(&self) -> bool {
        self.content != self.saved.0 || self.tags != self.saved.1
    }

    pub fn mark_saved(&mut self) {
        self.saved = (self.content.clone(), self.tags.clone());
    }
}

fn split_frontmatter(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---\n")?;
    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }
    let close = rest.find("\n---")?;
    let after = &rest[close + 4..];
    let body = after.strip_prefix('\n').unwrap_or(after);
    Some((&rest[..close], body))
}

fn parse_inline_list(value: &str) -> Vec<String> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    let mut tags: Vec<String> = Vec::new();
    for tag in inner.split(',') {
        let tag = tag.trim().trim_matches('"').trim_matches('\'').trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_drops_extension() {
        assert_eq!(Page::new("/Math/notes.md", "").title(), "notes");
        assert_eq!(Page::new("/README", "").title(), "README");
        assert_eq!(Page::new("/.env", "").title(), ".env");
    }

    #[test]
    fn dirty_until_saved() {
        let mut page = Page::new("/a.md", "x");
        assert!(!page.is_dirty());
        page.edit("y");
        assert!(page.is_dirty());
        page.mark_saved();
        assert!(!page.is_dirty());
    }

    #[test]
    fn tags_are_trimmed_and_unique() {
        let mut page = Page::new("/a.md", "x");
        assert!(page.add_tag("  calculus "));
        assert!(!page.add_tag("calculus"));
        assert!(!page.add_tag("   "));
        assert!(page.add_tag("exam"));
        assert_eq!(page.tags(), ["calculus", "exam"]);
        assert!(page.is_dirty());

        page.mark_saved();
        assert!(!page.remove_tag("nope"));
        assert!(!page.is_dirty());
        assert!(page.remove_tag("calculus"));
        assert!(page.is_dirty());
        assert_eq!(page.tags(), ["exam"]);
    }

    #[test]
    fn frontmatter_round_trip() {
        let raw = "---\ntitle: Limits\ntags: [math, \"exam\"]\n---\n# Limits\n";
        let mut page = Page::parse("/Math/limits.md", raw);
        assert_eq!(page.content(), "# Limits\n");
        assert_eq!(page.tags(), ["math", "exam"]);
        assert!(!page.is_dirty());

        page.remove_tag("exam");
        assert_eq!(
            page.to_file(),
            "---\ntitle: Limits\ntags: [math]\n---\n# Limits\n"
        );
    }

    #[test]
    fn plain_files_stay_plain() {
        let page = Page::parse("/a.md", "no frontmatter\n---\n");
        assert_eq!(page.content(), "no frontmatter\n---\n");
        assert!(page.tags().is_empty());
        assert_eq!(page.to_file(), "no frontmatter\n---\n");
    }
}
