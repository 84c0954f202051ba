//! Plain-text `.gitignore` access and built-in templates

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

const GITIGNORE: &str = ".gitignore";

/// Contents of `.gitignore` at the root, empty when the file is absent
pub fn read_gitignore(root: &Path) -> Result<String> {
    let gitignore_path = root.join(GITIGNORE);
    if !gitignore_path.exists() {
        return Ok(String::new());
    }
    Ok(std::fs::read_to_string(gitignore_path)?)
}

/// Replace `.gitignore` with `text`
pub fn write_gitignore(root: &Path, text: &str) -> Result<()> {
    std::fs::write(root.join(GITIGNORE), text)?;
    tracing::debug!("Wrote {} bytes to {}", text.len(), GITIGNORE);
    Ok(())
}

/// Append patterns that are not already listed. Returns how many were added.
pub fn add_to_gitignore(root: &Path, patterns: &[String]) -> Result<usize> {
    let mut content = read_gitignore(root)?;

    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }

    let mut added = 0;
    for pattern in patterns {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }
        let already_exists = content.lines().any(|line| line.trim() == pattern);
        if !already_exists {
            content.push_str(pattern);
            content.push('\n');
            added += 1;
        }
    }

    write_gitignore(root, &content)?;
    Ok(added)
}

/// Named set of ignore patterns
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoreTemplate {
    pub name: String,
    pub patterns: Vec<String>,
}

impl IgnoreTemplate {
    fn new(name: &str, patterns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// File text for the template, one pattern per line
    pub fn content(&self) -> String {
        let mut text = self.patterns.join("\n");
        text.push('\n');
        text
    }
}

/// Built-in templates offered when creating an ignore file
pub fn templates() -> Vec<IgnoreTemplate> {
    vec![
        IgnoreTemplate::new(
            "Android / Kotlin",
            &[
                "# Android",
                ".gradle/",
                ".idea/",
                "build/",
                "app/build/",
                "local.properties",
                "*.iml",
                ".DS_Store",
                "captures/",
                ".externalNativeBuild/",
                ".cxx/",
            ],
        ),
        IgnoreTemplate::new(
            "Python / AI",
            &[
                "# Python",
                "__pycache__/",
                "*.py[cod]",
                "*$py.class",
                "",
                "# Virtual Env",
                "venv/",
                "env/",
                ".env",
                "",
                "# AI / ML",
                "*.ipynb_checkpoints",
                "*.pt",
                "*.pth",
                "*.h5",
                "models/",
                "data/",
            ],
        ),
        IgnoreTemplate::new(
            "Web / Node.js",
            &[
                "# Node",
                "node_modules/",
                "npm-debug.log",
                "yarn-error.log",
                "",
                "# Build",
                "dist/",
                "build/",
                ".env",
                ".DS_Store",
            ],
        ),
        IgnoreTemplate::new(
            "Flutter",
            &[
                "# Flutter",
                ".dart_tool/",
                ".idea/",
                ".pub/",
                "build/",
                ".packages",
                ".flutter-plugins",
                ".flutter-plugins-dependencies",
            ],
        ),
        IgnoreTemplate::new(
            "Java",
            &["# Java", "*.class", "*.log", "*.jar", "*.war", ".idea/", "*.iml"],
        ),
    ]
}
