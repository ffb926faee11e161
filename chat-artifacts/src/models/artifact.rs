use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Code,
    Html,
    Css,
    Javascript,
    Python,
    React,
    Markdown,
    Json,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Code => "code",
            ArtifactKind::Html => "html",
            ArtifactKind::Css => "css",
            ArtifactKind::Javascript => "javascript",
            ArtifactKind::Python => "python",
            ArtifactKind::React => "react",
            ArtifactKind::Markdown => "markdown",
            ArtifactKind::Json => "json",
        }
    }

    /// Kinds that can be previewed in a browser sandbox
    pub fn is_runnable(&self) -> bool {
        matches!(
            self,
            ArtifactKind::Html | ArtifactKind::Css | ArtifactKind::Javascript | ArtifactKind::React
        )
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Pulled out of a fenced block in an assistant reply
    Extracted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub lines_of_code: usize,
    pub character_count: usize,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<String>,
    pub appears_complete: bool,
}

/// A classified unit of code extracted from an assistant reply
///
/// Artifacts are immutable once stored. Messages refer to them by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub language: String,
    pub content: String,
    pub session_id: String,
    pub message_id: String,
    pub created_at: DateTime<Utc>,
    pub is_runnable: bool,
    pub metadata: ArtifactMetadata,
}

impl Artifact {
    pub fn file_extension(&self) -> &'static str {
        file_extension(&self.language)
    }

    /// File name derived from the title, safe for a `Content-Disposition` header
    pub fn file_name(&self) -> String {
        let stem: String = self
            .title
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_matches('_');
        let stem = if stem.is_empty() { "artifact" } else { stem };

        format!("{}.{}", stem, self.file_extension())
    }

    pub fn download(&self) -> ArtifactDownload {
        let extension = self.file_extension();
        ArtifactDownload {
            filename: self.file_name(),
            media_type: media_type(extension).to_string(),
            content: self.content.clone(),
        }
    }
}

/// An artifact packaged as a downloadable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDownload {
    pub filename: String,
    pub media_type: String,
    pub content: String,
}

pub fn file_extension(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "python" => "py",
        "javascript" => "js",
        "html" => "html",
        "css" => "css",
        "jsx" => "jsx",
        "typescript" => "ts",
        "json" => "json",
        "markdown" => "md",
        "bash" => "sh",
        "sql" => "sql",
        _ => "txt",
    }
}

pub fn media_type(extension: &str) -> &'static str {
    match extension {
        "py" => "text/x-python",
        "js" => "application/javascript",
        "html" => "text/html",
        "css" => "text/css",
        "jsx" => "text/jsx",
        "ts" => "application/typescript",
        "json" => "application/json",
        "md" => "text/markdown",
        "sh" => "text/x-shellscript",
        "sql" => "application/sql",
        _ => "text/plain",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(title: &str, language: &str) -> Artifact {
        Artifact {
            id: "a1".to_string(),
            title: title.to_string(),
            description: String::new(),
            kind: ArtifactKind::Code,
            language: language.to_string(),
            content: "x".to_string(),
            session_id: "s1".to_string(),
            message_id: "m1".to_string(),
            created_at: Utc::now(),
            is_runnable: false,
            metadata: ArtifactMetadata {
                lines_of_code: 1,
                character_count: 1,
                provenance: Provenance::Extracted,
                imports: Vec::new(),
                functions: Vec::new(),
                appears_complete: false,
            },
        }
    }

    #[test]
    fn test_extension_mapping() {
        assert_eq!(file_extension("python"), "py");
        assert_eq!(file_extension("bash"), "sh");
        assert_eq!(file_extension("typescript"), "ts");
        assert_eq!(file_extension("JSX"), "jsx");
        assert_eq!(file_extension("foobar123"), "txt");
    }

    #[test]
    fn test_download_uses_title_and_media_type() {
        let download = artifact("fetch_users (python)", "python").download();
        assert_eq!(download.filename, "fetch_users__python.py");
        assert_eq!(download.media_type, "text/x-python");
        assert_eq!(download.content, "x");
    }

    #[test]
    fn test_download_falls_back_to_plain_text() {
        let download = artifact("///", "brainfuck").download();
        assert_eq!(download.filename, "artifact.txt");
        assert_eq!(download.media_type, "text/plain");
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let json = serde_json::to_value(artifact("Text Code", "text")).unwrap();
        assert_eq!(json["type"], "code");
        assert_eq!(json["metadata"]["provenance"], "extracted");
    }
}
