//! Turn raw fenced blocks into typed artifacts
//!
//! Kind inference is two stages, each a `Result<ArtifactKind, Unrecognized>`:
//! the language tag table, then an ordered chain of content predicates. The
//! first stage that recognizes the block wins; `ArtifactKind::Code` is the
//! explicit fallback.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::models::{Artifact, ArtifactKind, ArtifactMetadata, ChatError, ChatResult, Provenance};
use crate::utils::code_analysis::{extract_functions, extract_imports, is_complete};
use crate::utils::scanner::RawBlock;

const TITLE_SCAN_LINES: usize = 5;
const MAX_COMMENT_TITLE_CHARS: usize = 50;

/// A classification stage could not decide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unrecognized;

type ContentRule = (fn(&str) -> bool, ArtifactKind);

/// Content predicates, tried in order
const CONTENT_RULES: &[ContentRule] = &[
    (looks_like_html_document, ArtifactKind::Html),
    (looks_like_react_component, ArtifactKind::React),
    (looks_like_python, ArtifactKind::Python),
    (looks_like_javascript, ArtifactKind::Javascript),
    (looks_like_css, ArtifactKind::Css),
    (looks_like_json, ArtifactKind::Json),
];

static REACT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)(?:^\s*import\s+(?:React\b|.*\bfrom\s+['"]react['"])|require\(\s*['"]react['"]\s*\))"#,
    )
    .expect("valid react import regex")
});

static COMPONENT_DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:export\s+(?:default\s+)?)?(?:function\s+[A-Z]\w*\s*\(|(?:const|let)\s+[A-Z]\w*\s*=\s*(?:\([^)]*\)|\w+)\s*=>)",
    )
    .expect("valid component regex")
});

static PYTHON_SIGNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:(?:async\s+)?def\s+\w+\s*\(|class\s+\w+[^{\n]*:\s*$|from\s+[\w.]+\s+import\s|import\s+[\w.]+(?:\s+as\s+\w+)?(?:\s*,\s*[\w.]+(?:\s+as\s+\w+)?)*\s*$|if\s+__name__\s*==)",
    )
    .expect("valid python regex")
});

static JAVASCRIPT_SIGNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)(?:\bfunction\b\s*[\w$]*\s*\(|\b(?:const|let|var)\s+[\w$\[{]|=>|\bconsole\.\w+\(|\bdocument\.\w+|^\s*import\s+.*\bfrom\s+['"]|\bexport\s+(?:default|const|function)\b)"#,
    )
    .expect("valid javascript regex")
});

static CSS_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*[.#]?[A-Za-z*][^{};\n]*\{[^{}]*:[^{}]*\}").expect("valid css regex")
});

static SHELL_SIGNAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)(?:^#!\s*/(?:usr/)?bin/(?:env\s+)?(?:ba|z)?sh|^\s*(?:\$\s+)?(?:echo|cd|ls|grep|mkdir|rm|cp|mv|export|sudo|apt(?:-get)?|brew|npm|npx|pip|cargo|git|curl|chmod)\s)",
    )
    .expect("valid shell regex")
});

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:function|def|class)\s+([A-Za-z_$][\w$]*)").expect("valid declaration regex")
});

static ARROW_COMPONENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bconst\s+([A-Za-z_$][\w$]*)\s*=.*=>").expect("valid arrow regex")
});

/// Canonical language name for a fence tag
pub fn normalize_language(tag: &str) -> String {
    let tag = tag.trim().to_lowercase();
    let canonical = match tag.as_str() {
        "js" | "mjs" | "cjs" | "node" => "javascript",
        "ts" => "typescript",
        "py" | "py3" | "python3" => "python",
        "sh" | "shell" | "zsh" | "console" => "bash",
        "yml" => "yaml",
        "htm" | "xhtml" => "html",
        "md" => "markdown",
        "rs" => "rust",
        "golang" => "go",
        _ => return tag,
    };
    canonical.to_string()
}

/// First stage: the explicit language tag
pub fn kind_from_language(language: Option<&str>) -> Result<ArtifactKind, Unrecognized> {
    let language = language.ok_or(Unrecognized)?;
    match language {
        "html" => Ok(ArtifactKind::Html),
        "css" => Ok(ArtifactKind::Css),
        "javascript" => Ok(ArtifactKind::Javascript),
        "python" => Ok(ArtifactKind::Python),
        "jsx" | "tsx" => Ok(ArtifactKind::React),
        "markdown" => Ok(ArtifactKind::Markdown),
        "json" => Ok(ArtifactKind::Json),
        other if other.contains("react") => Ok(ArtifactKind::React),
        _ => Err(Unrecognized),
    }
}

/// Second stage: structural signals in the body
pub fn kind_from_content(content: &str) -> Result<ArtifactKind, Unrecognized> {
    CONTENT_RULES
        .iter()
        .find(|(matches, _)| matches(content))
        .map(|(_, kind)| *kind)
        .ok_or(Unrecognized)
}

pub fn infer_kind(language: Option<&str>, content: &str) -> ArtifactKind {
    kind_from_language(language)
        .or_else(|_| kind_from_content(content))
        .unwrap_or(ArtifactKind::Code)
}

pub fn looks_like_html_document(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.contains("<html") || lower.contains("<!doctype html")
}

pub fn looks_like_react_component(content: &str) -> bool {
    if REACT_IMPORT.is_match(content) {
        return true;
    }
    let has_jsx = content.contains("</") || content.contains("/>");
    has_jsx && COMPONENT_DEFINITION.is_match(content)
}

pub fn looks_like_python(content: &str) -> bool {
    PYTHON_SIGNAL.is_match(content)
}

pub fn looks_like_javascript(content: &str) -> bool {
    JAVASCRIPT_SIGNAL.is_match(content)
}

pub fn looks_like_css(content: &str) -> bool {
    CSS_RULE.is_match(content)
}

pub fn looks_like_json(content: &str) -> bool {
    let trimmed = content.trim();
    (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
}

pub fn looks_like_shell(content: &str) -> bool {
    SHELL_SIGNAL.is_match(content)
}

/// Language recorded for an untagged block
fn language_for_untagged(kind: ArtifactKind, content: &str) -> &'static str {
    match kind {
        ArtifactKind::Html => "html",
        ArtifactKind::Css => "css",
        ArtifactKind::Javascript => "javascript",
        ArtifactKind::Python => "python",
        ArtifactKind::React => "jsx",
        ArtifactKind::Markdown => "markdown",
        ArtifactKind::Json => "json",
        ArtifactKind::Code if looks_like_shell(content) => "bash",
        ArtifactKind::Code => "text",
    }
}

/// Best guess at the language of untagged code
pub fn detect_language(content: &str) -> &'static str {
    let kind = kind_from_content(content).unwrap_or(ArtifactKind::Code);
    language_for_untagged(kind, content)
}

fn comment_text(line: &str) -> Option<&str> {
    let is_comment = line.starts_with("//")
        || line.starts_with("/*")
        || line.starts_with("<!--")
        || line.starts_with("-- ")
        || (line.starts_with('#')
            && !line.starts_with("#!")
            && line[1..].chars().next().is_none_or(|c| c == '#' || c.is_whitespace()));
    if !is_comment {
        return None;
    }

    let text = line
        .trim_start_matches(|c: char| matches!(c, '#' | '/' | '*' | '<' | '!' | '-') || c.is_whitespace())
        .trim_end_matches(|c: char| matches!(c, '/' | '*' | '>' | '-') || c.is_whitespace());
    Some(text)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn generate_title(language: &str, content: &str) -> String {
    let lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_SCAN_LINES);

    for line in lines {
        if let Some(text) = comment_text(line)
            && !text.is_empty()
            && text.chars().count() < MAX_COMMENT_TITLE_CHARS
        {
            return text.to_string();
        }

        if let Some(caps) = DECLARATION.captures(line) {
            return format!("{} ({})", &caps[1], language);
        }

        if let Some(caps) = ARROW_COMPONENT.captures(line) {
            return format!("{} Component", &caps[1]);
        }
    }

    format!("{} Code", capitalize(language))
}

pub fn generate_description(kind: ArtifactKind, content: &str) -> String {
    let line_count = content.lines().filter(|line| !line.trim().is_empty()).count();

    match kind {
        ArtifactKind::Html => format!("HTML document with {line_count} lines"),
        ArtifactKind::React => format!("React component with {line_count} lines"),
        ArtifactKind::Python => format!("Python code with {line_count} lines"),
        ArtifactKind::Javascript => format!("JavaScript code with {line_count} lines"),
        ArtifactKind::Css => format!("CSS stylesheet with {line_count} lines"),
        ArtifactKind::Json => format!("JSON data with {line_count} lines"),
        ArtifactKind::Markdown => format!("Markdown document with {line_count} lines"),
        ArtifactKind::Code => format!("Code artifact with {line_count} lines"),
    }
}

pub fn is_runnable(kind: ArtifactKind, content: &str) -> bool {
    if kind.is_runnable() {
        return true;
    }
    let lower = content.to_lowercase();
    lower.contains("<html") && lower.contains("</html>")
}

/// Stateless classifier from scanned blocks to artifacts
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactClassifier;

impl ArtifactClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Build an artifact for `block`
    ///
    /// Malformed content degrades to `ArtifactKind::Code`; only an empty body
    /// is rejected.
    pub fn classify(
        &self,
        block: &RawBlock,
        session_id: &str,
        message_id: &str,
    ) -> ChatResult<Artifact> {
        let content = block.body.as_str();
        if content.trim().is_empty() {
            return Err(ChatError::Extraction("empty code block".to_string()));
        }

        let tagged = block.language_tag.as_deref().map(normalize_language);
        let kind = infer_kind(tagged.as_deref(), content);
        let language = tagged.unwrap_or_else(|| language_for_untagged(kind, content).to_string());

        let metadata = ArtifactMetadata {
            lines_of_code: content.lines().count(),
            character_count: content.chars().count(),
            provenance: Provenance::Extracted,
            imports: extract_imports(content, &language),
            functions: extract_functions(content, &language)
                .into_iter()
                .map(|f| f.name)
                .collect(),
            appears_complete: is_complete(content, &language),
        };

        Ok(Artifact {
            id: Uuid::new_v4().to_string(),
            title: generate_title(&language, content),
            description: generate_description(kind, content),
            kind,
            language,
            content: content.to_string(),
            session_id: session_id.to_string(),
            message_id: message_id.to_string(),
            created_at: Utc::now(),
            is_runnable: is_runnable(kind, content),
            metadata,
        })
    }
}
