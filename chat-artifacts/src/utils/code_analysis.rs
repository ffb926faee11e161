//! Lightweight structural inspection of code bodies
//!
//! These helpers feed artifact metadata. They are line and regex based and
//! never fail; an unsupported language just yields empty results.

use once_cell::sync::Lazy;
use regex::Regex;

static PY_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:async\s+)?def\s+(\w+)\s*\(").expect("valid python function regex")
});

static JS_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"function\s*\*?\s+([A-Za-z_$][\w$]*)\s*\(").expect("valid js function regex")
});

static JS_ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:const|let|var)\s+([A-Za-z_$][\w$]*)\s*=\s*(?:async\s*)?\([^)]*\)\s*=>")
        .expect("valid js arrow regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    ArrowFunction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub kind: FunctionKind,
}

fn is_js_family(language: &str) -> bool {
    matches!(language, "javascript" | "jsx" | "typescript" | "tsx")
}

pub fn extract_imports(code: &str, language: &str) -> Vec<String> {
    let lines = code.lines().map(str::trim);

    if language == "python" {
        lines
            .filter(|line| line.starts_with("import ") || line.starts_with("from "))
            .map(str::to_string)
            .collect()
    } else if is_js_family(language) {
        lines
            .filter(|line| {
                line.starts_with("import ")
                    || (line.starts_with("const ") && line.contains("require("))
            })
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    }
}

pub fn extract_functions(code: &str, language: &str) -> Vec<FunctionInfo> {
    let function = |name: &str| FunctionInfo {
        name: name.to_string(),
        kind: FunctionKind::Function,
    };

    if language == "python" {
        PY_FUNCTION
            .captures_iter(code)
            .map(|caps| function(&caps[1]))
            .collect()
    } else if is_js_family(language) {
        let declared = JS_FUNCTION.captures_iter(code).map(|caps| function(&caps[1]));
        let arrows = JS_ARROW.captures_iter(code).map(|caps| FunctionInfo {
            name: caps[1].to_string(),
            kind: FunctionKind::ArrowFunction,
        });
        declared.chain(arrows).collect()
    } else {
        Vec::new()
    }
}

/// Whether the body looks like a self-contained program rather than a fragment
pub fn is_complete(code: &str, language: &str) -> bool {
    let code = code.trim();

    match language {
        "html" => {
            let lower = code.to_lowercase();
            lower.contains("<html") && lower.contains("</html>")
        },
        "python" => code.contains("def ") || code.contains("class ") || code.lines().count() > 2,
        "javascript" | "jsx" => {
            code.contains("function ") || code.contains("=>") || code.contains("const ")
        },
        "css" => code.contains('{') && code.contains('}'),
        _ => code.chars().count() > 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_imports_and_functions() {
        let code = "import os\nfrom pathlib import Path\n\ndef walk(root):\n    pass\n\nasync def fetch():\n    pass";
        assert_eq!(
            extract_imports(code, "python"),
            vec!["import os", "from pathlib import Path"]
        );

        let names: Vec<_> = extract_functions(code, "python")
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["walk", "fetch"]);
    }

    #[test]
    fn test_js_functions() {
        let code = "const fs = require('fs');\nfunction load(path) {}\nconst save = (path, data) => {};";
        assert_eq!(extract_imports(code, "javascript"), vec!["const fs = require('fs');"]);

        let functions = extract_functions(code, "javascript");
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name, "load");
        assert_eq!(functions[1].kind, FunctionKind::ArrowFunction);
        assert_eq!(functions[1].name, "save");
    }

    #[test]
    fn test_unknown_language_yields_nothing() {
        assert!(extract_imports("import x", "cobol").is_empty());
        assert!(extract_functions("def f():", "cobol").is_empty());
    }

    #[test]
    fn test_is_complete() {
        assert!(is_complete("<html><body></body></html>", "html"));
        assert!(!is_complete("<div>hi</div>", "html"));
        assert!(is_complete(".a { color: red; }", "css"));
        assert!(!is_complete("x = 1", "python"));
        assert!(is_complete("echo hello world", "bash"));
    }
}
