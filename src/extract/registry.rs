//! Recognized code-file extensions.

/// Fixed mapping from lowercase extension (with its leading dot) to a label.
///
/// Only key membership matters for filtering; labels are for listings.
pub struct ExtensionRegistry {
    entries: &'static [(&'static str, &'static str)],
}

static BUILTIN: &[(&str, &str)] = &[
    (".html", "HTML"),
    (".htm", "HTML"),
    (".css", "CSS"),
    (".js", "JavaScript"),
    (".jsx", "JavaScript (JSX)"),
    (".ts", "TypeScript"),
    (".tsx", "TypeScript (TSX)"),
    (".php", "PHP"),
    (".py", "Python"),
    (".java", "Java"),
    (".cpp", "C++"),
    (".c", "C"),
    (".cs", "C#"),
    (".rb", "Ruby"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".swift", "Swift"),
    (".kt", "Kotlin"),
    (".scala", "Scala"),
    (".pl", "Perl"),
    (".sh", "Shell"),
    (".bash", "Bash"),
    (".zsh", "Zsh"),
    (".sql", "SQL"),
    (".xml", "XML"),
    (".json", "JSON"),
    (".yaml", "YAML"),
    (".yml", "YAML"),
    (".md", "Markdown"),
    (".txt", "Text"),
    (".vue", "Vue"),
    (".svelte", "Svelte"),
    (".r", "R"),
    (".m", "Objective-C / MATLAB"),
    (".scss", "SCSS"),
    (".less", "Less"),
    (".styl", "Stylus"),
];

static REGISTRY: ExtensionRegistry = ExtensionRegistry { entries: BUILTIN };

impl ExtensionRegistry {
    /// The process-wide registry.
    pub fn builtin() -> &'static ExtensionRegistry {
        &REGISTRY
    }

    pub fn label(&self, extension: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == extension)
            .map(|(_, label)| *label)
    }

    pub fn contains(&self, extension: &str) -> bool {
        self.label(extension).is_some()
    }

    /// Label of the language `path` is recognized as, if any.
    pub fn classify(&self, path: &str) -> Option<&'static str> {
        extension_key(path).and_then(|ext| self.label(&ext))
    }
}

/// Lowercased substring from the last `.` of `path`, dot included.
///
/// The whole path is considered, so `a.d/Makefile` yields `.d/makefile`,
/// which no registry key matches.
fn extension_key(path: &str) -> Option<String> {
    let lower = path.to_lowercase();
    let dot = lower.rfind('.')?;
    Some(lower[dot..].to_string())
}

/// Whether `path` names a file with a recognized code extension.
pub fn is_code_file(path: &str) -> bool {
    extension_key(path).is_some_and(|ext| ExtensionRegistry::builtin().contains(&ext))
}
