//! Extension to MIME type lookup.

use std::collections::HashMap;

/// MIME type served when an extension is missing or unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const BUILT_IN: &[(&str, &str)] = &[
    ("", DEFAULT_MIME_TYPE),
    ("bin", DEFAULT_MIME_TYPE),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("gif", "image/gif"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("wasm", "application/wasm"),
    ("webp", "image/webp"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// A read-only extension table with a mandatory `""` fallback entry.
#[derive(Debug, Clone)]
pub struct MimeTypes {
    table: HashMap<String, String>,
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::with_overrides(&HashMap::new())
    }
}

impl MimeTypes {
    /// The built-in table with `overrides` merged on top.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut table: HashMap<String, String> = BUILT_IN
            .iter()
            .map(|(ext, mime)| (ext.to_string(), mime.to_string()))
            .collect();
        for (ext, mime) in overrides {
            table.insert(ext.trim_start_matches('.').to_ascii_lowercase(), mime.clone());
        }
        Self { table }
    }

    /// Look up the MIME type for `extension`, falling back to the `""` entry.
    pub fn lookup(&self, extension: &str) -> &str {
        let extension = extension.to_ascii_lowercase();
        self.table
            .get(&extension)
            .or_else(|| self.table.get(""))
            .map(String::as_str)
            .unwrap_or(DEFAULT_MIME_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        let mime = MimeTypes::default();
        assert_eq!(mime.lookup("html"), "text/html");
        assert_eq!(mime.lookup("TXT"), "text/plain");
    }

    #[test]
    fn test_unknown_and_missing_extensions_fall_back() {
        let mime = MimeTypes::default();
        assert_eq!(mime.lookup("nope"), DEFAULT_MIME_TYPE);
        assert_eq!(mime.lookup(""), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_overrides_replace_the_default_entry() {
        let overrides = HashMap::from([
            ("".to_string(), "text/plain".to_string()),
            (".MD".to_string(), "text/markdown".to_string()),
        ]);
        let mime = MimeTypes::with_overrides(&overrides);
        assert_eq!(mime.lookup("md"), "text/markdown");
        assert_eq!(mime.lookup("unknown"), "text/plain");
    }
}
