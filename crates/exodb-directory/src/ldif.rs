//! LDIF template rendering.
//!
//! Provisioning records are built from template files with `${NAME}`
//! placeholders, substituted from a field set and parsed back into typed
//! entries before submission. Only the subset of LDIF the templates use is
//! understood: `dn:` lines, `attr: value` lines, `#` comments, and
//! blank-line record separators. Base64 values, line continuations, and
//! URL references are deliberately not handled.

use std::collections::HashMap;
use std::path::Path;

use crate::client::Entry;
use crate::error::{DirectoryError, DirectoryResult};

/// An LDIF template with `${NAME}` placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
}

impl Template {
    /// Create a template from its text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Load a template from a file.
    pub fn from_file(path: impl AsRef<Path>) -> DirectoryResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| DirectoryError::InvalidTemplate {
            message: format!("cannot read template {}: {e}", path.display()),
        })?;
        Ok(Self::new(text))
    }

    /// Substitute every placeholder from the given bindings.
    ///
    /// Every `${NAME}` occurrence must have a binding; an unbound
    /// placeholder is an error so a template/field mismatch surfaces here
    /// rather than as a directory-level rejection.
    pub fn render(&self, bindings: &HashMap<&str, String>) -> DirectoryResult<String> {
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| DirectoryError::InvalidTemplate {
                    message: "unterminated '${' placeholder".to_string(),
                })?;
            let name = &after[..end];
            let value =
                bindings
                    .get(name)
                    .ok_or_else(|| DirectoryError::UnboundPlaceholder {
                        name: name.to_string(),
                    })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }

    /// Render and parse into directory entries, ready to add.
    pub fn render_entries(&self, bindings: &HashMap<&str, String>) -> DirectoryResult<Vec<Entry>> {
        parse_entries(&self.render(bindings)?)
    }
}

/// Parse rendered LDIF text into entries.
pub fn parse_entries(text: &str) -> DirectoryResult<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut current: Option<Entry> = None;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.starts_with('#') {
            continue;
        }
        if line.is_empty() {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            continue;
        }

        let (name, value) =
            line.split_once(": ")
                .ok_or_else(|| DirectoryError::InvalidTemplate {
                    message: format!("line {}: expected 'attr: value', got '{line}'", lineno + 1),
                })?;

        if name.eq_ignore_ascii_case("dn") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(Entry::new(value));
        } else {
            let entry = current
                .as_mut()
                .ok_or_else(|| DirectoryError::InvalidTemplate {
                    message: format!("line {}: attribute before any 'dn:' line", lineno + 1),
                })?;
            entry.push_attr(name, value);
        }
    }
    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    if entries.is_empty() {
        return Err(DirectoryError::InvalidTemplate {
            message: "template rendered no entries".to_string(),
        });
    }

    Ok(entries)
}

/// A single-attribute modify/replace change record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub dn: String,
    pub attribute: String,
    pub value: String,
}

impl ChangeRecord {
    /// Create a replace record for one attribute of one entry.
    pub fn replace(
        dn: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            dn: dn.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Render the record as LDIF change text.
    pub fn to_ldif(&self) -> String {
        format!(
            "dn: {}\nchangetype: modify\nreplace: {}\n{}: {}\n",
            self.dn, self.attribute, self.attribute, self.value
        )
    }
}
