//! SAIL source scanner.
//!
//! A single left-to-right pass over source text, tracking token boundaries
//! rather than parsing the grammar. It recognizes:
//!
//! - component invocations: `a!gridField(`, `rule!calc(`, bare
//!   `SYSTEM_SYSRULES_gridField(` or `#"SYSTEM_SYSRULES_gridField_v2"(`
//! - object references: `#"<id>"(` for any non-`SYSTEM_SYSRULES_` literal
//!
//! `/* ... */` comments are skipped, and string literal *content* is never
//! scanned, so a component name mentioned inside an uninvoked literal is
//! not a usage. This is a deliberate approximation, not a SAIL parser.

use std::collections::BTreeSet;

/// Prefix the platform gives its built-in component rules in exports.
const SYSRULES_PREFIX: &str = "SYSTEM_SYSRULES_";

/// Everything the scanner found in one object's source.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ScanResult {
    /// Canonical (lowercased, prefix/version-stripped) component names.
    pub components: BTreeSet<String>,
    /// Referenced object ids, verbatim.
    pub references: BTreeSet<String>,
}

/// Canonical form of a component name: `a!`/`rule!` domain and
/// `SYSTEM_SYSRULES_` prefix dropped, `_v<N>` version suffix dropped,
/// lowercased.
pub(crate) fn canonical_component(name: &str) -> String {
    let name = name.strip_prefix("a!").unwrap_or(name);
    let name = name.strip_prefix("rule!").unwrap_or(name);
    let name = name.strip_prefix(SYSRULES_PREFIX).unwrap_or(name);
    strip_version_suffix(name).to_lowercase()
}

fn strip_version_suffix(name: &str) -> &str {
    if let Some(pos) = name.rfind("_v") {
        let tail = &name[pos + 2..];
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return &name[..pos];
        }
    }
    name
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan one object's source text.
pub(crate) fn scan_source(text: &str) -> ScanResult {
    let bytes = text.as_bytes();
    let mut result = ScanResult::default();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            // Comment: skip to the terminator. An unterminated comment
            // swallows the rest of the source, matching the language.
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = find_subslice(bytes, i + 2, b"*/")
                    .map(|p| p + 2)
                    .unwrap_or(bytes.len());
            }
            // Quoted-identifier form: #"..."; invoked when '(' follows.
            b'#' if bytes.get(i + 1) == Some(&b'"') => {
                let (literal, end) = read_string_literal(bytes, i + 2);
                if bytes.get(end) == Some(&b'(') {
                    if literal.starts_with(SYSRULES_PREFIX) {
                        result.components.insert(canonical_component(&literal));
                    } else if !literal.is_empty() {
                        result.references.insert(literal);
                    }
                }
                i = end;
            }
            // Plain string literal: content is opaque to the scanner.
            b'"' => {
                let (_, end) = read_string_literal(bytes, i + 1);
                i = end;
            }
            b if is_ident_start(b) => {
                let start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                let ident = &text[start..i];

                // Domain-qualified call: a!name( / rule!name(
                if bytes.get(i) == Some(&b'!')
                    && bytes.get(i + 1).copied().is_some_and(is_ident_start)
                {
                    let name_start = i + 1;
                    let mut j = name_start;
                    while j < bytes.len() && is_ident_byte(bytes[j]) {
                        j += 1;
                    }
                    if bytes.get(j) == Some(&b'(') && matches!(ident, "a" | "rule") {
                        result
                            .components
                            .insert(canonical_component(&text[name_start..j]));
                    }
                    i = j;
                } else if bytes.get(i) == Some(&b'(') && ident.starts_with(SYSRULES_PREFIX) {
                    result.components.insert(canonical_component(ident));
                }
            }
            _ => i += 1,
        }
    }

    result
}

/// Read a string literal starting just after its opening quote.
///
/// Returns the content (with doubled quotes collapsed) and the index just
/// past the closing quote. Doubled quotes are the language's escape form.
fn read_string_literal(bytes: &[u8], start: usize) -> (String, usize) {
    let mut content = Vec::new();
    let mut i = start;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            if bytes.get(i + 1) == Some(&b'"') {
                content.push(b'"');
                i += 2;
            } else {
                return (String::from_utf8_lossy(&content).into_owned(), i + 1);
            }
        } else {
            content.push(bytes[i]);
            i += 1;
        }
    }
    // Unterminated literal: treat the remainder as content.
    (String::from_utf8_lossy(&content).into_owned(), bytes.len())
}

fn find_subslice(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}
