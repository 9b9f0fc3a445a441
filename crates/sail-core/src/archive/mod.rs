//! Export archive parsing.
//!
//! Walks the zip's entries and extracts an [`ObjectRecord`] from every
//! recognized haul document. Folder selection mirrors the export layout:
//! `content/` holds interfaces, rules, constants, decisions and
//! integrations; `processModel/`, `recordType/`, `webApi/`,
//! `connectedSystem/`, `site/` and `dataStore/` hold one object each.
//! `group/`, `application/`, `datatype/` and binary assets are skipped.

mod haul;

use crate::error::{Result, SailError};
use crate::object::ObjectRecord;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tracing::{debug, warn};

/// Export folders whose XML entries are object-definition documents.
const OBJECT_FOLDERS: &[&str] = &[
    "content",
    "processModel",
    "recordType",
    "webApi",
    "connectedSystem",
    "site",
    "dataStore",
];

/// Non-fatal problem with a single archive entry.
#[derive(Debug, Clone, Serialize)]
pub struct ParseWarning {
    /// Archive entry the problem occurred in.
    pub entry: String,
    pub message: String,
}

/// Result of parsing one export archive.
#[derive(Debug)]
pub struct ParseOutcome {
    pub objects: Vec<ObjectRecord>,
    pub warnings: Vec<ParseWarning>,
}

/// Parse an export archive into object records.
///
/// Fails with [`SailError::MalformedArchive`] only when the bytes cannot be
/// opened as a zip at all; individual bad entries become warnings. Parsing
/// the same bytes twice yields the same set of records.
pub fn parse_archive(bytes: &[u8]) -> Result<ParseOutcome> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| SailError::MalformedArchive {
            message: format!("Not a readable export archive: {}", e),
        })?;

    let mut by_id: HashMap<String, ObjectRecord> = HashMap::new();
    let mut warnings = Vec::new();

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                warnings.push(ParseWarning {
                    entry: format!("#{}", i),
                    message: format!("Unreadable zip entry: {}", e),
                });
                continue;
            }
        };

        let name = entry.name().to_string();
        if !is_object_entry(&name) {
            continue;
        }

        let mut xml = String::new();
        if let Err(e) = entry.read_to_string(&mut xml) {
            warnings.push(ParseWarning {
                entry: name,
                message: format!("Entry is not valid UTF-8 text: {}", e),
            });
            continue;
        }

        match haul::parse_haul_document(&name, &xml) {
            Ok(Some(record)) => {
                if let Some(previous) = by_id.insert(record.id.clone(), record) {
                    warnings.push(ParseWarning {
                        entry: name,
                        message: format!(
                            "Duplicate object uuid {} (replacing entry {:?})",
                            previous.id, previous.entry
                        ),
                    });
                }
            }
            Ok(None) => debug!("Skipping non-object document {}", name),
            Err(e) => {
                warn!("Skipping malformed entry {}: {}", name, e);
                warnings.push(ParseWarning {
                    entry: name,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(ParseOutcome {
        objects: by_id.into_values().collect(),
        warnings,
    })
}

/// An entry is a candidate object document when it is an XML file directly
/// under one of the object folders.
fn is_object_entry(entry_name: &str) -> bool {
    if !entry_name.ends_with(".xml") {
        return false;
    }
    let Some((folder, _)) = entry_name.split_once('/') else {
        return false;
    };
    OBJECT_FOLDERS.contains(&folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn interface_xml(uuid: &str, name: &str, definition: &str) -> String {
        format!(
            "<contentHaul><interface><uuid>{}</uuid><name>{}</name>\
             <definition>{}</definition></interface></contentHaul>",
            uuid, name, definition
        )
    }

    #[test]
    fn test_parse_mixed_archive() {
        let bytes = build_zip(&[
            (
                "content/Home.xml",
                &interface_xml("_a-1", "Home", "a!sectionLayout()"),
            ),
            (
                "content/calc.xml",
                "<contentHaul><rule><uuid>_a-2</uuid><name>calc</name>\
                 <definition>1 + 1</definition></rule></contentHaul>",
            ),
            ("application/app.xml", "<applicationHaul/>"),
            ("META-INF/manifest.xml", "<manifest/>"),
            ("content/logo.png", "not xml"),
        ]);

        let outcome = parse_archive(&bytes).unwrap();
        assert_eq!(outcome.objects.len(), 2);
        assert!(outcome.warnings.is_empty());

        let iface = outcome.objects.iter().find(|o| o.id == "_a-1").unwrap();
        assert_eq!(iface.kind, ObjectKind::Interface);
        assert_eq!(iface.source_text.as_deref(), Some("a!sectionLayout()"));
    }

    #[test]
    fn test_not_a_zip_is_malformed_archive() {
        let err = parse_archive(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, SailError::MalformedArchive { .. }));
    }

    #[test]
    fn test_bad_entry_is_warning_not_error() {
        let bytes = build_zip(&[
            (
                "content/good.xml",
                &interface_xml("_a-1", "Good", "a!textField()"),
            ),
            ("content/bad.xml", "<contentHaul><interface></broken>"),
        ]);

        let outcome = parse_archive(&bytes).unwrap();
        assert_eq!(outcome.objects.len(), 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].entry, "content/bad.xml");
    }

    #[test]
    fn test_duplicate_uuid_last_wins_with_warning() {
        let bytes = build_zip(&[
            ("content/a.xml", &interface_xml("_a-1", "First", "x()")),
            ("content/b.xml", &interface_xml("_a-1", "Second", "y()")),
        ]);

        let outcome = parse_archive(&bytes).unwrap();
        assert_eq!(outcome.objects.len(), 1);
        assert_eq!(outcome.objects[0].name, "Second");
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn test_determinism() {
        let bytes = build_zip(&[
            ("content/a.xml", &interface_xml("_a-1", "A", "x()")),
            ("recordType/r.xml", "<recordTypeHaul><recordType name=\"R\" uuid=\"_r-1\"/></recordTypeHaul>"),
        ]);

        let mut first: Vec<String> = parse_archive(&bytes)
            .unwrap()
            .objects
            .into_iter()
            .map(|o| o.id)
            .collect();
        let mut second: Vec<String> = parse_archive(&bytes)
            .unwrap()
            .objects
            .into_iter()
            .map(|o| o.id)
            .collect();
        first.sort();
        second.sort();
        assert_eq!(first, second);
    }
}
