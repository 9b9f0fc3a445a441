//! Haul-document extraction.
//!
//! Every XML entry in an export is a "haul": a root element (`contentHaul`,
//! `processModelHaul`, ...) wrapping one design object. Tags may or may not
//! be namespaced depending on export version, so all matching is on local
//! names. The `definition` text is kept verbatim after XML unescaping —
//! no trimming, no re-serialization.

use crate::object::{ObjectKind, ObjectRecord};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Error parsing a single haul document. Non-fatal at archive level.
#[derive(Debug)]
pub(crate) struct HaulError(pub String);

impl From<quick_xml::Error> for HaulError {
    fn from(err: quick_xml::Error) -> Self {
        HaulError(format!("XML error: {}", err))
    }
}

impl std::fmt::Display for HaulError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object kinds by inner-element local tag.
///
/// Content hauls use `rule`/`interface`/... children; the other haul
/// families each have their own inner tag. Folder markers, documents and
/// other non-code content children are intentionally absent: entries whose
/// inner tag is unrecognized are not object-definition documents.
fn kind_for_tag(tag: &str) -> Option<ObjectKind> {
    match tag {
        "interface" => Some(ObjectKind::Interface),
        "rule" => Some(ObjectKind::ExpressionRule),
        "constant" => Some(ObjectKind::Constant),
        "decision" => Some(ObjectKind::Decision),
        "outboundIntegration" => Some(ObjectKind::Integration),
        "process_model_port" | "processModel" => Some(ObjectKind::ProcessModel),
        "recordType" => Some(ObjectKind::RecordType),
        "webApi" => Some(ObjectKind::WebApi),
        "connectedSystem" => Some(ObjectKind::ConnectedSystem),
        "site" => Some(ObjectKind::Site),
        "dataStore" => Some(ObjectKind::DataStore),
        _ => None,
    }
}

/// Fields captured from the inner object element.
#[derive(Default)]
struct Fields {
    name: Option<String>,
    uuid: Option<String>,
    description: Option<String>,
    definition: Option<String>,
}

/// Strip a namespace prefix from a local byte tag.
fn local(tag: &[u8]) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

/// Parse one haul XML document into an object record.
///
/// Returns `Ok(None)` for documents that are valid XML but not object
/// definitions (application manifests, folder markers, unknown hauls).
pub(crate) fn parse_haul_document(
    entry_name: &str,
    xml: &str,
) -> Result<Option<ObjectRecord>, HaulError> {
    let mut reader = Reader::from_str(xml);

    // Depth 0 = before root, 1 = root children (candidate inner elements),
    // 2+ = inside the inner element.
    let mut depth = 0usize;
    let mut kind: Option<ObjectKind> = None;
    let mut inner_depth = 0usize;
    let mut fields = Fields::default();
    let mut current_field: Option<String> = None;
    let mut field_text = String::new();

    loop {
        match reader.read_event().map_err(HaulError::from)? {
            Event::Start(e) => {
                depth += 1;
                let tag = local(e.local_name().as_ref());

                if depth == 2 && kind.is_none() {
                    if let Some(k) = kind_for_tag(&tag) {
                        kind = Some(k);
                        inner_depth = depth;
                        read_identity_attributes(&e, &mut fields)?;
                    }
                } else if kind.is_some() && depth == inner_depth + 1 {
                    match tag.as_str() {
                        "name" | "uuid" | "description" | "definition" => {
                            current_field = Some(tag);
                            field_text.clear();
                        }
                        _ => {}
                    }
                }
            }
            Event::Empty(e) => {
                let tag = local(e.local_name().as_ref());
                if depth == 1 && kind.is_none() {
                    if let Some(k) = kind_for_tag(&tag) {
                        // Self-closing inner element: identity lives in
                        // attributes (record types do this).
                        kind = Some(k);
                        inner_depth = depth + 1;
                        read_identity_attributes(&e, &mut fields)?;
                    }
                }
            }
            Event::Text(t) => {
                if current_field.is_some() {
                    let text = t
                        .unescape()
                        .map_err(|e| HaulError(format!("Text decode error: {}", e)))?;
                    field_text.push_str(&text);
                }
            }
            Event::CData(t) => {
                if current_field.is_some() {
                    field_text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(field) = current_field.take_if(|_| depth == inner_depth + 1) {
                    store_field(&mut fields, &field, std::mem::take(&mut field_text));
                }
                // Once the inner element closes, later siblings are ignored.
                if kind.is_some() && depth == inner_depth {
                    break;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let Some(kind) = kind else {
        return Ok(None);
    };

    let uuid = fields
        .uuid
        .filter(|u| !u.is_empty())
        .ok_or_else(|| HaulError(format!("Object in {} has no uuid", entry_name)))?;

    let name = fields
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| entry_stem(entry_name));

    Ok(Some(ObjectRecord {
        id: uuid,
        kind,
        name,
        description: fields.description.filter(|d| !d.is_empty()),
        source_text: fields.definition.filter(|d| !d.is_empty()),
        entry: Some(entry_name.to_string()),
    }))
}

/// Read `name`/`uuid` attributes off the inner element, namespace-blind.
fn read_identity_attributes(
    e: &quick_xml::events::BytesStart<'_>,
    fields: &mut Fields,
) -> Result<(), HaulError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| HaulError(format!("Attribute error: {}", e)))?;
        let key = local(attr.key.local_name().as_ref());
        let value = attr
            .unescape_value()
            .map_err(|e| HaulError(format!("Attribute decode error: {}", e)))?
            .into_owned();
        match key.as_str() {
            "name" if fields.name.is_none() => fields.name = Some(value),
            "uuid" if fields.uuid.is_none() => fields.uuid = Some(value),
            _ => {}
        }
    }
    Ok(())
}

fn store_field(fields: &mut Fields, field: &str, text: String) {
    match field {
        // definition stays verbatim; identity fields get trimmed
        "definition" => fields.definition = Some(text),
        "name" => fields.name = Some(text.trim().to_string()),
        "uuid" => fields.uuid = Some(text.trim().to_string()),
        "description" => fields.description = Some(text.trim().to_string()),
        _ => {}
    }
}

/// Filename stem of an archive entry, for name fallback.
fn entry_stem(entry_name: &str) -> String {
    let file = entry_name.rsplit('/').next().unwrap_or(entry_name);
    file.strip_suffix(".xml").unwrap_or(file).to_string()
}
