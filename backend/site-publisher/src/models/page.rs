/// Stored page model
///
/// Pages keep their section tree and element map as serialized JSON text.
/// Decoding is tolerant: malformed or wrong-shaped payloads become empty
/// structures so a single bad page never breaks listing or publishing.
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw row from the page store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PageRecord {
    pub page_id: String,
    pub page_name: String,
    pub position: i32,
    pub sections: Option<String>,
    pub elements: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_id: String,
    pub page_name: String,
    pub sections: Vec<Value>,
    pub elements: BTreeMap<String, Vec<Value>>,
}

impl From<PageRecord> for Page {
    fn from(record: PageRecord) -> Self {
        Page {
            sections: decode_sections(&record.page_id, record.sections.as_deref()),
            elements: decode_elements(&record.page_id, record.elements.as_deref()),
            page_id: record.page_id,
            page_name: record.page_name,
        }
    }
}

fn decode_sections(page_id: &str, raw: Option<&str>) -> Vec<Value> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Vec::new(),
        Some(raw) => raw,
    };

    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(page_id, "Discarding malformed sections payload: {}", e);
        Vec::new()
    })
}

fn decode_elements(page_id: &str, raw: Option<&str>) -> BTreeMap<String, Vec<Value>> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return BTreeMap::new(),
        Some(raw) => raw,
    };

    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::warn!(page_id, "Discarding malformed elements payload: {}", e);
        BTreeMap::new()
    })
}
