//! Publication metadata schema
//!
//! Clients speak the localized vocabulary on the left of [`FIELD_MAP`];
//! downstream processing expects the canonical names on the right.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::TrackingId;

/// Client field carrying the original file name
pub const FILENAME_FIELD: &str = "nazev_souboru";

/// Canonical key under which the tracking identifier is attached
pub const TRACKING_ID_FIELD: &str = "rest_id";

/// Canonical key of the library access list
pub const LIBRARIES_FIELD: &str = "libraries_that_can_access";

/// Value shape accepted for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// String or number, stored as trimmed text
    Text,
    /// Four-digit year given as string or integer
    Year,
    /// `http://` or `https://` address
    Url,
    /// Electronic format of the file
    Format,
    /// RIV category code
    RivCategory,
    /// Boolean, also `"true"`/`"false"`/`"ano"`/`"ne"`
    Flag,
    /// Array of texts (a lone text is a one-element list)
    TextList,
    /// Array of known library identifiers
    Libraries,
}

/// Mapping of one client field onto the canonical schema
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub client: &'static str,
    pub canonical: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(
    client: &'static str,
    canonical: &'static str,
    kind: FieldKind,
    required: bool,
) -> FieldSpec {
    FieldSpec {
        client,
        canonical,
        kind,
        required,
    }
}

/// Accepted electronic formats
pub const FORMATS: &[&str] = &["pdf", "epub", "mobi", "djvu", "html", "mp3", "jpg"];

/// Static client → canonical field table
pub const FIELD_MAP: &[FieldSpec] = &[
    field("title", "nazev", FieldKind::Text, true),
    field("podnazev", "podnazev", FieldKind::Text, false),
    field("poradi_vydani", "poradiVydani", FieldKind::Text, true),
    field("misto_vydani", "mistoVydani", FieldKind::Text, true),
    field("rok_vydani", "datumVydani", FieldKind::Year, true),
    field("zpracovatel_zaznamu", "zpracovatelZaznamu", FieldKind::Text, true),
    field("isbn", "ISBN", FieldKind::Text, false),
    field("isbn_souboru_publikaci", "ISBNSouboruPublikaci", FieldKind::Text, false),
    field("vazba", "vazba", FieldKind::Text, false),
    field("cena", "cena", FieldKind::Text, false),
    field("cast", "castDil", FieldKind::Text, false),
    field("nazev_casti", "nazevCasti", FieldKind::Text, false),
    field("nakladatel_vydavatel", "nakladatelVydavatel", FieldKind::Text, false),
    field("url", "url", FieldKind::Url, false),
    field("format", "format", FieldKind::Format, false),
    field("anotace", "anotace", FieldKind::Text, false),
    field("autori", "autori", FieldKind::TextList, false),
    field("category_for_riv", "category_for_riv", FieldKind::RivCategory, false),
    field("offer_to_riv", "offer_to_riv", FieldKind::Flag, false),
    field(LIBRARIES_FIELD, LIBRARIES_FIELD, FieldKind::Libraries, false),
];

/// Metadata after normalization into the canonical schema
///
/// Built once per request and immutable apart from attaching the tracking
/// identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalMetadata {
    filename: String,
    fields: BTreeMap<String, Value>,
}

impl CanonicalMetadata {
    pub(crate) fn new(filename: String, fields: BTreeMap<String, Value>) -> Self {
        Self { filename, fields }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn get(&self, canonical_key: &str) -> Option<&Value> {
        self.fields.get(canonical_key)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Library identifiers granted access
    pub fn libraries(&self) -> Vec<&str> {
        self.fields
            .get(LIBRARIES_FIELD)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn attach_tracking_id(&mut self, tracking_id: &TrackingId) {
        self.fields.insert(
            TRACKING_ID_FIELD.to_string(),
            Value::String(tracking_id.to_string()),
        );
    }

    /// Canonical payload as a JSON object (filename excluded)
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}
