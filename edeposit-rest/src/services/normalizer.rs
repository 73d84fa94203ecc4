//! Metadata normalizer
//!
//! Validates client metadata against [`FIELD_MAP`] and reshapes it into
//! canonical form. Pure: no I/O, no clock, no randomness.
//!
//! Normalization either yields a complete [`CanonicalMetadata`] or a single
//! [`ValidationError`] listing every problem; there is no partial result.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{FieldProblem, ValidationError};
use crate::models::{CanonicalMetadata, FieldKind, FIELD_MAP, FILENAME_FIELD, FORMATS, LIBRARIES_FIELD};
use crate::reference::{is_known_library, is_riv_category, DEFAULT_LIBRARY};

const YEAR_RANGE: std::ops::RangeInclusive<u64> = 1000..=9999;

/// Parse the raw metadata document submitted by the client
///
/// Anything other than a JSON object is malformed input.
pub fn parse_raw_metadata(json_metadata: &str) -> Result<Map<String, Value>, ValidationError> {
    let value: Value = serde_json::from_str(json_metadata)
        .map_err(|e| ValidationError::malformed_input(format!("metadata nejsou platný JSON ({})", e)))?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::malformed_input(
            "metadata musí být JSON objekt",
        )),
    }
}

/// Normalize raw client metadata into the canonical schema
pub fn normalize(mut raw: Map<String, Value>) -> Result<CanonicalMetadata, ValidationError> {
    let filename = extract_filename(&mut raw)?;

    let mut missing = Vec::new();
    let mut invalid = Vec::new();
    let mut fields = BTreeMap::new();

    for entry in FIELD_MAP {
        let coerced = match raw.get(entry.client) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => coerce(entry.kind, value),
        };

        match coerced {
            Ok(Some(value)) => {
                fields.insert(entry.canonical.to_string(), value);
            }
            Ok(None) => {
                if entry.required {
                    missing.push(entry.client.to_string());
                }
            }
            Err(reason) => invalid.push(FieldProblem {
                field: entry.client.to_string(),
                reason,
            }),
        }
    }

    if !missing.is_empty() || !invalid.is_empty() {
        return Err(ValidationError::schema(missing, invalid));
    }

    ensure_default_library(&mut fields);

    Ok(CanonicalMetadata::new(filename, fields))
}

fn extract_filename(raw: &mut Map<String, Value>) -> Result<String, ValidationError> {
    let filename = match raw.remove(FILENAME_FIELD) {
        Some(Value::String(name)) => name.trim().to_string(),
        _ => String::new(),
    };

    if filename.is_empty() {
        return Err(ValidationError::missing_field(FILENAME_FIELD));
    }

    Ok(filename)
}

fn ensure_default_library(fields: &mut BTreeMap<String, Value>) {
    let libraries = fields
        .entry(LIBRARIES_FIELD.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));

    if let Value::Array(items) = libraries {
        if !items.iter().any(|v| v.as_str() == Some(DEFAULT_LIBRARY)) {
            items.push(Value::String(DEFAULT_LIBRARY.to_string()));
        }
    }
}

/// Coerce one value; `Ok(None)` means "present but empty"
fn coerce(kind: FieldKind, value: &Value) -> Result<Option<Value>, String> {
    match kind {
        FieldKind::Text => Ok(text(value)?.map(Value::String)),
        FieldKind::Year => year(value),
        FieldKind::Url => match text(value)? {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Some(Value::String(url)))
            }
            Some(_) => Err("očekávána adresa začínající http:// nebo https://".to_string()),
            None => Ok(None),
        },
        FieldKind::Format => match text(value)? {
            Some(format) => {
                let format = format.to_lowercase();
                if FORMATS.contains(&format.as_str()) {
                    Ok(Some(Value::String(format)))
                } else {
                    Err(format!("nepodporovaný formát, povolené: {}", FORMATS.join(", ")))
                }
            }
            None => Ok(None),
        },
        FieldKind::RivCategory => match text(value)? {
            Some(code) => {
                let code = code.to_uppercase();
                if is_riv_category(&code) {
                    Ok(Some(Value::String(code)))
                } else {
                    Err(format!("neznámá kategorie RIV: {}", code))
                }
            }
            None => Ok(None),
        },
        FieldKind::Flag => flag(value).map(|b| Some(Value::Bool(b))),
        FieldKind::TextList => {
            let items = text_list(value)?;
            if items.is_empty() {
                Ok(None)
            } else {
                Ok(Some(Value::Array(items.into_iter().map(Value::String).collect())))
            }
        }
        FieldKind::Libraries => {
            let items = text_list(value)?;
            let unknown: Vec<&str> = items
                .iter()
                .map(String::as_str)
                .filter(|id| !is_known_library(id))
                .collect();
            if !unknown.is_empty() {
                return Err(format!("neznámá knihovna: {}", unknown.join(", ")));
            }
            Ok(Some(Value::Array(items.into_iter().map(Value::String).collect())))
        }
    }
}

fn text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err("očekáván text".to_string()),
    }
}

fn year(value: &Value) -> Result<Option<Value>, String> {
    let reason = || "očekáván rok v rozsahu 1000–9999".to_string();

    let parsed = match value {
        Value::Number(n) => n.as_u64().ok_or_else(reason)?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if !trimmed.chars().all(|c| c.is_ascii_digit()) {
                return Err(reason());
            }
            trimmed.parse::<u64>().map_err(|_| reason())?
        }
        _ => return Err(reason()),
    };

    if !YEAR_RANGE.contains(&parsed) {
        return Err(reason());
    }

    Ok(Some(Value::String(parsed.to_string())))
}

fn flag(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "ano" => Ok(true),
            "false" | "ne" => Ok(false),
            _ => Err("očekávána hodnota true/false".to_string()),
        },
        _ => Err("očekávána hodnota true/false".to_string()),
    }
}

fn text_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                _ => Err("očekáván seznam neprázdných textů".to_string()),
            })
            .collect(),
        Value::String(_) | Value::Number(_) => Ok(text(value)?.into_iter().collect()),
        _ => Err("očekáván seznam textů".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationKind;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test input must be an object"),
        }
    }

    fn minimal() -> Value {
        json!({
            "nazev_souboru": "kniha.pdf",
            "title": "Název",
            "poradi_vydani": "3",
            "misto_vydani": "Praha",
            "rok_vydani": "1989",
            "zpracovatel_zaznamu": "/me",
        })
    }

    #[test]
    fn test_minimal_metadata_normalized() {
        let metadata = normalize(raw(minimal())).unwrap();

        assert_eq!(metadata.filename(), "kniha.pdf");
        assert_eq!(metadata.get("nazev"), Some(&json!("Název")));
        assert_eq!(metadata.get("poradiVydani"), Some(&json!("3")));
        assert_eq!(metadata.get("mistoVydani"), Some(&json!("Praha")));
        assert_eq!(metadata.get("datumVydani"), Some(&json!("1989")));
        assert_eq!(metadata.get("zpracovatelZaznamu"), Some(&json!("/me")));
    }

    #[test]
    fn test_canonical_keys_only() {
        let metadata = normalize(raw(minimal())).unwrap();

        for key in metadata.fields().keys() {
            assert!(
                FIELD_MAP.iter().any(|f| f.canonical == key),
                "unexpected key {}",
                key
            );
        }
        assert!(metadata.get("title").is_none());
        assert!(metadata.get(FILENAME_FIELD).is_none());
    }

    #[test]
    fn test_default_library_added_when_omitted() {
        let metadata = normalize(raw(minimal())).unwrap();
        assert_eq!(metadata.libraries(), vec![DEFAULT_LIBRARY]);
    }

    #[test]
    fn test_default_library_appended_to_client_list() {
        let mut input = minimal();
        input["libraries_that_can_access"] = json!(["MZK", "VKOL"]);

        let metadata = normalize(raw(input)).unwrap();
        assert_eq!(metadata.libraries(), vec!["MZK", "VKOL", DEFAULT_LIBRARY]);
    }

    #[test]
    fn test_default_library_not_duplicated() {
        let mut input = minimal();
        input["libraries_that_can_access"] = json!(["NKC", "MZK"]);

        let metadata = normalize(raw(input)).unwrap();
        assert_eq!(metadata.libraries(), vec!["NKC", "MZK"]);
    }

    #[test]
    fn test_unknown_library_rejected() {
        let mut input = minimal();
        input["libraries_that_can_access"] = json!(["MZK", "ATLANTIS"]);

        let err = normalize(raw(input)).unwrap_err();
        assert!(err.mentions(LIBRARIES_FIELD));
        assert!(err.message.contains("ATLANTIS"));
    }

    #[test]
    fn test_missing_filename() {
        let mut input = minimal();
        input.as_object_mut().unwrap().remove(FILENAME_FIELD);

        let err = normalize(raw(input)).unwrap_err();
        assert_eq!(err.kind, ValidationKind::MissingField);
        assert_eq!(err.message, "Parametr `nazev_souboru` je povinný!");
    }

    #[test]
    fn test_empty_filename_is_missing() {
        let mut input = minimal();
        input[FILENAME_FIELD] = json!("   ");

        let err = normalize(raw(input)).unwrap_err();
        assert_eq!(err.kind, ValidationKind::MissingField);
    }

    #[test]
    fn test_missing_filename_reported_before_schema() {
        let err = normalize(raw(json!({ "rok_vydani": "azgabash" }))).unwrap_err();
        assert_eq!(err.kind, ValidationKind::MissingField);
    }

    #[test]
    fn test_non_numeric_year_rejected() {
        let mut input = minimal();
        input["rok_vydani"] = json!("azgabash");

        let err = normalize(raw(input)).unwrap_err();
        assert_eq!(err.kind, ValidationKind::Schema);
        assert!(err.mentions("rok_vydani"));
        assert!(err.message.contains("rok_vydani"));
    }

    #[test]
    fn test_numeric_year_equals_string_year() {
        let mut numeric = minimal();
        numeric["rok_vydani"] = json!(1989);

        let from_string = normalize(raw(minimal())).unwrap();
        let from_number = normalize(raw(numeric)).unwrap();
        assert_eq!(from_string, from_number);
    }

    #[test]
    fn test_year_out_of_range() {
        for bad in [json!(999), json!("10000"), json!(-5), json!(1989.5)] {
            let mut input = minimal();
            input["rok_vydani"] = bad.clone();
            let err = normalize(raw(input)).unwrap_err();
            assert!(err.mentions("rok_vydani"), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_all_problems_enumerated() {
        let err = normalize(raw(json!({
            "nazev_souboru": "kniha.pdf",
            "poradi_vydani": "3",
            "rok_vydani": "azgabash",
            "url": "ftp://example.org",
        })))
        .unwrap_err();

        assert_eq!(err.kind, ValidationKind::Schema);
        for field in ["title", "misto_vydani", "zpracovatel_zaznamu", "rok_vydani", "url"] {
            assert!(err.mentions(field), "{} missing from {:?}", field, err.problems);
        }
        assert!(err.message.starts_with("Chybějící klíče: title, misto_vydani, zpracovatel_zaznamu"));
        assert!(err.message.contains("Neplatné hodnoty: rok_vydani"));
    }

    #[test]
    fn test_blank_required_text_counts_as_missing() {
        let mut input = minimal();
        input["title"] = json!("  ");

        let err = normalize(raw(input)).unwrap_err();
        assert!(err.message.contains("Chybějící klíče: title"));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut input = minimal();
        input["title"] = json!({"cs": "Název"});

        let err = normalize(raw(input)).unwrap_err();
        assert!(err.mentions("title"));
        assert!(err.message.contains("Neplatné hodnoty"));
    }

    #[test]
    fn test_unknown_fields_dropped() {
        let mut input = minimal();
        input["tajne_pole"] = json!("x");

        let metadata = normalize(raw(input)).unwrap();
        assert!(metadata.get("tajne_pole").is_none());
    }

    #[test]
    fn test_optional_fields_translated() {
        let mut input = minimal();
        input["isbn"] = json!("80-86056-31-7");
        input["format"] = json!("PDF");
        input["category_for_riv"] = json!("af");
        input["offer_to_riv"] = json!("ano");
        input["autori"] = json!("Karel Čapek");
        input["url"] = json!("https://example.org/kniha");
        input["cena"] = json!(150);

        let metadata = normalize(raw(input)).unwrap();
        assert_eq!(metadata.get("ISBN"), Some(&json!("80-86056-31-7")));
        assert_eq!(metadata.get("format"), Some(&json!("pdf")));
        assert_eq!(metadata.get("category_for_riv"), Some(&json!("AF")));
        assert_eq!(metadata.get("offer_to_riv"), Some(&json!(true)));
        assert_eq!(metadata.get("autori"), Some(&json!(["Karel Čapek"])));
        assert_eq!(metadata.get("url"), Some(&json!("https://example.org/kniha")));
        assert_eq!(metadata.get("cena"), Some(&json!("150")));
    }

    #[test]
    fn test_invalid_enumerations_rejected() {
        let mut input = minimal();
        input["format"] = json!("docx");
        input["category_for_riv"] = json!("ZZ");
        input["offer_to_riv"] = json!("maybe");

        let err = normalize(raw(input)).unwrap_err();
        assert!(err.mentions("format"));
        assert!(err.mentions("category_for_riv"));
        assert!(err.mentions("offer_to_riv"));
    }

    #[test]
    fn test_parse_raw_metadata() {
        assert!(parse_raw_metadata(r#"{"title": "x"}"#).is_ok());

        let err = parse_raw_metadata("{not json").unwrap_err();
        assert_eq!(err.kind, ValidationKind::MalformedInput);

        let err = parse_raw_metadata("[1, 2, 3]").unwrap_err();
        assert_eq!(err.kind, ValidationKind::MalformedInput);
    }
}
