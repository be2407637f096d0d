use crate::constants::*;
use crate::sanitizer::{sanitize, sanitize_value, value_to_text};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::btree_map::{self, BTreeMap};

/// Roster status of a remote contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactStatus {
    Active,
    Inactive,
    Other,
}

impl From<&str> for ContactStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            STATUS_ACTIVE => Self::Active,
            STATUS_INACTIVE => Self::Inactive,
            _ => Self::Other,
        }
    }
}

/// A customer record from the contact listing.
///
/// Scalar fields of any JSON type are read as text; arrays and objects count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Contact {
    #[serde(rename = "InscricaoFederal", default, deserialize_with = "scalar_text")]
    pub tax_id: Option<String>,
    #[serde(rename = "Tipo", default, deserialize_with = "scalar_text")]
    pub kind: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "scalar_text")]
    pub status: Option<String>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(value_to_text(&v)),
        _ => None,
    })
}

impl Contact {
    /// Only company-type contacts feed the CNPJ roster.
    pub fn is_company(&self) -> bool {
        self.kind.as_deref() == Some(COMPANY_CONTACT_TYPE)
    }

    pub fn status(&self) -> ContactStatus {
        self.status
            .as_deref()
            .map(ContactStatus::from)
            .unwrap_or(ContactStatus::Other)
    }

    /// Trimmed tax ID, or `None` when missing or blank.
    pub fn normalized_tax_id(&self) -> Option<&str> {
        self.tax_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Certificate metadata as returned by the listing endpoint.
///
/// The payload is kept as a raw JSON object because field names and value types vary
/// between tenants; accessors below apply the lookup and fallback rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateDescriptor(Map<String, Value>);

/// Sanitized folder labels for a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateLabels {
    pub company: String,
    pub owner: String,
    pub category: String,
}

impl CertificateDescriptor {
    fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| is_truthy(v))
    }

    /// Remote file identifier: first non-empty of `Filename`, `filename`, `FileName`.
    pub fn file_id(&self) -> Option<String> {
        FILE_ID_FIELDS
            .iter()
            .filter_map(|name| self.field(name))
            .map(|v| value_to_text(v).trim().to_string())
            .find(|id| !id.is_empty())
    }

    /// Company, owner and category labels, falling back to the CNPJ, `Outros` and
    /// `SemCategoria` respectively.
    pub fn labels(&self, cnpj: &str) -> CertificateLabels {
        let or_default = |name: &str, default: &str| match self.field(name) {
            Some(value) => sanitize_value(Some(value)),
            None => sanitize(default),
        };

        CertificateLabels {
            company: or_default(COMPANY_FIELD, cnpj),
            owner: or_default(OWNER_FIELD, DEFAULT_OWNER_LABEL),
            category: or_default(CATEGORY_FIELD, DEFAULT_CATEGORY_LABEL),
        }
    }

    pub fn emission_date(&self) -> Option<String> {
        self.field(EMISSION_DATE_FIELD).map(value_to_text)
    }

    pub fn expiration_date(&self) -> Option<String> {
        self.field(EXPIRATION_DATE_FIELD).map(value_to_text)
    }
}

/// Truthiness of a JSON value: null, empty strings, zero, `false` and empty
/// containers count as missing.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

const LEDGER_CNPJ_KEY: &str = "cnpj";
const LEDGER_COMPANY_KEY: &str = "empresa";
const LEDGER_OWNER_KEY: &str = "owner";
const LEDGER_CATEGORY_KEY: &str = "category";
const LEDGER_PATH_KEY: &str = "arquivo";
const LEDGER_DOWNLOADED_AT_KEY: &str = "data_download";

/// One downloaded file. JSON keys match the on-disk ledger format.
///
/// Any JSON value loads. Known keys holding text fill the typed fields; everything
/// else, including known keys with non-text values, lands in `extra` and is written
/// back unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerEntry {
    pub cnpj: Option<String>,
    pub company: Option<String>,
    pub owner: Option<String>,
    pub category: Option<String>,
    pub path: Option<String>,
    pub downloaded_at: Option<String>,
    pub extra: Map<String, Value>,
    /// Entry that was not a JSON object on disk.
    pub raw: Option<Value>,
}

impl LedgerEntry {
    fn known_fields(&self) -> [(&'static str, Option<&String>); 6] {
        [
            (LEDGER_CNPJ_KEY, self.cnpj.as_ref()),
            (LEDGER_COMPANY_KEY, self.company.as_ref()),
            (LEDGER_OWNER_KEY, self.owner.as_ref()),
            (LEDGER_CATEGORY_KEY, self.category.as_ref()),
            (LEDGER_PATH_KEY, self.path.as_ref()),
            (LEDGER_DOWNLOADED_AT_KEY, self.downloaded_at.as_ref()),
        ]
    }
}

fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        other => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

impl From<Value> for LedgerEntry {
    fn from(value: Value) -> Self {
        let mut extra = match value {
            Value::Object(map) => map,
            other => {
                return Self {
                    raw: Some(other),
                    ..Self::default()
                }
            }
        };

        Self {
            cnpj: take_text(&mut extra, LEDGER_CNPJ_KEY),
            company: take_text(&mut extra, LEDGER_COMPANY_KEY),
            owner: take_text(&mut extra, LEDGER_OWNER_KEY),
            category: take_text(&mut extra, LEDGER_CATEGORY_KEY),
            path: take_text(&mut extra, LEDGER_PATH_KEY),
            downloaded_at: take_text(&mut extra, LEDGER_DOWNLOADED_AT_KEY),
            extra,
            raw: None,
        }
    }
}

impl<'de> Deserialize<'de> for LedgerEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for LedgerEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if let Some(raw) = &self.raw {
            return raw.serialize(serializer);
        }

        let known = self.known_fields();
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in known {
            if let Some(value) = value {
                map.serialize_entry(key, value)?;
            }
        }
        for (key, value) in &self.extra {
            let shadowed = known
                .iter()
                .any(|(name, field)| *name == key.as_str() && field.is_some());
            if !shadowed {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Download ledger keyed by remote file identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.entries.contains_key(file_id)
    }

    pub fn get(&self, file_id: &str) -> Option<&LedgerEntry> {
        self.entries.get(file_id)
    }

    /// Adds an entry unless the file id is already recorded. Existing entries are
    /// never replaced. Returns `true` if the entry was added.
    pub fn record(&mut self, file_id: impl Into<String>, entry: LedgerEntry) -> bool {
        match self.entries.entry(file_id.into()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LedgerEntry)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, LedgerEntry)> for Ledger {
    fn from_iter<I: IntoIterator<Item = (String, LedgerEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(value: Value) -> CertificateDescriptor {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_contact_status_parsing() {
        assert_eq!(ContactStatus::from("Ativo"), ContactStatus::Active);
        assert_eq!(ContactStatus::from(" Inativo "), ContactStatus::Inactive);
        assert_eq!(ContactStatus::from("ativo"), ContactStatus::Other);
        assert_eq!(ContactStatus::from(""), ContactStatus::Other);
    }

    #[test]
    fn test_contact_deserializes_portuguese_keys() {
        let contact: Contact = serde_json::from_value(json!({
            "InscricaoFederal": " 11222333000181 ",
            "Tipo": "Empresa/Cliente",
            "Status": "Ativo",
            "Nome": "ignored"
        }))
        .unwrap();

        assert!(contact.is_company());
        assert_eq!(contact.status(), ContactStatus::Active);
        assert_eq!(contact.normalized_tax_id(), Some("11222333000181"));
    }

    #[test]
    fn test_contact_missing_fields() {
        let contact: Contact = serde_json::from_value(json!({"Tipo": "Fornecedor"})).unwrap();
        assert!(!contact.is_company());
        assert_eq!(contact.status(), ContactStatus::Other);
        assert_eq!(contact.normalized_tax_id(), None);

        let blank = Contact {
            tax_id: Some("   ".into()),
            ..Contact::default()
        };
        assert_eq!(blank.normalized_tax_id(), None);
    }

    #[test]
    fn test_file_id_uses_first_non_empty_variant() {
        let cert = descriptor(json!({"Filename": "", "filename": null, "FileName": " abc "}));
        assert_eq!(cert.file_id().as_deref(), Some("abc"));

        let cert = descriptor(json!({"Filename": "first", "FileName": "second"}));
        assert_eq!(cert.file_id().as_deref(), Some("first"));
    }

    #[test]
    fn test_file_id_numeric_is_stringified() {
        let cert = descriptor(json!({"Filename": 98765}));
        assert_eq!(cert.file_id().as_deref(), Some("98765"));
    }

    #[test]
    fn test_file_id_absent() {
        let cert = descriptor(json!({"CategoryDescription": "Federal"}));
        assert_eq!(cert.file_id(), None);
    }

    #[test]
    fn test_labels_fall_back_to_cnpj_and_defaults() {
        let cert = descriptor(json!({"Filename": "x", "ClientContactName": ""}));
        let labels = cert.labels("11222333000181");
        assert_eq!(labels.company, "11222333000181");
        assert_eq!(labels.owner, "Outros");
        assert_eq!(labels.category, "SemCategoria");
    }

    #[test]
    fn test_labels_are_sanitized() {
        let cert = descriptor(json!({
            "ClientContactName": "  Acme   Ltd / Filial ",
            "CategoryOwnerDescription": "Receita: Federal",
            "CategoryDescription": "CND?"
        }));
        let labels = cert.labels("11222333000181");
        assert_eq!(labels.company, "Acme Ltd _ Filial");
        assert_eq!(labels.owner, "Receita_ Federal");
        assert_eq!(labels.category, "CND_");
    }

    #[test]
    fn test_display_dates() {
        let cert = descriptor(json!({"Dateemission": "2024-05-02", "Dateexpiration": null}));
        assert_eq!(cert.emission_date().as_deref(), Some("2024-05-02"));
        assert_eq!(cert.expiration_date(), None);
    }

    #[test]
    fn test_ledger_record_never_replaces() {
        let mut ledger = Ledger::new();
        let first = LedgerEntry {
            cnpj: Some("1".into()),
            ..LedgerEntry::default()
        };
        let second = LedgerEntry {
            cnpj: Some("2".into()),
            ..LedgerEntry::default()
        };

        assert!(ledger.record("abc", first.clone()));
        assert!(!ledger.record("abc", second));
        assert_eq!(ledger.get("abc"), Some(&first));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_ledger_entry_uses_on_disk_keys() {
        let entry = LedgerEntry {
            cnpj: Some("11222333000181".into()),
            company: Some("Acme Ltd".into()),
            owner: Some("Outros".into()),
            category: Some("Federal".into()),
            path: Some("CNDs/Acme Ltd/Outros/Federal/f.pdf".into()),
            downloaded_at: Some("2024-05-10 08:00:00".into()),
            extra: Map::new(),
            raw: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["empresa"], "Acme Ltd");
        assert_eq!(value["arquivo"], "CNDs/Acme Ltd/Outros/Federal/f.pdf");
        assert_eq!(value["data_download"], "2024-05-10 08:00:00");
    }

    #[test]
    fn test_empty_ledger_entry_serializes_as_empty_object() {
        let value = serde_json::to_value(LedgerEntry::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_ledger_entry_keeps_non_text_values() {
        let raw = json!({"cnpj": 11222333000181u64, "empresa": "Acme Ltd", "tags": ["a"]});
        let entry: LedgerEntry = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(entry.cnpj, None);
        assert_eq!(entry.company.as_deref(), Some("Acme Ltd"));
        assert_eq!(entry.extra.get("cnpj"), Some(&json!(11222333000181u64)));
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }

    #[test]
    fn test_ledger_entry_that_is_not_an_object_is_kept() {
        for raw in [json!(true), json!("2024-05-10"), json!(null), json!([1, 2])] {
            let entry: LedgerEntry = serde_json::from_value(raw.clone()).unwrap();
            assert_eq!(entry.raw.as_ref(), Some(&raw));
            assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
        }
    }

    #[test]
    fn test_contact_scalar_fields_of_any_type() {
        let contact: Contact = serde_json::from_value(json!({
            "InscricaoFederal": 12345678901u64,
            "Tipo": ["Pessoa"],
            "Status": null
        }))
        .unwrap();

        assert_eq!(contact.normalized_tax_id(), Some("12345678901"));
        assert_eq!(contact.kind, None);
        assert_eq!(contact.status(), ContactStatus::Other);
    }

    #[test]
    fn test_ledger_entry_keeps_unknown_keys() {
        let raw = json!({"cnpj": "1", "checksum": "deadbeef"});
        let entry: LedgerEntry = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(entry.extra.get("checksum"), Some(&json!("deadbeef")));
        assert_eq!(serde_json::to_value(&entry).unwrap(), raw);
    }
}
