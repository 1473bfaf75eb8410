use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::records::schema::{self, FieldDef};

/// The three record types managed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Candidate,
    Client,
    /// A client requirement. Exposed over HTTP as `requirements`.
    Mandate,
}

/// Keys owned by the store on every record type. `client` is the embedded
/// client of a requirement response.
pub const AUDIT_KEYS: &[&str] = &["id", "kind", "createdAt", "updatedAt", "client"];

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Candidate, RecordKind::Client, RecordKind::Mandate];

    /// Value of the `kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Candidate => "candidate",
            RecordKind::Client => "client",
            RecordKind::Mandate => "mandate",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// URL segment under `/api/v1`.
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::Candidate => "candidates",
            RecordKind::Client => "clients",
            RecordKind::Mandate => "requirements",
        }
    }

    pub fn from_collection(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == segment)
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Candidate => "Candidate",
            RecordKind::Client => "Client",
            RecordKind::Mandate => "Requirement",
        }
    }

    pub fn fields(self) -> &'static [FieldDef] {
        match self {
            RecordKind::Candidate => schema::CANDIDATE_FIELDS,
            RecordKind::Client => schema::CLIENT_FIELDS,
            RecordKind::Mandate => schema::MANDATE_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldDef> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn sections(self) -> &'static [&'static str] {
        match self {
            RecordKind::Candidate => schema::CANDIDATE_SECTIONS,
            RecordKind::Client => schema::CLIENT_SECTIONS,
            RecordKind::Mandate => schema::MANDATE_SECTIONS,
        }
    }

    /// Fields the store refuses to create a record without.
    pub fn required_on_create(self) -> &'static [&'static str] {
        match self {
            RecordKind::Candidate => &["fullName", "email"],
            RecordKind::Client => &["name"],
            RecordKind::Mandate => &["title", "clientId"],
        }
    }

    /// Values filled in by the store when a create payload leaves them unset.
    pub fn create_defaults(self) -> &'static [(&'static str, &'static str)] {
        match self {
            RecordKind::Candidate => &[("status", "NEW")],
            RecordKind::Client => &[("status", "ACTIVE")],
            RecordKind::Mandate => &[],
        }
    }

    /// Fields written only by the service itself, never by a client payload.
    pub fn system_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Candidate => &["resumeUrl"],
            RecordKind::Client => &[],
            RecordKind::Mandate => &["recruiterId"],
        }
    }

    /// Fields matched by the free-text `search` filter.
    pub fn search_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Candidate => &["fullName", "email", "currentRole", "currentCompany"],
            RecordKind::Client => &["name", "industry", "contactPerson"],
            RecordKind::Mandate => &["title"],
        }
    }

    /// Whether `search` also matches the name of the related client.
    pub fn searches_client_name(self) -> bool {
        matches!(self, RecordKind::Mandate)
    }
}

/// A persisted record. Field values are kept in their canonical JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    pub kind: RecordKind,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Requirements only: the client named by `clientId`, resolved on read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub id: Uuid,
    pub name: String,
}

impl Record {
    /// Returns the field value, treating an explicit `null` as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

/// Query parameters of a list request.
///
/// Every parameter is optional. An absent parameter imposes no constraint,
/// while a present one (even an empty string) is always applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub source: Option<String>,
    pub client_id: Option<String>,
}

impl ListFilter {
    /// The exact-equality predicates, keyed by the record field they compare.
    pub fn equality_predicates(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("status", self.status.as_deref()),
            ("priority", self.priority.as_deref()),
            ("source", self.source.as_deref()),
            ("clientId", self.client_id.as_deref()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(RecordKind::from_collection(kind.collection()), Some(kind));
            assert_eq!(RecordKind::from_db_str(kind.as_str()), Some(kind));
        }
        assert_eq!(RecordKind::from_collection("mandates"), None);
    }

    #[test]
    fn test_record_serializes_fields_flat() {
        let mut fields = Map::new();
        fields.insert("fullName".into(), json!("Alice Johnson"));
        let record = Record {
            id: Uuid::nil(),
            kind: RecordKind::Candidate,
            fields,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            client: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["fullName"], json!("Alice Johnson"));
        assert_eq!(value["kind"], json!("candidate"));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("client").is_none());
    }

    #[test]
    fn test_requirement_embeds_client() {
        let client_id = Uuid::new_v4();
        let mut fields = Map::new();
        fields.insert("clientId".into(), json!(client_id));
        let record = Record {
            id: Uuid::nil(),
            kind: RecordKind::Mandate,
            fields,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            client: Some(ClientSummary {
                id: client_id,
                name: "TechCorp Inc.".into(),
            }),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["client"], json!({"id": client_id, "name": "TechCorp Inc."}));

        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
        assert!(!back.fields.contains_key("client"));
    }

    #[test]
    fn test_null_field_reads_as_absent() {
        let mut fields = Map::new();
        fields.insert("phone".into(), Value::Null);
        let record = Record {
            id: Uuid::nil(),
            kind: RecordKind::Candidate,
            fields,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            client: None,
        };
        assert!(record.get("phone").is_none());
    }

    #[test]
    fn test_filter_distinguishes_empty_from_absent() {
        let filter: ListFilter = serde_json::from_value(json!({"status": ""})).unwrap();
        assert_eq!(filter.status.as_deref(), Some(""));
        assert_eq!(filter.priority, None);
    }
}
