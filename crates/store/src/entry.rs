use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single entry row as persisted by the datastore.
///
/// `id` and `timestamp` are assigned by the store on insert; this service
/// never generates either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Insert projection carrying only the client-supplied fields.
#[derive(Debug, Clone, Serialize)]
pub struct NewEntry {
    pub title: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_round_trips_through_json() {
        let raw = r#"{"id":7,"title":"hello","description":null,"timestamp":"2026-08-30T12:00:00Z"}"#;
        let entry: Entry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.id, 7);
        assert_eq!(entry.title, "hello");
        assert!(entry.description.is_none());
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["id"], 7);
    }

    #[test]
    fn new_entry_serializes_description_as_null_when_absent() {
        let row = NewEntry { title: "t".into(), description: None };
        let v = serde_json::to_value(&row).unwrap();
        assert!(v["description"].is_null());
        assert_eq!(v["title"], "t");
    }
}
