// Gist domain types.
// Decodes GitHub gist JSON into domain entities and defines the create payload.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A file inside a gist.
///
/// Files decoded from a listing carry a `raw_url`; files built locally for
/// upload carry `content` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub filename: Option<String>,
    pub raw_url: Option<String>,
    pub content: Option<String>,
}

impl File {
    /// A file to upload with a new gist.
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            raw_url: None,
            content: Some(content.into()),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            filename: string_field(object.get("filename")),
            raw_url: string_field(object.get("raw_url")),
            content: None,
        })
    }
}

/// A GitHub gist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    pub description: String,
    pub owner_login: Option<String>,
    pub owner_avatar_url: Option<String>,
    pub url: String,
    #[serde(default)]
    pub files: Vec<File>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Wire shape of a gist; only the three identifying fields are required.
#[derive(Debug, Deserialize)]
struct GistPayload {
    id: String,
    description: String,
    url: String,
    #[serde(default)]
    owner: Option<Value>,
    #[serde(default)]
    files: Option<Value>,
    #[serde(default)]
    created_at: Option<Value>,
    #[serde(default)]
    updated_at: Option<Value>,
}

impl Gist {
    /// Decode one gist object. Returns `None` if `id`, `description` or `url`
    /// is missing or not a string.
    pub fn from_json(value: &Value) -> Option<Self> {
        let payload = GistPayload::deserialize(value).ok()?;

        let owner = payload.owner.as_ref().and_then(Value::as_object);
        let files = payload
            .files
            .as_ref()
            .and_then(Value::as_object)
            .map(|files| files.values().filter_map(File::from_json).collect())
            .unwrap_or_default();

        Some(Self {
            id: payload.id,
            description: payload.description,
            owner_login: owner.and_then(|o| string_field(o.get("login"))),
            owner_avatar_url: owner.and_then(|o| string_field(o.get("avatar_url"))),
            url: payload.url,
            files,
            created_at: parse_timestamp(payload.created_at.as_ref()),
            updated_at: parse_timestamp(payload.updated_at.as_ref()),
        })
    }
}

/// Decode every gist in a list response, dropping items that fail to decode.
pub fn decode_gists(items: &[Value]) -> Vec<Gist> {
    let gists: Vec<Gist> = items.iter().filter_map(Gist::from_json).collect();
    if gists.len() < items.len() {
        debug!(
            dropped = items.len() - gists.len(),
            "skipped gists missing id, description or url"
        );
    }
    gists
}

fn string_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

fn parse_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let text = value?.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A gist collection that can be listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Public,
    Starred,
    Mine,
}

impl Collection {
    /// Name under which the collection's snapshot is stored.
    pub fn snapshot_name(&self) -> &'static str {
        match self {
            Collection::Public => "Public",
            Collection::Starred => "Starred",
            Collection::Mine => "Mine",
        }
    }
}

/// Content of one file in a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFileContent {
    pub content: String,
}

/// Body of a create-gist request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewGist {
    pub description: String,
    #[serde(rename = "isPublic")]
    pub is_public: String,
    pub files: BTreeMap<String, NewFileContent>,
}

impl NewGist {
    /// Build the payload. Files lacking a name or content are left out.
    pub fn new(description: &str, is_public: bool, files: &[File]) -> Self {
        let files = files
            .iter()
            .filter_map(|file| match (&file.filename, &file.content) {
                (Some(name), Some(content)) => Some((
                    name.clone(),
                    NewFileContent {
                        content: content.clone(),
                    },
                )),
                _ => None,
            })
            .collect();

        Self {
            description: description.to_string(),
            is_public: if is_public { "true" } else { "false" }.to_string(),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gist_json(id: &str) -> Value {
        json!({
            "id": id,
            "description": format!("gist {}", id),
            "url": format!("https://api.github.com/gists/{}", id),
            "owner": {"login": "octocat", "avatar_url": "https://avatars.example/octocat"},
            "files": {
                "hello.rs": {"filename": "hello.rs", "raw_url": "https://gist.example/raw/hello.rs"}
            },
            "created_at": "2017-03-27T10:00:00Z",
            "updated_at": "2017-03-28T11:30:00Z"
        })
    }

    #[test]
    fn test_decode_full_gist() {
        let gist = Gist::from_json(&gist_json("aa1")).unwrap();

        assert_eq!(gist.id, "aa1");
        assert_eq!(gist.description, "gist aa1");
        assert_eq!(gist.owner_login.as_deref(), Some("octocat"));
        assert_eq!(gist.owner_avatar_url.as_deref(), Some("https://avatars.example/octocat"));
        assert_eq!(gist.files.len(), 1);
        assert_eq!(gist.files[0].filename.as_deref(), Some("hello.rs"));
        assert_eq!(gist.files[0].raw_url.as_deref(), Some("https://gist.example/raw/hello.rs"));
        assert_eq!(gist.files[0].content, None);
        assert_eq!(
            gist.created_at.unwrap().to_rfc3339(),
            "2017-03-27T10:00:00+00:00"
        );
    }

    #[test]
    fn test_decode_minimal_gist() {
        let gist = Gist::from_json(&json!({
            "id": "x",
            "description": "",
            "url": "https://api.github.com/gists/x"
        }))
        .unwrap();

        assert_eq!(gist.owner_login, None);
        assert!(gist.files.is_empty());
        assert_eq!(gist.created_at, None);
    }

    #[test]
    fn test_bad_timestamps_are_null() {
        let mut value = gist_json("t");
        value["created_at"] = json!("yesterday");
        value["updated_at"] = json!(12345);

        let gist = Gist::from_json(&value).unwrap();
        assert_eq!(gist.created_at, None);
        assert_eq!(gist.updated_at, None);
    }

    #[test]
    fn test_missing_required_field_fails() {
        for field in ["id", "description", "url"] {
            let mut value = gist_json("m");
            value.as_object_mut().unwrap().remove(field);
            assert!(Gist::from_json(&value).is_none(), "{} should be required", field);
        }

        let mut value = gist_json("n");
        value["description"] = Value::Null;
        assert!(Gist::from_json(&value).is_none());
    }

    #[test]
    fn test_decode_preserves_order() {
        let items = vec![gist_json("1"), gist_json("2"), gist_json("3")];
        let ids: Vec<String> = decode_gists(&items).into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_decode_drops_invalid_items() {
        let mut broken = gist_json("2");
        broken.as_object_mut().unwrap().remove("url");
        let items = vec![gist_json("1"), broken, json!("not an object"), gist_json("4")];

        let ids: Vec<String> = decode_gists(&items).into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_new_gist_payload() {
        let files = vec![
            File::new("main.rs", "fn main() {}"),
            File {
                filename: Some("remote.txt".into()),
                raw_url: Some("https://gist.example/raw".into()),
                content: None,
            },
        ];
        let payload = serde_json::to_value(NewGist::new("demo", false, &files)).unwrap();

        assert_eq!(
            payload,
            json!({
                "description": "demo",
                "isPublic": "false",
                "files": {"main.rs": {"content": "fn main() {}"}}
            })
        );
        assert_eq!(NewGist::new("demo", true, &[]).is_public, "true");
    }

    #[test]
    fn test_snapshot_names() {
        assert_eq!(Collection::Public.snapshot_name(), "Public");
        assert_eq!(Collection::Starred.snapshot_name(), "Starred");
        assert_eq!(Collection::Mine.snapshot_name(), "Mine");
    }
}
