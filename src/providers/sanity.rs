//! Content records (Sanity GROQ query API).
//!
//! One feed serves three collections; each collection is its own cache key
//! and has its own document schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::SanityConfig;
use crate::error::TransportError;
use crate::feed::{CacheKey, Provider, ProviderId};
use crate::providers::http::UpstreamHttp;
use crate::validate::{validate, Field, Schema, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCollection {
    Experience,
    Project,
    Certification,
}

impl ContentCollection {
    pub const ALL: [ContentCollection; 3] = [
        ContentCollection::Experience,
        ContentCollection::Project,
        ContentCollection::Certification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCollection::Experience => "experience",
            ContentCollection::Project => "project",
            ContentCollection::Certification => "certification",
        }
    }

    fn query(&self) -> &'static str {
        match self {
            ContentCollection::Experience => r#"*[_type == "experience"] | order(startDate desc)"#,
            ContentCollection::Project => r#"*[_type == "project"] | order(_createdAt desc)"#,
            ContentCollection::Certification => {
                r#"*[_type == "certification"] | order(issueDate desc)"#
            }
        }
    }

    fn schema(&self) -> &'static Schema {
        match self {
            ContentCollection::Experience => &EXPERIENCE_RESULT,
            ContentCollection::Project => &PROJECT_RESULT,
            ContentCollection::Certification => &CERTIFICATION_RESULT,
        }
    }
}

impl fmt::Display for ContentCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCollection(pub String);

impl fmt::Display for UnknownCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown content collection '{}'", self.0)
    }
}

impl std::error::Error for UnknownCollection {}

impl FromStr for ContentCollection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentCollection::ALL
            .into_iter()
            .find(|collection| collection.as_str() == s)
            .ok_or_else(|| UnknownCollection(s.to_string()))
    }
}

impl CacheKey for ContentCollection {
    fn label(&self) -> String {
        self.as_str().to_string()
    }
}

/// System fields every document carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_createdAt")]
    pub created_at: String,
    #[serde(rename = "_updatedAt")]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub company: String,
    pub role: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub technologies: Option<Vec<String>>,
    #[serde(default)]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    #[serde(flatten)]
    pub meta: DocumentMeta,
    pub name: String,
    pub issuer: String,
    pub issue_date: String,
    #[serde(default)]
    pub credential_url: Option<String>,
}

/// One served document, whichever collection it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContentDocument {
    Experience(Experience),
    Project(Project),
    Certification(Certification),
}

const TEXT: Schema = Schema::Nullable(&Schema::String);
const TAGS: Schema = Schema::Nullable(&Schema::Array(&Schema::String));

const EXPERIENCE: Schema = Schema::Object(&[
    Field::required("_id", Schema::String),
    Field::required("_createdAt", Schema::String),
    Field::required("_updatedAt", Schema::String),
    Field::required("company", Schema::String),
    Field::required("role", Schema::String),
    Field::required("startDate", Schema::String),
    Field::optional("endDate", TEXT),
    Field::optional("description", TEXT),
    Field::optional("technologies", TAGS),
]);

const PROJECT: Schema = Schema::Object(&[
    Field::required("_id", Schema::String),
    Field::required("_createdAt", Schema::String),
    Field::required("_updatedAt", Schema::String),
    Field::required("title", Schema::String),
    Field::optional("description", TEXT),
    Field::optional("url", TEXT),
    Field::optional("repository", TEXT),
    Field::optional("technologies", TAGS),
    Field::optional("featured", Schema::Nullable(&Schema::Boolean)),
]);

const CERTIFICATION: Schema = Schema::Object(&[
    Field::required("_id", Schema::String),
    Field::required("_createdAt", Schema::String),
    Field::required("_updatedAt", Schema::String),
    Field::required("name", Schema::String),
    Field::required("issuer", Schema::String),
    Field::required("issueDate", Schema::String),
    Field::optional("credentialUrl", TEXT),
]);

static EXPERIENCE_RESULT: Schema =
    Schema::Object(&[Field::required("result", Schema::Array(&EXPERIENCE))]);
static PROJECT_RESULT: Schema =
    Schema::Object(&[Field::required("result", Schema::Array(&PROJECT))]);
static CERTIFICATION_RESULT: Schema =
    Schema::Object(&[Field::required("result", Schema::Array(&CERTIFICATION))]);

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: Vec<T>,
}

pub struct SanityProvider {
    http: Arc<UpstreamHttp>,
    url: String,
    token: Option<String>,
}

impl SanityProvider {
    pub fn new(http: Arc<UpstreamHttp>, config: &SanityConfig, token: Option<String>) -> Self {
        let url = format!(
            "{}/v{}/data/query/{}",
            config.base_url(),
            config.api_version,
            config.dataset
        );
        Self { http, url, token }
    }
}

impl Provider for SanityProvider {
    type Key = ContentCollection;
    type Output = Vec<ContentDocument>;

    fn id(&self) -> ProviderId {
        ProviderId::Content
    }

    async fn fetch(&self, collection: &ContentCollection) -> Result<Value, TransportError> {
        let query = [("query", collection.query())];
        self.http
            .send_json(ProviderId::Content.as_str(), || {
                let request = self.http.client().get(&self.url).query(&query);
                match &self.token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            })
            .await?
            .ok_or_else(|| TransportError::Decode("empty query response".to_string()))
    }

    fn decode(&self, collection: &ContentCollection, raw: Value) -> ValidationResult<Vec<ContentDocument>> {
        decode_collection(*collection, raw)
    }
}

fn decode_collection(collection: ContentCollection, raw: Value) -> ValidationResult<Vec<ContentDocument>> {
    fn documents<T: serde::de::DeserializeOwned>(
        raw: Value,
        schema: &Schema,
        wrap: fn(T) -> ContentDocument,
    ) -> ValidationResult<Vec<ContentDocument>> {
        validate::<QueryResponse<T>>(raw, schema)
            .map(|response| response.result.into_iter().map(wrap).collect())
    }

    let schema = collection.schema();
    match collection {
        ContentCollection::Experience => documents(raw, schema, ContentDocument::Experience),
        ContentCollection::Project => documents(raw, schema, ContentDocument::Project),
        ContentCollection::Certification => documents(raw, schema, ContentDocument::Certification),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::FieldError;
    use serde_json::json;

    #[test]
    fn test_collection_from_str() {
        assert_eq!("project".parse::<ContentCollection>(), Ok(ContentCollection::Project));
        assert_eq!(
            "posts".parse::<ContentCollection>(),
            Err(UnknownCollection("posts".into()))
        );
    }

    #[test]
    fn test_decode_projects() {
        let raw = json!({
            "query": "*[_type == \"project\"]",
            "ms": 4,
            "result": [{
                "_id": "p1",
                "_type": "project",
                "_createdAt": "2024-03-01T10:00:00Z",
                "_updatedAt": "2024-03-02T10:00:00Z",
                "_rev": "abc",
                "title": "Portfolio",
                "description": null,
                "technologies": ["Rust", "Next.js"],
                "featured": true
            }]
        });
        let ValidationResult::Valid(documents) = decode_collection(ContentCollection::Project, raw) else {
            panic!("expected valid documents");
        };
        assert_eq!(
            serde_json::to_value(&documents).unwrap(),
            json!([{
                "_id": "p1",
                "_createdAt": "2024-03-01T10:00:00Z",
                "_updatedAt": "2024-03-02T10:00:00Z",
                "title": "Portfolio",
                "description": null,
                "url": null,
                "repository": null,
                "technologies": ["Rust", "Next.js"],
                "featured": true
            }])
        );
    }

    #[test]
    fn test_decode_reports_document_path() {
        let raw = json!({
            "result": [
                {"_id": "c1", "_createdAt": "t", "_updatedAt": "t", "name": "CKA", "issuer": "CNCF", "issueDate": "2023-01-01"},
                {"_id": "c2", "_createdAt": "t", "_updatedAt": "t", "name": "AWS", "issueDate": "2022-01-01"}
            ]
        });
        assert_eq!(
            decode_collection(ContentCollection::Certification, raw),
            ValidationResult::Invalid(vec![FieldError::missing("result[1].issuer", "string")])
        );
    }

    #[test]
    fn test_empty_collection() {
        let raw = json!({"result": []});
        assert_eq!(
            decode_collection(ContentCollection::Experience, raw),
            ValidationResult::Valid(vec![])
        );
    }
}
