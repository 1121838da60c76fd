//! Append-only message log in a Firestore collection, via the REST API.
//!
//! Reference: https://firebase.google.com/docs/firestore/reference/rest/v1/projects.databases.documents/createDocument

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use url::Url;

use crate::config::DeliveryConfig;
use crate::deliver::{error_body, Deliverer, DeliveryError};
use crate::format::{Payload, PayloadKind};

const PROVIDER: &str = "firestore";

/// Appends [`Payload::Document`] payloads to a collection.
///
/// Firestore mints the document id; it is returned as the message id.
pub struct FirestoreStore {
    client: Client,
    base_url: Url,
    project_id: Option<String>,
    collection: String,
    access_token: Option<String>,
}

/// A Firestore typed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(()),
    BooleanValue(bool),
    /// int64 travels as a decimal string
    IntegerValue(String),
    DoubleValue(f64),
    StringValue(String),
    ArrayValue { values: Vec<FirestoreValue> },
    MapValue { fields: BTreeMap<String, FirestoreValue> },
}

impl From<&Value> for FirestoreValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FirestoreValue::NullValue(()),
            Value::Bool(b) => FirestoreValue::BooleanValue(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FirestoreValue::IntegerValue(i.to_string()),
                None => FirestoreValue::DoubleValue(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FirestoreValue::StringValue(s.clone()),
            Value::Array(items) => FirestoreValue::ArrayValue {
                values: items.iter().map(FirestoreValue::from).collect(),
            },
            Value::Object(map) => FirestoreValue::MapValue {
                fields: map
                    .iter()
                    .map(|(k, v)| (k.clone(), FirestoreValue::from(v)))
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateDocument {
    fields: BTreeMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
struct CreatedDocument {
    /// `projects/{p}/databases/(default)/documents/{collection}/{id}`
    name: String,
}

impl CreatedDocument {
    fn id(&self) -> Option<&str> {
        self.name.rsplit('/').next().filter(|id| !id.is_empty())
    }
}

impl FirestoreStore {
    pub fn new(client: Client, config: &DeliveryConfig) -> Self {
        Self {
            client,
            base_url: config.firestore_api_url.clone(),
            project_id: config.firestore_project_id.clone(),
            collection: config.firestore_collection.clone(),
            access_token: config.firestore_access_token.clone(),
        }
    }

    /// `{base}/v1/projects/{project}/databases/(default)/documents/{collection}`
    fn collection_url(&self, project_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                project_id,
                "databases",
                "(default)",
                "documents",
                self.collection.as_str(),
            ]);
        }
        url
    }
}

/// Encode a serializable record as a Firestore `fields` map.
fn encode_fields<T: Serialize>(
    record: &T,
) -> Result<BTreeMap<String, FirestoreValue>, DeliveryError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map
            .iter()
            .map(|(k, v)| (k.clone(), FirestoreValue::from(v)))
            .collect()),
        other => {
            error!(encoded = %other, "firestore_record_not_an_object");
            Err(DeliveryError::UnsupportedPayload {
                provider: PROVIDER,
                kind: PayloadKind::Document,
            })
        }
    }
}

#[async_trait]
impl Deliverer for FirestoreStore {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn payload_kind(&self) -> PayloadKind {
        PayloadKind::Document
    }

    async fn deliver(&self, payload: &Payload) -> Result<String, DeliveryError> {
        let Payload::Document(document) = payload else {
            return Err(DeliveryError::UnsupportedPayload {
                provider: PROVIDER,
                kind: payload.kind(),
            });
        };

        let project_id = self
            .project_id
            .as_deref()
            .ok_or(DeliveryError::NotConfigured(PROVIDER))?;

        let body = CreateDocument {
            fields: encode_fields(document)?,
        };

        info!(
            collection = %self.collection,
            has_photo = document.photo.is_some(),
            text_length = document.text.len(),
            "firestore_append_starting"
        );

        let mut request = self.client.post(self.collection_url(project_id)).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| DeliveryError::Transport {
            provider: PROVIDER,
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            error!(status_code = status.as_u16(), body = %body, "firestore_append_failed");
            return Err(DeliveryError::Provider {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedDocument = response
            .json()
            .await
            .map_err(|e| DeliveryError::InvalidResponse {
                provider: PROVIDER,
                detail: e.to_string(),
            })?;

        let id = created
            .id()
            .ok_or_else(|| DeliveryError::InvalidResponse {
                provider: PROVIDER,
                detail: format!("document name without id: {}", created.name),
            })?
            .to_string();

        info!(collection = %self.collection, document_id = %id, "firestore_append_complete");

        Ok(id)
    }
}
