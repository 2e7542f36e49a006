//! Minimal Notion REST client for data-source backed content.
//!
//! The resume and timeline live in Notion databases. Since API version
//! `2025-09-03` a database is a container of data sources; rows are
//! queried from a data source, not from the database itself. Resolving a
//! configured database id therefore takes up to two calls:
//!
//! 1. `GET /databases/{id}` → first data source id (or the database id)
//!    and, when present, its schema.
//! 2. `GET /data_sources/{id}` when the schema was not included.
//!
//! Rows come from `POST /data_sources/{id}/query`, drained cursor by cursor.
//! Property values are decoded into [`PropertyValue`] immediately; nothing
//! downstream sees raw JSON.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::NotionConfig;
use crate::fields::KeyMap;

const PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Notion API error (HTTP {status}) {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("Notion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected Notion response: {0}")]
    Malformed(String),
}

impl NotionError {
    /// The database does not exist or is not shared with the integration.
    pub fn is_not_found(&self) -> bool {
        matches!(self, NotionError::Api { code, .. } if code == "object_not_found")
    }
}

/// A decoded page property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Title, rich text, and scalar types rendered as text.
    Text(String),
    Number(f64),
    Select(String),
    MultiSelect(Vec<String>),
    Date { start: String, end: Option<String> },
    /// Null values, relations, and unsupported types.
    Empty,
}

impl PropertyValue {
    /// Decode a page property object (`{"type": "...", "<type>": ...}`).
    pub fn from_json(prop: &Value) -> Self {
        let kind = prop.get("type").and_then(Value::as_str).unwrap_or_default();
        let value = prop.get(kind).unwrap_or(&Value::Null);

        match kind {
            "title" | "rich_text" => PropertyValue::Text(join_plain_text(value)),
            "number" => value
                .as_f64()
                .map(PropertyValue::Number)
                .unwrap_or(PropertyValue::Empty),
            "select" | "status" => value
                .get("name")
                .and_then(Value::as_str)
                .map(|s| PropertyValue::Select(s.trim().to_string()))
                .unwrap_or(PropertyValue::Empty),
            "multi_select" => PropertyValue::MultiSelect(
                value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.get("name").and_then(Value::as_str))
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            "date" => {
                let start = date_part(value.get("start"));
                let end = date_part(value.get("end"));
                match (start, end) {
                    (Some(start), end) => PropertyValue::Date { start, end },
                    (None, Some(end)) => PropertyValue::Date {
                        start: end,
                        end: None,
                    },
                    (None, None) => PropertyValue::Empty,
                }
            }
            "relation" => PropertyValue::Empty,
            _ => match value {
                Value::String(s) => PropertyValue::Text(s.trim().to_string()),
                Value::Number(n) => n.as_f64().map(PropertyValue::Number).unwrap_or(PropertyValue::Empty),
                Value::Bool(b) => PropertyValue::Text(b.to_string()),
                _ => PropertyValue::Empty,
            },
        }
    }

    /// Plain-text rendering. Dates render as `start` or `start → end`;
    /// whole numbers render without a fraction.
    pub fn plain_text(&self) -> String {
        match self {
            PropertyValue::Text(s) | PropertyValue::Select(s) => s.clone(),
            PropertyValue::Number(n) => format_number(*n),
            PropertyValue::MultiSelect(names) => names.join(", "),
            PropertyValue::Date { start, end } => match end {
                Some(end) if end != start => format!("{} → {}", start, end),
                _ => start.clone(),
            },
            PropertyValue::Empty => String::new(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Select option name; empty for other types.
    pub fn select_name(&self) -> &str {
        match self {
            PropertyValue::Select(s) => s,
            _ => "",
        }
    }

    /// Multi-select option names; empty for other types.
    pub fn names(&self) -> &[String] {
        match self {
            PropertyValue::MultiSelect(names) => names,
            _ => &[],
        }
    }
}

fn join_plain_text(value: &Value) -> String {
    value
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn date_part(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(|s| s.chars().take(10).collect::<String>())
        .filter(|s| !s.is_empty())
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One queried page with decoded properties, keyed by schema key.
#[derive(Debug, Clone, Default)]
pub struct PageRow {
    /// Notion page id, used to name the row in warnings.
    pub id: String,
    pub properties: HashMap<String, PropertyValue>,
}

impl PageRow {
    pub fn from_properties(id: impl Into<String>, props: &Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            properties: props
                .iter()
                .map(|(k, v)| (k.clone(), PropertyValue::from_json(v)))
                .collect(),
        }
    }

    /// First property present for any of `candidates`, via `keys`.
    pub fn lookup(&self, keys: &KeyMap, candidates: &[&str]) -> Option<&PropertyValue> {
        keys.keys_for(candidates)
            .find_map(|key| self.properties.get(key))
    }

    /// Plain text of the first matching property, trimmed.
    pub fn text(&self, keys: &KeyMap, candidates: &[&str]) -> String {
        self.lookup(keys, candidates)
            .map(|v| v.plain_text().trim().to_string())
            .unwrap_or_default()
    }
}

/// A resolved data source: its id and `(column name, schema key)` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub id: String,
    pub columns: Vec<(String, String)>,
}

impl DataSource {
    fn from_schema(id: String, schema: &Map<String, Value>) -> Self {
        let columns = schema
            .iter()
            .map(|(key, prop)| {
                let name = prop
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(key)
                    .trim()
                    .to_string();
                (name, key.clone())
            })
            .collect();
        Self { id, columns }
    }

    pub fn key_map(&self, rules: &[crate::fields::AliasRule]) -> KeyMap {
        KeyMap::build(
            self.columns.iter().map(|(n, k)| (n.as_str(), k.as_str())),
            rules,
        )
    }
}

#[derive(Deserialize)]
struct DatabaseObject {
    #[serde(default)]
    data_sources: Vec<DataSourceRef>,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Deserialize)]
struct DataSourceRef {
    id: String,
    #[serde(default)]
    schema: Option<Map<String, Value>>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct DataSourceObject {
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    schema: Map<String, Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<PageObject>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct PageObject {
    #[serde(default)]
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

pub struct NotionClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    version: String,
}

impl NotionClient {
    pub fn new(config: &NotionConfig, token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            version: config.version.clone(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.api_base, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, NotionError> {
        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: ErrorBody = serde_json::from_str(&body).unwrap_or(ErrorBody {
                code: String::new(),
                message: body.chars().take(500).collect(),
            });
            return Err(NotionError::Api {
                status: status.as_u16(),
                code: err.code,
                message: err.message,
            });
        }

        serde_json::from_str(&body).map_err(|e| NotionError::Malformed(e.to_string()))
    }

    /// Resolve a database id to its first data source and schema.
    pub async fn resolve_source(&self, database_id: &str) -> Result<DataSource, NotionError> {
        let db: DatabaseObject = self
            .send(self.request(reqwest::Method::GET, &format!("/databases/{}", database_id)))
            .await?;

        let first = db.data_sources.into_iter().next();
        let source_id = first
            .as_ref()
            .map(|ds| ds.id.clone())
            .unwrap_or_else(|| database_id.to_string());

        let mut schema = db.properties;
        if schema.is_empty() {
            if let Some(ds) = first {
                schema = ds.schema.or(ds.properties).unwrap_or_default();
            }
        }

        if schema.is_empty() {
            tracing::debug!(data_source = %source_id, "schema not embedded, fetching data source");
            let ds: DataSourceObject = self
                .send(self.request(reqwest::Method::GET, &format!("/data_sources/{}", source_id)))
                .await?;
            schema = if ds.properties.is_empty() {
                ds.schema
            } else {
                ds.properties
            };
        }

        Ok(DataSource::from_schema(source_id, &schema))
    }

    /// Every row of a data source, following `next_cursor` until done.
    pub async fn query_all(&self, data_source_id: &str) -> Result<Vec<PageRow>, NotionError> {
        let path = format!("/data_sources/{}/query", data_source_id);
        let mut rows = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = serde_json::json!({ "page_size": PAGE_SIZE });
            if let Some(c) = &cursor {
                body["start_cursor"] = Value::String(c.clone());
            }

            let page: QueryResponse = self
                .send(self.request(reqwest::Method::POST, &path).json(&body))
                .await?;
            rows.extend(
                page.results
                    .iter()
                    .map(|p| PageRow::from_properties(p.id.as_str(), &p.properties)),
            );
            tracing::debug!(rows = rows.len(), has_more = page.has_more, "queried data source page");

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) if cursor.as_deref() == Some(next.as_str()) => {
                    return Err(NotionError::Malformed(format!("cursor {} repeated", next)))
                }
                (true, Some(next)) => cursor = Some(next),
                (true, None) => {
                    return Err(NotionError::Malformed(
                        "has_more is true but next_cursor is missing".to_string(),
                    ))
                }
                (false, _) => break,
            }
        }

        Ok(rows)
    }
}
