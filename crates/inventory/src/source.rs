//! Source inventory client.
//!
//! Blocking reqwest client (no Tokio runtime required) for the JSON:API
//! style source system: `data[].attributes` payloads, `page[number]` /
//! `page[size]` pagination, `meta.total-pages` for the page count.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crosswalk_engine::model::{RecordKind, SourceRecord};
use crosswalk_engine::readers::SourceReader;
use serde::Deserialize;

use crate::error::InventoryError;

const PAGE_SIZE: u32 = 100;

/// Connection settings for the source system. Either a local snapshot file
/// or a base URL plus API key; the CLI picks which path to use.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Attribute carrying the organization scope on each row.
    #[serde(default = "default_org_field")]
    pub org_field: String,
}

fn default_org_field() -> String {
    "organization-name".into()
}

fn endpoint(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Organization => "organizations",
        RecordKind::Server => "servers",
        RecordKind::VoiceGateway => "voice-gateways",
        RecordKind::EmailService => "email-services",
        RecordKind::LobApplication => "lob-applications",
        RecordKind::Site => "sites",
    }
}

/// Source API client (blocking).
#[derive(Clone)]
pub struct SourceClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    org_field: String,
}

impl SourceClient {
    pub fn from_settings(settings: &SourceSettings) -> Result<Self, InventoryError> {
        let base_url = settings.base_url.clone().ok_or_else(|| {
            InventoryError::Settings("source.base_url is required without a snapshot".into())
        })?;
        let api_key = settings.api_key.clone().ok_or_else(|| {
            InventoryError::Auth("source.api_key is not configured".into())
        })?;
        Ok(Self::new(base_url, api_key, settings.org_field.clone()))
    }

    pub fn new(base_url: String, api_key: String, org_field: String) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("xwalk/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, base_url, api_key, org_field }
    }

    fn fetch_page(
        &self,
        kind: RecordKind,
        org: Option<&str>,
        page: u32,
    ) -> Result<serde_json::Value, InventoryError> {
        let url = format!("{}/{}", self.base_url, endpoint(kind));
        let mut params = vec![
            ("page[size]".to_string(), PAGE_SIZE.to_string()),
            ("page[number]".to_string(), page.to_string()),
        ];
        if let Some(org) = org {
            params.push(("filter[organization_id]".to_string(), org.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(&params)
            .send()
            .map_err(|e| InventoryError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(InventoryError::Auth(format!(
                "source API rejected the key (HTTP {})",
                status
            )));
        }
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(InventoryError::Http(status, body));
        }

        response
            .json()
            .map_err(|e| InventoryError::Parse(e.to_string()))
    }
}

impl SourceReader for SourceClient {
    type Error = InventoryError;

    fn list(&self, kind: RecordKind, org: Option<&str>) -> Result<Vec<SourceRecord>, InventoryError> {
        let mut records = Vec::new();
        let mut page = 1u32;
        let mut total_pages = 1u32;

        while page <= total_pages {
            let body = self.fetch_page(kind, org, page)?;

            let data = body["data"].as_array().ok_or_else(|| {
                InventoryError::Parse("source response missing 'data' array".into())
            })?;

            for item in data {
                records.push(parse_resource(item, kind, org, &self.org_field));
            }

            total_pages = body["meta"]["total-pages"].as_u64().unwrap_or(1) as u32;
            page += 1;
        }

        Ok(records)
    }
}

/// Flatten one JSON:API resource into a SourceRecord. Attribute values are
/// stringified; null and nested values are dropped.
fn parse_resource(
    item: &serde_json::Value,
    kind: RecordKind,
    org: Option<&str>,
    org_field: &str,
) -> SourceRecord {
    let id = item["id"]
        .as_str()
        .map(String::from)
        .or_else(|| item["id"].as_i64().map(|n| n.to_string()));

    let mut fields = BTreeMap::new();
    if let Some(attrs) = item["attributes"].as_object() {
        for (key, value) in attrs {
            if let Some(s) = scalar_to_string(value) {
                fields.insert(key.clone(), s);
            }
        }
    }

    let org = fields
        .get(org_field)
        .cloned()
        .or_else(|| org.map(String::from))
        .unwrap_or_default();

    SourceRecord { id, kind, fields, org }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn mock_resource(id: u32, name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "type": "servers",
            "attributes": {
                "name": name,
                "serial_number": format!("SN{id}"),
                "organization-name": "Acme",
                "ram_gb": 64,
                "decommissioned": false,
                "tags": ["a", "b"]
            }
        })
    }

    #[test]
    fn paginates_until_total_pages() {
        let server = MockServer::start();

        let page1 = server.mock(|when, then| {
            when.method(GET).path("/servers").query_param("page[number]", "1");
            then.status(200).json_body(serde_json::json!({
                "data": [mock_resource(1, "web-01"), mock_resource(2, "web-02")],
                "meta": { "total-pages": 2 }
            }));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET).path("/servers").query_param("page[number]", "2");
            then.status(200).json_body(serde_json::json!({
                "data": [mock_resource(3, "web-03")],
                "meta": { "total-pages": 2 }
            }));
        });

        let client = SourceClient::new(
            server.base_url(),
            "key".into(),
            "organization-name".into(),
        );
        let records = client.list(RecordKind::Server, None).unwrap();

        page1.assert();
        page2.assert();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id.as_deref(), Some("1"));
        assert_eq!(records[0].org, "Acme");
        assert_eq!(records[2].fields["name"], "web-03");
    }

    #[test]
    fn attributes_flatten_scalars_only() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/servers");
            then.status(200).json_body(serde_json::json!({
                "data": [mock_resource(7, "db-01")],
                "meta": { "total-pages": 1 }
            }));
        });

        let client = SourceClient::new(
            server.base_url(),
            "key".into(),
            "organization-name".into(),
        );
        let records = client.list(RecordKind::Server, None).unwrap();

        let fields = &records[0].fields;
        assert_eq!(fields["serial_number"], "SN7");
        assert_eq!(fields["ram_gb"], "64");
        assert_eq!(fields["decommissioned"], "false");
        assert!(!fields.contains_key("tags"));
    }

    #[test]
    fn rejected_key_is_auth_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/servers");
            then.status(401).body("{}");
        });

        let client = SourceClient::new(
            server.base_url(),
            "bad-key".into(),
            "organization-name".into(),
        );
        let err = client.list(RecordKind::Server, None).unwrap_err();
        assert!(matches!(err, InventoryError::Auth(_)), "got {err}");
    }
}
