//! Target inventory client.
//!
//! Blocking client for the target system's table API: one table per record
//! kind, `sysparm_query` filtering with offset pagination, POST to create,
//! PATCH to update. Implements the engine's read and write contracts.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crosswalk_engine::apply::{RemoteWriteError, TargetWriter};
use crosswalk_engine::model::{RecordKind, TargetRecord};
use crosswalk_engine::readers::TargetReader;
use serde::Deserialize;

use crate::error::InventoryError;

const PAGE_LIMIT: u32 = 1000;

/// Connection settings for the target system. Either a local snapshot file
/// or a base URL (through `/api/now`) plus basic-auth credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSettings {
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Field carrying the organization scope on each row.
    #[serde(default = "default_org_field")]
    pub org_field: String,
}

fn default_org_field() -> String {
    "company".into()
}

fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Organization => "core_company",
        RecordKind::Server => "cmdb_ci_server",
        RecordKind::VoiceGateway => "cmdb_ci_voice_gateway",
        RecordKind::EmailService => "cmdb_ci_email_server",
        RecordKind::LobApplication => "cmdb_ci_appl",
        RecordKind::Site => "cmn_location",
    }
}

/// Target table-API client (blocking).
#[derive(Clone)]
pub struct TargetClient {
    http: reqwest::blocking::Client,
    base_url: String,
    username: String,
    password: String,
    org_field: String,
}

impl TargetClient {
    pub fn from_settings(settings: &TargetSettings) -> Result<Self, InventoryError> {
        let base_url = settings.base_url.clone().ok_or_else(|| {
            InventoryError::Settings("target.base_url is required without a snapshot".into())
        })?;
        let (username, password) = match (&settings.username, &settings.password) {
            (Some(u), Some(p)) => (u.clone(), p.clone()),
            _ => {
                return Err(InventoryError::Auth(
                    "target.username and target.password are not configured".into(),
                ))
            }
        };
        Ok(Self::new(base_url, username, password, settings.org_field.clone()))
    }

    pub fn new(base_url: String, username: String, password: String, org_field: String) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("xwalk/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, base_url, username, password, org_field }
    }

    fn get(&self, url: &str, params: &[(String, String)]) -> Result<serde_json::Value, InventoryError> {
        let response = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .query(params)
            .send()
            .map_err(|e| InventoryError::Network(e.to_string()))?;
        self.parse_response(response)
    }

    fn send_json(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, InventoryError> {
        let response = self
            .http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .map_err(|e| InventoryError::Network(e.to_string()))?;
        self.parse_response(response)
    }

    fn parse_response(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<serde_json::Value, InventoryError> {
        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(InventoryError::Auth(format!(
                "target API rejected credentials (HTTP {})",
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

impl TargetReader for TargetClient {
    type Error = InventoryError;

    fn list(&self, kind: RecordKind, org: Option<&str>) -> Result<Vec<TargetRecord>, InventoryError> {
        let url = format!("{}/table/{}", self.base_url, table(kind));
        let mut records = Vec::new();
        let mut offset = 0u32;

        loop {
            let mut params = vec![
                ("sysparm_limit".to_string(), PAGE_LIMIT.to_string()),
                ("sysparm_offset".to_string(), offset.to_string()),
            ];
            if let Some(org) = org {
                params.push(("sysparm_query".to_string(), format!("{}={}", self.org_field, org)));
            }

            let body = self.get(&url, &params)?;
            let rows = body["result"].as_array().ok_or_else(|| {
                InventoryError::Parse("target response missing 'result' array".into())
            })?;

            for row in rows {
                if let Some(record) = parse_row(row, kind, &self.org_field) {
                    records.push(record);
                }
            }

            if (rows.len() as u32) < PAGE_LIMIT {
                break;
            }
            offset += PAGE_LIMIT;
        }

        Ok(records)
    }
}

impl TargetWriter for TargetClient {
    fn create(
        &mut self,
        kind: RecordKind,
        fields: &BTreeMap<String, String>,
    ) -> Result<String, RemoteWriteError> {
        let url = format!("{}/table/{}", self.base_url, table(kind));
        let body = serde_json::to_value(fields).unwrap_or_default();
        let display = fields.get("name").cloned().unwrap_or_default();

        let json = self
            .send_json(reqwest::Method::POST, &url, &body)
            .map_err(|e| remote_err(&display, kind, e))?;

        json["result"]["sys_id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| remote_err(
                &display,
                kind,
                InventoryError::Parse("Missing sys_id in create response".into()),
            ))
    }

    fn update(
        &mut self,
        kind: RecordKind,
        target_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), RemoteWriteError> {
        let url = format!("{}/table/{}/{}", self.base_url, table(kind), target_id);
        let body = serde_json::to_value(fields).unwrap_or_default();

        self.send_json(reqwest::Method::PATCH, &url, &body)
            .map_err(|e| remote_err(target_id, kind, e))?;
        Ok(())
    }
}

fn remote_err(id: &str, kind: RecordKind, e: InventoryError) -> RemoteWriteError {
    RemoteWriteError { id: id.to_string(), kind, message: e.to_string() }
}

/// Flatten one table row into a TargetRecord. Reference fields arrive as
/// `{link, value}` objects; the raw value is kept. Returns None for rows
/// without a `sys_id`, which can never be matched or updated.
fn parse_row(row: &serde_json::Value, kind: RecordKind, org_field: &str) -> Option<TargetRecord> {
    let mut fields = BTreeMap::new();
    if let Some(obj) = row.as_object() {
        for (key, value) in obj {
            let flat = match value {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                serde_json::Value::Bool(b) => Some(b.to_string()),
                serde_json::Value::Object(o) => {
                    o.get("value").and_then(|v| v.as_str()).map(String::from)
                }
                _ => None,
            };
            if let Some(flat) = flat {
                fields.insert(key.clone(), flat);
            }
        }
    }

    let target_id = fields.remove("sys_id").filter(|id| !id.trim().is_empty())?;
    let org = fields.get(org_field).cloned().unwrap_or_default();

    Some(TargetRecord { target_id, kind, fields, org })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> TargetClient {
        TargetClient::new(
            server.base_url(),
            "api_user".into(),
            "secret".into(),
            "company".into(),
        )
    }

    #[test]
    fn list_flattens_rows_and_references() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/table/cmdb_ci_server");
            then.status(200).json_body(serde_json::json!({
                "result": [{
                    "sys_id": "abc123",
                    "name": "web-01",
                    "serial_number": "SN1",
                    "company": "Acme",
                    "u_owner": { "link": "https://x/api/now/table/sys_user/42", "value": "42" }
                }]
            }));
        });

        let records = client(&server).list(RecordKind::Server, None).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.target_id, "abc123");
        assert_eq!(r.org, "Acme");
        assert_eq!(r.fields["u_owner"], "42");
        assert!(!r.fields.contains_key("sys_id"));
    }

    #[test]
    fn list_drops_rows_without_sys_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/table/cmdb_ci_server");
            then.status(200).json_body(serde_json::json!({
                "result": [
                    { "name": "orphan", "serial_number": "SN0" },
                    { "sys_id": "", "name": "blank", "serial_number": "SN1" },
                    { "sys_id": "abc123", "name": "web-01", "serial_number": "SN2" }
                ]
            }));
        });

        let records = client(&server).list(RecordKind::Server, None).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target_id, "abc123");
    }

    #[test]
    fn list_filters_by_org_query() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/table/core_company")
                .query_param("sysparm_query", "company=Acme");
            then.status(200).json_body(serde_json::json!({ "result": [] }));
        });

        let records = client(&server).list(RecordKind::Organization, Some("Acme")).unwrap();
        mock.assert();
        assert!(records.is_empty());
    }

    #[test]
    fn create_returns_sys_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/table/core_company")
                .json_body_includes(r#"{ "name": "Acme Corp" }"#);
            then.status(201).json_body(serde_json::json!({
                "result": { "sys_id": "new123" }
            }));
        });

        let mut c = client(&server);
        let fields = BTreeMap::from([("name".to_string(), "Acme Corp".to_string())]);
        let sys_id = c.create(RecordKind::Organization, &fields).unwrap();

        mock.assert();
        assert_eq!(sys_id, "new123");
    }

    #[test]
    fn update_patches_by_sys_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH).path("/table/cmdb_ci_server/abc123");
            then.status(200).json_body(serde_json::json!({ "result": {} }));
        });

        let mut c = client(&server);
        let fields = BTreeMap::from([("name".to_string(), "web-01".to_string())]);
        c.update(RecordKind::Server, "abc123", &fields).unwrap();
        mock.assert();
    }

    #[test]
    fn write_failure_carries_record_context() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/table/cmdb_ci_server");
            then.status(403).body("{}");
        });

        let mut c = client(&server);
        let fields = BTreeMap::from([("name".to_string(), "web-01".to_string())]);
        let err = c.create(RecordKind::Server, &fields).unwrap_err();

        assert_eq!(err.id, "web-01");
        assert_eq!(err.kind, RecordKind::Server);
    }
}
