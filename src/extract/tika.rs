//! Structured extraction through an Apache Tika server.
//!
//! Uses the recursive metadata endpoint (`/rmeta/text`), which returns one
//! JSON object per document (the container first, then embedded files).
//! Each object holds metadata plus the extracted text under
//! `X-TIKA:content`.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Body, Client};
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_DISPOSITION};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{DocumentExtractor, Extracted, ExtractionError, Metadata};
use crate::config::TikaSettings;

/// Key holding the extracted text in rmeta responses.
const CONTENT_KEY: &str = "X-TIKA:content";

/// Timeout for the availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Fast structured extractor backed by a Tika server.
#[derive(Debug, Clone)]
pub struct TikaExtractor {
    settings: TikaSettings,
}

impl TikaExtractor {
    pub fn new(settings: TikaSettings) -> Self {
        Self { settings }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.endpoint.trim_end_matches('/'), path)
    }

    fn parse(&self, file_path: &Path) -> Result<Extracted, ExtractionError> {
        if !self.settings.enabled {
            return Err(ExtractionError::Unavailable(
                "Tika is disabled in configuration".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .build()?;

        let file = File::open(file_path)?;
        let mut request = client
            .put(self.url("rmeta/text"))
            .header(ACCEPT, "application/json")
            .body(Body::from(file));

        if let Some(disposition) = file_path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| {
                HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name)).ok()
            })
        {
            request = request.header(CONTENT_DISPOSITION, disposition);
        }

        let response = request.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ExtractionError::Unavailable(format!(
                    "Tika server at {} did not respond: {}",
                    self.settings.endpoint, e
                ))
            } else {
                ExtractionError::Http(e)
            }
        })?;

        let documents: Vec<Map<String, Value>> = response.error_for_status()?.json()?;
        debug!("Tika returned {} document entries", documents.len());
        Ok(parse_rmeta(documents))
    }
}

impl DocumentExtractor for TikaExtractor {
    fn name(&self) -> &'static str {
        "tika"
    }

    fn is_available(&self) -> bool {
        if !self.settings.enabled {
            return false;
        }
        Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .and_then(|client| client.get(self.url("tika")).send())
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }

    fn availability_hint(&self) -> String {
        if !self.settings.enabled {
            "Tika is disabled in configuration".to_string()
        } else {
            format!(
                "Tika server expected at {} (run: docker run -p 9998:9998 apache/tika)",
                self.settings.endpoint
            )
        }
    }

    fn extract(&self, file_path: &Path) -> Extracted {
        info!("Reading with Apache Tika: {:?}", file_path);
        match self.parse(file_path) {
            Ok(extracted) => extracted,
            Err(ExtractionError::Unavailable(reason)) => {
                warn!("Apache Tika is not available: {}", reason);
                Extracted::default()
            }
            Err(e) => {
                warn!("Tika parsing failed: {}", e);
                Extracted::default()
            }
        }
    }
}

/// Turn an rmeta response into text and container metadata.
fn parse_rmeta(documents: Vec<Map<String, Value>>) -> Extracted {
    let mut documents = documents.into_iter();
    let Some(mut container) = documents.next() else {
        return Extracted::default();
    };

    let mut contents: Vec<String> = Vec::new();
    if let Some(Value::String(content)) = container.remove(CONTENT_KEY) {
        contents.push(content);
    }
    for embedded in documents {
        if let Some(Value::String(content)) = embedded.get(CONTENT_KEY) {
            contents.push(content.clone());
        }
    }

    let metadata: Metadata = container
        .into_iter()
        .map(|(key, value)| (key, metadata_value(value)))
        .collect();

    Extracted {
        text: contents.join("\n").trim().to_string(),
        metadata,
    }
}

/// Flatten a metadata value; multi-valued keys become comma separated.
fn metadata_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(metadata_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
