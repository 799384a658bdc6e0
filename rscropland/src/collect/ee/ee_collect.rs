use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

use super::expression::{band_names_node, compute_request, ImageRef, Reduction};
use super::RemotePlatform;
use crate::config::PlatformConfig;
use crate::error::{CroplandError, Result};

/// Successful `value:compute` response
#[derive(Debug, Deserialize)]
struct ComputeResponse {
    result: Option<Value>,
}

/// Error body returned by the REST API
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Client session for the Earth Engine REST API
///
/// Created once with [`EeCollect::initialize`] and passed by reference to the
/// calculators. Every call is a blocking POST to `value:compute`.
pub struct EeCollect {
    client: Client,
    compute_url: Url,
    project: String,
}

impl EeCollect {
    /// Validate the platform config and open an authenticated session
    pub fn initialize(config: &PlatformConfig) -> Result<Self> {
        if config.project.is_empty() {
            return Err(CroplandError::Config("platform.project is empty".to_string()));
        }
        let token = config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CroplandError::Config("platform access token is not set".to_string()))?;

        let compute_url = Self::compute_url(&config.base_url, &config.project)?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| CroplandError::Config(format!("invalid access token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        // reqwest's blocking client defaults to a 30s timeout; only set one when configured
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        log::info!(
            "Initialized Earth Engine session for project '{}' ({})",
            config.project,
            compute_url
        );

        Ok(EeCollect {
            client,
            compute_url,
            project: config.project.clone(),
        })
    }

    /// End the session
    pub fn close(self) {
        log::info!("Closed Earth Engine session for project '{}'", self.project);
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn compute_url(base_url: &str, project: &str) -> Result<Url> {
        let base = Url::parse(base_url)
            .map_err(|e| CroplandError::Config(format!("invalid base_url '{base_url}': {e}")))?;
        base.join(&format!("v1/projects/{}/value:compute", project))
            .map_err(|e| CroplandError::Config(format!("invalid project '{project}': {e}")))
    }

    /// POST an expression node and return the `result` value
    fn compute(&self, node: Value) -> Result<Value> {
        let body = compute_request(node);
        log::debug!("POST {} ({} bytes)", self.compute_url, body.to_string().len());

        let response = self.client.post(self.compute_url.clone()).json(&body).send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(CroplandError::remote(Self::describe_error(status.as_u16(), &text)));
        }
        parse_compute_response(&text)
    }

    fn describe_error(status: u16, body: &str) -> String {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => format!(
                "platform returned {} {}: {}",
                envelope.error.code.unwrap_or(status),
                envelope.error.status.unwrap_or_default(),
                envelope.error.message
            ),
            Err(_) => format!("platform returned {}: {}", status, body),
        }
    }
}

fn parse_compute_response(text: &str) -> Result<Value> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(text) {
        return Err(CroplandError::remote(envelope.error.message));
    }
    let response: ComputeResponse = serde_json::from_str(text)
        .map_err(|e| CroplandError::remote(format!("malformed compute response: {e}")))?;
    response
        .result
        .ok_or_else(|| CroplandError::remote("compute response has no result"))
}

fn parse_band_names(value: Value) -> Result<Vec<String>> {
    serde_json::from_value(value)
        .map_err(|e| CroplandError::remote(format!("band names are not a list of strings: {e}")))
}

fn parse_dictionary(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CroplandError::remote(format!(
            "expected a reduction dictionary, got {}",
            other
        ))),
    }
}

impl RemotePlatform for EeCollect {
    fn band_names(&self, image: &ImageRef) -> Result<Vec<String>> {
        log::debug!("Fetching band names of {}", image.asset_id);
        parse_band_names(self.compute(band_names_node(image))?)
    }

    fn reduce_region(&self, reduction: &Reduction) -> Result<Map<String, Value>> {
        if let Some(bbox) = reduction.geometry.bounding_box() {
            log::debug!(
                "reduceRegion sum at {} m (tileScale {}) over {:?}",
                reduction.scale,
                reduction.tile_scale,
                bbox
            );
        }
        parse_dictionary(self.compute(reduction.to_value_node())?)
    }
}
