use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::collect::global_variables::{
    CROPLAND_BAND, CROPLAND_SCALE, CROPLAND_THRESHOLD, EE_ACCESS_TOKEN_ENV, EE_BASE_URL,
    EE_PROJECT_ENV, NO_PLANTING_BAND_PREFIX, NO_PLANTING_SCALE, REGION_NAME_PROPERTY, TILE_SCALE,
};
use crate::error::{CroplandError, Result};

/// Connection settings for the remote platform
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub base_url: String,
    /// Cloud project the computations are billed to
    pub project: String,
    /// OAuth2 bearer token. Usually supplied through `EE_ACCESS_TOKEN`.
    pub access_token: Option<String>,
    /// Request timeout. `None` blocks until the platform answers.
    pub timeout_secs: Option<u64>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        PlatformConfig {
            base_url: EE_BASE_URL.to_string(),
            project: String::new(),
            access_token: None,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NoPlantingConfig {
    pub asset_id: String,
    pub band_prefix: String,
    /// Explicit year -> band mapping, takes precedence over the prefix
    pub band_overrides: BTreeMap<i32, String>,
    pub scale: f64,
}

impl Default for NoPlantingConfig {
    fn default() -> Self {
        NoPlantingConfig {
            asset_id: String::new(),
            band_prefix: NO_PLANTING_BAND_PREFIX.to_string(),
            band_overrides: BTreeMap::new(),
            scale: NO_PLANTING_SCALE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CroplandConfig {
    pub asset_id: String,
    pub band: String,
    pub threshold: f64,
    pub scale: f64,
}

impl Default for CroplandConfig {
    fn default() -> Self {
        CroplandConfig {
            asset_id: String::new(),
            band: CROPLAND_BAND.to_string(),
            threshold: CROPLAND_THRESHOLD,
            scale: CROPLAND_SCALE,
        }
    }
}

/// Full report configuration, usually read from a JSON file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub platform: PlatformConfig,
    pub no_planting: NoPlantingConfig,
    pub cropland: CroplandConfig,
    pub tile_scale: u32,
    /// Region attribute used as the row name
    pub name_property: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            platform: PlatformConfig::default(),
            no_planting: NoPlantingConfig::default(),
            cropland: CroplandConfig::default(),
            tile_scale: TILE_SCALE,
            name_property: REGION_NAME_PROPERTY.to_string(),
        }
    }
}

impl ReportConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loaded report config from {:?}", path);
        Self::from_json(&content)
    }

    /// Override platform credentials from `EE_ACCESS_TOKEN` / `EE_PROJECT`
    pub fn apply_env(mut self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok());
        self
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(EE_ACCESS_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.platform.access_token = Some(token);
        }
        if let Some(project) = lookup(EE_PROJECT_ENV).filter(|p| !p.is_empty()) {
            self.platform.project = project;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.no_planting.asset_id.is_empty() {
            return Err(CroplandError::Config("no_planting.asset_id is empty".to_string()));
        }
        if self.cropland.asset_id.is_empty() {
            return Err(CroplandError::Config("cropland.asset_id is empty".to_string()));
        }
        if self.no_planting.scale <= 0.0 || self.cropland.scale <= 0.0 {
            return Err(CroplandError::Config("reduction scales must be positive".to_string()));
        }
        if self.tile_scale == 0 {
            return Err(CroplandError::Config("tile_scale must be at least 1".to_string()));
        }
        Ok(())
    }
}
