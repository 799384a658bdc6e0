use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

use super::expression::{ImageRef, Reduction};
use super::RemotePlatform;
use crate::error::{CroplandError, Result};

/// In-memory platform: per-asset band lists and queued reduction sums
#[derive(Default)]
pub struct MockPlatform {
    bands: HashMap<String, Vec<String>>,
    /// Per asset, the sums (m²) returned by successive reductions, `None` = no data
    sums: RefCell<HashMap<String, VecDeque<Option<f64>>>>,
    failing_assets: Vec<String>,
    pub reductions: RefCell<Vec<Reduction>>,
    pub band_lookups: Cell<usize>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bands(mut self, asset_id: &str, bands: &[&str]) -> Self {
        self.bands.insert(
            asset_id.to_string(),
            bands.iter().map(|b| b.to_string()).collect(),
        );
        self
    }

    pub fn with_sums(self, asset_id: &str, sums: &[Option<f64>]) -> Self {
        self.sums
            .borrow_mut()
            .entry(asset_id.to_string())
            .or_default()
            .extend(sums.iter().copied());
        self
    }

    pub fn failing(mut self, asset_id: &str) -> Self {
        self.failing_assets.push(asset_id.to_string());
        self
    }

    pub fn reduction_count(&self) -> usize {
        self.reductions.borrow().len()
    }
}

impl RemotePlatform for MockPlatform {
    fn band_names(&self, image: &ImageRef) -> Result<Vec<String>> {
        self.band_lookups.set(self.band_lookups.get() + 1);
        self.bands
            .get(&image.asset_id)
            .cloned()
            .ok_or_else(|| CroplandError::remote(format!("asset '{}' not found", image.asset_id)))
    }

    fn reduce_region(&self, reduction: &Reduction) -> Result<Map<String, Value>> {
        self.reductions.borrow_mut().push(reduction.clone());

        let asset = reduction
            .image
            .source()
            .map(|image| image.asset_id.clone())
            .unwrap_or_default();
        if self.failing_assets.contains(&asset) {
            return Err(CroplandError::remote(format!("computation timed out for '{asset}'")));
        }
        let band = reduction.image.output_band().unwrap_or_default().to_string();

        let sum = self
            .sums
            .borrow_mut()
            .get_mut(&asset)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| CroplandError::remote(format!("no queued sum for '{asset}'")))?;

        let mut result = Map::new();
        result.insert(band, sum.map(Value::from).unwrap_or(Value::Null));
        Ok(result)
    }
}
