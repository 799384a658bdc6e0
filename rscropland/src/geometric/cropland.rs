use std::cell::OnceCell;

use crate::collect::ee::expression::{Expression, ImageRef, Reduction};
use crate::collect::ee::RemotePlatform;
use crate::collect::global_variables::{CROPLAND_BAND, CROPLAND_SCALE, CROPLAND_THRESHOLD, TILE_SCALE};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::geometric::bands::require_band;
use crate::geometric::reduce_to_hectares;
use crate::geometric::region::RegionGeometry;

/// Total cropland area calculator
/// Cropland is every pixel whose vegetation index is strictly above the threshold.
pub struct TotalCropland {
    image: ImageRef,
    band: String,
    threshold: f64,
    scale: f64,
    tile_scale: u32,
    /// Set once the band has been found in the image
    checked_band: OnceCell<String>,
}

impl TotalCropland {
    pub fn new(image: ImageRef) -> Self {
        TotalCropland {
            image,
            band: CROPLAND_BAND.to_string(),
            threshold: CROPLAND_THRESHOLD,
            scale: CROPLAND_SCALE,
            tile_scale: TILE_SCALE,
            checked_band: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        TotalCropland::new(ImageRef::new(config.cropland.asset_id.clone()))
            .with_band(config.cropland.band.clone())
            .with_threshold(config.cropland.threshold)
            .with_scale(config.cropland.scale)
            .with_tile_scale(config.tile_scale)
    }

    pub fn with_band(mut self, band: impl Into<String>) -> Self {
        self.band = band.into();
        self.checked_band = OnceCell::new();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_tile_scale(mut self, tile_scale: u32) -> Self {
        self.tile_scale = tile_scale;
        self
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    fn band<P: RemotePlatform + ?Sized>(&self, platform: &P) -> Result<&str> {
        if let Some(band) = self.checked_band.get() {
            return Ok(band.as_str());
        }
        let available = platform.band_names(&self.image)?;
        let band = require_band(self.band.clone(), &self.image.asset_id, &available)?;
        Ok(self.checked_band.get_or_init(|| band).as_str())
    }

    pub fn reduction(&self, geometry: &RegionGeometry) -> Reduction {
        let area = Expression::load(&self.image)
            .select(self.band.clone())
            .gt(self.threshold)
            .multiply(Expression::PixelArea);
        Reduction::sum(area, geometry.clone(), self.scale, self.tile_scale)
    }

    /// Total cropland area in hectares inside `geometry`
    pub fn compute<P: RemotePlatform + ?Sized>(
        &self,
        platform: &P,
        geometry: &RegionGeometry,
    ) -> Result<f64> {
        let band = self.band(platform)?;
        reduce_to_hectares(platform, &self.reduction(geometry), band)
    }
}
