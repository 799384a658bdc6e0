use std::cell::OnceCell;

use crate::collect::ee::expression::{Expression, ImageRef, Reduction};
use crate::collect::ee::RemotePlatform;
use crate::collect::global_variables::{NO_PLANTING_SCALE, TILE_SCALE};
use crate::config::ReportConfig;
use crate::error::Result;
use crate::geometric::bands::BandCatalog;
use crate::geometric::reduce_to_hectares;
use crate::geometric::region::RegionGeometry;

/// No-planting area calculator
/// Sums pixel area of the year's planting-anomaly mask inside a region.
pub struct NoPlanting {
    image: ImageRef,
    catalog: BandCatalog,
    scale: f64,
    tile_scale: u32,
    /// Band list of `image`, fetched on first use
    bands: OnceCell<Vec<String>>,
}

impl NoPlanting {
    pub fn new(image: ImageRef) -> Self {
        NoPlanting {
            image,
            catalog: BandCatalog::default(),
            scale: NO_PLANTING_SCALE,
            tile_scale: TILE_SCALE,
            bands: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        NoPlanting::new(ImageRef::new(config.no_planting.asset_id.clone()))
            .with_catalog(BandCatalog::from_config(&config.no_planting))
            .with_scale(config.no_planting.scale)
            .with_tile_scale(config.tile_scale)
    }

    pub fn with_catalog(mut self, catalog: BandCatalog) -> Self {
        self.catalog = catalog;
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

    pub fn catalog(&self) -> &BandCatalog {
        &self.catalog
    }

    /// Band of `year`, validated against the image
    pub fn band<P: RemotePlatform + ?Sized>(&self, platform: &P, year: i32) -> Result<String> {
        let available = self.available_bands(platform)?;
        self.catalog.resolve(year, &self.image.asset_id, available)
    }

    fn available_bands<P: RemotePlatform + ?Sized>(&self, platform: &P) -> Result<&[String]> {
        if let Some(bands) = self.bands.get() {
            return Ok(bands.as_slice());
        }
        let bands = platform.band_names(&self.image)?;
        Ok(self.bands.get_or_init(|| bands).as_slice())
    }

    pub fn reduction(&self, geometry: &RegionGeometry, band: &str) -> Reduction {
        let area = Expression::load(&self.image)
            .select(band)
            .multiply(Expression::PixelArea);
        Reduction::sum(area, geometry.clone(), self.scale, self.tile_scale)
    }

    /// No-planting area in hectares for `year` inside `geometry`
    pub fn compute<P: RemotePlatform + ?Sized>(
        &self,
        platform: &P,
        geometry: &RegionGeometry,
        year: i32,
    ) -> Result<f64> {
        let band = self.band(platform, year)?;
        reduce_to_hectares(platform, &self.reduction(geometry, &band), &band)
    }
}
