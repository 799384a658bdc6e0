use geo::{BoundingRect, MultiPolygon};

use crate::error::{CroplandError, Result};

/// EPSG code of the coordinates the remote platform expects (WGS84 lon/lat)
pub const WGS84_EPSG: i32 = 4326;

/// CRS handling for region geometries
/// Region tables may come in any projected CRS; the platform only takes WGS84.
#[derive(Debug, Clone, Copy)]
pub struct GeoCore {
    /// EPSG code of the source coordinates
    pub epsg: i32,
}

impl Default for GeoCore {
    fn default() -> Self {
        GeoCore::new(WGS84_EPSG)
    }
}

impl GeoCore {
    pub fn new(epsg: i32) -> Self {
        GeoCore { epsg }
    }

    pub fn get_epsg(&self) -> i32 {
        self.epsg
    }

    pub fn set_epsg(&mut self, epsg: i32) {
        self.epsg = epsg;
    }

    pub fn is_wgs84(&self) -> bool {
        self.epsg == WGS84_EPSG
    }

    #[cfg(feature = "proj")]
    fn proj_between(from_epsg: i32, to_epsg: i32) -> Result<proj::Proj> {
        let from_crs = format!("EPSG:{}", from_epsg);
        let to_crs = format!("EPSG:{}", to_epsg);
        proj::Proj::new_known_crs(&from_crs, &to_crs, None).map_err(|e| {
            CroplandError::Projection(format!(
                "failed to create transformation {from_crs} -> {to_crs}: {e}"
            ))
        })
    }

    /// Reproject a multipolygon from this CRS to WGS84.
    /// No-op when the source is already EPSG:4326.
    pub fn to_wgs84(&self, geometry: MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        if self.is_wgs84() {
            return Ok(geometry);
        }
        self.reproject(geometry)
    }

    #[cfg(feature = "proj")]
    fn reproject(&self, geometry: MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        use geo::MapCoords;

        // Always x = lon, y = lat for 4326 output
        let proj = Self::proj_between(self.epsg, WGS84_EPSG)?;
        geometry.try_map_coords(|coord| {
            let (x, y) = proj.convert((coord.x, coord.y)).map_err(|e| {
                CroplandError::Projection(format!(
                    "failed to transform ({}, {}) from EPSG:{}: {e}",
                    coord.x, coord.y, self.epsg
                ))
            })?;
            Ok(geo::coord! { x: x, y: y })
        })
    }

    #[cfg(not(feature = "proj"))]
    fn reproject(&self, _geometry: MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        Err(CroplandError::Projection(format!(
            "EPSG:{} input requires the `proj` feature",
            self.epsg
        )))
    }
}

/// Bounding box structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64, // min longitude
    pub min_y: f64, // min latitude
    pub max_x: f64, // max longitude
    pub max_y: f64, // max latitude
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounding box of a multipolygon, `None` when it is empty
    pub fn of(geometry: &MultiPolygon<f64>) -> Option<Self> {
        geometry
            .bounding_rect()
            .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }
}
