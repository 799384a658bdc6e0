pub mod bands;
pub mod cropland;
pub mod no_planting;
pub mod region;
pub mod report;

use crate::collect::ee::expression::Reduction;
use crate::collect::ee::RemotePlatform;
use crate::commons::basic_functions::square_meters_to_hectares;
use crate::error::{CroplandError, Result};

/// Run a sum reduction and convert the value of `band` from m² to hectares.
/// A missing or null value means the geometry has no intersecting data.
pub(crate) fn reduce_to_hectares<P: RemotePlatform + ?Sized>(
    platform: &P,
    reduction: &Reduction,
    band: &str,
) -> Result<f64> {
    let result = platform.reduce_region(reduction)?;
    let area_m2 = match result.get(band) {
        Some(value) if value.is_null() => None,
        Some(value) => Some(value.as_f64().ok_or_else(|| {
            CroplandError::remote(format!("value of band '{}' is not numeric: {}", band, value))
        })?),
        None => None,
    }
    .ok_or_else(|| {
        CroplandError::remote(format!(
            "reduction returned no data for band '{}' (geometry outside image extent?)",
            band
        ))
    })?;
    Ok(square_meters_to_hectares(area_m2))
}
