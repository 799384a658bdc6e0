use std::collections::BTreeMap;

use crate::collect::global_variables::NO_PLANTING_BAND_PREFIX;
use crate::config::NoPlantingConfig;
use crate::error::{CroplandError, Result};

/// Year -> band mapping for a multi-year indicator image
///
/// Bands default to `{prefix}{year}`; `overrides` pins individual years to
/// another band name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandCatalog {
    prefix: String,
    overrides: BTreeMap<i32, String>,
}

impl Default for BandCatalog {
    fn default() -> Self {
        BandCatalog::with_prefix(NO_PLANTING_BAND_PREFIX)
    }
}

impl BandCatalog {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        BandCatalog {
            prefix: prefix.into(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &NoPlantingConfig) -> Self {
        BandCatalog {
            prefix: config.band_prefix.clone(),
            overrides: config.band_overrides.clone(),
        }
    }

    pub fn with_override(mut self, year: i32, band: impl Into<String>) -> Self {
        self.overrides.insert(year, band.into());
        self
    }

    /// Band identifier for `year`, not yet checked against the image
    pub fn band_for(&self, year: i32) -> String {
        self.overrides
            .get(&year)
            .cloned()
            .unwrap_or_else(|| format!("{}{}", self.prefix, year))
    }

    /// Band for `year`, checked against the image's actual band list
    pub fn resolve(&self, year: i32, image: &str, available: &[String]) -> Result<String> {
        let band = self.band_for(year);
        require_band(band, image, available)
    }
}

/// `band` if it is one of `available`, `BandNotFound` otherwise
pub fn require_band(band: String, image: &str, available: &[String]) -> Result<String> {
    if available.iter().any(|b| *b == band) {
        Ok(band)
    } else {
        Err(CroplandError::BandNotFound {
            band,
            image: image.to_string(),
            available: available.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_band_for_default_prefix() {
        let catalog = BandCatalog::default();
        assert_eq!(catalog.band_for(2023), "EVI_Z_Score_2023");
    }

    #[test]
    fn test_override_wins() {
        let catalog = BandCatalog::default().with_override(2024, "EVI_Z_2024_rev2");
        assert_eq!(catalog.band_for(2024), "EVI_Z_2024_rev2");
        assert_eq!(catalog.band_for(2023), "EVI_Z_Score_2023");
    }

    #[test]
    fn test_resolve_present_and_missing() {
        let catalog = BandCatalog::default();
        let available = bands(&["EVI_Z_Score_2022", "EVI_Z_Score_2023"]);

        assert_eq!(
            catalog.resolve(2023, "np", &available).unwrap(),
            "EVI_Z_Score_2023"
        );
        match catalog.resolve(2031, "np", &available).unwrap_err() {
            CroplandError::BandNotFound { band, image, available } => {
                assert_eq!(band, "EVI_Z_Score_2031");
                assert_eq!(image, "np");
                assert_eq!(available.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
