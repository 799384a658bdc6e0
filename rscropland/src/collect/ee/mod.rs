//! Remote geospatial platform boundary
//!
//! Calculators only talk to the platform through [`RemotePlatform`], so the
//! HTTP client ([`ee_collect::EeCollect`]) can be swapped for an in-memory
//! double in tests.

pub mod ee_collect;
pub mod expression;
#[cfg(test)]
pub mod mock;

use serde_json::{Map, Value};

use crate::error::Result;
use expression::{ImageRef, Reduction};

pub trait RemotePlatform {
    /// Band names of a raster image
    fn band_names(&self, image: &ImageRef) -> Result<Vec<String>>;

    /// Run a sum reduction and return the result dictionary (band -> value).
    /// Bands without intersecting data come back as `null` or are absent.
    fn reduce_region(&self, reduction: &Reduction) -> Result<Map<String, Value>>;
}

impl<P: RemotePlatform + ?Sized> RemotePlatform for &P {
    fn band_names(&self, image: &ImageRef) -> Result<Vec<String>> {
        (**self).band_names(image)
    }

    fn reduce_region(&self, reduction: &Reduction) -> Result<Map<String, Value>> {
        (**self).reduce_region(reduction)
    }
}
