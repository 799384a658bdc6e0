use thiserror::Error;

/// Errors raised while computing region areas on the remote platform
#[derive(Debug, Error)]
pub enum CroplandError {
    /// The requested band is not part of the raster image
    #[error("band '{band}' not found in image '{image}' (available: {available:?})")]
    BandNotFound {
        band: String,
        image: String,
        available: Vec<String>,
    },

    /// The platform failed the request, or returned no value for the geometry
    #[error("remote computation failed: {message}")]
    RemoteComputation { message: String },

    /// Geometry is missing or cannot be expressed as a (multi)polygon boundary
    #[error("invalid geometry for region '{region}': {message}")]
    InvalidGeometry { region: String, message: String },

    /// Region record is missing a required attribute
    #[error("invalid region record #{index}: {message}")]
    InvalidRegion { index: usize, message: String },

    /// Region file is not a usable GeoJSON document
    #[error("invalid region table: {0}")]
    InvalidTable(String),

    #[error("projection error: {0}")]
    Projection(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CroplandError {
    pub fn remote(message: impl Into<String>) -> Self {
        CroplandError::RemoteComputation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CroplandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_not_found_message() {
        let err = CroplandError::BandNotFound {
            band: "EVI_Z_Score_2030".to_string(),
            image: "projects/x/assets/no_planting".to_string(),
            available: vec!["EVI_Z_Score_2023".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("EVI_Z_Score_2030"));
        assert!(msg.contains("EVI_Z_Score_2023"));
    }

    #[test]
    fn test_remote_helper() {
        let err = CroplandError::remote("no data for band 'EVI'");
        assert!(matches!(err, CroplandError::RemoteComputation { .. }));
    }
}
