use std::path::PathBuf;

pub const TEMP_PATH: &str = "./temp";

/// Earth Engine REST endpoint
pub const EE_BASE_URL: &str = "https://earthengine.googleapis.com";

/// Environment variables read by `ReportConfig::apply_env`
pub const EE_ACCESS_TOKEN_ENV: &str = "EE_ACCESS_TOKEN";
pub const EE_PROJECT_ENV: &str = "EE_PROJECT";

/// Year-specific band prefix of the no-planting indicator image (EVI z-score)
pub const NO_PLANTING_BAND_PREFIX: &str = "EVI_Z_Score_";
/// Single band of the vegetation-index image
pub const CROPLAND_BAND: &str = "EVI";

/// Reduction scales in meters/pixel
pub const NO_PLANTING_SCALE: f64 = 1500.0;
pub const CROPLAND_SCALE: f64 = 2000.0;
/// Tiling hint for large-area reductions
pub const TILE_SCALE: u32 = 16;

/// Vegetation index strictly above this value is cropland
pub const CROPLAND_THRESHOLD: f64 = 0.0;

/// Attribute holding the region name in the administrative table
pub const REGION_NAME_PROPERTY: &str = "State_En";

/// Output column names
pub const NO_PLANTING_COLUMN: &str = "No_Planting_Area_ha";
pub const TOTAL_CROPLAND_COLUMN: &str = "Total_Cropland_Area_ha";
pub const PERCENT_NO_PLANTING_COLUMN: &str = "Percent_No_Planting";

pub fn get_temp_path() -> PathBuf {
    PathBuf::from(TEMP_PATH)
}
