//! No-planting versus total cropland area per administrative region.
//!
//! Areas are reduced server-side on a remote geospatial platform
//! ([`collect::ee::EeCollect`]); this crate only builds the requests and
//! assembles the per-region report ([`geometric::report::RegionReport`]).

pub mod collect;
pub mod commons;
pub mod config;
pub mod error;
pub mod geo_core;
pub mod geometric;

pub use collect::ee::ee_collect::EeCollect;
pub use collect::ee::expression::ImageRef;
pub use collect::ee::RemotePlatform;
pub use config::ReportConfig;
pub use error::{CroplandError, Result};
pub use geometric::region::{Region, RegionGeometry, RegionTable};
pub use geometric::report::{build_report, ErrorPolicy, RegionAreas, RegionOutcome, RegionReport};
