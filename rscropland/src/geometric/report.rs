use anyhow::{Context, Result as AnyResult};
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::collect::ee::expression::ImageRef;
use crate::collect::ee::RemotePlatform;
use crate::collect::global_variables::{
    NO_PLANTING_COLUMN, PERCENT_NO_PLANTING_COLUMN, TEMP_PATH, TOTAL_CROPLAND_COLUMN,
};
use crate::commons::basic_functions::{percent_of, round_to};
use crate::config::ReportConfig;
use crate::error::{CroplandError, Result};
use crate::geometric::cropland::TotalCropland;
use crate::geometric::no_planting::NoPlanting;
use crate::geometric::region::{Region, RegionTable};

/// Decimal places of every derived column
const DECIMALS: i32 = 2;

/// Region row augmented with the three area columns
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAreas {
    pub region: Region,
    pub no_planting_area_ha: f64,
    pub total_cropland_area_ha: f64,
    /// `None` when the region has no cropland
    pub percent_no_planting: Option<f64>,
}

impl RegionAreas {
    /// Derive the percentage from raw hectare values, then round all three
    pub fn from_hectares(region: Region, no_planting_ha: f64, total_cropland_ha: f64) -> Self {
        RegionAreas {
            region,
            no_planting_area_ha: round_to(no_planting_ha, DECIMALS),
            total_cropland_area_ha: round_to(total_cropland_ha, DECIMALS),
            percent_no_planting: percent_of(no_planting_ha, total_cropland_ha)
                .map(|p| round_to(p, DECIMALS)),
        }
    }

    pub fn name(&self) -> &str {
        &self.region.name
    }
}

/// What to do when a region fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort on the first failing region, no partial report
    #[default]
    FailFast,
    /// Keep going and report the error on the failing row
    Collect,
}

/// Per-region result of [`RegionReport::build_with_outcomes`]
#[derive(Debug)]
pub enum RegionOutcome {
    Computed(RegionAreas),
    Failed { region: Region, error: CroplandError },
}

impl RegionOutcome {
    pub fn is_computed(&self) -> bool {
        matches!(self, RegionOutcome::Computed(_))
    }

    pub fn region(&self) -> &Region {
        match self {
            RegionOutcome::Computed(areas) => &areas.region,
            RegionOutcome::Failed { region, .. } => region,
        }
    }
}

/// Region report builder
/// Runs both calculators on every region, in table order, for one year.
pub struct RegionReport {
    no_planting: NoPlanting,
    cropland: TotalCropland,
    year: i32,
    policy: ErrorPolicy,
    output_path: PathBuf,
}

impl RegionReport {
    pub fn new(no_planting: NoPlanting, cropland: TotalCropland, year: i32) -> Self {
        RegionReport {
            no_planting,
            cropland,
            year,
            policy: ErrorPolicy::default(),
            output_path: PathBuf::from(TEMP_PATH),
        }
    }

    pub fn from_config(config: &ReportConfig, year: i32) -> Self {
        RegionReport::new(
            NoPlanting::from_config(config),
            TotalCropland::from_config(config),
            year,
        )
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_output_path(mut self, output_path: impl Into<PathBuf>) -> Self {
        self.output_path = output_path.into();
        self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }

    /// Both areas for one region: two remote reductions
    pub fn compute_region<P: RemotePlatform + ?Sized>(
        &self,
        platform: &P,
        region: &Region,
    ) -> Result<RegionAreas> {
        let no_planting_ha = self
            .no_planting
            .compute(platform, &region.geometry, self.year)?;
        let total_cropland_ha = self.cropland.compute(platform, &region.geometry)?;

        let areas = RegionAreas::from_hectares(region.clone(), no_planting_ha, total_cropland_ha);
        log::info!(
            "{}: no-planting {:.2} ha / cropland {:.2} ha ({})",
            areas.name(),
            areas.no_planting_area_ha,
            areas.total_cropland_area_ha,
            areas
                .percent_no_planting
                .map(|p| format!("{:.2}%", p))
                .unwrap_or_else(|| "no cropland".to_string())
        );
        Ok(areas)
    }

    /// Fail-fast build: the first failing region aborts the whole report.
    /// The input table is left untouched.
    pub fn build<P: RemotePlatform + ?Sized>(
        &self,
        platform: &P,
        regions: &RegionTable,
    ) -> Result<Vec<RegionAreas>> {
        log::info!(
            "Computing {} areas for {} regions",
            self.year,
            regions.len()
        );
        regions
            .iter()
            .map(|region| {
                self.compute_region(platform, region).map_err(|e| {
                    log::error!("Region '{}' failed, aborting report: {}", region.name, e);
                    e
                })
            })
            .collect()
    }

    /// Build honouring the configured [`ErrorPolicy`], one outcome per region.
    /// Under `FailFast` the returned list stops at the first failure.
    pub fn build_with_outcomes<P: RemotePlatform + ?Sized>(
        &self,
        platform: &P,
        regions: &RegionTable,
    ) -> Vec<RegionOutcome> {
        let mut outcomes = Vec::with_capacity(regions.len());
        for region in regions.iter() {
            match self.compute_region(platform, region) {
                Ok(areas) => outcomes.push(RegionOutcome::Computed(areas)),
                Err(error) => {
                    log::warn!("Region '{}' failed: {}", region.name, error);
                    outcomes.push(RegionOutcome::Failed {
                        region: region.clone(),
                        error,
                    });
                    if self.policy == ErrorPolicy::FailFast {
                        break;
                    }
                }
            }
        }
        outcomes
    }

    /// Write the augmented table as `{output_path}/{name}.geojson`
    pub fn to_geojson(&self, rows: &[RegionAreas], name: Option<&str>) -> AnyResult<PathBuf> {
        let name = name.unwrap_or("no_planting_report");
        std::fs::create_dir_all(&self.output_path)
            .with_context(|| format!("Failed to create directory: {:?}", self.output_path))?;
        let output_file = self.output_path.join(format!("{}.geojson", name));
        std::fs::write(&output_file, to_geojson(rows).to_string())
            .with_context(|| format!("Failed to write GeoJSON file: {:?}", output_file))?;
        log::info!("Report saved to: {:?}", output_file);
        Ok(output_file)
    }
}

/// One-shot report over `regions` for `year` with default calculator settings
pub fn build_report<P: RemotePlatform + ?Sized>(
    platform: &P,
    regions: &RegionTable,
    indicator: &ImageRef,
    index: &ImageRef,
    year: i32,
) -> Result<Vec<RegionAreas>> {
    RegionReport::new(
        NoPlanting::new(indicator.clone()),
        TotalCropland::new(index.clone()),
        year,
    )
    .build(platform, regions)
}

/// Augmented table as a FeatureCollection: original attributes plus the three columns
pub fn to_geojson(rows: &[RegionAreas]) -> GeoJson {
    let features = rows
        .iter()
        .map(|row| {
            let mut properties = row.region.properties.clone();
            properties.insert(NO_PLANTING_COLUMN.to_string(), Value::from(row.no_planting_area_ha));
            properties.insert(
                TOTAL_CROPLAND_COLUMN.to_string(),
                Value::from(row.total_cropland_area_ha),
            );
            properties.insert(
                PERCENT_NO_PLANTING_COLUMN.to_string(),
                row.percent_no_planting.map(Value::from).unwrap_or(Value::Null),
            );
            let mut feature = Feature::from(row.region.geometry.to_geojson());
            feature.properties = Some(properties);
            feature
        })
        .collect();

    GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// `name_column` plus the three columns; a missing percentage is an empty cell
#[cfg(feature = "csv")]
pub fn to_csv(rows: &[RegionAreas], name_column: &str, path: impl AsRef<Path>) -> AnyResult<()> {
    let path = path.as_ref();
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    writer
        .write_record([
            name_column,
            NO_PLANTING_COLUMN,
            TOTAL_CROPLAND_COLUMN,
            PERCENT_NO_PLANTING_COLUMN,
        ])
        .context("Failed to write CSV header")?;
    for row in rows {
        writer
            .serialize((
                row.name(),
                row.no_planting_area_ha,
                row.total_cropland_area_ha,
                row.percent_no_planting,
            ))
            .context("Failed to serialize CSV row")?;
    }
    writer.flush().context("Failed to flush CSV file")?;
    log::info!("Report saved to: {:?}", path);
    Ok(())
}

/// Summary table (`name_column` plus the three columns) as a polars DataFrame
#[cfg(feature = "polars")]
pub fn to_dataframe(rows: &[RegionAreas], name_column: &str) -> AnyResult<polars::prelude::DataFrame> {
    let names: Vec<&str> = rows.iter().map(RegionAreas::name).collect();
    let no_planting: Vec<f64> = rows.iter().map(|r| r.no_planting_area_ha).collect();
    let total: Vec<f64> = rows.iter().map(|r| r.total_cropland_area_ha).collect();
    let percent: Vec<Option<f64>> = rows.iter().map(|r| r.percent_no_planting).collect();

    let df = polars::df!(
        name_column => names,
        NO_PLANTING_COLUMN => no_planting,
        TOTAL_CROPLAND_COLUMN => total,
        PERCENT_NO_PLANTING_COLUMN => percent
    )
    .context("Failed to build report DataFrame")?;
    Ok(df)
}
