use anyhow::{Context, Result};
use rscropland::collect::global_variables::get_temp_path;
use rscropland::geometric::report::to_csv;
use rscropland::{EeCollect, RegionReport, RegionTable, ReportConfig};

/// Example: no-planting vs total cropland per Sudan state (ADM1) for 2023
///
/// Expects `./config.json` (see `config.example.json`) and the ADM1
/// boundaries as GeoJSON. Credentials come from `EE_ACCESS_TOKEN` / `EE_PROJECT`.
fn main() -> Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ReportConfig::from_file("./config.json")
        .context("Failed to load ./config.json")?
        .apply_env();
    config.validate()?;

    let regions = RegionTable::from_file("./data/sdn_adm1.geojson", &config.name_property)?
        .to_wgs84()?;
    println!("Loaded {} states", regions.len());

    let platform = EeCollect::initialize(&config.platform)?;
    let report = RegionReport::from_config(&config, 2023).with_output_path(get_temp_path());
    let rows = report.build(&platform, &regions);
    platform.close();
    let rows = rows?;

    for row in &rows {
        println!(
            "{:<20} {:>12.2} {:>12.2} {:>8}",
            row.name(),
            row.no_planting_area_ha,
            row.total_cropland_area_ha,
            row.percent_no_planting
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    let geojson_path = report.to_geojson(&rows, Some("sdn_adm1_no_planting_2023"))?;
    let csv_path = report.get_output_path().join("sdn_adm1_no_planting_2023.csv");
    to_csv(&rows, regions.name_property(), &csv_path)?;

    println!("\nSaved: {:?}, {:?}", geojson_path, csv_path);
    Ok(())
}
