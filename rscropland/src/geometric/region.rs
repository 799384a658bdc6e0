use geo::{MultiPolygon, Polygon};
use geojson::{Feature, GeoJson};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{CroplandError, Result};
use crate::geo_core::{BoundingBox, GeoCore};

/// Region boundary as sent to the platform (WGS84 lon/lat)
#[derive(Debug, Clone, PartialEq)]
pub enum RegionGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl RegionGeometry {
    /// Convert a GeoJSON geometry, rejecting anything that is not a (multi)polygon
    pub fn from_geojson(geometry: &geojson::Geometry, region: &str) -> Result<Self> {
        let invalid = |message: String| CroplandError::InvalidGeometry {
            region: region.to_string(),
            message,
        };
        let geom: geo::Geometry<f64> = geometry
            .clone()
            .try_into()
            .map_err(|e: geojson::Error| invalid(e.to_string()))?;

        let geometry = match geom {
            geo::Geometry::Polygon(p) => RegionGeometry::Polygon(p),
            geo::Geometry::MultiPolygon(mp) => RegionGeometry::MultiPolygon(mp),
            other => {
                return Err(invalid(format!(
                    "expected Polygon or MultiPolygon, got {}",
                    geometry_kind(&other)
                )))
            }
        };
        if geometry.is_empty() {
            return Err(invalid("geometry has no coordinates".to_string()));
        }
        Ok(geometry)
    }

    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        match self {
            RegionGeometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
            RegionGeometry::MultiPolygon(mp) => mp.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            RegionGeometry::Polygon(p) => p.exterior().0.is_empty(),
            RegionGeometry::MultiPolygon(mp) => mp.0.iter().all(|p| p.exterior().0.is_empty()),
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(&self.to_multi_polygon())
    }

    /// Reproject to WGS84, keeping the simple/multi distinction
    pub fn to_wgs84(self, geo_core: &GeoCore) -> Result<Self> {
        if geo_core.is_wgs84() {
            return Ok(self);
        }
        let was_polygon = matches!(self, RegionGeometry::Polygon(_));
        let mut reprojected = geo_core.to_wgs84(self.to_multi_polygon())?;
        if was_polygon && reprojected.0.len() == 1 {
            if let Some(polygon) = reprojected.0.pop() {
                return Ok(RegionGeometry::Polygon(polygon));
            }
        }
        Ok(RegionGeometry::MultiPolygon(reprojected))
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        match self {
            RegionGeometry::Polygon(p) => geojson::Geometry::new(geojson::Value::from(p)),
            RegionGeometry::MultiPolygon(mp) => geojson::Geometry::new(geojson::Value::from(mp)),
        }
    }
}

fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

/// One administrative region record
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub geometry: RegionGeometry,
    /// Original attributes, carried through to the report untouched
    pub properties: Map<String, Value>,
}

/// Ordered administrative-boundary table
#[derive(Debug, Clone)]
pub struct RegionTable {
    pub regions: Vec<Region>,
    pub geo_core: GeoCore,
    name_property: String,
}

impl RegionTable {
    pub fn name_property(&self) -> &str {
        &self.name_property
    }

    /// Parse a GeoJSON FeatureCollection, naming rows by `name_property`
    pub fn from_geojson_str(content: &str, name_property: &str) -> Result<Self> {
        let geojson: GeoJson = content
            .parse()
            .map_err(|e: geojson::Error| {
                CroplandError::InvalidTable(format!("failed to parse GeoJSON: {e}"))
            })?;
        Self::from_geojson(geojson, name_property)
    }

    pub fn from_file(path: impl AsRef<Path>, name_property: &str) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_geojson_str(&content, name_property)?;
        log::info!("Loaded {} regions from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn from_geojson(geojson: GeoJson, name_property: &str) -> Result<Self> {
        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(_) => {
                return Err(CroplandError::InvalidTable(
                    "expected a Feature or FeatureCollection, got a bare Geometry".to_string(),
                ))
            }
        };

        let regions = features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| Self::region_from_feature(index, feature, name_property))
            .collect::<Result<Vec<_>>>()?;

        Ok(RegionTable {
            regions,
            geo_core: GeoCore::default(),
            name_property: name_property.to_string(),
        })
    }

    fn region_from_feature(index: usize, feature: Feature, name_property: &str) -> Result<Region> {
        let properties = feature.properties.unwrap_or_default();
        let name = match properties.get(name_property) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(CroplandError::InvalidRegion {
                    index,
                    message: format!("missing '{}' attribute", name_property),
                })
            }
        };
        let geometry = feature
            .geometry
            .as_ref()
            .ok_or_else(|| CroplandError::InvalidGeometry {
                region: name.clone(),
                message: "feature has no geometry".to_string(),
            })
            .and_then(|g| RegionGeometry::from_geojson(g, &name))?;

        Ok(Region {
            name,
            geometry,
            properties,
        })
    }

    /// Declare the CRS the coordinates are expressed in
    pub fn with_epsg(mut self, epsg: i32) -> Self {
        self.geo_core.set_epsg(epsg);
        self
    }

    /// Table with every geometry reprojected to WGS84
    pub fn to_wgs84(self) -> Result<Self> {
        if self.geo_core.is_wgs84() {
            return Ok(self);
        }
        log::info!(
            "Reprojecting {} regions from EPSG:{} to EPSG:4326",
            self.regions.len(),
            self.geo_core.get_epsg()
        );
        let geo_core = self.geo_core;
        let regions = self
            .regions
            .into_iter()
            .map(|region| {
                Ok(Region {
                    geometry: region.geometry.to_wgs84(&geo_core)?,
                    ..region
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RegionTable {
            regions,
            geo_core: GeoCore::default(),
            name_property: self.name_property,
        })
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const STATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "State_En": "Gezira", "ADM1_PCODE": "SD07" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[32.5, 13.5], [33.5, 13.5], [33.5, 15.0], [32.5, 15.0], [32.5, 13.5]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "State_En": "Red Sea", "ADM1_PCODE": "SD03" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[36.0, 18.0], [38.0, 18.0], [38.0, 22.0], [36.0, 22.0], [36.0, 18.0]]],
                        [[[37.2, 19.5], [37.4, 19.5], [37.4, 19.7], [37.2, 19.5]]]
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn test_load_feature_collection_in_order() {
        let table = RegionTable::from_geojson_str(STATES, "State_En").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.regions[0].name, "Gezira");
        assert_eq!(table.regions[1].name, "Red Sea");
        assert!(matches!(table.regions[0].geometry, RegionGeometry::Polygon(_)));
        assert!(matches!(table.regions[1].geometry, RegionGeometry::MultiPolygon(_)));
        assert_eq!(table.regions[0].properties["ADM1_PCODE"], "SD07");
        assert_eq!(table.name_property(), "State_En");
    }

    #[test]
    fn test_missing_name_property() {
        let err = RegionTable::from_geojson_str(STATES, "ADM1_EN").unwrap_err();
        assert!(matches!(err, CroplandError::InvalidRegion { index: 0, .. }));
    }

    #[test]
    fn test_malformed_document_is_a_table_error() {
        let err = RegionTable::from_geojson_str(r#"{"type": "FeatureCollection", "features": ["#, "State_En")
            .unwrap_err();
        assert!(matches!(err, CroplandError::InvalidTable(ref m) if m.contains("parse")));
    }

    #[test]
    fn test_bare_geometry_is_a_table_error() {
        let content = r#"{ "type": "Point", "coordinates": [32.53, 15.59] }"#;
        let err = RegionTable::from_geojson_str(content, "State_En").unwrap_err();
        assert!(matches!(err, CroplandError::InvalidTable(_)));
    }

    #[test]
    fn test_rejects_point_geometry() {
        let content = r#"{
            "type": "Feature",
            "properties": { "State_En": "Khartoum" },
            "geometry": { "type": "Point", "coordinates": [32.53, 15.59] }
        }"#;
        let err = RegionTable::from_geojson_str(content, "State_En").unwrap_err();
        match err {
            CroplandError::InvalidGeometry { region, message } => {
                assert_eq!(region, "Khartoum");
                assert!(message.contains("Point"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_missing_geometry() {
        let content = r#"{
            "type": "Feature",
            "properties": { "State_En": "Khartoum" },
            "geometry": null
        }"#;
        let err = RegionTable::from_geojson_str(content, "State_En").unwrap_err();
        assert!(matches!(err, CroplandError::InvalidGeometry { .. }));
    }

    #[test]
    fn test_bounding_box() {
        let table = RegionTable::from_geojson_str(STATES, "State_En").unwrap();
        let bbox = table.regions[1].geometry.bounding_box().unwrap();
        assert_eq!(bbox, BoundingBox::new(36.0, 18.0, 38.0, 22.0));
    }

    #[test]
    fn test_wgs84_table_is_unchanged() {
        let table = RegionTable::from_geojson_str(STATES, "State_En").unwrap();
        let before = table.regions.clone();
        let after = table.to_wgs84().unwrap();
        assert_eq!(after.regions, before);
    }

    #[test]
    fn test_geometry_roundtrips_to_geojson() {
        let table = RegionTable::from_geojson_str(STATES, "State_En").unwrap();
        let geometry = &table.regions[0].geometry;
        let back = RegionGeometry::from_geojson(&geometry.to_geojson(), "Gezira").unwrap();
        assert_eq!(&back, geometry);
    }

    /// One-degree square at the origin, in EPSG:3857 meters
    const MERCATOR_STATE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "State_En": "Null Island" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [0.0, 0.0],
                        [111319.49079327357, 0.0],
                        [111319.49079327357, 111325.14286638486],
                        [0.0, 111325.14286638486],
                        [0.0, 0.0]
                    ]]
                }
            }
        ]
    }"#;

    #[cfg(feature = "proj")]
    #[test]
    fn test_reproject_web_mercator_table() {
        let table = RegionTable::from_geojson_str(MERCATOR_STATE, "State_En")
            .unwrap()
            .with_epsg(3857)
            .to_wgs84()
            .unwrap();

        assert!(table.geo_core.is_wgs84());
        assert_eq!(table.name_property(), "State_En");
        let region = &table.regions[0];
        assert_eq!(region.name, "Null Island");
        assert!(matches!(region.geometry, RegionGeometry::Polygon(_)));

        let bbox = region.geometry.bounding_box().unwrap();
        approx::assert_abs_diff_eq!(bbox.min_x, 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(bbox.min_y, 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(bbox.max_x, 1.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(bbox.max_y, 1.0, epsilon = 1e-6);
    }

    #[cfg(not(feature = "proj"))]
    #[test]
    fn test_projected_table_needs_proj_feature() {
        let err = RegionTable::from_geojson_str(MERCATOR_STATE, "State_En")
            .unwrap()
            .with_epsg(3857)
            .to_wgs84()
            .unwrap_err();
        assert!(matches!(err, CroplandError::Projection(_)));
    }
}
