use serde_json::{json, Map, Value};

use crate::geometric::region::RegionGeometry;

/// Reference to a remote raster asset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub asset_id: String,
}

impl ImageRef {
    pub fn new(asset_id: impl Into<String>) -> Self {
        ImageRef {
            asset_id: asset_id.into(),
        }
    }
}

/// Server-side image expression
///
/// Only the operations the area reductions need are modelled. Each variant
/// maps onto one Earth Engine algorithm invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `Image.load`
    Load(ImageRef),
    /// `Image.pixelArea`: area of each pixel in m², projection-aware
    PixelArea,
    /// `Image.constant`
    Constant(f64),
    /// `Image.select`
    Select { input: Box<Expression>, band: String },
    /// `Image.multiply`
    Multiply(Box<Expression>, Box<Expression>),
    /// `Image.gt`: 1 where the left image is strictly greater than the right
    GreaterThan(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn load(image: &ImageRef) -> Self {
        Expression::Load(image.clone())
    }

    pub fn select(self, band: impl Into<String>) -> Self {
        Expression::Select {
            input: Box::new(self),
            band: band.into(),
        }
    }

    pub fn multiply(self, other: Expression) -> Self {
        Expression::Multiply(Box::new(self), Box::new(other))
    }

    pub fn gt(self, threshold: f64) -> Self {
        Expression::GreaterThan(Box::new(self), Box::new(Expression::Constant(threshold)))
    }

    /// Asset the expression is rooted at (left-most load)
    pub fn source(&self) -> Option<&ImageRef> {
        match self {
            Expression::Load(image) => Some(image),
            Expression::PixelArea | Expression::Constant(_) => None,
            Expression::Select { input, .. } => input.source(),
            Expression::Multiply(left, right) | Expression::GreaterThan(left, right) => {
                left.source().or_else(|| right.source())
            }
        }
    }

    /// Band the result is named after. Binary operations keep the left operand's name.
    pub fn output_band(&self) -> Option<&str> {
        match self {
            Expression::Select { band, .. } => Some(band),
            Expression::Multiply(left, _) | Expression::GreaterThan(left, _) => left.output_band(),
            Expression::Load(_) | Expression::PixelArea | Expression::Constant(_) => None,
        }
    }

    /// Serialize as an Earth Engine `ValueNode`
    pub fn to_value_node(&self) -> Value {
        match self {
            Expression::Load(image) => invocation("Image.load", [("id", constant(json!(image.asset_id)))]),
            Expression::PixelArea => invocation("Image.pixelArea", []),
            Expression::Constant(value) => invocation("Image.constant", [("value", constant(json!(value)))]),
            Expression::Select { input, band } => invocation(
                "Image.select",
                [
                    ("input", input.to_value_node()),
                    ("bandSelectors", constant(json!([band]))),
                ],
            ),
            Expression::Multiply(left, right) => invocation(
                "Image.multiply",
                [("image1", left.to_value_node()), ("image2", right.to_value_node())],
            ),
            Expression::GreaterThan(left, right) => invocation(
                "Image.gt",
                [("image1", left.to_value_node()), ("image2", right.to_value_node())],
            ),
        }
    }
}

/// `Image.reduceRegion` with `Reducer.sum` over one geometry
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub image: Expression,
    pub geometry: RegionGeometry,
    /// Nominal scale in meters/pixel
    pub scale: f64,
    pub tile_scale: u32,
}

impl Reduction {
    pub fn sum(image: Expression, geometry: RegionGeometry, scale: f64, tile_scale: u32) -> Self {
        Reduction {
            image,
            geometry,
            scale,
            tile_scale,
        }
    }

    pub fn to_value_node(&self) -> Value {
        invocation(
            "Image.reduceRegion",
            [
                ("image", self.image.to_value_node()),
                ("reducer", invocation("Reducer.sum", [])),
                ("geometry", geometry_node(&self.geometry)),
                ("scale", constant(json!(self.scale))),
                ("tileScale", constant(json!(self.tile_scale))),
            ],
        )
    }
}

/// `Image.bandNames` of a loaded asset
pub fn band_names_node(image: &ImageRef) -> Value {
    invocation("Image.bandNames", [("image", Expression::load(image).to_value_node())])
}

/// Wrap a value node in the request body of `value:compute`
pub fn compute_request(node: Value) -> Value {
    json!({
        "expression": {
            "result": "0",
            "values": { "0": node }
        }
    })
}

fn geometry_node(geometry: &RegionGeometry) -> Value {
    let (function, coordinates) = match geometry {
        RegionGeometry::Polygon(polygon) => (
            "GeometryConstructors.Polygon",
            json!(polygon_rings(polygon)),
        ),
        RegionGeometry::MultiPolygon(multi) => (
            "GeometryConstructors.MultiPolygon",
            json!(multi.0.iter().map(polygon_rings).collect::<Vec<_>>()),
        ),
    };
    invocation(
        function,
        [
            ("coordinates", constant(coordinates)),
            ("evenOdd", constant(json!(true))),
        ],
    )
}

fn polygon_rings(polygon: &geo::Polygon<f64>) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(|ring| ring.coords().map(|c| [c.x, c.y]).collect())
        .collect()
}

fn constant(value: Value) -> Value {
    json!({ "constantValue": value })
}

fn invocation<const N: usize>(function: &str, arguments: [(&str, Value); N]) -> Value {
    let arguments: Map<String, Value> = arguments
        .into_iter()
        .map(|(name, node)| (name.to_string(), node))
        .collect();
    json!({
        "functionInvocationValue": {
            "functionName": function,
            "arguments": arguments
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> RegionGeometry {
        RegionGeometry::Polygon(polygon![
            (x: 30.0, y: 12.0),
            (x: 31.0, y: 12.0),
            (x: 31.0, y: 13.0),
            (x: 30.0, y: 13.0),
            (x: 30.0, y: 12.0),
        ])
    }

    #[test]
    fn test_cropland_expression_shape() {
        let image = ImageRef::new("projects/demo/assets/evi");
        let expr = Expression::load(&image)
            .select("EVI")
            .gt(0.0)
            .multiply(Expression::PixelArea);

        assert_eq!(expr.source(), Some(&image));
        assert_eq!(expr.output_band(), Some("EVI"));

        let node = expr.to_value_node();
        let call = &node["functionInvocationValue"];
        assert_eq!(call["functionName"], "Image.multiply");
        assert_eq!(call["arguments"]["image1"]["functionInvocationValue"]["functionName"], "Image.gt");
        assert_eq!(
            call["arguments"]["image2"]["functionInvocationValue"]["functionName"],
            "Image.pixelArea"
        );
    }

    #[test]
    fn test_reduction_node_carries_scale_and_tiles() {
        let image = ImageRef::new("projects/demo/assets/no_planting");
        let reduction = Reduction::sum(
            Expression::load(&image).select("EVI_Z_Score_2023").multiply(Expression::PixelArea),
            square(),
            1500.0,
            16,
        );
        let node = reduction.to_value_node();
        let args = &node["functionInvocationValue"]["arguments"];
        assert_eq!(args["scale"]["constantValue"], 1500.0);
        assert_eq!(args["tileScale"]["constantValue"], 16);
        assert_eq!(args["reducer"]["functionInvocationValue"]["functionName"], "Reducer.sum");

        let geometry = &args["geometry"]["functionInvocationValue"];
        assert_eq!(geometry["functionName"], "GeometryConstructors.Polygon");
        let ring = &geometry["arguments"]["coordinates"]["constantValue"][0];
        assert_eq!(ring.as_array().unwrap().len(), 5);
        assert_eq!(ring[1], json!([31.0, 12.0]));
    }

    #[test]
    fn test_compute_request_envelope() {
        let body = compute_request(band_names_node(&ImageRef::new("a/b")));
        assert_eq!(body["expression"]["result"], "0");
        let call = &body["expression"]["values"]["0"]["functionInvocationValue"];
        assert_eq!(call["functionName"], "Image.bandNames");
        assert_eq!(
            call["arguments"]["image"]["functionInvocationValue"]["arguments"]["id"]["constantValue"],
            "a/b"
        );
    }
}
