//! World boundaries used as the map's background layer.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::GeoJson;

use crate::error::GeometryError;

#[derive(Debug, Clone)]
pub struct Country {
    pub name: String,
    /// Outlines in geographic degrees (x = longitude, y = latitude).
    pub shape: MultiPolygon<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct WorldGeometry {
    pub countries: Vec<Country>,
}

pub async fn fetch_world(url: &str) -> Result<WorldGeometry, GeometryError> {
    log::info!("Fetching world geometry from {url}");
    let text = reqwest::get(url).await?.error_for_status()?.text().await?;
    let world = parse_world(&text)?;
    log::info!("Loaded {} country outlines", world.countries.len());
    Ok(world)
}

/// Parses a GeoJSON document. Features that are not polygons are skipped.
pub fn parse_world(text: &str) -> Result<WorldGeometry, GeometryError> {
    let features = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => Vec::new(),
    };

    let countries = features
        .into_iter()
        .filter_map(|feature| {
            let name = feature
                .property("name")
                .and_then(|value| value.as_str())
                .unwrap_or_default()
                .to_string();
            let geometry = feature.geometry?;

            let shape = match geo::Geometry::<f64>::try_from(geometry) {
                Ok(geo::Geometry::Polygon(polygon)) => MultiPolygon::new(vec![polygon]),
                Ok(geo::Geometry::MultiPolygon(multi)) => multi,
                Ok(_) => return None,
                Err(e) => {
                    log::warn!("Skipping feature {name}: {e}");
                    return None;
                }
            };

            Some(Country { name, shape })
        })
        .collect();

    Ok(WorldGeometry { countries })
}

/// Applies `f` to every vertex, keeping ring structure.
pub fn map_coords(
    shape: &MultiPolygon<f64>,
    mut f: impl FnMut(f64, f64) -> (f64, f64),
) -> MultiPolygon<f64> {
    let mut ring = |line: &LineString<f64>| -> LineString<f64> {
        line.coords()
            .map(|c| {
                let (x, y) = f(c.x, c.y);
                Coord { x, y }
            })
            .collect()
    };

    shape
        .iter()
        .map(|polygon| {
            let exterior = ring(polygon.exterior());
            let interiors = polygon.interiors().iter().map(&mut ring).collect();
            Polygon::new(exterior, interiors)
        })
        .collect()
}
