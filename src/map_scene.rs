//! Everything the map draws, built as plain data so the drawing code only
//! has to walk it. Coordinates here are in layer units (projected, before
//! the pan/zoom transform).

use std::time::Duration;

use geo::{Contains, MultiPolygon, Point};

use crate::data::{Incident, Severity};
use crate::geometry::{map_coords, WorldGeometry};
use crate::projection::{Mercator, ZoomTransform};

pub const DEEP_NAVY: (f64, f64, f64) = (
    0x1c as f64 / 255.0,
    0x10 as f64 / 255.0,
    0x53 as f64 / 255.0,
);
pub const VIBRANT_PURPLE: (f64, f64, f64) = (
    0xab as f64 / 255.0,
    0x39 as f64 / 255.0,
    0xdc as f64 / 255.0,
);
pub const OFF_WHITE: (f64, f64, f64) = (
    0xf5 as f64 / 255.0,
    0xf5 as f64 / 255.0,
    0xf5 as f64 / 255.0,
);
pub const HOVER_FILL: (f64, f64, f64) = (
    0xf1 as f64 / 255.0,
    0xf5 as f64 / 255.0,
    0xf9 as f64 / 255.0,
);

/// Static ring drawn around every High marker.
pub const DANGER_RING_RADIUS: f64 = 10.0;
/// Radius of the invisible click target around each marker.
pub const HIT_RADIUS: f64 = 20.0;
const GROW_IN: Duration = Duration::from_millis(500);
const GROW_FROM: f64 = 0.8;

/// Expanding, fading circle repeated forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub radius: (f64, f64),
    pub opacity: (f64, f64),
    pub period: Duration,
}

pub const HIGH_RIPPLE: Pulse = Pulse {
    radius: (10.0, 35.0),
    opacity: (1.0, 0.0),
    period: Duration::from_millis(2000),
};

pub const SELECTION_PULSE: Pulse = Pulse {
    radius: (14.0, 22.0),
    opacity: (1.0, 0.0),
    period: Duration::from_millis(1500),
};

impl Pulse {
    /// Radius and opacity at `elapsed` since the animation started.
    pub fn sample(&self, elapsed: Duration) -> (f64, f64) {
        let period = self.period.as_secs_f64();
        let t = if period > 0.0 {
            (elapsed.as_secs_f64() % period) / period
        } else {
            0.0
        };
        (lerp(self.radius, t), lerp(self.opacity, t))
    }
}

fn lerp((from, to): (f64, f64), t: f64) -> f64 {
    from + (to - from) * t
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSprite {
    pub id: String,
    pub severity: Severity,
    pub center: (f64, f64),
    pub selected: bool,
}

impl MarkerSprite {
    pub fn color(&self) -> (f64, f64, f64) {
        self.severity.color()
    }

    pub fn has_danger_ring(&self) -> bool {
        self.severity == Severity::High
    }

    /// Selected High markers show the selection pulse instead of the ripple.
    pub fn ripple(&self) -> Option<Pulse> {
        (self.severity == Severity::High && !self.selected).then_some(HIGH_RIPPLE)
    }

    pub fn selection_pulse(&self) -> Option<Pulse> {
        self.selected.then_some(SELECTION_PULSE)
    }

    /// Final radius of the core dot.
    pub fn core_radius(&self) -> f64 {
        let base = match self.severity {
            Severity::High => 8.0,
            Severity::Medium => 6.0,
            Severity::Low => 5.0,
        };
        if self.selected {
            base + 2.0
        } else {
            base
        }
    }

    /// Core radius while growing in after a rebuild.
    pub fn core_radius_at(&self, since_build: Duration) -> f64 {
        let t = (since_build.as_secs_f64() / GROW_IN.as_secs_f64()).min(1.0);
        self.core_radius() * lerp((GROW_FROM, 1.0), t)
    }
}

/// Whether anything in the marker layer still moves and needs new frames.
pub fn is_animating(markers: &[MarkerSprite], since_build: Duration) -> bool {
    since_build < GROW_IN
        || markers
            .iter()
            .any(|marker| marker.ripple().is_some() || marker.selection_pulse().is_some())
}

/// Markers in draw order: ascending severity so High ends up on top, input
/// order kept within a severity.
pub fn build_markers(
    incidents: &[Incident],
    selected: Option<&str>,
    projection: &Mercator,
) -> Vec<MarkerSprite> {
    let mut markers: Vec<MarkerSprite> = incidents
        .iter()
        .map(|incident| MarkerSprite {
            id: incident.id.clone(),
            severity: incident.severity,
            center: projection.project(incident.coordinates),
            selected: selected == Some(incident.id.as_str()),
        })
        .collect();
    markers.sort_by_key(|marker| marker.severity.rank());
    markers
}

/// Id of the topmost marker whose click target contains `screen`.
pub fn hit_test<'a>(
    markers: &'a [MarkerSprite],
    transform: &ZoomTransform,
    screen: (f64, f64),
) -> Option<&'a str> {
    let (x, y) = transform.invert(screen);
    markers
        .iter()
        .rev()
        .find(|marker| {
            let dx = marker.center.0 - x;
            let dy = marker.center.1 - y;
            (dx * dx + dy * dy).sqrt() <= HIT_RADIUS
        })
        .map(|marker| marker.id.as_str())
}

#[derive(Debug, Clone)]
pub struct CountryPath {
    pub name: String,
    pub shape: MultiPolygon<f64>,
}

pub fn project_countries(world: &WorldGeometry, projection: &Mercator) -> Vec<CountryPath> {
    world
        .countries
        .iter()
        .map(|country| CountryPath {
            name: country.name.clone(),
            shape: map_coords(&country.shape, |lng, lat| projection.project_raw(lng, lat)),
        })
        .collect()
}

/// Index of the country under a layer-space point.
pub fn country_at(countries: &[CountryPath], layer_point: (f64, f64)) -> Option<usize> {
    let point = Point::new(layer_point.0, layer_point.1);
    countries
        .iter()
        .position(|country| country.shape.contains(&point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Category, Coordinates};
    use crate::geometry::parse_world;

    fn incident(id: &str, severity: Severity, lng: f64, lat: f64) -> Incident {
        Incident {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            severity,
            category: Category::Other,
            location_name: String::new(),
            coordinates: Coordinates::new(lng, lat),
            date: "2025-01-01".to_string(),
            sources: Vec::new(),
        }
    }

    fn sample() -> Vec<Incident> {
        vec![
            incident("h1", Severity::High, 32.5, 30.0),
            incident("l1", Severity::Low, 4.1, 51.9),
            incident("m1", Severity::Medium, 121.5, 31.2),
            incident("h2", Severity::High, -79.9, 9.1),
            incident("l2", Severity::Low, 103.8, 1.3),
        ]
    }

    #[test]
    fn draw_order_is_ascending_severity_and_stable() {
        let markers = build_markers(&sample(), None, &Mercator::fit(800.0, 600.0));
        let ids: Vec<&str> = markers.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2", "m1", "h1", "h2"]);

        let ranks: Vec<u8> = markers.iter().map(|m| m.severity.rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn selected_high_marker_swaps_ripple_for_selection_pulse() {
        let markers = build_markers(&sample(), Some("h1"), &Mercator::fit(800.0, 600.0));
        let h1 = markers.iter().find(|m| m.id == "h1").unwrap();
        let h2 = markers.iter().find(|m| m.id == "h2").unwrap();

        assert!(h1.has_danger_ring());
        assert_eq!(h1.ripple(), None);
        assert_eq!(h1.selection_pulse(), Some(SELECTION_PULSE));

        assert_eq!(h2.ripple(), Some(HIGH_RIPPLE));
        assert_eq!(h2.selection_pulse(), None);
    }

    #[test]
    fn low_and_medium_have_no_ring_or_ripple() {
        let markers = build_markers(&sample(), Some("m1"), &Mercator::fit(800.0, 600.0));
        for marker in markers.iter().filter(|m| m.severity != Severity::High) {
            assert!(!marker.has_danger_ring());
            assert_eq!(marker.ripple(), None);
        }
        let m1 = markers.iter().find(|m| m.id == "m1").unwrap();
        assert!(m1.selection_pulse().is_some());
    }

    #[test]
    fn core_radius_encodes_severity_and_selection() {
        let markers = build_markers(&sample(), Some("l1"), &Mercator::fit(800.0, 600.0));
        let radius = |id: &str| markers.iter().find(|m| m.id == id).unwrap().core_radius();
        assert!(radius("h1") > radius("m1"));
        assert!(radius("m1") > radius("l2"));
        assert!(radius("l1") > radius("l2"));
    }

    #[test]
    fn core_radius_grows_in() {
        let marker = build_markers(&sample(), None, &Mercator::fit(800.0, 600.0))
            .pop()
            .unwrap();
        let full = marker.core_radius();
        assert!((marker.core_radius_at(Duration::ZERO) - full * 0.8).abs() < 1e-9);
        assert!((marker.core_radius_at(Duration::from_secs(3)) - full).abs() < 1e-9);
    }

    #[test]
    fn static_scene_stops_animating_after_grow_in() {
        let projection = Mercator::fit(800.0, 600.0);
        let calm = build_markers(
            &[incident("l", Severity::Low, 0.0, 0.0), incident("m", Severity::Medium, 1.0, 1.0)],
            None,
            &projection,
        );
        assert!(is_animating(&calm, Duration::from_millis(100)));
        assert!(!is_animating(&calm, Duration::from_secs(1)));

        let rippling = build_markers(&sample(), None, &projection);
        assert!(is_animating(&rippling, Duration::from_secs(60)));

        let lone = [incident("l", Severity::Low, 0.0, 0.0)];
        let selected = build_markers(&lone, Some("l"), &projection);
        assert!(is_animating(&selected, Duration::from_secs(60)));
    }

    #[test]
    fn pulses_cycle_from_start_to_end() {
        let (r, o) = HIGH_RIPPLE.sample(Duration::ZERO);
        assert_eq!((r, o), (10.0, 1.0));
        let (r, o) = HIGH_RIPPLE.sample(Duration::from_millis(1000));
        assert!((r - 22.5).abs() < 1e-9);
        assert!((o - 0.5).abs() < 1e-9);
        // Wraps after one period.
        assert_eq!(
            SELECTION_PULSE.sample(Duration::from_millis(1500)),
            SELECTION_PULSE.sample(Duration::ZERO)
        );
    }

    #[test]
    fn invalid_coordinates_render_at_origin() {
        let projection = Mercator::fit(800.0, 600.0);
        let markers = build_markers(
            &[incident("bad", Severity::Low, 500.0, 500.0)],
            None,
            &projection,
        );
        assert_eq!(markers[0].center, projection.project(Coordinates::ORIGIN));
    }

    #[test]
    fn hit_test_prefers_topmost_marker() {
        let projection = Mercator::fit(800.0, 600.0);
        let stacked = vec![
            incident("low", Severity::Low, 10.0, 10.0),
            incident("high", Severity::High, 10.0, 10.0),
        ];
        let markers = build_markers(&stacked, None, &projection);
        let at = projection.project(Coordinates::new(10.0, 10.0));

        assert_eq!(hit_test(&markers, &ZoomTransform::IDENTITY, at), Some("high"));
        assert_eq!(
            hit_test(&markers, &ZoomTransform::IDENTITY, (at.0 + 50.0, at.1)),
            None
        );
    }

    #[test]
    fn hit_test_accounts_for_zoom() {
        let projection = Mercator::fit(800.0, 600.0);
        let markers = build_markers(&sample(), None, &projection);
        let transform = ZoomTransform::IDENTITY.zoom_at(4.0, (400.0, 300.0), 800.0, 600.0);
        let target = markers.iter().find(|m| m.id == "m1").unwrap();
        let screen = transform.apply(target.center);
        assert_eq!(hit_test(&markers, &transform, screen), Some("m1"));
    }

    #[test]
    fn finds_country_under_point() {
        let world = parse_world(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"name": "Box"},
                 "geometry": {"type": "Polygon",
                              "coordinates": [[[0,0],[20,0],[20,20],[0,20],[0,0]]]}}
            ]}"#,
        )
        .unwrap();
        let projection = Mercator::fit(800.0, 600.0);
        let countries = project_countries(&world, &projection);

        let inside = projection.project(Coordinates::new(10.0, 10.0));
        let outside = projection.project(Coordinates::new(-40.0, 10.0));
        assert_eq!(country_at(&countries, inside), Some(0));
        assert_eq!(country_at(&countries, outside), None);
    }
}
