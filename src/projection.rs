//! Mercator projection fitted to the map canvas, and the pan/zoom transform
//! layered on top of it.

use std::f64::consts::FRAC_PI_4;

use crate::data::Coordinates;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 8.0;
const SCALE_DIVISOR: f64 = 6.5;
const CENTER: Coordinates = Coordinates { lng: 0.0, lat: 30.0 };
/// Latitude at which the Mercator square ends.
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mercator {
    pub scale: f64,
    pub center: Coordinates,
    pub translate: (f64, f64),
}

impl Mercator {
    /// Projection parameters for a canvas of the given size.
    pub fn fit(width: f64, height: f64) -> Self {
        Self {
            scale: width / SCALE_DIVISOR,
            center: CENTER,
            translate: (width / 2.0, height / 2.0),
        }
    }

    /// Projects to canvas units. Invalid coordinates land on the geographic
    /// origin instead.
    pub fn project(&self, coordinates: Coordinates) -> (f64, f64) {
        let coordinates = if coordinates.is_valid() {
            coordinates
        } else {
            Coordinates::ORIGIN
        };
        self.project_raw(coordinates.lng, coordinates.lat)
    }

    pub fn project_raw(&self, lng: f64, lat: f64) -> (f64, f64) {
        let (x, y) = mercator(lng, lat);
        let (cx, cy) = mercator(self.center.lng, self.center.lat);
        (
            self.translate.0 + self.scale * (x - cx),
            self.translate.1 - self.scale * (y - cy),
        )
    }
}

fn mercator(lng: f64, lat: f64) -> (f64, f64) {
    let lambda = lng.to_radians();
    let phi = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (lambda, (FRAC_PI_4 + phi / 2.0).tan().ln())
}

/// Uniform scale + translation applied to the whole country and marker
/// layer. Screen = layer * k + (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        k: 1.0,
        x: 0.0,
        y: 0.0,
    };

    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        (point.0 * self.k + self.x, point.1 * self.k + self.y)
    }

    pub fn invert(&self, point: (f64, f64)) -> (f64, f64) {
        ((point.0 - self.x) / self.k, (point.1 - self.y) / self.k)
    }

    /// Translates by a screen-space delta, clamped to the canvas extent.
    pub fn pan_by(&self, dx: f64, dy: f64, width: f64, height: f64) -> Self {
        Self {
            k: self.k,
            x: self.x + dx,
            y: self.y + dy,
        }
        .constrain(width, height)
    }

    /// Zooms by `factor` keeping the layer point under `anchor` fixed.
    pub fn zoom_at(&self, factor: f64, anchor: (f64, f64), width: f64, height: f64) -> Self {
        let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (lx, ly) = self.invert(anchor);
        Self {
            k,
            x: anchor.0 - lx * k,
            y: anchor.1 - ly * k,
        }
        .constrain(width, height)
    }

    /// Keeps the canvas rectangle fully covered by the zoomed layer.
    pub fn constrain(&self, width: f64, height: f64) -> Self {
        let k = self.k.clamp(MIN_ZOOM, MAX_ZOOM);
        let min_x = width * (1.0 - k);
        let min_y = height * (1.0 - k);
        Self {
            k,
            x: self.x.clamp(min_x, 0.0),
            y: self.y.clamp(min_y, 0.0),
        }
    }
}

/// Converts a scroll delta (positive = away from the user) into a zoom
/// factor, one notch doubling or halving at `step = 1`.
pub fn scroll_zoom_factor(delta_y: f64, step: f64) -> f64 {
    2f64.powf(-delta_y * step)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn center_projects_to_canvas_middle() {
        let projection = Mercator::fit(800.0, 600.0);
        let (x, y) = projection.project(Coordinates::new(0.0, 30.0));
        assert!(approx(x, 400.0));
        assert!(approx(y, 300.0));
    }

    #[test]
    fn scale_follows_width() {
        let projection = Mercator::fit(1300.0, 600.0);
        assert!(approx(projection.scale, 200.0));
    }

    #[test]
    fn north_is_up_and_east_is_right() {
        let projection = Mercator::fit(800.0, 600.0);
        let origin = projection.project(Coordinates::ORIGIN);
        let north_east = projection.project(Coordinates::new(10.0, 10.0));
        assert!(north_east.0 > origin.0);
        assert!(north_east.1 < origin.1);
    }

    #[test]
    fn invalid_coordinates_degrade_to_origin() {
        let projection = Mercator::fit(800.0, 600.0);
        let origin = projection.project(Coordinates::ORIGIN);
        assert_eq!(projection.project(Coordinates::new(200.0, 10.0)), origin);
        assert_eq!(projection.project(Coordinates::new(f64::NAN, 10.0)), origin);
    }

    #[test]
    fn poles_stay_finite() {
        let projection = Mercator::fit(800.0, 600.0);
        let (_, y) = projection.project(Coordinates::new(0.0, 90.0));
        assert!(y.is_finite());
    }

    #[test]
    fn zoom_is_clamped_to_range() {
        let t = ZoomTransform::IDENTITY.zoom_at(100.0, (400.0, 300.0), 800.0, 600.0);
        assert!(approx(t.k, MAX_ZOOM));
        let t = t.zoom_at(0.001, (400.0, 300.0), 800.0, 600.0);
        assert!(approx(t.k, MIN_ZOOM));
        assert_eq!(t, ZoomTransform::IDENTITY);
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let t = ZoomTransform::IDENTITY.zoom_at(2.0, (400.0, 300.0), 800.0, 600.0);
        let (x, y) = t.apply((400.0, 300.0));
        assert!(approx(x, 400.0));
        assert!(approx(y, 300.0));
    }

    #[test]
    fn pan_cannot_expose_outside_canvas() {
        let t = ZoomTransform::IDENTITY.pan_by(50.0, -50.0, 800.0, 600.0);
        assert_eq!(t, ZoomTransform::IDENTITY);

        let zoomed = ZoomTransform::IDENTITY.zoom_at(2.0, (0.0, 0.0), 800.0, 600.0);
        let t = zoomed.pan_by(-10_000.0, -10_000.0, 800.0, 600.0);
        assert!(approx(t.x, -800.0));
        assert!(approx(t.y, -600.0));
    }

    #[test]
    fn invert_undoes_apply() {
        let t = ZoomTransform { k: 3.0, x: -120.0, y: -40.0 };
        let (x, y) = t.invert(t.apply((12.5, 99.0)));
        assert!(approx(x, 12.5));
        assert!(approx(y, 99.0));
    }

    #[test]
    fn scroll_direction_maps_to_zoom() {
        assert!(scroll_zoom_factor(-1.0, 0.5) > 1.0);
        assert!(scroll_zoom_factor(1.0, 0.5) < 1.0);
        assert!(approx(scroll_zoom_factor(0.0, 0.5), 1.0));
    }
}
