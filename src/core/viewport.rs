use crate::core::geo::{LatLng, LatLngBounds, Point, EARTH_RADIUS};
use crate::core::constants::TILE_SIZE;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Hard panning extent; the visible area never leaves it
    max_bounds: Option<LatLngBounds>,
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 19.0),
            size,
            min_zoom: 0.0,
            max_zoom: 19.0,
            max_bounds: None,
        }
    }

    /// Sets the panning extent and pulls the current center inside it
    pub fn set_max_bounds(&mut self, bounds: Option<LatLngBounds>) {
        self.max_bounds = bounds;
        self.center = self.clamp_center(self.center);
    }

    pub fn max_bounds(&self) -> Option<&LatLngBounds> {
        self.max_bounds.as_ref()
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.center = self.clamp_center(center);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.center = self.clamp_center(self.center);
    }

    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.center = self.clamp_center(self.center);
    }

    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self.center = self.clamp_center(self.center);
    }

    /// Integer zoom used to pick tiles
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.round().clamp(0.0, 30.0) as u8
    }

    /// Projects a LatLng to world pixel coordinates (EPSG:3857) at the given zoom
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let scale = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let m = lat_lng.to_mercator();
        let world = 2.0 * PI * EARTH_RADIUS;

        Point::new(
            (m.x + PI * EARTH_RADIUS) / world * scale,
            (-m.y + PI * EARTH_RADIUS) / world * scale,
        )
    }

    /// Inverse of [`Viewport::project`]
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let scale = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let world = 2.0 * PI * EARTH_RADIUS;
        let x = pixel.x / scale * world - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - pixel.y / scale * world;

        LatLng::from_mercator(Point::new(x, y))
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let world = self.project(lat_lng, None);
        let center = self.project(&self.center, None);
        world
            .subtract(&center)
            .add(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let center = self.project(&self.center, None);
        let world = pixel
            .subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
            .add(&center);
        self.unproject(&world, None)
    }

    /// Pans the viewport by a pixel offset (drag direction), clamped to the extent
    pub fn pan(&mut self, delta: Point) {
        let center = self.project(&self.center, None).subtract(&delta);
        let center = self.unproject(&center, None);
        self.set_center(center);
    }

    /// Zooms to `zoom`, keeping the geographic point under `focus` stationary
    pub fn zoom_to(&mut self, zoom: f64, focus: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus {
            Some(focus) => {
                let anchor = self.pixel_to_lat_lng(&focus);
                self.zoom = new_zoom;
                let moved = self.lat_lng_to_pixel(&anchor);
                self.pan(focus.subtract(&moved));
            }
            None => {
                self.zoom = new_zoom;
                self.center = self.clamp_center(self.center);
            }
        }
    }

    /// Geographic bounds currently visible
    pub fn bounds(&self) -> LatLngBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&self.size);
        LatLngBounds::new(LatLng::new(se.lat, nw.lng), LatLng::new(nw.lat, se.lng))
    }

    /// Keeps the whole visible area inside `max_bounds`. On an axis where the
    /// viewport is larger than the extent, the extent is centered instead.
    fn clamp_center(&self, center: LatLng) -> LatLng {
        let Some(bounds) = &self.max_bounds else {
            return LatLng::new(LatLng::clamp_lat(center.lat), center.lng.clamp(-180.0, 180.0));
        };

        let nw = self.project(&LatLng::new(bounds.north_east.lat, bounds.south_west.lng), None);
        let se = self.project(&LatLng::new(bounds.south_west.lat, bounds.north_east.lng), None);
        let (half_w, half_h) = (self.size.x / 2.0, self.size.y / 2.0);

        let pixel = self.project(&center, None);
        let x = clamp_axis(pixel.x, nw.x + half_w, se.x - half_w);
        let y = clamp_axis(pixel.y, nw.y + half_h, se.y - half_h);
        if x == pixel.x && y == pixel.y {
            center
        } else {
            self.unproject(&Point::new(x, y), None)
        }
    }
}

fn clamp_axis(value: f64, min: f64, max: f64) -> f64 {
    if min > max {
        (min + max) / 2.0
    } else {
        value.clamp(min, max)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_pixel_maps_to_center() {
        let viewport = Viewport::new(LatLng::new(46.21, 16.42), 14.0, Point::new(1000.0, 800.0));
        let center = viewport.pixel_to_lat_lng(&Point::new(500.0, 400.0));
        assert!((center.lat - 46.21).abs() < 1e-9);
        assert!((center.lng - 16.42).abs() < 1e-9);

        let pixel = viewport.lat_lng_to_pixel(&LatLng::new(46.21, 16.42));
        assert!((pixel.x - 500.0).abs() < 1e-6);
        assert!((pixel.y - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_pan_is_clamped_to_extent() {
        let mut viewport = Viewport::new(LatLng::new(46.21, 16.42), 14.0, Point::new(800.0, 600.0));
        let extent = LatLngBounds::from_coords(42.1, 13.0, 46.6, 19.7);
        viewport.set_max_bounds(Some(extent.clone()));

        // drag far to the right moves the center west, past the extent
        viewport.pan(Point::new(10_000_000.0, 0.0));
        assert!(extent.contains(&viewport.center));

        // the western edge of the screen sits on the extent, not the center
        let visible = viewport.bounds();
        assert!((visible.south_west.lng - 13.0).abs() < 1e-6);
        assert!(viewport.center.lng > 13.0);

        viewport.pan(Point::new(0.0, -10_000_000.0));
        let visible = viewport.bounds();
        assert!((visible.south_west.lat - 42.1).abs() < 1e-6);
        assert!(visible.north_east.lat <= 46.6 + 1e-9);
    }

    #[test]
    fn test_zoom_out_reclamps_visible_area() {
        let extent = LatLngBounds::from_coords(42.1, 13.0, 46.6, 19.7);
        let mut viewport = Viewport::new(LatLng::new(46.5, 19.6), 14.0, Point::new(800.0, 600.0));
        viewport.set_max_bounds(Some(extent.clone()));
        let visible = viewport.bounds();
        assert!(visible.north_east.lat <= 46.6 + 1e-9);
        assert!(visible.north_east.lng <= 19.7 + 1e-9);

        viewport.set_zoom(9.0);
        let visible = viewport.bounds();
        assert!(visible.north_east.lat <= 46.6 + 1e-9);
        assert!(visible.north_east.lng <= 19.7 + 1e-9);
    }

    #[test]
    fn test_viewport_wider_than_extent_centers_it() {
        let extent = LatLngBounds::from_coords(42.1, 13.0, 46.6, 19.7);
        let mut viewport = Viewport::new(LatLng::new(46.0, 14.0), 5.0, Point::new(2000.0, 1500.0));
        viewport.set_max_bounds(Some(extent));
        assert!((viewport.center.lng - 16.35).abs() < 1e-6);
    }

    #[test]
    fn test_zoom_keeps_focus_point() {
        let mut viewport = Viewport::new(LatLng::new(46.21, 16.42), 12.0, Point::new(800.0, 600.0));
        let focus = Point::new(100.0, 100.0);
        let before = viewport.pixel_to_lat_lng(&focus);
        viewport.zoom_to(13.0, Some(focus));
        let after = viewport.pixel_to_lat_lng(&focus);
        assert!((before.lat - after.lat).abs() < 1e-6);
        assert!((before.lng - after.lng).abs() < 1e-6);
    }
}
