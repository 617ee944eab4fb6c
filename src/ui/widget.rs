use crate::{
    core::{
        geo::{LatLng, Point, TileCoord},
        map::Map,
        viewport::Viewport,
    },
    input::InputEvent,
    layers::{base::{LayerTrait, LayerType}, style::ParcelStyle, vector::ParcelFeature},
    ui::{overlay, popup, textures::TileTextures},
    view::MapView,
};
use egui::{Color32, Mesh, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Vec2};
use geo::{MapCoords, TriangulateEarcut};
use geo_types::{Coord, LineString};

/// Background shown where no tile has arrived yet
const BACKGROUND: Color32 = Color32::from_rgb(0xe5, 0xe3, 0xdf);

/// egui canvas for a [`MapView`]: paints the layers, forwards pointer input
/// to the map and draws the overlay UI and the popup on top.
pub struct MapCanvas {
    textures: TileTextures,
    last_size: Option<Vec2>,
}

impl MapCanvas {
    pub fn new() -> Self {
        Self {
            textures: TileTextures::default(),
            last_size: None,
        }
    }

    pub fn show(&mut self, ui: &mut Ui, view: &mut MapView) -> Response {
        let desired_size = ui.available_size();
        let (rect, response) = ui.allocate_exact_size(desired_size, Sense::click_and_drag());

        {
            let shared = view.map();
            let mut map = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

            if self.last_size != Some(rect.size()) {
                self.last_size = Some(rect.size());
                map.handle_input(InputEvent::Resize {
                    size: Point::new(rect.width() as f64, rect.height() as f64),
                });
            }

            forward_input(ui, &response, rect, &mut map);
            map.update();

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 0.0, BACKGROUND);
            self.paint_layers(ui.ctx(), &painter, rect, &map);
        }

        overlay::show(ui, rect, view);
        popup::show(ui, rect, view);

        response
    }

    fn paint_layers(&mut self, ctx: &egui::Context, painter: &egui::Painter, rect: Rect, map: &Map) {
        let tiles = map.visible_tiles();
        let viewport = map.viewport();

        for layer_id in map.list_layers() {
            let Some(layer) = map.get_layer(&layer_id) else {
                continue;
            };
            if !layer.is_visible() {
                continue;
            }

            match layer.layer_type() {
                LayerType::Tile => {
                    let Some(raster) = map.tile_layer(&layer_id) else {
                        continue;
                    };
                    let tint = Color32::WHITE.gamma_multiply(raster.opacity());
                    for coord in &tiles {
                        let Some(bytes) = raster.tile(coord) else {
                            continue;
                        };
                        if let Some(texture) = self.textures.get_or_load(ctx, &layer_id, *coord, &bytes)
                        {
                            painter.image(
                                texture.id(),
                                tile_rect(viewport, rect, coord),
                                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                                tint,
                            );
                        }
                    }
                }
                LayerType::Vector => {
                    let Some(parcels) = map.parcel_layer(&layer_id) else {
                        continue;
                    };
                    for coord in &tiles {
                        for (feature, style) in parcels.styled_features(coord) {
                            paint_parcel(painter, viewport, rect, feature, &style);
                        }
                    }
                }
            }
        }
    }
}

impl Default for MapCanvas {
    fn default() -> Self {
        Self::new()
    }
}

fn forward_input(ui: &Ui, response: &Response, rect: Rect, map: &mut Map) {
    if response.dragged() {
        let delta = response.drag_delta();
        if delta.length_sq() > 0.0 {
            map.handle_input(InputEvent::Drag {
                delta: Point::new(delta.x as f64, delta.y as f64),
            });
        }
    }

    if response.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll.abs() > 0.1 {
            if let Some(pointer) = response.hover_pos() {
                map.handle_input(InputEvent::Scroll {
                    delta: scroll as f64,
                    position: local(rect, pointer),
                });
            }
        }
    }

    if response.clicked() {
        if let Some(pointer) = response.interact_pointer_pos() {
            map.handle_input(InputEvent::Click {
                position: local(rect, pointer),
            });
        }
    }
}

fn local(rect: Rect, pos: Pos2) -> Point {
    Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64)
}

fn screen(viewport: &Viewport, rect: Rect, lat_lng: &LatLng) -> Pos2 {
    let pixel = viewport.lat_lng_to_pixel(lat_lng);
    Pos2::new(rect.min.x + pixel.x as f32, rect.min.y + pixel.y as f32)
}

fn tile_rect(viewport: &Viewport, rect: Rect, coord: &TileCoord) -> Rect {
    let south_east = TileCoord::new(coord.x + 1, coord.y + 1, coord.z);
    Rect::from_two_pos(
        screen(viewport, rect, &coord.to_lat_lng()),
        screen(viewport, rect, &south_east.to_lat_lng()),
    )
}

fn paint_parcel(
    painter: &egui::Painter,
    viewport: &Viewport,
    rect: Rect,
    feature: &ParcelFeature,
    style: &ParcelStyle,
) {
    painter.extend(parcel_shapes(viewport, rect, feature, style));
}

/// Fill and outline of a parcel in screen space. The fill is an earcut
/// triangulation so concave parcels and holes render exactly.
fn parcel_shapes(
    viewport: &Viewport,
    rect: Rect,
    feature: &ParcelFeature,
    style: &ParcelStyle,
) -> Vec<Shape> {
    let stroke = Stroke::new(style.stroke_width, Color32::from(style.stroke));
    let fill = Color32::from(style.fill);
    let mut shapes = Vec::new();

    for polygon in &feature.geometry {
        // a closed ring needs at least a triangle plus the repeated first point
        if polygon.exterior().0.len() < 4 {
            continue;
        }
        let on_screen = polygon.map_coords(|c| {
            let pos = screen(viewport, rect, &LatLng::new(c.y, c.x));
            Coord {
                x: pos.x as f64,
                y: pos.y as f64,
            }
        });
        let outline = ring_points(on_screen.exterior());
        if !rect.intersects(Rect::from_points(&outline)) {
            continue;
        }

        let triangulation = on_screen.earcut_triangles_raw();
        let mut mesh = Mesh::default();
        for xy in triangulation.vertices.chunks_exact(2) {
            mesh.colored_vertex(Pos2::new(xy[0] as f32, xy[1] as f32), fill);
        }
        for triangle in triangulation.triangle_indices.chunks_exact(3) {
            mesh.add_triangle(triangle[0] as u32, triangle[1] as u32, triangle[2] as u32);
        }
        shapes.push(Shape::mesh(mesh));

        shapes.push(Shape::closed_line(outline, stroke));
        for interior in on_screen.interiors() {
            shapes.push(Shape::closed_line(ring_points(interior), stroke));
        }
    }
    shapes
}

fn ring_points(ring: &LineString<f64>) -> Vec<Pos2> {
    let mut points: Vec<Pos2> = ring
        .coords()
        .map(|c| Pos2::new(c.x as f32, c.y as f32))
        .collect();
    // the ring repeats its first point
    points.pop();
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::style::{FeatureKey, FeatureRef};
    use geo_types::{MultiPolygon, Polygon};

    #[test]
    fn test_concave_parcel_fill_follows_outline() {
        let viewport = Viewport::new(LatLng::new(46.21, 16.42), 14.0, Point::new(400.0, 400.0));
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::splat(400.0));

        // L-shape with the south-east quarter cut out
        let corners = [
            (100.0, 100.0),
            (300.0, 100.0),
            (300.0, 200.0),
            (200.0, 200.0),
            (200.0, 300.0),
            (100.0, 300.0),
            (100.0, 100.0),
        ];
        let ring: Vec<(f64, f64)> = corners
            .iter()
            .map(|&(x, y)| {
                let position = viewport.pixel_to_lat_lng(&Point::new(x, y));
                (position.lng, position.lat)
            })
            .collect();
        let feature = ParcelFeature {
            reference: FeatureRef {
                key: FeatureKey {
                    tile: TileCoord::new(0, 0, 14),
                    index: 0,
                },
                id: None,
            },
            geometry: MultiPolygon::new(vec![Polygon::new(LineString::from(ring), vec![])]),
        };

        let shapes = parcel_shapes(&viewport, rect, &feature, &ParcelStyle::DEFAULT);
        assert_eq!(shapes.len(), 2);

        let Shape::Mesh(mesh) = &shapes[0] else {
            panic!("fill is not a mesh");
        };
        let filled: f32 = mesh
            .indices
            .chunks_exact(3)
            .map(|t| {
                let a = mesh.vertices[t[0] as usize].pos;
                let b = mesh.vertices[t[1] as usize].pos;
                let c = mesh.vertices[t[2] as usize].pos;
                ((b - a).x * (c - a).y - (b - a).y * (c - a).x).abs() / 2.0
            })
            .sum();
        // 30 000 px² for the L; its convex hull would cover 35 000
        assert!((filled - 30_000.0).abs() < 1.0, "filled {filled}");
    }
}
