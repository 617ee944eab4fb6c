//! Cadastral vector tile decoding.
//!
//! Protobuf parsing is left to `mvt-reader`; this module only maps the
//! tile-local polygon coordinates onto the globe and keeps the feature ids.

use crate::{
    core::{constants::MVT_EXTENT, geo::TileCoord},
    layers::style::FeatureId,
    MapError, Result,
};
use geo::MapCoords;
use geo_types::{Coord, Geometry, MultiPolygon};
use mvt_reader::Reader;

/// One polygonal feature of a vector tile, in lng/lat (x = lng, y = lat)
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedParcel {
    pub id: Option<FeatureId>,
    pub geometry: MultiPolygon<f64>,
}

/// Decodes every polygon feature of every layer in an MVT payload
pub fn decode_parcels(data: &[u8], coord: TileCoord) -> Result<Vec<DecodedParcel>> {
    let reader =
        Reader::new(data.to_vec()).map_err(|e| MapError::TileDecode(format!("{coord}: {e:?}")))?;
    let layer_names = reader
        .get_layer_names()
        .map_err(|e| MapError::TileDecode(format!("{coord}: {e:?}")))?;

    let mut parcels = Vec::new();
    for index in 0..layer_names.len() {
        let features = reader
            .get_features(index)
            .map_err(|e| MapError::TileDecode(format!("{coord}: {e:?}")))?;

        for feature in features {
            let geometry = feature
                .get_geometry()
                .map_coords(|c| tile_to_lng_lat(coord, c));

            if let Some(geometry) = polygons_of(geometry) {
                parcels.push(DecodedParcel {
                    id: feature.id.map(FeatureId::from),
                    geometry,
                });
            }
        }
    }

    log::debug!("decoded {} parcels from tile {}", parcels.len(), coord);
    Ok(parcels)
}

fn tile_to_lng_lat(coord: TileCoord, c: Coord<f32>) -> Coord<f64> {
    let position = coord.offset_to_lat_lng(c.x as f64 / MVT_EXTENT, c.y as f64 / MVT_EXTENT);
    Coord {
        x: position.lng,
        y: position.lat,
    }
}

fn polygons_of(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Some(multi),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use geo_types::{LineString, Point, Polygon};

    fn varint(mut value: u64, out: &mut Vec<u8>) {
        while value >= 0x80 {
            out.push((value as u8) | 0x80);
            value >>= 7;
        }
        out.push(value as u8);
    }

    fn uint_field(field: u64, value: u64, out: &mut Vec<u8>) {
        varint(field << 3, out);
        varint(value, out);
    }

    fn bytes_field(field: u64, bytes: &[u8], out: &mut Vec<u8>) {
        varint((field << 3) | 2, out);
        varint(bytes.len() as u64, out);
        out.extend_from_slice(bytes);
    }

    fn packed_field(field: u64, values: &[u32], out: &mut Vec<u8>) {
        let mut packed = Vec::new();
        for value in values {
            varint(*value as u64, &mut packed);
        }
        bytes_field(field, &packed, out);
    }

    fn feature(id: u64, geom_type: u64, geometry: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        uint_field(1, id, &mut out);
        uint_field(3, geom_type, &mut out);
        packed_field(4, geometry, &mut out);
        out
    }

    /// One layer: a square parcel with id 42 and a point with id 7
    fn parcel_tile() -> Vec<u8> {
        // MoveTo(1000,1000) LineTo(+2000,0)(0,+2000)(-2000,0) ClosePath
        let square = [9, 2000, 2000, 26, 4000, 0, 0, 4000, 3999, 0, 15];
        // MoveTo(2048,2048)
        let point = [9, 4096, 4096];

        let mut layer = Vec::new();
        uint_field(15, 2, &mut layer);
        bytes_field(1, b"cadastral_parcels", &mut layer);
        bytes_field(2, &feature(42, 3, &square), &mut layer);
        bytes_field(2, &feature(7, 1, &point), &mut layer);
        uint_field(5, 4096, &mut layer);

        let mut tile = Vec::new();
        bytes_field(3, &layer, &mut tile);
        tile
    }

    #[test]
    fn test_decodes_polygon_features_with_ids() {
        let coord = TileCoord::new(8939, 5754, 14);
        let parcels = decode_parcels(&parcel_tile(), coord).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].id, Some(FeatureId::from("42")));

        let bounds = coord.bounds();
        let exterior = parcels[0].geometry.0[0].exterior();
        assert_eq!(exterior.0.len(), 5);
        for c in exterior.coords() {
            assert!(bounds.contains(&LatLng::new(c.y, c.x)), "{c:?} outside {bounds:?}");
        }

        // tile-local (1000, 1000) is the north-west corner of the square
        let nw = coord.offset_to_lat_lng(1000.0 / MVT_EXTENT, 1000.0 / MVT_EXTENT);
        assert!((exterior.0[0].x - nw.lng).abs() < 1e-9);
        assert!((exterior.0[0].y - nw.lat).abs() < 1e-9);
    }

    #[test]
    fn test_garbage_payload_is_decode_error() {
        // field 3 (layers), length-delimited, claiming more bytes than exist
        let result = decode_parcels(&[0x1a, 0x7f, 0x00], TileCoord::new(0, 0, 0));
        assert!(matches!(result, Err(MapError::TileDecode(_))));
    }

    #[test]
    fn test_tile_local_corner_maps_to_tile_corner() {
        let coord = TileCoord::new(8939, 5754, 14);
        let corner = tile_to_lng_lat(coord, Coord { x: 0.0, y: 0.0 });
        let nw = coord.to_lat_lng();
        assert!((corner.x - nw.lng).abs() < 1e-9);
        assert!((corner.y - nw.lat).abs() < 1e-9);
    }

    #[test]
    fn test_only_polygons_are_kept() {
        let square = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        assert!(polygons_of(Geometry::Polygon(square)).is_some());
        assert!(polygons_of(Geometry::Point(Point::new(0.0, 0.0))).is_none());
    }
}
