//! Planar helpers over [`Region`].
//!
//! All boolean operations go through `geo::BooleanOps` on multi-polygons so a
//! single-part isochrone and a fragmented one are handled the same way.

use crate::Region;
use geo::{Area, BooleanOps, Geometry, MultiPolygon, Polygon, Rect};

/// Region with no parts.
pub fn empty_region() -> Region {
    MultiPolygon(Vec::new())
}

/// True when the region has no parts or no area.
///
/// Boolean ops can leave zero-area slivers behind when two polygons only touch,
/// so those count as empty as well.
pub fn is_empty(region: &Region) -> bool {
    region.0.is_empty() || region.unsigned_area() <= 0.0
}

/// Union of every region yielded, or `None` when the iterator is empty.
pub fn union_all<I>(regions: I) -> Option<Region>
where
    I: IntoIterator<Item = Region>,
{
    regions
        .into_iter()
        .reduce(|acc, region| acc.union(&region))
}

/// Keep only the polygonal parts of a decoded geometry.
///
/// Returns `None` when nothing polygonal is left.
pub fn region_from_geometry(geometry: Geometry<f64>) -> Option<Region> {
    let mut parts = Vec::new();
    collect_polygons(geometry, &mut parts);
    if parts.is_empty() {
        None
    } else {
        Some(MultiPolygon(parts))
    }
}

fn collect_polygons(geometry: Geometry<f64>, parts: &mut Vec<Polygon<f64>>) {
    match geometry {
        Geometry::Polygon(polygon) => parts.push(polygon),
        Geometry::MultiPolygon(multi) => parts.extend(multi.0),
        Geometry::Rect(rect) => parts.push(rect.to_polygon()),
        Geometry::Triangle(triangle) => parts.push(triangle.to_polygon()),
        Geometry::GeometryCollection(collection) => {
            for member in collection.0 {
                collect_polygons(member, parts);
            }
        }
        // Points and lines carry no reachable area
        _ => {}
    }
}

/// Axis-aligned rectangle as a region, corners given as `(x, y)`.
///
/// ```
/// use equal_time_lib::geometry::{is_empty, rect_region};
///
/// let square = rect_region((0.0, 0.0), (1.0, 1.0));
/// assert!(!is_empty(&square));
/// ```
pub fn rect_region(min: (f64, f64), max: (f64, f64)) -> Region {
    MultiPolygon(vec![Rect::new(min, max).to_polygon()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, GeometryCollection, Point};

    #[test]
    fn empty_region_is_empty() {
        assert!(is_empty(&empty_region()));
    }

    #[test]
    fn union_all_of_nothing_is_none() {
        assert!(union_all(Vec::<Region>::new()).is_none());
    }

    #[test]
    fn union_all_merges_overlapping_squares() {
        let merged = union_all(vec![
            rect_region((0.0, 0.0), (2.0, 2.0)),
            rect_region((1.0, 0.0), (3.0, 2.0)),
        ])
        .unwrap();
        assert!((merged.unsigned_area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn touching_squares_intersect_to_empty() {
        let left = rect_region((0.0, 0.0), (1.0, 1.0));
        let right = rect_region((1.0, 0.0), (2.0, 1.0));
        assert!(is_empty(&left.intersection(&right)));
    }

    #[test]
    fn collection_keeps_polygons_only() {
        let triangle = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)];
        let collection = Geometry::GeometryCollection(GeometryCollection(vec![
            Geometry::Point(Point::new(5.0, 5.0)),
            Geometry::Polygon(triangle),
        ]));
        let region = region_from_geometry(collection).unwrap();
        assert_eq!(region.0.len(), 1);
        assert!((region.unsigned_area() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn point_has_no_region() {
        assert!(region_from_geometry(Geometry::Point(Point::new(1.0, 1.0))).is_none());
    }
}
