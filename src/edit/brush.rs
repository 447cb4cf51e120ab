//! Brush geometry and polygon conversions for region editing.
//!
//! The working region outline lives as a `geo` multi-polygon so each
//! brush application is a plain boolean union/difference. Holes punched
//! by the eraser travel through path data as ordinary subpaths, so ring
//! nesting is reconstructed from containment: a ring inside an odd
//! number of other rings is an interior of its innermost containing
//! exterior, everything else is an exterior of its own.

use std::collections::HashMap;

use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};

/// Vertex count of the circular brush outline.
pub const BRUSH_SEGMENTS: usize = 32;

/// Circle approximation used as the brush footprint.
pub fn circle_polygon(cx: f64, cy: f64, radius: f64) -> Polygon<f64> {
    let points: Vec<Coord<f64>> = (0..BRUSH_SEGMENTS)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / BRUSH_SEGMENTS as f64;
            Coord {
                x: cx + radius * angle.cos(),
                y: cy + radius * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::from(points), Vec::new())
}

/// Convert parsed path rings into a multi-polygon.
///
/// Rings nested to even depth become exteriors; odd-depth rings become
/// the interior of their innermost containing exterior, rewound against
/// it so area sums stay correct. A hole with no containing exterior
/// degrades to a standalone polygon rather than being dropped.
pub fn rings_to_multi_polygon(rings: &[Vec<(f64, f64)>]) -> MultiPolygon<f64> {
    let usable: Vec<&[(f64, f64)]> = rings
        .iter()
        .filter(|ring| ring.len() >= 3)
        .map(Vec::as_slice)
        .collect();
    let shells: Vec<Polygon<f64>> = usable
        .iter()
        .map(|ring| Polygon::new(ring_line(ring), Vec::new()))
        .collect();
    let signs: Vec<f64> = usable.iter().map(|ring| signed_ring_area(ring)).collect();

    // Which other rings contain each ring's first vertex; the count's
    // parity is the nesting depth (hole vertices never sit exactly on
    // another ring's boundary).
    let containers: Vec<Vec<usize>> = (0..usable.len())
        .map(|i| {
            let anchor = Point::new(usable[i][0].0, usable[i][0].1);
            (0..usable.len())
                .filter(|j| *j != i && shells[*j].contains(&anchor))
                .collect()
        })
        .collect();

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for (i, shell) in shells.iter().enumerate() {
        if containers[i].len() % 2 == 0 {
            slot.insert(i, polygons.len());
            polygons.push(shell.clone());
        }
    }
    for i in 0..usable.len() {
        if containers[i].len() % 2 == 1 {
            let parent = containers[i]
                .iter()
                .copied()
                .filter(|j| containers[*j].len() % 2 == 0)
                .max_by_key(|j| containers[*j].len());
            match parent {
                Some(j) => {
                    let mut line = ring_line(usable[i]);
                    if signs[i].is_sign_positive() == signs[j].is_sign_positive() {
                        line.0.reverse();
                    }
                    polygons[slot[&j]].interiors_push(line);
                }
                None => polygons.push(Polygon::new(ring_line(usable[i]), Vec::new())),
            }
        }
    }
    MultiPolygon::new(polygons)
}

/// Convert a multi-polygon back into path rings (exteriors first, then
/// any interiors produced by the boolean operations).
pub fn multi_polygon_to_rings(multi: &MultiPolygon<f64>) -> Vec<Vec<(f64, f64)>> {
    let mut rings = Vec::new();
    for polygon in multi {
        rings.push(line_string_to_ring(polygon.exterior()));
        for interior in polygon.interiors() {
            rings.push(line_string_to_ring(interior));
        }
    }
    rings
}

fn ring_line(ring: &[(f64, f64)]) -> LineString<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|(x, y)| Coord { x: *x, y: *y }).collect();
    LineString::from(coords)
}

/// Shoelace sum; the sign encodes the winding direction.
fn signed_ring_area(ring: &[(f64, f64)]) -> f64 {
    let mut sum = 0.0;
    for (i, (x0, y0)) in ring.iter().enumerate() {
        let (x1, y1) = ring[(i + 1) % ring.len()];
        sum += x0 * y1 - x1 * y0;
    }
    sum / 2.0
}

fn line_string_to_ring(line: &LineString<f64>) -> Vec<(f64, f64)> {
    let mut ring: Vec<(f64, f64)> = line.coords().map(|c| (c.x, c.y)).collect();
    // Closed line strings repeat the first coordinate at the end.
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, BooleanOps};

    #[test]
    fn test_circle_polygon_area() {
        let circle = circle_polygon(0.0, 0.0, 10.0);
        // A 32-gon covers just under the full disc area.
        let area = circle.unsigned_area();
        assert!(area > 300.0 && area < std::f64::consts::PI * 100.0);
    }

    #[test]
    fn test_ring_round_trip() {
        let rings = vec![vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]];
        let multi = rings_to_multi_polygon(&rings);
        assert_eq!(multi.unsigned_area(), 100.0);
        assert_eq!(multi_polygon_to_rings(&multi), rings);
    }

    #[test]
    fn test_degenerate_rings_skipped() {
        let rings = vec![vec![(0.0, 0.0), (1.0, 1.0)]];
        assert_eq!(rings_to_multi_polygon(&rings).0.len(), 0);
    }

    #[test]
    fn test_hole_survives_round_trip() {
        let square = vec![vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]];
        let circle = MultiPolygon::new(vec![circle_polygon(50.0, 50.0, 10.0)]);
        let punched = rings_to_multi_polygon(&square).difference(&circle);
        assert!(punched.unsigned_area() < 10000.0);

        // Serializing the hole as a subpath and re-parsing must not turn
        // it into additive area.
        let reparsed = rings_to_multi_polygon(&multi_polygon_to_rings(&punched));
        assert_eq!(reparsed.0.len(), 1);
        assert!(!reparsed.0[0].interiors().is_empty());
        assert!((reparsed.unsigned_area() - punched.unsigned_area()).abs() < 1e-6);
    }

    #[test]
    fn test_nested_rings_alternate_fill() {
        // Square, hole, island: depth parity decides exterior vs hole.
        let rings = vec![
            vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
            vec![(20.0, 20.0), (80.0, 20.0), (80.0, 80.0), (20.0, 80.0)],
            vec![(40.0, 40.0), (60.0, 40.0), (60.0, 60.0), (40.0, 60.0)],
        ];
        let multi = rings_to_multi_polygon(&rings);
        assert_eq!(multi.0.len(), 2);
        assert_eq!(multi.unsigned_area(), 10000.0 - 3600.0 + 400.0);
    }

    #[test]
    fn test_orphan_hole_degrades_to_polygon() {
        let rings = vec![vec![(0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)]];
        // Clockwise and contained by nothing: kept as a filled shape.
        let multi = rings_to_multi_polygon(&rings);
        assert_eq!(multi.0.len(), 1);
        assert_eq!(multi.unsigned_area(), 100.0);
    }
}
