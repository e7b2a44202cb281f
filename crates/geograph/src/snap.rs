use ahash::AHashMap;
use geo::Coord;
use smallvec::SmallVec;

use crate::dcel::VertexId;

/// Collapses near-coincident coordinates onto a single vertex, absorbing
/// floating-point noise from intersection computations and from inputs that
/// share boundaries only approximately.
///
/// Coordinates are bucketed in a uniform grid whose cell size equals the
/// tolerance; a lookup scans the 3×3 block of cells around the query, so any
/// previously inserted vertex within `tolerance` (Euclidean, in coordinate
/// space) is found.  The nearest such vertex wins.
///
/// Vertex ids are handed out in insertion order, so feeding coordinates in a
/// deterministic order gives deterministic ids.
#[derive(Debug, Clone)]
pub struct VertexSnapper {
    tolerance: f64,
    cells:     AHashMap<(i64, i64), SmallVec<[VertexId; 2]>>,
    coords:    Vec<Coord<f64>>,
}

impl VertexSnapper {
    /// `tolerance` must be finite; non-positive values degrade to exact
    /// matching.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance: if tolerance > 0.0 { tolerance } else { f64::MIN_POSITIVE },
            cells:     AHashMap::new(),
            coords:    Vec::new(),
        }
    }

    /// Coordinates of all vertices, indexed by `VertexId.0`.
    #[inline] pub fn coords(&self) -> &[Coord<f64>] { &self.coords }

    #[inline] pub fn coord(&self, id: VertexId) -> Coord<f64> { self.coords[id.0] }

    #[inline]
    fn cell(&self, c: Coord<f64>) -> (i64, i64) {
        // Float-to-int casts saturate, so far-out coordinates still land in a cell.
        ((c.x / self.tolerance).floor() as i64, (c.y / self.tolerance).floor() as i64)
    }

    /// Existing vertex within tolerance of `c`, if any.
    pub fn find(&self, c: Coord<f64>) -> Option<VertexId> {
        let (cx, cy) = self.cell(c);
        let mut best: Option<(f64, VertexId)> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(ids) = self.cells.get(&(cx.saturating_add(dx), cy.saturating_add(dy))) else { continue };
                for &id in ids {
                    let p = self.coords[id.0];
                    let d = (p.x - c.x).hypot(p.y - c.y);
                    if d <= self.tolerance && best.is_none_or(|(bd, bid)| d < bd || (d == bd && id < bid)) {
                        best = Some((d, id));
                    }
                }
            }
        }
        best.map(|(_, id)| id)
    }

    /// Return the vertex for `c`, inserting a new one if nothing lies within
    /// tolerance.
    pub fn snap(&mut self, c: Coord<f64>) -> VertexId {
        if let Some(id) = self.find(c) { return id; }
        let id = VertexId(self.coords.len());
        self.coords.push(c);
        let cell = self.cell(c);
        self.cells.entry(cell).or_default().push(id);
        id
    }
}
