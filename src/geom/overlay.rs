//! Boundary overlay shared by the planar and spherical engines.
//!
//! # Pipeline
//!
//! 1. Every input ring edge is snapped to shared vertices and tagged with the
//!    operand it came from.
//! 2. A sweep over the edges (sorted by their smallest x) finds every place
//!    where two edges meet: a vertex touching another edge, or a proper
//!    crossing.  Edges are split there, and the sweep repeats over the
//!    pieces until nothing splits.
//! 3. Split pieces are merged into undirected arrangement edges carrying, per
//!    operand, the net number of times that operand's boundary runs along
//!    them (+1 per piece running from the lower to the higher vertex id, -1
//!    otherwise).  Pieces that cancel out disappear.
//! 4. The arrangement becomes a [`Dcel`]; faces are created per cycle and
//!    disconnected components are nested by containment.
//! 5. Winding numbers per operand are propagated across edges starting from
//!    the unbounded face.  A face is in the union when either operand winds
//!    around it.
//! 6. Half-edges with the union on their left and the outside on their right
//!    are chained into closed rings.

use std::collections::VecDeque;

use ahash::AHashMap;
use geo::{Coord, MultiPolygon};
use geograph::{Dcel, FaceId, HalfEdgeId, VertexId, VertexSnapper, OUTER_FACE};
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::kernel::{Kernel, Tolerances};
use super::ring::lex_cmp;
use crate::error::{Result, UnionError};

/// Which input a boundary edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    A,
    B,
}

impl Operand {
    #[inline]
    fn index(self) -> usize {
        match self {
            Operand::A => 0,
            Operand::B => 1,
        }
    }
}

/// Per-operand winding change across an edge.
type Winding = [i32; 2];

/// A directed input edge between snapped vertices.
#[derive(Debug, Clone, Copy)]
struct InputEdge {
    u:       VertexId,
    v:       VertexId,
    operand: Operand,
}

impl InputEdge {
    #[inline]
    fn has_endpoint(&self, id: VertexId) -> bool { self.u == id || self.v == id }
}

/// Upper bound on splitting passes.  Typical inputs settle in two.
const MAX_NODING_PASSES: usize = 32;

fn internal(msg: String) -> UnionError {
    UnionError::AlgorithmInternal(format!("[geom::overlay] {msg}"))
}

pub(crate) struct Overlay<'k> {
    kernel:     &'k dyn Kernel,
    tolerances: Tolerances,
    snapper:    VertexSnapper,
    edges:      Vec<InputEdge>,
}

impl<'k> Overlay<'k> {
    pub(crate) fn new(kernel: &'k dyn Kernel, tolerances: Tolerances) -> Self {
        Self {
            kernel,
            tolerances,
            snapper: VertexSnapper::new(tolerances.snap),
            edges:   Vec::new(),
        }
    }

    /// Add the (closed) rings of one operand.
    pub(crate) fn add_operand(&mut self, operand: Operand, mp: &MultiPolygon<f64>) {
        for polygon in &mp.0 {
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                let ids: Vec<VertexId> = ring.0.iter().map(|&c| self.snapper.snap(c)).collect();
                for w in ids.windows(2) {
                    if w[0] != w[1] {
                        self.edges.push(InputEdge { u: w[0], v: w[1], operand });
                    }
                }
            }
        }
    }

    /// Run the overlay and return the union boundary as closed rings, with
    /// the union on the left of every ring.
    pub(crate) fn boundary_rings(mut self) -> Result<Vec<Vec<Coord<f64>>>> {
        self.node();
        let (mut dcel, winding) = self.arrangement();
        trace!(
            vertices = dcel.num_vertices(),
            edges = dcel.num_edges(),
            "overlay arrangement built"
        );
        assign_faces(self.kernel, &mut dcel)?;
        let inside = classify(&dcel, &winding)?;
        trace_boundary(&dcel, &inside)
    }

    // -----------------------------------------------------------------------
    // Splitting
    // -----------------------------------------------------------------------

    /// Split edges until no edge has another edge's vertex on its interior
    /// and no two edges cross.  Snapping a crossing moves it by up to the
    /// snap tolerance, which can put it on a third edge or make the new
    /// pieces cross again, so one pass is not enough.
    fn node(&mut self) {
        for pass in 1..=MAX_NODING_PASSES {
            let splits = self.find_splits();
            let count: usize = splits.iter().map(Vec::len).sum();
            if count == 0 {
                trace!(passes = pass, edges = self.edges.len(), "noding converged");
                return;
            }
            trace!(pass, splits = count, "noding pass");
            self.edges = self.edges.iter().zip(splits)
                .flat_map(|(edge, points)| split_edge(*edge, points))
                .collect();
        }
        debug!(passes = MAX_NODING_PASSES, "noding stopped before converging");
    }

    /// One sweep over the edges (sorted by their smallest x).  Returns, per
    /// edge, the vertices where it has to be split, none of them its own
    /// endpoints.
    fn find_splits(&mut self) -> Vec<Vec<(f64, VertexId)>> {
        let n = self.edges.len();
        let segments: Vec<(Coord<f64>, Coord<f64>)> = self.edges.iter()
            .map(|e| (self.snapper.coord(e.u), self.snapper.coord(e.v)))
            .collect();
        let lower = |i: usize| {
            let (a, b) = segments[i];
            if lex_cmp(&a, &b).is_le() { (a, b) } else { (b, a) }
        };

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            let (ai, bi) = lower(i);
            let (aj, bj) = lower(j);
            lex_cmp(&ai, &aj).then(lex_cmp(&bi, &bj)).then(i.cmp(&j))
        });

        let tolerance = self.tolerances.snap;
        let mut splits: Vec<Vec<(f64, VertexId)>> = vec![Vec::new(); n];
        let mut active: Vec<usize> = Vec::new();
        for &i in &order {
            let min_x = lower(i).0.x;
            // Lexicographic order puts the larger x last.
            active.retain(|&j| lower(j).1.x + tolerance >= min_x);
            for &j in &active {
                self.intersect_pair(i, j, &segments, &mut splits);
            }
            active.push(i);
        }
        splits
    }

    fn intersect_pair(
        &mut self,
        i: usize,
        j: usize,
        segments: &[(Coord<f64>, Coord<f64>)],
        splits: &mut [Vec<(f64, VertexId)>],
    ) {
        let kernel = self.kernel;
        let tolerance = self.tolerances.snap;
        let (ei, ej) = (self.edges[i], self.edges[j]);
        let (si, sj) = (segments[i], segments[j]);

        // Vertices of one edge lying on the other.
        for (p, id) in [(si.0, ei.u), (si.1, ei.v)] {
            if !ej.has_endpoint(id) {
                if let Some(t) = kernel.locate_on_edge(p, sj.0, sj.1, tolerance) {
                    splits[j].push((t, id));
                }
            }
        }
        for (p, id) in [(sj.0, ej.u), (sj.1, ej.v)] {
            if !ei.has_endpoint(id) {
                if let Some(t) = kernel.locate_on_edge(p, si.0, si.1, tolerance) {
                    splits[i].push((t, id));
                }
            }
        }

        let shares_vertex = ei.has_endpoint(ej.u) || ei.has_endpoint(ej.v);
        if shares_vertex { return; }
        if let Some(crossing) = kernel.crossing(si.0, si.1, sj.0, sj.1) {
            // The crossing may snap onto an endpoint of one edge; only the
            // other edge is split then.
            let id = self.snapper.snap(crossing.point);
            if !ei.has_endpoint(id) { splits[i].push((crossing.t, id)); }
            if !ej.has_endpoint(id) { splits[j].push((crossing.u, id)); }
        }
    }

    // -----------------------------------------------------------------------
    // Arrangement
    // -----------------------------------------------------------------------

    /// Merge the noded edges into undirected edges and build the DCEL.
    /// Returns the winding change across each half-edge (from its right to
    /// its left).
    fn arrangement(&self) -> (Dcel<Coord<f64>>, Vec<Winding>) {
        let mut index: AHashMap<(VertexId, VertexId), usize> = AHashMap::new();
        let mut keys: Vec<(VertexId, VertexId)> = Vec::new();
        let mut counts: Vec<Winding> = Vec::new();

        for edge in &self.edges {
            let (a, b) = (edge.u, edge.v);
            let (key, sign) = if a < b { ((a, b), 1) } else { ((b, a), -1) };
            let k = *index.entry(key).or_insert_with(|| {
                keys.push(key);
                counts.push([0; 2]);
                keys.len() - 1
            });
            counts[k][edge.operand.index()] += sign;
        }

        let mut dcel: Dcel<Coord<f64>> = Dcel::new();
        for &c in self.snapper.coords() {
            dcel.add_vertex(c);
        }
        let mut winding: Vec<Winding> = Vec::with_capacity(2 * keys.len());
        for (&(u, v), &count) in keys.iter().zip(&counts) {
            if count == [0, 0] { continue; }
            dcel.add_edge(u, v);
            winding.push(count);
            winding.push([-count[0], -count[1]]);
        }

        let kernel = self.kernel;
        dcel.link_by_heading(|a, b| kernel.heading(*a, *b));
        (dcel, winding)
    }
}

/// Pieces of `edge` after splitting it at `points` (parameter, vertex).
fn split_edge(edge: InputEdge, mut points: Vec<(f64, VertexId)>) -> SmallVec<[InputEdge; 2]> {
    if points.is_empty() {
        return SmallVec::from_elem(edge, 1);
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let mut chain: SmallVec<[VertexId; 4]> = SmallVec::with_capacity(points.len() + 2);
    chain.push(edge.u);
    chain.extend(points.into_iter().map(|(_, id)| id));
    chain.push(edge.v);
    chain.dedup();
    chain.windows(2)
        .map(|w| InputEdge { u: w[0], v: w[1], operand: edge.operand })
        .collect()
}

// ---------------------------------------------------------------------------
// Faces
// ---------------------------------------------------------------------------

/// Disjoint-set over dense indices, for connected components.
pub(crate) struct Components {
    parent: Vec<usize>,
}

impl Components {
    pub(crate) fn new(n: usize) -> Self { Self { parent: (0..n).collect() } }

    pub(crate) fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub(crate) fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb { self.parent[ra.max(rb)] = ra.min(rb); }
    }
}

/// Create a face per bounded cycle and attach each component's outer cycle
/// to the face it sits in.
fn assign_faces(kernel: &dyn Kernel, dcel: &mut Dcel<Coord<f64>>) -> Result<()> {
    let starts = dcel.cycles();
    let mut cycle_of = vec![0usize; dcel.num_half_edges()];
    let mut rings: Vec<Vec<Coord<f64>>> = Vec::with_capacity(starts.len());
    for (c, &start) in starts.iter().enumerate() {
        let ring = dcel.face_cycle(start)
            .map(|he| {
                cycle_of[he.0] = c;
                *dcel.origin_coords(he)
            })
            .collect();
        rings.push(ring);
    }
    let areas: Vec<f64> = rings.iter().map(|ring| kernel.signed_area(ring)).collect();

    let mut components = Components::new(dcel.num_vertices());
    for e in 0..dcel.num_edges() {
        let (u, v) = (dcel.half_edges[2 * e].origin, dcel.half_edges[2 * e + 1].origin);
        components.union(u.0, v.0);
    }
    let component: Vec<usize> = starts.iter()
        .map(|&start| components.find(dcel.half_edge(start).origin.0))
        .collect();

    // The outer boundary of a component is its most negative cycle.
    let mut outer_of: AHashMap<usize, usize> = AHashMap::new();
    for (c, &comp) in component.iter().enumerate() {
        outer_of.entry(comp)
            .and_modify(|best| if areas[c] < areas[*best] { *best = c })
            .or_insert(c);
    }
    let mut is_outer = vec![false; starts.len()];
    for &c in outer_of.values() {
        is_outer[c] = true;
    }

    let mut face_of = vec![OUTER_FACE; starts.len()];
    for c in (0..starts.len()).filter(|&c| !is_outer[c]) {
        face_of[c] = dcel.add_face(Some(starts[c]));
    }

    let spans: Vec<(f64, f64)> = rings.iter()
        .map(|ring| ring.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.x), hi.max(p.x))))
        .collect();
    for c in (0..starts.len()).filter(|&c| is_outer[c]) {
        let sample = rings[c][0];
        let mut best: Option<usize> = None;
        for d in 0..starts.len() {
            if is_outer[d] || component[d] == component[c] { continue; }
            if sample.x < spans[d].0 || sample.x > spans[d].1 { continue; }
            if !kernel.contains(&rings[d], sample) { continue; }
            if best.is_none_or(|b| areas[d] < areas[b]) {
                best = Some(d);
            }
        }
        if let Some(d) = best {
            face_of[c] = face_of[d];
        }
    }

    for (i, &c) in cycle_of.iter().enumerate() {
        dcel.half_edge_mut(HalfEdgeId(i)).face = face_of[c];
    }
    trace!(cycles = starts.len(), faces = dcel.num_faces(), "faces assigned");
    Ok(())
}

/// Propagate winding numbers from the unbounded face and report, per face,
/// whether it belongs to the union.
fn classify(dcel: &Dcel<Coord<f64>>, winding: &[Winding]) -> Result<Vec<bool>> {
    let mut neighbours: Vec<SmallVec<[(FaceId, Winding); 4]>> = vec![SmallVec::new(); dcel.num_faces()];
    for (i, he) in dcel.half_edges.iter().enumerate() {
        let across = dcel.half_edge(he.twin).face;
        neighbours[across.0].push((he.face, winding[i]));
    }

    let mut numbers: Vec<Option<Winding>> = vec![None; dcel.num_faces()];
    numbers[OUTER_FACE.0] = Some([0, 0]);
    let mut queue = VecDeque::from([(OUTER_FACE, [0, 0])]);
    while let Some((face, w)) = queue.pop_front() {
        for &(next, delta) in &neighbours[face.0] {
            let expected = [w[0] + delta[0], w[1] + delta[1]];
            match numbers[next.0] {
                None => {
                    numbers[next.0] = Some(expected);
                    queue.push_back((next, expected));
                }
                Some(found) if found != expected => {
                    return Err(internal(format!("{next:?} reached with winding {found:?} and {expected:?}")));
                }
                Some(_) => {}
            }
        }
    }

    numbers.iter().enumerate()
        .map(|(f, w)| match w {
            Some(w) => Ok(w[0] != 0 || w[1] != 0),
            None => Err(internal(format!("{:?} is unreachable from the outer face", FaceId(f)))),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Boundary tracing
// ---------------------------------------------------------------------------

/// Chain the union boundary into closed rings.  At a vertex where several
/// boundary edges meet, the walk takes the first boundary edge clockwise from
/// the reversed incoming edge, so rings touching at a vertex stay separate.
fn trace_boundary(dcel: &Dcel<Coord<f64>>, inside: &[bool]) -> Result<Vec<Vec<Coord<f64>>>> {
    let n = dcel.num_half_edges();
    let on_boundary = |he: HalfEdgeId| {
        let h = dcel.half_edge(he);
        inside[h.face.0] && !inside[dcel.half_edge(h.twin).face.0]
    };

    let mut used = vec![false; n];
    let mut rings = Vec::new();
    for i in 0..n {
        let start = HalfEdgeId(i);
        if used[i] || !on_boundary(start) { continue; }

        let mut ring = Vec::new();
        let mut current = start;
        loop {
            if used[current.0] {
                return Err(internal(format!("boundary walk revisited {current:?}")));
            }
            used[current.0] = true;
            ring.push(*dcel.origin_coords(current));

            let mut next = dcel.half_edge(current).next;
            let mut turns = 0;
            while !on_boundary(next) {
                next = dcel.half_edge(dcel.twin(next)).next;
                turns += 1;
                if turns > n {
                    return Err(internal(format!("no boundary continuation after {current:?}")));
                }
            }
            current = next;
            if current == start { break; }
        }
        if let Some(&first) = ring.first() { ring.push(first); }
        rings.push(ring);
    }
    Ok(rings)
}
