//! Doubly Connected Edge List (DCEL): a half-edge structure for the planar
//! subdivision produced by overlaying polygon boundaries.
//!
//! # Structure
//!
//! Every undirected edge is stored as a pair of directed **half-edges**
//! (twins).  Each half-edge carries:
//!
//! * `origin` : the vertex it leaves from
//! * `twin`   : the opposite half-edge (same edge, opposite direction)
//! * `next`   : the next half-edge around the face on its left
//! * `prev`   : the previous half-edge around the face on its left
//! * `face`   : the face to the left of this half-edge
//!
//! # Indexing
//!
//! All records live in flat `Vec`s addressed by strongly-typed index wrappers
//! (`VertexId`, `HalfEdgeId`, `FaceId`).  `FaceId(0)` is reserved for the
//! unbounded face; bounded faces start at `FaceId(1)`.
//!
//! # Building
//!
//! Callers add vertices and edges, then call [`Dcel::link_by_heading`] with a
//! heading function for their coordinate domain.  Linking sorts the outgoing
//! half-edges of every vertex counter-clockwise and wires `next`/`prev` so
//! that every face cycle keeps its face on the left.  Face records are left to
//! the caller, who knows how to decide containment between components.

use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// Index types
// ---------------------------------------------------------------------------

macro_rules! idx {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);
    };
}

idx!(VertexId);
idx!(HalfEdgeId);
idx!(FaceId);

/// The unbounded face: always `FaceId(0)`.
pub const OUTER_FACE: FaceId = FaceId(0);

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A vertex with an arbitrary coordinate payload `C` and one incident
/// half-edge (any half-edge whose `origin` is this vertex).
#[derive(Clone, Debug)]
pub struct Vertex<C> {
    pub coords:    C,
    /// Any half-edge leaving this vertex.  `None` for isolated vertices.
    pub half_edge: Option<HalfEdgeId>,
}

/// A directed half-edge.
#[derive(Clone, Debug)]
pub struct HalfEdge {
    /// Vertex this half-edge leaves from.
    pub origin: VertexId,
    /// The other half-edge of the same undirected edge.
    pub twin:   HalfEdgeId,
    /// Next half-edge around `face`.
    pub next:   HalfEdgeId,
    /// Previous half-edge around `face`.
    pub prev:   HalfEdgeId,
    /// Face to the left of this half-edge.
    pub face:   FaceId,
}

/// A face (bounded region or the unbounded face) with one incident half-edge.
#[derive(Clone, Debug)]
pub struct Face {
    /// Any half-edge on the outer boundary of this face.  `None` for the
    /// unbounded face.
    pub half_edge: Option<HalfEdgeId>,
}

// ---------------------------------------------------------------------------
// DCEL
// ---------------------------------------------------------------------------

/// A Doubly Connected Edge List over vertices with coordinate type `C`.
#[derive(Clone, Debug)]
pub struct Dcel<C> {
    pub vertices:   Vec<Vertex<C>>,
    pub half_edges: Vec<HalfEdge>,
    pub faces:      Vec<Face>,
}

impl<C> Default for Dcel<C> {
    fn default() -> Self { Self::new() }
}

impl<C> Dcel<C> {
    /// Create an empty DCEL.  The unbounded face (`OUTER_FACE`) is pre-inserted.
    pub fn new() -> Self {
        Self {
            vertices:   Vec::new(),
            half_edges: Vec::new(),
            faces: vec![Face { half_edge: None }],
        }
    }

    // -----------------------------------------------------------------------
    // Counts
    // -----------------------------------------------------------------------

    pub fn num_vertices(&self)   -> usize { self.vertices.len() }
    pub fn num_half_edges(&self) -> usize { self.half_edges.len() }
    /// Number of undirected edges.
    pub fn num_edges(&self)      -> usize { self.half_edges.len() / 2 }
    /// Number of faces including the unbounded face.
    pub fn num_faces(&self)      -> usize { self.faces.len() }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn vertex(&self, id: VertexId)       -> &Vertex<C>  { &self.vertices[id.0] }

    pub fn half_edge(&self, id: HalfEdgeId)       -> &HalfEdge  { &self.half_edges[id.0] }
    pub fn half_edge_mut(&mut self, id: HalfEdgeId) -> &mut HalfEdge { &mut self.half_edges[id.0] }

    /// Coordinates of the origin of `he`.
    #[inline]
    pub fn origin_coords(&self, he: HalfEdgeId) -> &C {
        &self.vertices[self.half_edges[he.0].origin.0].coords
    }

    /// The vertex at the head (destination) of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.half_edges[self.half_edges[he.0].twin.0].origin
    }

    /// The twin of `he`.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId) -> HalfEdgeId { self.half_edges[he.0].twin }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    /// Add an isolated vertex with the given coordinates.
    pub fn add_vertex(&mut self, coords: C) -> VertexId {
        let id = VertexId(self.vertices.len());
        self.vertices.push(Vertex { coords, half_edge: None });
        id
    }

    /// Add a new bounded face whose boundary contains `half_edge`.
    pub fn add_face(&mut self, half_edge: Option<HalfEdgeId>) -> FaceId {
        let id = FaceId(self.faces.len());
        self.faces.push(Face { half_edge });
        id
    }

    /// Add a twin pair of half-edges between `u` and `v`.  Both start out on
    /// `OUTER_FACE` and linked to themselves; `link_by_heading` fixes the
    /// links and the caller assigns faces afterwards.
    ///
    /// Returns `(uv, vu)`: the half-edge from u to v and its twin.  The pair
    /// always occupies indices `2k` and `2k + 1`.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> (HalfEdgeId, HalfEdgeId) {
        let uv = HalfEdgeId(self.half_edges.len());
        let vu = HalfEdgeId(self.half_edges.len() + 1);

        self.half_edges.push(HalfEdge { origin: u, twin: vu, next: uv, prev: uv, face: OUTER_FACE });
        self.half_edges.push(HalfEdge { origin: v, twin: uv, next: vu, prev: vu, face: OUTER_FACE });

        if self.vertices[u.0].half_edge.is_none() { self.vertices[u.0].half_edge = Some(uv); }
        if self.vertices[v.0].half_edge.is_none() { self.vertices[v.0].half_edge = Some(vu); }

        (uv, vu)
    }

    /// Set `he.next = next` and `next.prev = he`.
    pub fn set_next(&mut self, he: HalfEdgeId, next: HalfEdgeId) {
        self.half_edges[he.0].next   = next;
        self.half_edges[next.0].prev = he;
    }

    /// Wire `next`/`prev` for every half-edge from the angular order of the
    /// edges around each vertex.
    ///
    /// `heading(from, to)` must return the counter-clockwise angle of the edge
    /// direction at `from`, in any consistent range.  Outgoing half-edges of a
    /// vertex are sorted by heading (ties broken by half-edge index); the
    /// half-edge arriving along `h_i` then continues with `h_{i-1}`, the
    /// tightest left turn, so every cycle keeps its face on the left.
    pub fn link_by_heading<F>(&mut self, heading: F)
    where
        F: Fn(&C, &C) -> f64,
    {
        let mut stars: Vec<SmallVec<[(f64, HalfEdgeId); 4]>> =
            (0..self.vertices.len()).map(|_| SmallVec::new()).collect();

        for i in 0..self.half_edges.len() {
            let he = HalfEdgeId(i);
            let origin = self.half_edges[i].origin;
            let dest = self.dest(he);
            let angle = heading(&self.vertices[origin.0].coords, &self.vertices[dest.0].coords);
            stars[origin.0].push((angle, he));
        }

        for star in &mut stars {
            star.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let k = star.len();
            for i in 0..k {
                let outgoing = star[i].1;
                let turn = star[(i + k - 1) % k].1;
                let incoming = self.half_edges[outgoing.0].twin;
                self.set_next(incoming, turn);
            }
        }
    }

    /// One representative half-edge per face cycle, in index order of the
    /// first half-edge visited.
    pub fn cycles(&self) -> Vec<HalfEdgeId> {
        let mut seen = vec![false; self.half_edges.len()];
        let mut starts = Vec::new();
        for i in 0..self.half_edges.len() {
            if seen[i] { continue; }
            let start = HalfEdgeId(i);
            for he in self.face_cycle(start) {
                seen[he.0] = true;
            }
            starts.push(start);
        }
        starts
    }

    // -----------------------------------------------------------------------
    // Traversal
    // -----------------------------------------------------------------------

    /// Iterate over the half-edges of the cycle containing `start`, following
    /// `next` links until returning to `start`.
    pub fn face_cycle(&self, start: HalfEdgeId) -> FaceCycle<'_, C> {
        FaceCycle { dcel: self, start, current: start, done: false }
    }
}

/// Iterator over half-edges in a face cycle.
pub struct FaceCycle<'a, C> {
    dcel:    &'a Dcel<C>,
    start:   HalfEdgeId,
    current: HalfEdgeId,
    done:    bool,
}

impl<'a, C> Iterator for FaceCycle<'a, C> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<HalfEdgeId> {
        if self.done { return None; }
        let he = self.current;
        self.current = self.dcel.half_edges[he.0].next;
        if self.current == self.start { self.done = true; }
        Some(he)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
