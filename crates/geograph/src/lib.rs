//! Planar subdivision building blocks: an arena-indexed DCEL and a tolerant
//! vertex snapper.  The crate knows nothing about coordinate domains; callers
//! supply headings when linking edges.

pub mod dcel;
pub mod snap;

pub use dcel::{Dcel, FaceId, HalfEdgeId, VertexId, OUTER_FACE};
pub use snap::VertexSnapper;
