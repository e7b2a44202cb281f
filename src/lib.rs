#![doc = "Row-wise polygon union over multi-polygon columns"]
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod function;
pub mod geom;
pub mod io;

#[doc(inline)]
pub use config::{RowErrorPolicy, UnionConfig};

#[doc(inline)]
pub use error::{Result, UnionError};

#[doc(inline)]
pub use function::{union_rows, Argument, PolygonsUnion, CARTESIAN_NAME, GEOGRAPHIC_NAME};

#[doc(inline)]
pub use geom::{union, Domain};
