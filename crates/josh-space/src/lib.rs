//! Grid-space geometry for the Josh simulation engine: patch grids,
//! the precomputed grid binary format, Earth↔grid projection, grid
//! combination, and the virtual-file-system wire format.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod combiner;
pub mod error;
pub mod patch_grid;
pub mod precomputed;
pub mod projection;
pub mod vfs;

pub use combiner::GridCombiner;
pub use error::{GridAxis, GridError};
pub use patch_grid::PatchGrid;
pub use precomputed::PrecomputedGrid;
pub use projection::{haversine_meters, EarthExtents, ExtentsTransformer, PatchKeyConverter};
pub use vfs::{parse_vfs_stream, write_vfs_stream, VfsEntry};
