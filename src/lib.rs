//! Chunk-wise inverse quantization of hyperspectral Zarr cubes.
//!
//! Cubes are stored as `uint16` with the affine quantization described by
//! [Calibration]. Decompression reads one source chunk at a time, so peak
//! memory is bounded by the chunk size when writing to a new store
//! ([decompress_to_storage]) and by the output size when decoding into memory
//! ([decompress_to_memory]).
//!
//! Logs go through the [log] crate; no logger is installed by this crate.
pub mod chunk;
mod error;
pub mod memory;
pub mod schema;
pub mod sidecar;
pub mod storage;
pub mod transform;

pub use zarrs;

pub use error::{Error, Result};
pub use memory::{DecompressedCube, decompress_store_to_memory, decompress_to_memory};
pub use schema::SchemaResult;
pub use storage::{decompress_store_to_storage, decompress_to_storage};
pub use transform::{Calibration, ValueTransform};

/// Source group read when none is given.
pub const DEFAULT_GROUP: &str = "0";
