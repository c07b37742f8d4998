use std::{ops::Range, path::Path};

use ndarray::{ArrayD, IxDyn, Slice};
use zarrs::storage::ReadableListableStorage;

use crate::{
    Error, Result,
    chunk::{ChunkCoordinate, ChunkGrid},
    schema::{self, SchemaResult},
    sidecar::SidecarArray,
    storage::open_source,
    transform::{Calibration, ValueTransform},
};

/// A fully decompressed hyperspectral cube.
#[derive(Debug, Clone)]
pub struct DecompressedCube {
    /// Source member names the arrays were read from.
    pub schema: SchemaResult,
    pub data: ArrayD<f32>,
    pub wavenumber: SidecarArray,
    pub mask: Option<SidecarArray>,
}

/// Decompress `group` of the store at `source_path` into memory.
pub fn decompress_to_memory(
    source_path: impl AsRef<Path>,
    group: &str,
) -> Result<DecompressedCube> {
    let store = open_source(source_path)?;
    decompress_store_to_memory(&store, group, &Calibration::QCL)
}

/// Decompress `group` of `store` into memory, one source chunk at a time.
///
/// Nothing is returned unless every chunk was read.
pub fn decompress_store_to_memory(
    store: &ReadableListableStorage,
    group: &str,
    calibration: &Calibration,
) -> Result<DecompressedCube> {
    log::info!("Starting chunk-wise decompression of group '{group}' to memory");
    let schema = schema::resolve(store, group)?;

    let source = schema::open_member(store, group, &schema.data)?;
    let grid = ChunkGrid::from_array(&source)?;
    log::info!(
        "Source: shape={:?}, chunks={:?}, dtype={}",
        grid.shape(),
        grid.chunk_shape(),
        schema::data_type_name(source.data_type()),
    );

    let mut data = ArrayD::<f32>::zeros(IxDyn(&to_usize(grid.shape())?));
    let transform = ValueTransform::new(*calibration);
    let total = grid.num_chunks();
    for (idx, coord) in grid.iter().enumerate() {
        log::debug!("Chunk {}/{total}: {:?}", idx + 1, coord.ranges());
        let raw: ArrayD<u16> = source
            .retrieve_array_subset(&coord.to_subset())
            .map_err(Error::read)?;
        write_block(&mut data, &coord, &transform.apply(raw.view()))?;
    }

    let wavenumber = SidecarArray::read(store, group, &schema.wavenumber)?;
    let mask = schema
        .mask
        .as_deref()
        .map(|name| SidecarArray::read(store, group, name))
        .transpose()?;

    log::info!("Decompression of group '{group}' to memory complete");
    Ok(DecompressedCube {
        schema,
        data,
        wavenumber,
        mask,
    })
}

/// Copy `block` into the region of `dest` covered by `coord`.
fn write_block(
    dest: &mut ArrayD<f32>,
    coord: &ChunkCoordinate,
    block: &ArrayD<f32>,
) -> Result<()> {
    let ranges = coord
        .ranges()
        .iter()
        .map(to_usize_range)
        .collect::<Result<Vec<_>>>()?;
    dest.slice_each_axis_mut(|ax| Slice::from(ranges[ax.axis.index()].clone()))
        .assign(block);
    Ok(())
}

fn to_usize(values: &[u64]) -> Result<Vec<usize>> {
    values
        .iter()
        .map(|&v| usize::try_from(v).map_err(Error::read))
        .collect()
}

fn to_usize_range(range: &Range<u64>) -> Result<Range<usize>> {
    let start = usize::try_from(range.start).map_err(Error::read)?;
    let end = usize::try_from(range.end).map_err(Error::read)?;
    Ok(start..end)
}
