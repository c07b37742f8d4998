use std::{path::Path, sync::Arc};

use zarrs::{
    array::{ArrayBuilder, data_type},
    filesystem::FilesystemStore,
    group::GroupBuilder,
    storage::{
        ReadableListableStorage, ReadableWritableListableStorage, StorePrefix,
        WritableStorageTraits,
    },
};

use crate::{
    Error, Result,
    chunk::ChunkGrid,
    schema::{self, SchemaResult},
    sidecar::SidecarArray,
    transform::{Calibration, ValueTransform},
};

/// Group the decompressed arrays are written to, whatever the source group was.
pub const DESTINATION_GROUP: &str = "0";
/// Destination name of the decompressed data array.
pub const DATA_ARRAY: &str = "qcl_data";
/// Destination name of the copied wavenumber array.
pub const WAVENUMBER_ARRAY: &str = "wavenumbers";
/// Destination name of the copied mask array.
pub const MASK_ARRAY: &str = "mask";

/// Open an existing filesystem store for reading.
///
/// Unlike [FilesystemStore::new], a missing directory is an error rather than created.
pub fn open_source(path: impl AsRef<Path>) -> Result<ReadableListableStorage> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Err(Error::read(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no store at {}", path.display()),
        )));
    }
    let store = FilesystemStore::new(path).map_err(Error::read)?;
    Ok(Arc::new(store))
}

/// Open a filesystem store for writing, creating the directory if needed.
pub fn create_destination(path: impl AsRef<Path>) -> Result<ReadableWritableListableStorage> {
    let store = FilesystemStore::new(path.as_ref()).map_err(Error::destination)?;
    Ok(Arc::new(store))
}

/// Decompress `group` of the store at `source_path` into a new store at `dest_path`.
pub fn decompress_to_storage(
    source_path: impl AsRef<Path>,
    dest_path: impl AsRef<Path>,
    group: &str,
) -> Result<SchemaResult> {
    let (source_path, dest_path) = (source_path.as_ref(), dest_path.as_ref());
    let source = open_source(source_path)?;
    log::info!("Starting disk-to-disk decompression of group '{group}'");
    // Resolve before the destination directory is created.
    let schema = schema::resolve(&source, group)?;
    // The destination is truncated, so it must not be or contain the source.
    if let (Ok(src), Ok(dst)) = (source_path.canonicalize(), dest_path.canonicalize()) {
        if src.starts_with(&dst) {
            return Err(overlaps_source(format!(
                "destination {} contains the source store {}",
                dst.display(),
                src.display()
            )));
        }
    }
    let dest = create_destination(dest_path)?;
    write_decompressed(&source, &dest, group, schema, &Calibration::QCL)
}

/// Decompress `group` of `source` into `dest`, streaming one chunk at a time.
///
/// Anything already in `dest` is erased. The destination holds group
/// [DESTINATION_GROUP] with [DATA_ARRAY], [WAVENUMBER_ARRAY] and, if the source
/// has one, [MASK_ARRAY].
///
/// If a chunk fails to write, the chunks written before it stay in place.
/// Passing the source store itself as `dest` is a [Error::DestinationWrite].
pub fn decompress_store_to_storage(
    source: &ReadableListableStorage,
    dest: &ReadableWritableListableStorage,
    group: &str,
    calibration: &Calibration,
) -> Result<SchemaResult> {
    log::info!("Starting disk-to-disk decompression of group '{group}'");
    let schema = schema::resolve(source, group)?;
    write_decompressed(source, dest, group, schema, calibration)
}

fn write_decompressed(
    source: &ReadableListableStorage,
    dest: &ReadableWritableListableStorage,
    group: &str,
    schema: SchemaResult,
    calibration: &Calibration,
) -> Result<SchemaResult> {
    // Checked before the destination is erased.
    if std::ptr::addr_eq(Arc::as_ptr(source), Arc::as_ptr(dest)) {
        return Err(overlaps_source("destination is the source store".into()));
    }
    let source_array = schema::open_member(source, group, &schema.data)?;
    let grid = ChunkGrid::from_array(&source_array)?;
    log::info!(
        "Source: shape={:?}, chunks={:?}, dtype={}",
        grid.shape(),
        grid.chunk_shape(),
        schema::data_type_name(source_array.data_type()),
    );

    dest.erase_prefix(&StorePrefix::root())
        .map_err(Error::destination)?;
    for path in ["/".to_string(), schema::group_path(DESTINATION_GROUP)] {
        GroupBuilder::new()
            .build(dest.clone(), &path)
            .map_err(Error::destination)?
            .store_metadata()
            .map_err(Error::destination)?;
    }

    let chunk_shape: Vec<u64> = grid.chunk_shape().iter().map(|c| c.get()).collect();
    let dest_path = schema::array_path(DESTINATION_GROUP, DATA_ARRAY);
    let dest_array = ArrayBuilder::new(
        grid.shape().to_vec(),
        chunk_shape,
        data_type::float32(),
        0.0f32,
    )
    .build(dest.clone(), &dest_path)
    .map_err(Error::destination)?;
    dest_array.store_metadata().map_err(Error::destination)?;
    log::info!("Destination array '{dest_path}' created");

    let transform = ValueTransform::new(*calibration);
    let total = grid.num_chunks();
    for (idx, coord) in grid.iter().enumerate() {
        log::debug!("Chunk {}/{total}: {:?}", idx + 1, coord.ranges());
        let subset = coord.to_subset();
        let raw: Vec<u16> = source_array
            .retrieve_array_subset(&subset)
            .map_err(Error::read)?;
        let floats = transform.apply_slice(&raw);
        dest_array
            .store_array_subset(&subset, &floats)
            .map_err(Error::write)?;
    }

    SidecarArray::read(source, group, &schema.wavenumber)?.write(
        dest,
        &schema::array_path(DESTINATION_GROUP, WAVENUMBER_ARRAY),
    )?;
    if let Some(mask) = &schema.mask {
        SidecarArray::read(source, group, mask)?
            .write(dest, &schema::array_path(DESTINATION_GROUP, MASK_ARRAY))?;
    }

    log::info!("Decompression of group '{group}' to storage complete");
    Ok(schema)
}

fn overlaps_source(msg: String) -> Error {
    Error::destination(std::io::Error::new(std::io::ErrorKind::AlreadyExists, msg))
}
