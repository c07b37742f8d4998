use zarrs::{
    array::{ArrayBuilder, ArrayBytes, DataType, ElementOwned, FillValue},
    storage::{ReadableListableStorage, ReadableWritableListableStorage},
};

use crate::{Error, Result, schema};

/// An auxiliary array (wavenumber axis or mask), held exactly as stored.
#[derive(Debug, Clone)]
pub struct SidecarArray {
    name: String,
    shape: Vec<u64>,
    data_type: DataType,
    fill_value: FillValue,
    bytes: ArrayBytes<'static>,
}

impl SidecarArray {
    /// Read a member array of `group` in full.
    pub fn read(store: &ReadableListableStorage, group: &str, name: &str) -> Result<Self> {
        let array = schema::open_member(store, group, name)?;
        let bytes: ArrayBytes<'static> = array
            .retrieve_array_subset(&array.subset_all())
            .map_err(Error::read)?;
        Ok(Self {
            name: name.to_string(),
            shape: array.shape().to_vec(),
            data_type: array.data_type().clone(),
            fill_value: array.fill_value().clone(),
            bytes,
        })
    }

    /// Name of the source member this was read from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn bytes(&self) -> &ArrayBytes<'static> {
        &self.bytes
    }

    /// Decode into typed elements in C order.
    pub fn into_elements<T: ElementOwned>(self) -> Result<Vec<T>> {
        T::from_array_bytes(&self.data_type, self.bytes).map_err(Error::read)
    }

    /// Write as a new single-chunk array at `path` of `store`.
    ///
    /// The data type and fill value are kept; the chunk spans the whole array.
    pub fn write(&self, store: &ReadableWritableListableStorage, path: &str) -> Result<()> {
        // Chunk extents must be non-zero even when an axis is empty.
        let chunk_shape: Vec<u64> = self.shape.iter().map(|&n| n.max(1)).collect();
        let array = ArrayBuilder::new(
            self.shape.clone(),
            chunk_shape,
            self.data_type.clone(),
            self.fill_value.clone(),
        )
        .build(store.clone(), path)
        .map_err(Error::destination)?;
        array.store_metadata().map_err(Error::destination)?;
        array
            .store_array_subset(&array.subset_all(), self.bytes.clone())
            .map_err(Error::write)?;
        log::info!("Copied '{}' to '{path}'", self.name);
        Ok(())
    }
}

