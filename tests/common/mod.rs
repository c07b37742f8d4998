#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use zarrs::array::{ArrayBuilder, data_type};
use zarrs::group::GroupBuilder;
use zarrs::storage::byte_range::{ByteRange, ByteRangeIterator};
use zarrs::storage::store::MemoryStore;
use zarrs::storage::{
    ListableStorageTraits, MaybeBytes, MaybeBytesIterator, OffsetBytesIterator,
    ReadableListableStorage, ReadableStorageTraits, ReadableWritableListableStorage,
    StorageError, StoreKey, StoreKeys, StoreKeysPrefixes, StorePrefix, WritableStorageTraits,
};

pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// A quantized cube and its sidecars, ready to be written to a store.
pub struct Cube {
    pub data_name: &'static str,
    pub shape: Vec<u64>,
    pub chunks: Vec<u64>,
    pub values: Vec<u16>,
    pub wavenumber_name: &'static str,
    pub wavenumbers: Vec<f32>,
    pub mask: Option<(Vec<u64>, Vec<u8>)>,
}

impl Cube {
    /// Deterministic pseudo-random values covering the full uint16 range.
    pub fn new(shape: &[u64], chunks: &[u64]) -> Self {
        let n: u64 = shape.iter().product();
        let mut state: u32 = 0x2545_f491;
        let values = (0..n)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 16) as u16
            })
            .collect();
        let bands = *shape.last().unwrap();
        Self {
            data_name: "hyperspec",
            shape: shape.to_vec(),
            chunks: chunks.to_vec(),
            values,
            wavenumber_name: "wvnm",
            wavenumbers: (0..bands).map(|i| 950.0 + 2.5 * i as f32).collect(),
            mask: None,
        }
    }

    pub fn zeros(shape: &[u64], chunks: &[u64]) -> Self {
        let mut cube = Self::new(shape, chunks);
        cube.values.iter_mut().for_each(|v| *v = 0);
        cube
    }

    pub fn with_names(mut self, data: &'static str, wavenumber: &'static str) -> Self {
        self.data_name = data;
        self.wavenumber_name = wavenumber;
        self
    }

    /// Add a mask over the first two axes.
    pub fn with_mask(mut self) -> Self {
        let shape = self.shape[..2].to_vec();
        let n: u64 = shape.iter().product();
        let values = (0..n).map(|i| (i % 3 == 0) as u8).collect();
        self.mask = Some((shape, values));
        self
    }

    pub fn write(&self, store: &ReadableWritableListableStorage, group: &str) {
        write_groups(store, group);

        let data = ArrayBuilder::new(
            self.shape.clone(),
            self.chunks.clone(),
            data_type::uint16(),
            0u16,
        )
        .build(store.clone(), &format!("/{group}/{}", self.data_name))
        .unwrap();
        data.store_metadata().unwrap();
        data.store_array_subset(&data.subset_all(), &self.values)
            .unwrap();

        let wav_shape = vec![self.wavenumbers.len() as u64];
        let wav = ArrayBuilder::new(
            wav_shape.clone(),
            wav_shape,
            data_type::float32(),
            0.0f32,
        )
        .build(store.clone(), &format!("/{group}/{}", self.wavenumber_name))
        .unwrap();
        wav.store_metadata().unwrap();
        wav.store_array_subset(&wav.subset_all(), &self.wavenumbers)
            .unwrap();

        if let Some((shape, values)) = &self.mask {
            let mask = ArrayBuilder::new(shape.clone(), vec![4, 4], data_type::uint8(), 0u8)
                .build(store.clone(), &format!("/{group}/mask"))
                .unwrap();
            mask.store_metadata().unwrap();
            mask.store_array_subset(&mask.subset_all(), values).unwrap();
        }
    }

    /// Element count of the data array.
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Store the root group and `group` metadata.
pub fn write_groups(store: &ReadableWritableListableStorage, group: &str) {
    for path in ["/".to_string(), format!("/{group}")] {
        GroupBuilder::new()
            .build(store.clone(), &path)
            .unwrap()
            .store_metadata()
            .unwrap();
    }
}

/// An in-memory store, as both a writable and a read-only handle.
pub fn memory_store() -> (ReadableWritableListableStorage, ReadableListableStorage) {
    let store = Arc::new(MemoryStore::new());
    (store.clone(), store)
}

/// A store whose writes under `prefix` start failing after `budget` of them succeed.
pub struct FailingStore {
    inner: MemoryStore,
    prefix: String,
    remaining: AtomicUsize,
}

impl FailingStore {
    pub fn new(prefix: &str, budget: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            prefix: prefix.to_string(),
            remaining: AtomicUsize::new(budget),
        }
    }
}

impl ReadableStorageTraits for FailingStore {
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        self.inner.size_key(key)
    }

    fn supports_get_partial(&self) -> bool {
        false
    }

    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        self.inner.get(key)
    }

    fn get_partial_many<'a>(
        &'a self,
        _key: &StoreKey,
        _byte_ranges: ByteRangeIterator<'a>,
    ) -> Result<MaybeBytesIterator<'a>, StorageError> {
        Err(StorageError::Unsupported(
            "get_partial_many not supported".into(),
        ))
    }

    fn get_partial(
        &self,
        _key: &StoreKey,
        _byte_range: ByteRange,
    ) -> Result<MaybeBytes, StorageError> {
        Err(StorageError::Unsupported("get_partial not supported".into()))
    }
}

impl ListableStorageTraits for FailingStore {
    fn list(&self) -> Result<StoreKeys, StorageError> {
        self.inner.list()
    }

    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        self.inner.list_prefix(prefix)
    }

    fn list_dir(&self, prefix: &StorePrefix) -> Result<StoreKeysPrefixes, StorageError> {
        self.inner.list_dir(prefix)
    }

    fn size_prefix(&self, prefix: &StorePrefix) -> Result<u64, StorageError> {
        self.inner.size_prefix(prefix)
    }

    fn size(&self) -> Result<u64, StorageError> {
        self.inner.size()
    }
}

impl WritableStorageTraits for FailingStore {
    fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        if key.as_str().starts_with(&self.prefix) {
            let left = self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if left.is_err() {
                return Err(std::io::Error::other(format!("no space left for {}", key.as_str())).into());
            }
        }
        self.inner.set(key, value)
    }

    fn supports_set_partial(&self) -> bool {
        false
    }

    fn set_partial_many<'a>(
        &'a self,
        _key: &StoreKey,
        _offset_values: OffsetBytesIterator<'a>,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unsupported(
            "set_partial_many not supported".into(),
        ))
    }

    fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        self.inner.erase(key)
    }

    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError> {
        self.inner.erase_prefix(prefix)
    }
}
