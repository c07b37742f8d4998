use std::num::NonZeroU64;

use crate::schema::ArrayRole;

pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxedError = Box<dyn std::error::Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("group '{0}' not found in the source store")]
    GroupNotFound(String),
    #[error("could not find a {role} array; searched for {aliases:?}")]
    MissingArray {
        role: ArrayRole,
        aliases: &'static [&'static str],
    },
    #[error("array '{name}' has data type '{found}', but 'uint16' is required")]
    UnsupportedDtype { name: String, found: String },
    #[error("array shape {shape:?} does not match the dimensionality of chunk shape {chunk_shape:?}")]
    ChunkShapeMismatch {
        shape: Vec<u64>,
        chunk_shape: Vec<NonZeroU64>,
    },
    #[error("could not read from the source store: {0}")]
    StorageRead(#[source] BoxedError),
    #[error("could not write to the destination store: {0}")]
    StorageWrite(#[source] BoxedError),
    #[error("could not create the destination: {0}")]
    DestinationWrite(#[source] BoxedError),
}

impl Error {
    pub fn read(error: impl std::error::Error + 'static) -> Self {
        Self::StorageRead(Box::new(error))
    }

    pub fn write(error: impl std::error::Error + 'static) -> Self {
        Self::StorageWrite(Box::new(error))
    }

    pub fn destination(error: impl std::error::Error + 'static) -> Self {
        Self::DestinationWrite(Box::new(error))
    }
}
