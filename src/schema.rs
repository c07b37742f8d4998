use std::{borrow::Cow, fmt};

use serde::{Deserialize, Serialize};
use zarrs::{
    array::{Array, DataType},
    storage::{
        ListableStorageTraits, ReadableListableStorage, ReadableListableStorageTraits,
        StorageError, StorePrefix,
    },
};

use crate::{Error, Result};

/// Names the primary data array may be stored under, in priority order.
pub const DATA_ALIASES: &[&str] = &["hyperspec", "qcl_data", "data", "hyperspectral"];
/// Names the wavenumber axis may be stored under, in priority order.
pub const WAVENUMBER_ALIASES: &[&str] = &["wvnm", "wavenumber", "wavenumbers", "wav"];
/// The optional mask is only recognised under this name.
pub const MASK_NAME: &str = "mask";

const REQUIRED_DATA_TYPE: &str = "uint16";

/// Which required array an alias lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayRole {
    Data,
    Wavenumber,
}

impl ArrayRole {
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ArrayRole::Data => DATA_ALIASES,
            ArrayRole::Wavenumber => WAVENUMBER_ALIASES,
        }
    }
}

impl fmt::Display for ArrayRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayRole::Data => f.write_str("data"),
            ArrayRole::Wavenumber => f.write_str("wavenumber"),
        }
    }
}

/// Member names of the arrays making up a hyperspectral cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaResult {
    pub data: String,
    pub wavenumber: String,
    pub mask: Option<String>,
}

/// Node path of a group identifier, e.g. `"0"` -> `"/0"`.
pub fn group_path(group: &str) -> String {
    format!("/{}", group.trim_matches('/'))
}

/// Node path of a member array of a group.
pub fn array_path(group: &str, name: &str) -> String {
    let group = group.trim_matches('/');
    if group.is_empty() {
        format!("/{name}")
    } else {
        format!("/{group}/{name}")
    }
}

fn group_prefix(group: &str) -> Result<StorePrefix> {
    let group = group.trim_matches('/');
    if group.is_empty() {
        Ok(StorePrefix::root())
    } else {
        StorePrefix::new(format!("{group}/")).map_err(Error::read)
    }
}

/// First alias, in priority order, present among `members`.
pub fn resolve_alias<'a, S: AsRef<str>>(aliases: &[&'a str], members: &[S]) -> Option<&'a str> {
    aliases
        .iter()
        .copied()
        .find(|alias| members.iter().any(|m| m.as_ref() == *alias))
}

/// List the names of the direct children (arrays and groups) of a group.
pub fn list_members(store: &ReadableListableStorage, group: &str) -> Result<Vec<String>> {
    let prefix = group_prefix(group)?;
    let listing = match store.list_dir(&prefix) {
        Ok(l) => l,
        Err(StorageError::IOError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::GroupNotFound(group.to_string()));
        }
        Err(e) => return Err(Error::read(e)),
    };
    if listing.keys().is_empty() && listing.prefixes().is_empty() {
        return Err(Error::GroupNotFound(group.to_string()));
    }
    let members = listing
        .prefixes()
        .iter()
        .filter_map(|p| {
            p.as_str()
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .map(str::to_string)
        })
        .collect();
    Ok(members)
}

/// Open a member array of `group`.
pub fn open_member(
    store: &ReadableListableStorage,
    group: &str,
    name: &str,
) -> Result<Array<dyn ReadableListableStorageTraits>> {
    Array::open(store.clone(), &array_path(group, name)).map_err(Error::read)
}

/// Canonical name of a data type, e.g. `uint16`.
pub(crate) fn data_type_name(data_type: &DataType) -> String {
    data_type
        .name_v3()
        .map_or_else(|| format!("{data_type:?}"), Cow::into_owned)
}

fn check_data_type(name: &str, data_type: &DataType) -> Result<()> {
    let found = data_type_name(data_type);
    if found == REQUIRED_DATA_TYPE {
        Ok(())
    } else {
        Err(Error::UnsupportedDtype {
            name: name.to_string(),
            found,
        })
    }
}

fn require(role: ArrayRole, members: &[String]) -> Result<String> {
    resolve_alias(role.aliases(), members)
        .map(str::to_string)
        .ok_or(Error::MissingArray {
            role,
            aliases: role.aliases(),
        })
}

/// Find the data, wavenumber, and mask arrays of `group` and check the data is uint16.
///
/// Only member names and the data array's metadata are read.
pub fn resolve(store: &ReadableListableStorage, group: &str) -> Result<SchemaResult> {
    log::info!("Searching for arrays in group '{group}'");
    let members = list_members(store, group)?;

    let data = require(ArrayRole::Data, &members)?;
    let wavenumber = require(ArrayRole::Wavenumber, &members)?;

    log::info!("Verifying data type of '{data}'");
    let array = open_member(store, group, &data)?;
    check_data_type(&data, array.data_type())?;

    let mask = members
        .iter()
        .any(|m| m == MASK_NAME)
        .then(|| MASK_NAME.to_string());

    log::info!("Found data '{data}', wavenumber '{wavenumber}', mask {mask:?}");
    Ok(SchemaResult {
        data,
        wavenumber,
        mask,
    })
}
