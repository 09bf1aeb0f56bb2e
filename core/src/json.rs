use std::ops::{Deref, DerefMut};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::archive::{InputArchive, OutputArchive};
use crate::class_traits::ClassTraits;
use crate::error::{ArchiveError, ArchiveResult};
use crate::persist::Persist;

/// Persists any serde type as one JSON document string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> Deref for Json<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T> DerefMut for Json<T> {
  fn deref_mut(&mut self) -> &mut T {
    &mut self.0
  }
}

impl<T> ClassTraits for Json<T> {
  const NAME: &'static str = "Json";
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;
}

impl<T: Serialize + DeserializeOwned> Persist for Json<T> {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    let document = serde_json::to_string(&self.0).map_err(|err| ArchiveError::unknown(err.to_string()))?;
    ar.write_str(&document)
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let document = ar.read_string()?;
    serde_json::from_str(&document)
      .map(Json)
      .map_err(|err| ArchiveError::invalid_data_format(err.to_string()))
  }
}
