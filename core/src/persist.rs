use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::Hash;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::archive::{InputArchive, OutputArchive};
use crate::class_traits::{template_name, ClassTraits};
use crate::error::{ArchiveError, ArchiveResult};

/// Save/load routine of a serializable type.
///
/// `version` is the class version read from (or written to) the stream, or the
/// current `VERSION` when the type does not store class info. `load` constructs the
/// value, reading any construction arguments first.
pub trait Persist: ClassTraits + Sized {
  fn save(&self, ar: &mut OutputArchive<'_>, version: u32) -> ArchiveResult<()>;

  fn load(ar: &mut InputArchive<'_>, version: u32) -> ArchiveResult<Self>;
}

// Upper bound for capacity reserved from an untrusted count.
const PREALLOCATION_LIMIT: usize = 4096;

macro_rules! primitive_persist {
  ($($ty:ty),* $(,)?) => {
    $(
      impl Persist for $ty {
        fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
          ar.write_primitive(*self)
        }

        fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
          ar.read_primitive()
        }
      }
    )*
  };
}

primitive_persist!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize, f32, f64, bool, char);

impl Persist for String {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_str(self)
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    ar.read_string()
  }
}

macro_rules! collection_class_traits {
  ($outer:literal, impl<$($param:ident),*> for $ty:ty) => {
    impl<$($param: ClassTraits),*> ClassTraits for $ty {
      const TRACKED: bool = false;
      const STORE_CLASS_INFO: bool = false;

      fn class_name() -> Cow<'static, str> {
        Cow::Owned(template_name($outer, &[$($param::class_name()),*]))
      }
    }
  };
}

collection_class_traits!("Vec", impl<T> for Vec<T>);
collection_class_traits!("VecDeque", impl<T> for VecDeque<T>);
collection_class_traits!("BTreeMap", impl<K, V> for BTreeMap<K, V>);
collection_class_traits!("HashMap", impl<K, V> for HashMap<K, V>);
collection_class_traits!("Pair", impl<A, B> for (A, B));

impl<T: Persist> Persist for Vec<T> {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_count(self.len())?;
    self.iter().try_for_each(|item| ar.write(item))
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let count = ar.read_count()?;
    let mut items = Vec::with_capacity(count.min(PREALLOCATION_LIMIT));
    for _ in 0..count {
      items.push(ar.read()?);
    }
    Ok(items)
  }
}

impl<T: Persist> Persist for VecDeque<T> {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_count(self.len())?;
    self.iter().try_for_each(|item| ar.write(item))
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let count = ar.read_count()?;
    let mut items = VecDeque::with_capacity(count.min(PREALLOCATION_LIMIT));
    for _ in 0..count {
      items.push_back(ar.read()?);
    }
    Ok(items)
  }
}

impl<K: Persist + Ord, V: Persist> Persist for BTreeMap<K, V> {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_count(self.len())?;
    for (key, value) in self {
      ar.write(key)?;
      ar.write(value)?;
    }
    Ok(())
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let count = ar.read_count()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
      let key = ar.read()?;
      let value = ar.read()?;
      entries.insert(key, value);
    }
    Ok(entries)
  }
}

impl<K: Persist + Eq + Hash, V: Persist> Persist for HashMap<K, V> {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_count(self.len())?;
    for (key, value) in self {
      ar.write(key)?;
      ar.write(value)?;
    }
    Ok(())
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let count = ar.read_count()?;
    let mut entries = HashMap::with_capacity(count.min(PREALLOCATION_LIMIT));
    for _ in 0..count {
      let key = ar.read()?;
      let value = ar.read()?;
      entries.insert(key, value);
    }
    Ok(entries)
  }
}

impl<A: Persist, B: Persist> Persist for (A, B) {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write(&self.0)?;
    ar.write(&self.1)
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    Ok((ar.read()?, ar.read()?))
  }
}

impl ClassTraits for NaiveDate {
  const NAME: &'static str = "date";
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;
}

/// Days since 0001-01-01 (day 1).
impl Persist for NaiveDate {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_primitive(self.num_days_from_ce())
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let days: i32 = ar.read_primitive()?;
    NaiveDate::from_num_days_from_ce_opt(days)
      .ok_or_else(|| ArchiveError::invalid_data_format(format!("{days} is not a valid day number")))
  }
}

impl ClassTraits for NaiveTime {
  const NAME: &'static str = "time";
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;
}

/// Seconds since midnight, then nanoseconds. Leap seconds carry nanoseconds past one billion.
impl Persist for NaiveTime {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write_primitive(self.num_seconds_from_midnight())?;
    ar.write_primitive(self.nanosecond())
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let secs: u32 = ar.read_primitive()?;
    let nanos: u32 = ar.read_primitive()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
      .ok_or_else(|| ArchiveError::invalid_data_format(format!("{secs}s {nanos}ns is not a valid time of day")))
  }
}

impl ClassTraits for NaiveDateTime {
  const NAME: &'static str = "datetime";
  const TRACKED: bool = false;
  const STORE_CLASS_INFO: bool = false;
}

impl Persist for NaiveDateTime {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.write(&self.date())?;
    ar.write(&self.time())
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    let date: NaiveDate = ar.read()?;
    let time: NaiveTime = ar.read()?;
    Ok(NaiveDateTime::new(date, time))
  }
}
