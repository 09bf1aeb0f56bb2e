use std::fmt::{Debug, Formatter};
use std::io::Write;

use archivum_utils_rs::io::Device;
use num_enum::TryFromPrimitive;

use crate::archive::{ArchiveState, ObjectId, TrackedHandle, WriteIdentityTable};
use crate::binary::BinaryWriter;
use crate::codec::{ArchiveFormat, Primitive, PrimitiveWriter, ARCHIVE_MAJOR_VERSION};
use crate::config::ArchiveConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{ArchiveError, ArchiveResult};
use crate::persist::Persist;
use crate::pointer::{DispatchStrategy, PointerTag, Pointee};
use crate::registry::ClassRegistry;
use crate::text::TextWriter;

/// Write side of one serialization session.
///
/// The header is written on construction; after the first codec failure the archive
/// refuses further work.
pub struct OutputArchive<'a> {
  codec: Box<dyn PrimitiveWriter + 'a>,
  registry: ClassRegistry,
  identities: WriteIdentityTable,
  major_version: u32,
  minor_version: u32,
  state: ArchiveState,
}

impl<'a> OutputArchive<'a> {
  pub fn new(codec: impl PrimitiveWriter + 'a, config: ArchiveConfig) -> ArchiveResult<Self> {
    if !codec.is_open() {
      return Err(ArchiveError::stream_not_open());
    }
    let format = codec.format();
    let major_version = config.major_version;
    let minor_version = format.minor_version();
    if major_version > ARCHIVE_MAJOR_VERSION {
      return Err(ArchiveError::archive_version_mismatch(
        major_version,
        minor_version,
        ARCHIVE_MAJOR_VERSION,
        minor_version,
      ));
    }
    let mut codec: Box<dyn PrimitiveWriter + 'a> = Box::new(codec);
    codec.write_header(major_version, minor_version)?;
    tracing::debug!(%format, major_version, minor_version, "output archive opened");
    Ok(Self {
      codec,
      registry: config.registry,
      identities: WriteIdentityTable::new(),
      major_version,
      minor_version,
      state: ArchiveState::Open,
    })
  }

  pub fn binary<W: Write + Device + 'a>(stream: W, config: ArchiveConfig) -> ArchiveResult<Self> {
    Self::new(BinaryWriter::new(stream), config)
  }

  pub fn text<W: Write + Device + 'a>(stream: W, config: ArchiveConfig) -> ArchiveResult<Self> {
    Self::new(TextWriter::new(stream), config)
  }

  pub fn format(&self) -> ArchiveFormat {
    self.codec.format()
  }

  pub fn major_version(&self) -> u32 {
    self.major_version
  }

  pub fn minor_version(&self) -> u32 {
    self.minor_version
  }

  pub fn state(&self) -> ArchiveState {
    self.state
  }

  pub fn registry(&self) -> &ClassRegistry {
    &self.registry
  }

  /// Writes a value, preceded by its class version when the type stores class info.
  pub fn write<T: Persist>(&mut self, value: &T) -> ArchiveResult<()> {
    if T::IS_PRIMITIVE {
      return value.save(self, T::VERSION);
    }
    let version = self.write_class_version(T::STORE_CLASS_INFO, T::VERSION)?;
    value.save(self, version)
  }

  /// Writes a value as a named key/value pair.
  pub fn field<T: Persist>(&mut self, name: &str, value: &T) -> ArchiveResult<()> {
    self.with_codec(|codec| codec.begin_field(name))?;
    self.write(value)?;
    self.with_codec(|codec| codec.end_field(name))
  }

  /// Writes the state of a direct base as a standalone object with its own version.
  pub fn base<T: Persist>(&mut self, base: &T) -> ArchiveResult<()> {
    tracing::trace!(class = %T::class_name(), "base");
    self.write(base)
  }

  pub fn write_primitive<P: Primitive>(&mut self, value: P) -> ArchiveResult<()> {
    self.with_codec(|codec| {
      codec.begin_value()?;
      value.write_to(codec)?;
      codec.end_value()
    })
  }

  pub fn write_str(&mut self, text: &str) -> ArchiveResult<()> {
    self.with_codec(|codec| {
      codec.begin_value()?;
      codec.write_text(text)?;
      codec.end_value()
    })
  }

  /// Length-prefixed byte array.
  pub fn write_bytes(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
    self.with_codec(|codec| {
      codec.begin_value()?;
      codec.write_bytes(bytes)?;
      codec.end_value()
    })
  }

  /// Bytes without a length; the reader must ask for exactly `bytes.len()` bytes.
  pub fn write_raw_span(&mut self, bytes: &[u8]) -> ArchiveResult<()> {
    self.with_codec(|codec| {
      codec.begin_value()?;
      codec.write_raw_span(bytes)?;
      codec.end_value()
    })
  }

  pub fn write_count(&mut self, count: usize) -> ArchiveResult<()> {
    let count = u32::try_from(count)
      .map_err(|_| ArchiveError::invalid_data_format(format!("count {count} exceeds the u32 prefix")))?;
    self.write_primitive(count)
  }

  /// Writes an enum as its underlying integer representation.
  pub fn write_enum<E>(&mut self, value: E) -> ArchiveResult<()>
  where
    E: TryFromPrimitive,
    E::Primitive: Primitive + From<E>, {
    let raw: E::Primitive = value.into();
    self.write_primitive(raw)
  }

  /// Writes `object` as a shared object identified by a caller-chosen id.
  ///
  /// Later calls with the same id emit a back-reference.
  pub fn write_tracked<T>(&mut self, id: ObjectId, object: &T) -> ArchiveResult<()>
  where
    T: Pointee + ?Sized,
    T::Dispatch: DispatchStrategy<T>, {
    self.write_pointer(Some(object), Some(TrackedHandle::logical(id)))
  }

  /// Flushes the stream and ends the session.
  pub fn finish(mut self) -> ArchiveResult<()> {
    self.with_codec(|codec| codec.flush())?;
    tracing::debug!(format = %self.format(), objects = self.identities.len(), "output archive finished");
    Ok(())
  }

  pub(crate) fn write_pointer<T>(&mut self, object: Option<&T>, identity: Option<TrackedHandle>) -> ArchiveResult<()>
  where
    T: Pointee + ?Sized,
    T::Dispatch: DispatchStrategy<T>, {
    let Some(object) = object else {
      return self.write_enum(PointerTag::Null);
    };
    match identity.filter(|_| T::TRACKED && !T::IS_PRIMITIVE) {
      Some(identity) => {
        if let Some(key) = self.identities.lookup::<T>(&identity.id())? {
          tracing::trace!(key, class = %T::class_name(), "back-reference");
          self.write_enum(PointerTag::Reference)?;
          return self.write_primitive(key);
        }
        let key = self.identities.insert::<T>(identity);
        tracing::trace!(key, class = %T::class_name(), "new tracked object");
        self.write_enum(PointerTag::NewTracked)?;
        self.write_primitive(key)?;
      }
      None => self.write_enum(PointerTag::NewUntracked)?,
    }
    let descriptor = <T::Dispatch as DispatchStrategy<T>>::describe(object);
    self.write_descriptor(&descriptor)?;
    let version = self.write_class_version(descriptor.store_version(), descriptor.version())?;
    <T::Dispatch as DispatchStrategy<T>>::save(object, self, &descriptor, version)
  }

  pub(crate) fn write_descriptor(&mut self, descriptor: &TypeDescriptor) -> ArchiveResult<()> {
    self.write_str(descriptor.name())
  }

  /// Writes `version` when class info is stored and returns the version handed to `save`.
  /// Legacy major 0 archives carry no class versions.
  pub(crate) fn write_class_version(&mut self, store_version: bool, version: u32) -> ArchiveResult<u32> {
    if self.major_version == 0 {
      return Ok(0);
    }
    if store_version {
      self.write_primitive(version)?;
    }
    Ok(version)
  }

  fn with_codec<R>(
    &mut self,
    f: impl FnOnce(&mut (dyn PrimitiveWriter + 'a)) -> ArchiveResult<R>,
  ) -> ArchiveResult<R> {
    if self.state == ArchiveState::Failed {
      return Err(ArchiveError::stream("output archive has already failed"));
    }
    let result = f(self.codec.as_mut());
    if let Err(err) = &result {
      tracing::debug!(error = %err, "output archive failed");
      self.state = ArchiveState::Failed;
    }
    result
  }
}

impl Debug for OutputArchive<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OutputArchive")
      .field("format", &self.format())
      .field("major_version", &self.major_version)
      .field("minor_version", &self.minor_version)
      .field("state", &self.state)
      .field("identities", &self.identities)
      .finish()
  }
}
