use std::fmt::{Debug, Formatter};
use std::io::Read;

use archivum_utils_rs::io::Device;
use num_enum::TryFromPrimitive;

use crate::archive::{ArchiveState, ReadIdentityTable};
use crate::binary::BinaryReader;
use crate::codec::{ArchiveFormat, Primitive, PrimitiveReader, ARCHIVE_MAJOR_VERSION};
use crate::config::ArchiveConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{ArchiveError, ArchiveResult};
use crate::persist::Persist;
use crate::pointer::{DispatchStrategy, IncomingPointer, PointerTag, Pointee};
use crate::registry::ClassRegistry;
use crate::text::TextReader;

/// Read side of one serialization session.
///
/// The header is read and validated on construction.
pub struct InputArchive<'a> {
  codec: Box<dyn PrimitiveReader + 'a>,
  registry: ClassRegistry,
  identities: ReadIdentityTable,
  major_version: u32,
  minor_version: u32,
  max_length: usize,
  state: ArchiveState,
}

impl<'a> InputArchive<'a> {
  pub fn new(codec: impl PrimitiveReader + 'a, config: ArchiveConfig) -> ArchiveResult<Self> {
    if !codec.is_open() {
      return Err(ArchiveError::stream_not_open());
    }
    let mut codec: Box<dyn PrimitiveReader + 'a> = Box::new(codec);
    let format = codec.format();
    let (major_version, minor_version) = codec.read_header()?;
    if major_version > ARCHIVE_MAJOR_VERSION || minor_version > format.minor_version() {
      return Err(ArchiveError::archive_version_mismatch(
        major_version,
        minor_version,
        ARCHIVE_MAJOR_VERSION,
        format.minor_version(),
      ));
    }
    tracing::debug!(%format, major_version, minor_version, "input archive opened");
    Ok(Self {
      codec,
      registry: config.registry,
      identities: ReadIdentityTable::new(),
      major_version,
      minor_version,
      max_length: config.max_length,
      state: ArchiveState::Open,
    })
  }

  pub fn binary<R: Read + Device + 'a>(stream: R, config: ArchiveConfig) -> ArchiveResult<Self> {
    Self::new(BinaryReader::new(stream), config)
  }

  pub fn text<R: Read + Device + 'a>(stream: R, config: ArchiveConfig) -> ArchiveResult<Self> {
    Self::new(TextReader::new(stream), config)
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

  pub fn read<T: Persist>(&mut self) -> ArchiveResult<T> {
    if T::IS_PRIMITIVE {
      return T::load(self, T::VERSION);
    }
    let version = self.read_class_version(T::STORE_CLASS_INFO, T::VERSION, || T::class_name().into_owned())?;
    T::load(self, version)
  }

  pub fn read_into<T: Persist>(&mut self, target: &mut T) -> ArchiveResult<()> {
    *target = self.read()?;
    Ok(())
  }

  pub fn field<T: Persist>(&mut self, name: &str) -> ArchiveResult<T> {
    self.with_codec(|codec| codec.begin_field(name))?;
    let value = self.read()?;
    self.with_codec(|codec| codec.end_field(name))?;
    Ok(value)
  }

  /// Reads the state of a direct base written with `OutputArchive::base`.
  pub fn base<T: Persist>(&mut self) -> ArchiveResult<T> {
    tracing::trace!(class = %T::class_name(), "base");
    self.read()
  }

  pub fn read_primitive<P: Primitive>(&mut self) -> ArchiveResult<P> {
    self.with_codec(|codec| {
      codec.begin_value()?;
      let value = P::read_from(codec)?;
      codec.end_value()?;
      Ok(value)
    })
  }

  pub fn read_string(&mut self) -> ArchiveResult<String> {
    let max_length = self.max_length;
    self.with_codec(|codec| {
      codec.begin_value()?;
      let text = codec.read_text(max_length)?;
      codec.end_value()?;
      Ok(text)
    })
  }

  pub fn read_bytes(&mut self) -> ArchiveResult<Vec<u8>> {
    let max_length = self.max_length;
    self.with_codec(|codec| {
      codec.begin_value()?;
      let bytes = codec.read_bytes(max_length)?;
      codec.end_value()?;
      Ok(bytes)
    })
  }

  /// Fills `buffer` from a span written with `OutputArchive::write_raw_span`.
  pub fn read_raw_span(&mut self, buffer: &mut [u8]) -> ArchiveResult<()> {
    self.with_codec(|codec| {
      codec.begin_value()?;
      codec.read_raw_span(buffer)?;
      codec.end_value()
    })
  }

  pub fn read_count(&mut self) -> ArchiveResult<usize> {
    let count = self.read_primitive::<u32>()? as usize;
    if count > self.max_length {
      return Err(ArchiveError::invalid_data_format(format!(
        "count {count} exceeds the limit of {}",
        self.max_length
      )));
    }
    Ok(count)
  }

  pub fn read_enum<E>(&mut self) -> ArchiveResult<E>
  where
    E: TryFromPrimitive,
    E::Primitive: Primitive + Debug, {
    let raw: E::Primitive = self.read_primitive()?;
    E::try_from_primitive(raw).map_err(|_| {
      ArchiveError::invalid_data_format(format!("{raw:?} is not a valid {}", std::any::type_name::<E>()))
    })
  }

  /// Default-constructs the class registered under `name` for base `B`.
  ///
  /// Abstract classes yield `None`.
  pub fn create<B: ?Sized + 'static>(&self, name: &str) -> ArchiveResult<Option<Box<B>>> {
    self.registry.instantiate::<B>(self.format(), name)
  }

  pub(crate) fn identities_mut(&mut self) -> &mut ReadIdentityTable {
    &mut self.identities
  }

  pub(crate) fn read_pointer_header(&mut self) -> ArchiveResult<IncomingPointer> {
    match self.read_enum::<PointerTag>()? {
      PointerTag::Null => Ok(IncomingPointer::Null),
      PointerTag::NewUntracked => Ok(IncomingPointer::Fresh(None)),
      PointerTag::NewTracked => Ok(IncomingPointer::Fresh(Some(self.read_primitive()?))),
      PointerTag::Reference => Ok(IncomingPointer::Reference(self.read_primitive()?)),
    }
  }

  /// Reads the class name, the optional class version and the body of a new object.
  pub(crate) fn read_object<T>(&mut self) -> ArchiveResult<Box<T>>
  where
    T: Pointee + ?Sized,
    T::Dispatch: DispatchStrategy<T>, {
    let name = self.read_string()?;
    let descriptor = <T::Dispatch as DispatchStrategy<T>>::incoming(self, &name)?;
    let version = self.read_descriptor_version(&descriptor)?;
    <T::Dispatch as DispatchStrategy<T>>::restore(self, &name, version)
  }

  pub(crate) fn read_descriptor_version(&mut self, descriptor: &TypeDescriptor) -> ArchiveResult<u32> {
    self.read_class_version(descriptor.store_version(), descriptor.version(), || {
      descriptor.name().to_string()
    })
  }

  /// Newer stored versions than `known` are rejected.
  fn read_class_version(
    &mut self,
    store_version: bool,
    known: u32,
    class_name: impl FnOnce() -> String,
  ) -> ArchiveResult<u32> {
    if self.major_version == 0 {
      return Ok(0);
    }
    if !store_version {
      return Ok(known);
    }
    let version: u32 = self.read_primitive()?;
    if version > known {
      return Err(ArchiveError::class_version_mismatch(&class_name(), version, known));
    }
    Ok(version)
  }

  fn with_codec<R>(
    &mut self,
    f: impl FnOnce(&mut (dyn PrimitiveReader + 'a)) -> ArchiveResult<R>,
  ) -> ArchiveResult<R> {
    if self.state == ArchiveState::Failed {
      return Err(ArchiveError::stream("input archive has already failed"));
    }
    let result = f(self.codec.as_mut());
    if let Err(err) = &result {
      tracing::debug!(error = %err, "input archive failed");
      self.state = ArchiveState::Failed;
    }
    result
  }
}

impl Debug for InputArchive<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InputArchive")
      .field("format", &self.format())
      .field("major_version", &self.major_version)
      .field("minor_version", &self.minor_version)
      .field("max_length", &self.max_length)
      .field("state", &self.state)
      .field("identities", &self.identities)
      .finish()
  }
}
