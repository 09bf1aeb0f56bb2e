use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use archivum_core_rs::*;
use serde::{Deserialize, Serialize};

thread_local! {
  static LAYER_SAVES: Cell<usize> = const { Cell::new(0) };
}

fn init_logger() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .try_init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Metadata {
  author: String,
  tags: Vec<String>,
}

#[derive(Debug, Default, ClassTraits)]
#[class(name = "Layer", version = 1)]
struct Layer {
  name: String,
  opacity: f32,
}

impl Persist for Layer {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    LAYER_SAVES.with(|saves| saves.set(saves.get() + 1));
    ar.field("name", &self.name)?;
    ar.field("opacity", &self.opacity)
  }

  fn load(ar: &mut InputArchive<'_>, version: u32) -> ArchiveResult<Self> {
    let name = ar.field("name")?;
    // opacity was added in version 1
    let opacity = if version >= 1 { ar.field("opacity")? } else { 1.0 };
    Ok(Self { name, opacity })
  }
}

#[derive(Debug, ClassTraits)]
#[class(name = "Document", version = 4)]
struct Document {
  title: String,
  layers: Vec<Rc<Layer>>,
  active: Option<Rc<Layer>>,
  bookmarks: BTreeMap<String, Rc<Layer>>,
  metadata: Json<Metadata>,
  properties: Vec<Variant>,
}

impl Persist for Document {
  fn save(&self, ar: &mut OutputArchive<'_>, _version: u32) -> ArchiveResult<()> {
    ar.field("title", &self.title)?;
    ar.field("layers", &self.layers)?;
    ar.field("active", &self.active)?;
    ar.field("bookmarks", &self.bookmarks)?;
    ar.field("metadata", &self.metadata)?;
    ar.field("properties", &self.properties)
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    Ok(Self {
      title: ar.field("title")?,
      layers: ar.field("layers")?,
      active: ar.field("active")?,
      bookmarks: ar.field("bookmarks")?,
      metadata: ar.field("metadata")?,
      properties: ar.field("properties")?,
    })
  }
}

fn document() -> Document {
  let background = Rc::new(Layer {
    name: "background".into(),
    opacity: 1.0,
  });
  let sketch = Rc::new(Layer {
    name: "sketch".into(),
    opacity: 0.5,
  });
  let mut bookmarks = BTreeMap::new();
  bookmarks.insert("start".to_string(), background.clone());
  bookmarks.insert("work".to_string(), sketch.clone());
  Document {
    title: "poster".into(),
    layers: vec![background, sketch.clone()],
    active: Some(sketch),
    bookmarks,
    metadata: Json(Metadata {
      author: "m. k.".into(),
      tags: vec!["draft".into(), "a3".into()],
    }),
    properties: vec![Variant::from(300u32), Variant::from(Color::new(0, 0, 0, 255))],
  }
}

fn write_document(format: ArchiveFormat, document: &Document) -> Vec<u8> {
  let mut buffer = Vec::new();
  let config = ArchiveConfig::with_registry(ClassRegistry::new());
  let mut ar = match format {
    ArchiveFormat::Binary => OutputArchive::binary(&mut buffer, config).unwrap(),
    ArchiveFormat::Text => OutputArchive::text(&mut buffer, config).unwrap(),
  };
  ar.write(document).unwrap();
  ar.finish().unwrap();
  buffer
}

fn read_document(format: ArchiveFormat, data: &[u8]) -> ArchiveResult<Document> {
  let config = ArchiveConfig::with_registry(ClassRegistry::new());
  let mut ar = match format {
    ArchiveFormat::Binary => InputArchive::binary(data, config)?,
    ArchiveFormat::Text => InputArchive::text(data, config)?,
  };
  ar.read()
}

#[test]
fn test_document_round_trip_preserves_sharing() {
  init_logger();
  for format in [ArchiveFormat::Binary, ArchiveFormat::Text] {
    let original = document();
    let saves_before = LAYER_SAVES.get();
    let data = write_document(format, &original);
    assert_eq!(LAYER_SAVES.get() - saves_before, 2);

    let restored = read_document(format, &data).unwrap();
    assert_eq!(restored.title, "poster");
    assert_eq!(restored.layers.len(), 2);
    assert!(Rc::ptr_eq(&restored.layers[1], restored.active.as_ref().unwrap()));
    assert!(Rc::ptr_eq(&restored.layers[0], &restored.bookmarks["start"]));
    assert!(Rc::ptr_eq(&restored.layers[1], &restored.bookmarks["work"]));
    assert_eq!(restored.layers[1].opacity, 0.5);
    assert_eq!(*restored.metadata, *original.metadata);
    assert_eq!(restored.properties, original.properties);
  }
}

#[test]
fn test_text_archive_is_readable() {
  let layer = Rc::new(Layer {
    name: "ab cd".into(),
    opacity: 0.25,
  });
  let mut buffer = Vec::new();
  {
    let mut ar = OutputArchive::text(&mut buffer, ArchiveConfig::with_registry(ClassRegistry::new())).unwrap();
    ar.write(&vec![layer.clone(), layer]).unwrap();
  }
  assert_eq!(
    String::from_utf8(buffer).unwrap(),
    "ARCVTXT 1 1 2 1 0 5 Layer 1 5 ab cd 0.25 3 0"
  );
}

#[test]
fn test_legacy_archive_uses_version_zero() {
  let legacy = ArchiveConfig::from([
    ConfigOption::with_registry(ClassRegistry::new()),
    ConfigOption::with_major_version(0),
  ]);
  let mut buffer = Vec::new();
  {
    let mut ar = OutputArchive::binary(&mut buffer, legacy).unwrap();
    assert_eq!(ar.major_version(), 0);
    ar.write(&Rc::new(Layer {
      name: "old".into(),
      opacity: 0.1,
    }))
    .unwrap();
  }

  let mut ar = InputArchive::binary(buffer.as_slice(), ArchiveConfig::with_registry(ClassRegistry::new())).unwrap();
  let layer: Rc<Layer> = ar.read().unwrap();
  assert_eq!(layer.name, "old");
  // version 0 predates opacity; the stored opacity is left unread
  assert_eq!(layer.opacity, 1.0);
}

#[test]
fn test_future_document_version_is_rejected() {
  let mut buffer = Vec::new();
  {
    let mut ar = OutputArchive::binary(&mut buffer, ArchiveConfig::with_registry(ClassRegistry::new())).unwrap();
    ar.write_primitive(Document::VERSION + 1).unwrap();
  }

  let err = read_document(ArchiveFormat::Binary, &buffer).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::ClassVersionMismatch);
  assert_eq!(err.info(), Some("Document"));
}

#[test]
fn test_wrong_format_is_unrecognized() {
  let data = write_document(ArchiveFormat::Text, &document());
  let err = read_document(ArchiveFormat::Binary, &data).unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::UnrecognizedArchiveFormat);

  let err = read_document(ArchiveFormat::Binary, b"ARCV").unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::UnrecognizedArchiveFormat);
}

#[test]
fn test_corrupt_json_is_invalid_data() {
  let mut buffer = Vec::new();
  {
    let mut ar = OutputArchive::binary(&mut buffer, ArchiveConfig::with_registry(ClassRegistry::new())).unwrap();
    ar.write(&"{\"author\": 7}".to_string()).unwrap();
  }

  let mut ar = InputArchive::binary(buffer.as_slice(), ArchiveConfig::with_registry(ClassRegistry::new())).unwrap();
  let err = ar.read::<Json<Metadata>>().unwrap_err();
  assert_eq!(err.kind(), ArchiveErrorKind::InvalidDataFormat);
}
