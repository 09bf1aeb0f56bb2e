use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use rstest::rstest;

use crate::{
  ArchiveConfig, ArchiveFormat, ArchiveResult, ClassRegistry, ClassTraits, Color, InputArchive, Line, OutputArchive,
  Persist, Point, PointF, RectF, SelfDescribing, Size, Variant, VariantKind,
};

fn init_logger() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .try_init();
}

fn save(format: ArchiveFormat, registry: &ClassRegistry, values: &[Variant]) -> Vec<u8> {
  let mut buffer = Vec::new();
  {
    let config = ArchiveConfig::with_registry(registry.clone());
    let mut ar = match format {
      ArchiveFormat::Binary => OutputArchive::binary(&mut buffer, config).unwrap(),
      ArchiveFormat::Text => OutputArchive::text(&mut buffer, config).unwrap(),
    };
    for value in values {
      ar.write(value).unwrap();
    }
  }
  buffer
}

fn load(format: ArchiveFormat, registry: &ClassRegistry, data: &[u8], count: usize) -> Vec<Variant> {
  let config = ArchiveConfig::with_registry(registry.clone());
  let mut ar = match format {
    ArchiveFormat::Binary => InputArchive::binary(data, config).unwrap(),
    ArchiveFormat::Text => InputArchive::text(data, config).unwrap(),
  };
  (0..count).map(|_| ar.read().unwrap()).collect()
}

#[derive(Debug, Default, Clone, PartialEq, ClassTraits, SelfDescribing)]
#[class(name = "Matrix", version = 2)]
struct Matrix {
  rows: u8,
  cells: Vec<f64>,
}

impl Persist for Matrix {
  fn save(&self, ar: &mut OutputArchive<'_>, version: u32) -> ArchiveResult<()> {
    assert_eq!(version, 2);
    ar.field("rows", &self.rows)?;
    ar.field("cells", &self.cells)
  }

  fn load(ar: &mut InputArchive<'_>, _version: u32) -> ArchiveResult<Self> {
    Ok(Self {
      rows: ar.field("rows")?,
      cells: ar.field("cells")?,
    })
  }
}

fn matrix() -> Matrix {
  Matrix {
    rows: 2,
    cells: vec![1.0, 0.0, 0.0, 1.0],
  }
}

#[test]
fn test_kind_numbers() {
  assert_eq!(u32::from(VariantKind::Invalid), 0);
  assert_eq!(u32::from(VariantKind::String), 10);
  assert_eq!(u32::from(VariantKind::PointF), 26);
  assert_eq!(u32::from(VariantKind::Color), 67);
  assert_eq!(u32::from(VariantKind::User), 1024);
  assert_eq!(Variant::from("x").kind(), VariantKind::String);
  assert_eq!(Variant::default().kind(), VariantKind::Invalid);
  assert_eq!(VariantKind::DateTime.to_string(), "DateTime");
}

#[rstest]
#[case(ArchiveFormat::Binary)]
#[case(ArchiveFormat::Text)]
fn test_builtin_kinds_round_trip(#[case] format: ArchiveFormat) {
  init_logger();
  let mut map = BTreeMap::new();
  map.insert("origin".to_string(), Variant::from(Point::new(0, -3)));
  map.insert("nothing".to_string(), Variant::Invalid);
  let values = vec![
    Variant::Invalid,
    Variant::from(true),
    Variant::from(-12i32),
    Variant::from(u32::MAX),
    Variant::from(i64::MIN),
    Variant::from(7u64),
    Variant::from(0.5f32),
    Variant::from(f64::INFINITY),
    Variant::from('λ'),
    Variant::from("two words"),
    Variant::ByteArray(vec![0, 255, 10]),
    Variant::from(vec!["a".to_string(), String::new()]),
    Variant::from(vec![Variant::from(1i32), Variant::from(vec![Variant::Invalid])]),
    Variant::from(map),
    Variant::from(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
    Variant::from(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap()),
    Variant::from(PointF::new(0.25, -1.5)),
    Variant::from(Size::new(640, 480)),
    Variant::from(RectF::new(0.0, 0.0, 1.0, 1.0)),
    Variant::from(Line::new(Point::new(1, 2), Point::new(3, 4))),
    Variant::from(Color::new(255, 128, 0, 255)),
  ];

  let registry = ClassRegistry::new();
  let data = save(format, &registry, &values);
  assert_eq!(load(format, &registry, &data, values.len()), values);
}

#[rstest]
#[case(ArchiveFormat::Binary)]
#[case(ArchiveFormat::Text)]
fn test_registered_user_payload(#[case] format: ArchiveFormat) {
  let registry = ClassRegistry::new();
  let _registration = registry.register_variant_payload::<Matrix>();
  assert!(registry.serializers().contains(None, "Variant<Matrix>"));

  let values = vec![Variant::user(matrix()), Variant::from(5i32)];
  let data = save(format, &registry, &values);
  let restored = load(format, &registry, &data, 2);

  assert_eq!(restored, values);
  assert_eq!(restored[0].payload::<Matrix>(), Some(&matrix()));
  assert_eq!(restored[1].payload::<Matrix>(), None);
}

#[rstest]
#[case(ArchiveFormat::Binary)]
#[case(ArchiveFormat::Text)]
fn test_unregistered_payload_reads_back_invalid(#[case] format: ArchiveFormat) {
  let registry = ClassRegistry::new();
  let values = vec![Variant::user(matrix()), Variant::from("after")];
  let data = save(format, &registry, &values);

  let restored = load(format, &registry, &data, 2);
  assert_eq!(restored, vec![Variant::Invalid, Variant::from("after")]);
}

#[test]
fn test_payload_registered_only_on_read_side() {
  let writer = ClassRegistry::new();
  let reader = ClassRegistry::new();
  let _registration = reader.register_variant_payload::<Matrix>();

  let data = save(ArchiveFormat::Binary, &writer, &[Variant::user(matrix()), Variant::from(1u64)]);
  let restored = load(ArchiveFormat::Binary, &reader, &data, 2);
  assert!(!restored[0].is_valid());
  assert_eq!(restored[1], Variant::ULongLong(1));
}

#[test]
fn test_user_values_compare_by_payload() {
  let left = Variant::user(matrix());
  let right = left.clone();
  assert_eq!(left, right);
  assert_ne!(left, Variant::user(Matrix::default()));
  match &right {
    Variant::User(value) => assert_eq!(value.descriptor().name(), "Matrix"),
    other => panic!("unexpected variant: {other:?}"),
  }
}
