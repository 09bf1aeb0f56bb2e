use crate::codec::ARCHIVE_MAJOR_VERSION;
use crate::config_option::ConfigOption;
use crate::registry::ClassRegistry;

/// Default upper bound for lengths and counts read from a stream.
pub const DEFAULT_MAX_LENGTH: usize = 1 << 28;

#[derive(Debug, Clone)]
pub struct ArchiveConfig {
  pub registry: ClassRegistry,
  /// Major version written by output archives.
  pub major_version: u32,
  /// Longer strings, spans and collections are rejected on read.
  pub max_length: usize,
}

impl Default for ArchiveConfig {
  fn default() -> Self {
    ArchiveConfig {
      registry: ClassRegistry::shared(),
      major_version: ARCHIVE_MAJOR_VERSION,
      max_length: DEFAULT_MAX_LENGTH,
    }
  }
}

impl ArchiveConfig {
  pub fn from(options: impl IntoIterator<Item = ConfigOption>) -> ArchiveConfig {
    let mut config = ArchiveConfig::default();
    for option in options {
      option.apply(&mut config);
    }
    config
  }

  pub fn with_registry(registry: ClassRegistry) -> ArchiveConfig {
    ArchiveConfig::from([ConfigOption::SetRegistry(registry)])
  }
}

static_assertions::assert_impl_all!(ArchiveConfig: Send, Sync);
