use crate::config::ArchiveConfig;
use crate::registry::ClassRegistry;

#[derive(Debug, Clone)]
pub enum ConfigOption {
  SetRegistry(ClassRegistry),
  SetMajorVersion(u32),
  SetMaxLength(usize),
}

impl ConfigOption {
  pub fn apply(&self, config: &mut ArchiveConfig) {
    match self {
      ConfigOption::SetRegistry(registry) => {
        config.registry = registry.clone();
      }
      ConfigOption::SetMajorVersion(major_version) => {
        config.major_version = *major_version;
      }
      ConfigOption::SetMaxLength(max_length) => {
        config.max_length = *max_length;
      }
    }
  }

  pub fn with_registry(registry: ClassRegistry) -> ConfigOption {
    ConfigOption::SetRegistry(registry)
  }

  pub fn with_major_version(major_version: u32) -> ConfigOption {
    ConfigOption::SetMajorVersion(major_version)
  }

  pub fn with_max_length(max_length: usize) -> ConfigOption {
    ConfigOption::SetMaxLength(max_length)
  }
}
