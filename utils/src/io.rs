mod device;
mod memory_device;

pub use self::{device::*, memory_device::*};
