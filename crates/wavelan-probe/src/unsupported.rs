//! Fallback for targets without a wireless backend.
//!
//! `open` always fails, so no step method is ever reached.

use std::io;

use wavelan_core::QualityUnit;

use crate::backend::{InterfaceName, StepError, StepResult, WirelessBackend};

/// Device handle that can never be opened.
pub struct Device {
    interface: String,
}

impl WirelessBackend for Device {
    fn open_channel(_interface: &InterfaceName) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "no wireless backend for this platform",
        ))
    }

    fn interface(&self) -> &str {
        &self.interface
    }

    fn quality_unit(&self) -> QualityUnit {
        QualityUnit::Percent
    }

    fn carrier(&mut self) -> StepResult<()> {
        Err(StepError::NoSuchDevice)
    }

    fn netname(&mut self) -> StepResult<String> {
        Err(StepError::NoSuchDevice)
    }

    fn quality(&mut self) -> StepResult<i32> {
        Err(StepError::NoSuchDevice)
    }

    fn rate(&mut self) -> StepResult<i32> {
        Err(StepError::NoSuchDevice)
    }
}
