//! The backend contract and the query facade built on it.
//!
//! Each platform implements the step methods of [`WirelessBackend`]; the
//! provided [`WirelessBackend::query`] runs them in a fixed order:
//!
//! 1. quality unit (platform convention, never fails)
//! 2. vendor, where the platform has a separable identity query
//! 3. carrier
//! 4. netname, quality, rate
//!
//! The first failing step ends the query. Nothing is retried; the caller's
//! next poll tries again.

use std::fmt;
use std::io;

use tracing::debug;
use wavelan_core::{
    truncate_bounded, LinkStats, PartialStats, QualityUnit, WavelanError, WavelanResult,
};

/// Longest interface name accepted by the kernel (`IFNAMSIZ - 1`).
pub const MAX_INTERFACE_LEN: usize = 15;

/// An interface name accepted by [`WirelessBackend::open`].
///
/// Never empty and at most [`MAX_INTERFACE_LEN`] bytes; longer names are
/// truncated on a char boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Validate `name`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `name` is empty.
    pub fn new(name: &str) -> WavelanResult<Self> {
        if name.is_empty() {
            return Err(WavelanError::invalid_parameter(
                "interface name cannot be empty",
            ));
        }
        Ok(Self(truncate_bounded(name, MAX_INTERFACE_LEN)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a failed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    /// Interface present but not associated.
    NoCarrier,
    /// Interface absent, or the call is unsupported or denied.
    NoSuchDevice,
}

/// Result of a single step.
pub type StepResult<T> = Result<T, StepError>;

/// A wireless statistics source bound to one interface.
///
/// Implementations own their kernel channel; dropping the value releases it.
pub trait WirelessBackend: Sized {
    /// Establish the kernel channel for `interface`.
    ///
    /// Implementor hook; callers go through [`WirelessBackend::open`].
    fn open_channel(interface: &InterfaceName) -> io::Result<Self>;

    /// Interface this backend is bound to.
    fn interface(&self) -> &str;

    /// Unit this platform reports `quality` in.
    fn quality_unit(&self) -> QualityUnit;

    /// Hardware identity, for platforms with a separable identity query.
    ///
    /// `None` means the platform has no such query; vendor stays "Unknown".
    fn vendor(&mut self) -> Option<StepResult<String>> {
        None
    }

    /// Check for an active association.
    fn carrier(&mut self) -> StepResult<()>;

    /// Current SSID.
    fn netname(&mut self) -> StepResult<String>;

    /// Current signal quality, in [`Self::quality_unit`].
    fn quality(&mut self) -> StepResult<i32>;

    /// Current link rate in Mb/s.
    fn rate(&mut self) -> StepResult<i32>;

    /// Open a backend for `interface`.
    ///
    /// Names longer than [`MAX_INTERFACE_LEN`] are truncated.
    ///
    /// # Errors
    ///
    /// - `InvalidParameter` if `interface` is empty
    /// - `Open` if the kernel channel cannot be established
    fn open(interface: &str) -> WavelanResult<Self> {
        let name = InterfaceName::new(interface)?;
        Self::open_channel(&name).map_err(|e| {
            debug!(interface = %name, error = %e, "failed to open wireless channel");
            WavelanError::open(name.as_str(), e)
        })
    }

    /// Query a full statistics snapshot.
    ///
    /// # Errors
    ///
    /// - `NoSuchDevice` if the interface is gone or a kernel request fails
    /// - `NoCarrier` if the interface is not associated; the error carries
    ///   the vendor and quality unit determined so far
    fn query(&mut self) -> WavelanResult<LinkStats> {
        let mut partial = PartialStats::new(self.quality_unit());

        if let Some(vendor) = self.vendor() {
            match vendor {
                Ok(vendor) => partial.vendor = vendor,
                Err(err) => return Err(step_failure(self.interface(), "vendor", err, partial)),
            }
        }

        if let Err(err) = self.carrier() {
            return Err(step_failure(self.interface(), "carrier", err, partial));
        }

        let network_name = match self.netname() {
            Ok(name) => name,
            Err(err) => return Err(step_failure(self.interface(), "netname", err, partial)),
        };
        let quality = match self.quality() {
            Ok(quality) => quality,
            Err(err) => return Err(step_failure(self.interface(), "quality", err, partial)),
        };
        let rate = match self.rate() {
            Ok(rate) => rate,
            Err(err) => return Err(step_failure(self.interface(), "rate", err, partial)),
        };

        Ok(LinkStats::new(
            &network_name,
            quality,
            partial.quality_unit,
            rate,
            &partial.vendor,
        ))
    }

    /// Release the channel. Equivalent to dropping the backend.
    fn close(self) {
        drop(self)
    }
}

/// Turn a failed step into the query error.
pub(crate) fn step_failure(
    interface: &str,
    step: &'static str,
    err: StepError,
    partial: PartialStats,
) -> WavelanError {
    debug!(interface, step, ?err, "wireless query step failed");
    match err {
        StepError::NoCarrier => WavelanError::no_carrier(interface, partial),
        StepError::NoSuchDevice => WavelanError::no_such_device(interface),
    }
}
