//! # Attenuator matrix control
//!
//! [`ControlClient`] validates values against the hardware limits and drives an
//! [`AttenuatorTransport`], the black-box seam to the matrix controller.
//! [`TcpTransport`] is the production transport.
//!
//! ## Sharing the matrix
//!
//! The matrix is shared by every node of the experiment and `atten` may run on
//! any of them at the same time. This crate takes no lock of its own:
//!
//! - concurrent writes to *different* channels are independent and safe;
//! - concurrent writes to the *same* channel are serialized by the controller
//!   and the last write wins.
//!
//! An interrupted write leaves the channel at either the old or the new value;
//! that atomicity is provided by the controller protocol, not by this crate.
//!
//! A write is acknowledged by the controller's reply to that write alone; no
//! follow-up read is issued, so each invocation is one transaction.
//!
//! ## Retries
//!
//! None. A failed transaction is reported as-is and the operator decides
//! whether to issue it again.

pub mod client;
pub mod tcp;

pub use client::ControlClient;
pub use tcp::TcpTransport;

use crate::error::Result;
use crate::topology::ChannelId;

/// Raw get/set-by-channel access to the attenuator matrix controller.
///
/// Implementations do not range-check; that is [`ControlClient`]'s job.
pub trait AttenuatorTransport {
    /// Short description used in logs, e.g. the controller address.
    fn name(&self) -> &str;

    /// Current attenuation of `channel`, in dB.
    fn get_attenuation(&mut self, channel: ChannelId) -> Result<f64>;

    /// Write `db` to `channel` in a single transaction. Returns once the
    /// controller has accepted it, with the applied value when its
    /// acknowledgement reports one.
    fn set_attenuation(&mut self, channel: ChannelId, db: f64) -> Result<Option<f64>>;
}

impl<T: AttenuatorTransport + ?Sized> AttenuatorTransport for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get_attenuation(&mut self, channel: ChannelId) -> Result<f64> {
        (**self).get_attenuation(channel)
    }

    fn set_attenuation(&mut self, channel: ChannelId, db: f64) -> Result<Option<f64>> {
        (**self).set_attenuation(channel, db)
    }
}
