//! Range-checked, acknowledged attenuation control.

use crate::control::AttenuatorTransport;
use crate::error::{AttenError, Result};
use crate::registry::ChannelRef;

use tracing::{debug, info};

/// Hardware limits plus the transport used to reach the controller.
pub struct ControlClient<T> {
    transport: T,
    max_db: f64,
    tolerance_db: f64,
}

impl<T: AttenuatorTransport> ControlClient<T> {
    pub fn new(transport: T, max_db: f64, tolerance_db: f64) -> Self {
        Self {
            transport,
            max_db,
            tolerance_db,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn get(&mut self, channel: &ChannelRef<'_>) -> Result<f64> {
        let db = self.transport.get_attenuation(channel.id)?;
        debug!(channel = %channel.id, db, "read attenuation");
        Ok(db)
    }

    /// Set `channel` to `db` and wait for the controller's acknowledgement.
    ///
    /// Out-of-range values never reach the transport. Exactly one transport
    /// call is made. When the acknowledgement carries the applied value it
    /// must match `db` within the configured tolerance.
    pub fn set(&mut self, channel: &ChannelRef<'_>, db: f64) -> Result<()> {
        self.check_range(channel, db)?;

        debug!(
            transport = self.transport.name(),
            channel = %channel.id,
            from = channel.from_node(),
            to = channel.to_node(),
            db,
            "setting attenuation"
        );
        let acked = self.transport.set_attenuation(channel.id, db)?;

        let tolerance = self.tolerance_db;
        if let Some(applied) = acked.filter(|applied| (applied - db).abs() > tolerance) {
            return Err(AttenError::hardware(
                channel.id.get(),
                format!(
                    "controller acknowledged {} dB after setting {} dB on path {}->{}",
                    applied,
                    db,
                    channel.from_node(),
                    channel.to_node()
                ),
            ));
        }

        info!(channel = %channel.id, db, acked = ?acked, "attenuation applied");
        Ok(())
    }

    fn check_range(&self, channel: &ChannelRef<'_>, db: f64) -> Result<()> {
        if !db.is_finite() || db < 0.0 || db > self.max_db {
            return Err(AttenError::Range {
                channel: channel.id.get(),
                value: db,
                max: self.max_db,
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }
}
