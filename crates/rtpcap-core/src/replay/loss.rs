use log::debug;
use rand::RngCore;
use rand_distr::{Distribution, Normal};
use thiserror::Error;

/// Assumed packetization interval when converting cutout durations to
/// packet counts.
const PACKET_INTERVAL_SECS: f32 = 0.02;

/// Shape of the simulated loss: Gaussian-distributed cutout and recovery
/// durations, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct LossProfile {
    pub mean_cutout: f32,
    pub cutout_std_dev: f32,
    pub mean_interval: f32,
    pub interval_std_dev: f32,
}

#[derive(Debug, Error)]
pub enum LossError {
    #[error("invalid loss profile: {0}")]
    InvalidProfile(String),
}

/// Burst packet-loss simulator for replay testing.
///
/// Alternates between dropping a cutout's worth of packets and keeping a
/// recovery period's worth, with both durations drawn from the configured
/// distributions. The random source is supplied by the caller, so seeded
/// generators give reproducible loss patterns.
pub struct PacketLossModel {
    rng: Box<dyn RngCore + Send>,
    cutout: Normal<f32>,
    interval: Normal<f32>,
    packets_to_drop: u32,
    packets_to_keep: u32,
}

impl PacketLossModel {
    pub fn new<R>(rng: R, profile: LossProfile) -> Result<Self, LossError>
    where
        R: RngCore + Send + 'static,
    {
        let cutout = Normal::new(profile.mean_cutout, profile.cutout_std_dev)
            .map_err(|e| LossError::InvalidProfile(format!("cutout: {e}")))?;
        let interval = Normal::new(profile.mean_interval, profile.interval_std_dev)
            .map_err(|e| LossError::InvalidProfile(format!("interval: {e}")))?;
        Ok(Self {
            rng: Box::new(rng),
            cutout,
            interval,
            packets_to_drop: 0,
            packets_to_keep: 0,
        })
    }

    /// Decide the fate of the next packet.
    pub fn should_drop(&mut self) -> bool {
        if self.packets_to_drop > 0 {
            self.packets_to_drop -= 1;
            return true;
        }
        if self.packets_to_keep > 0 {
            self.packets_to_keep -= 1;
            return false;
        }

        // Start a new cutout immediately, then schedule the recovery
        // period that follows it.
        let cutout_secs = self.next_positive(self.cutout);
        let recovery_secs = self.next_positive(self.interval);
        self.packets_to_drop =
            ((cutout_secs / PACKET_INTERVAL_SECS).round() as u32).saturating_sub(1);
        self.packets_to_keep = (recovery_secs / PACKET_INTERVAL_SECS).round() as u32;
        debug!(
            "dropping this and the next {} packets, then keeping {}",
            self.packets_to_drop, self.packets_to_keep
        );
        true
    }

    fn next_positive(&mut self, distribution: Normal<f32>) -> f32 {
        loop {
            let value = distribution.sample(&mut *self.rng);
            if value > 0.0 {
                return value;
            }
        }
    }
}

impl std::fmt::Debug for PacketLossModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketLossModel")
            .field("packets_to_drop", &self.packets_to_drop)
            .field("packets_to_keep", &self.packets_to_keep)
            .finish()
    }
}
