//! Scoped transient configuration with unconditional restore.

use super::{SensorArbiter, SensorGuard};
use crate::sensor::{Frame, Resolution, SensorConfig, SensorError};

/// Highest resolution a single-shot capture will request, regardless of
/// what the caller asked for. Larger captures are the leading cause of
/// out-of-memory resets on constrained devices.
pub const SNAPSHOT_RESOLUTION_CEILING: Resolution = Resolution::Vga;

/// Minimum compression level for transient captures. Quality values below
/// this produce frames too large for the worst-case memory budget.
pub const MIN_CAPTURE_COMPRESSION: u8 = 30;

/// Computes the policy-adjusted configuration for a single snapshot.
///
/// The resolution is clamped to [`SNAPSHOT_RESOLUTION_CEILING`] (or the
/// caller's lower hint) and quality is clamped to at least
/// [`MIN_CAPTURE_COMPRESSION`]. A sensor already configured below the
/// ceiling is left at its current resolution.
pub fn snapshot_config(current: SensorConfig, max_resolution: Option<Resolution>) -> SensorConfig {
    let ceiling = max_resolution
        .unwrap_or(SNAPSHOT_RESOLUTION_CEILING)
        .min(SNAPSHOT_RESOLUTION_CEILING);
    SensorConfig {
        resolution: current.resolution.min(ceiling),
        // Higher value = more compression, so max() enforces the floor.
        quality: current.quality.max(MIN_CAPTURE_COMPRESSION),
    }
}

/// Holds the sensor under a temporary configuration.
///
/// Construction acquires the arbiter, saves the sensor's current
/// configuration, and applies the adjusted target. Dropping the guard
/// restores the saved configuration on every exit path, including panics
/// and capture failures, before the arbiter is released. A failed restore
/// is logged and the lock is released anyway so the sensor cannot be
/// deadlocked by a dying caller.
pub struct ScopedConfig<'a> {
    guard: SensorGuard<'a>,
    saved: SensorConfig,
}

impl<'a> ScopedConfig<'a> {
    /// Acquires the arbiter and applies `adjust(current)` as the
    /// temporary configuration.
    ///
    /// Reading the current configuration and applying the target happen
    /// under the same lock acquisition, so the adjustment always sees the
    /// real pre-capture state.
    pub fn apply<F>(arbiter: &'a SensorArbiter, adjust: F) -> Result<Self, SensorError>
    where
        F: FnOnce(SensorConfig) -> SensorConfig,
    {
        let mut guard = arbiter.lock();
        let saved = guard.config();
        let target = adjust(saved);
        if target != saved {
            guard.apply_config(&target)?;
            tracing::debug!(?saved, ?target, "transient sensor configuration applied");
        }
        Ok(Self { guard, saved })
    }

    /// Acquires one frame under the temporary configuration.
    pub fn acquire(&mut self) -> Result<Frame, SensorError> {
        self.guard.acquire()
    }

    /// Returns the configuration that will be restored on drop.
    pub fn saved(&self) -> SensorConfig {
        self.saved
    }
}

impl Drop for ScopedConfig<'_> {
    fn drop(&mut self) {
        if self.guard.config() == self.saved {
            return;
        }
        if let Err(err) = self.guard.apply_config(&self.saved) {
            // Fail open: release the arbiter anyway, a stuck lock is
            // worse than a sensor left in the transient mode.
            tracing::warn!(error = %err, "failed to restore sensor configuration");
        }
    }
}
