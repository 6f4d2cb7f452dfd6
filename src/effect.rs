// Effect lifetime and size easing.
// Size is a pure function of elapsed wall time: a piecewise-linear ramp from
// base to peak over the first half of the duration, back to base over the
// second half. Expiry is a plain timeout checked every tick; no timer
// callbacks, so a stalled host loop only delays expiry to the next tick.

use crate::types::{EffectSettings, Timestamp};

/// One running effect, owned by the rule that fired it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveEffect {
    /// Declaration-order index of the rule that fired this effect.
    pub rule_index: usize,
    pub started_at: Timestamp,
}

impl ActiveEffect {
    pub fn start(rule_index: usize, now: Timestamp) -> Self {
        ActiveEffect {
            rule_index,
            started_at: now,
        }
    }

    /// Whether the effect's lifetime has elapsed. The boundary instant
    /// itself counts as expired: at exactly `duration` the effect is done.
    pub fn expired(&self, now: Timestamp, settings: &EffectSettings) -> bool {
        now.since(self.started_at) >= settings.duration_us
    }

    /// Eased overlay size at `now`. Returns the base size once expired.
    pub fn size_at(&self, now: Timestamp, settings: &EffectSettings) -> f64 {
        eased_size(now.since(self.started_at), settings)
    }
}

/// Piecewise-linear up/down ramp over one effect lifetime.
/// `base == peak` degenerates to a constant-size effect.
pub fn eased_size(elapsed_us: u64, settings: &EffectSettings) -> f64 {
    if settings.duration_us == 0 || elapsed_us >= settings.duration_us {
        return settings.base_size;
    }

    let progress = elapsed_us as f64 / settings.duration_us as f64;
    let ramp = if progress <= 0.5 {
        progress * 2.0
    } else {
        (1.0 - progress) * 2.0
    };

    settings.base_size + (settings.peak_size - settings.base_size) * ramp
}
