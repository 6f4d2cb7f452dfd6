// The trigger engine: one evaluate call per rendering tick, synchronously.
// Holds the per-rule fired flags and the running effects; the caller owns
// the scheduling loop and the wall clock. No timers, no globals.

use crate::effect::ActiveEffect;
use crate::error::EngineError;
use crate::rules::RuleSet;
use crate::types::{
    EffectSettings, EffectSnapshot, EngineConfig, FrameStatus, Observation, ObservationBatch,
    Timestamp, TriggerMode,
};

/// Per-rule one-shot latch. Set on first firing, cleared only by
/// `reset_session`.
#[derive(Debug, Clone, Copy, Default)]
struct TriggerState {
    fired: bool,
}

/// Stateful evaluator mapping (pose, confidence, video time) observations to
/// one-shot effect firings.
///
/// Single-threaded and frame-driven: a skipped tick (observation source had
/// nothing to report) leaves all state intact, and expiry simply happens on
/// whichever tick comes next.
pub struct TriggerEngine {
    mode: TriggerMode,
    rules: RuleSet,
    settings: EffectSettings,
    states: Vec<TriggerState>,
    running: Vec<ActiveEffect>,
    last_sound_at: Option<Timestamp>,
}

impl TriggerEngine {
    /// Build an engine from configuration, validating the rule table.
    pub fn new(config: &EngineConfig) -> Result<TriggerEngine, EngineError> {
        let rules = RuleSet::from_configs(&config.rules)?;
        Ok(TriggerEngine::from_parts(
            config.mode,
            rules,
            config.effect_settings.clone(),
        ))
    }

    pub fn from_parts(mode: TriggerMode, rules: RuleSet, settings: EffectSettings) -> TriggerEngine {
        let states = vec![TriggerState::default(); rules.len()];
        TriggerEngine {
            mode,
            rules,
            settings,
            states,
            running: Vec::new(),
            last_sound_at: None,
        }
    }

    /// Engine preloaded with the original choreography demo's rule table.
    pub fn classic_demo() -> TriggerEngine {
        TriggerEngine::from_parts(
            TriggerMode::Exclusive,
            RuleSet::classic_demo(),
            EffectSettings::default(),
        )
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Evaluate a single observation against the rule table.
    pub fn evaluate(&mut self, obs: &Observation, now: Timestamp) -> FrameStatus {
        self.expire(now);
        let mut fired = Vec::new();
        self.fire_pass(obs, now, &mut fired);
        self.finish(fired, now)
    }

    /// Evaluate one tick's worth of observations (the classifier emits every
    /// class per tick) against the same wall-clock instant, in order.
    pub fn evaluate_batch(&mut self, batch: &ObservationBatch, now: Timestamp) -> FrameStatus {
        self.expire(now);
        let mut fired = Vec::new();
        for obs in &batch.observations {
            self.fire_pass(obs, now, &mut fired);
        }
        self.finish(fired, now)
    }

    /// Advance the clock without an observation. Expires overdue effects and
    /// reports current status; never fires.
    pub fn idle_tick(&mut self, now: Timestamp) -> FrameStatus {
        self.expire(now);
        self.finish(Vec::new(), now)
    }

    /// Clear every fired flag, drop all running effects, and re-arm the
    /// sound cooldown. Called when the reference video restarts or playback
    /// stops. Idempotent; safe at any time.
    pub fn reset_session(&mut self) {
        for state in &mut self.states {
            state.fired = false;
        }
        self.running.clear();
        self.last_sound_at = None;
    }

    /// Drop effects whose lifetime elapsed. Pure timeout against the wall
    /// clock, checked on every tick.
    fn expire(&mut self, now: Timestamp) {
        let settings = &self.settings;
        self.running.retain(|effect| !effect.expired(now, settings));
    }

    /// Scan rules in declaration order and fire every qualifying one the
    /// current mode admits. Exclusive mode serializes: once any effect runs,
    /// nothing else fires until it expires, so at most the first qualifying
    /// rule fires per tick. Independent mode only blocks a rule while its
    /// own effect runs.
    fn fire_pass(&mut self, obs: &Observation, now: Timestamp, fired: &mut Vec<usize>) {
        for (index, rule) in self.rules.rules().iter().enumerate() {
            if !rule.matches(obs) {
                continue;
            }
            if self.states[index].fired {
                continue;
            }
            let blocked = match self.mode {
                TriggerMode::Exclusive => !self.running.is_empty(),
                TriggerMode::Independent => {
                    self.running.iter().any(|e| e.rule_index == index)
                }
            };
            if blocked {
                continue;
            }

            if rule.one_shot {
                self.states[index].fired = true;
            }
            self.running.push(ActiveEffect::start(index, now));
            fired.push(index);
        }
    }

    fn finish(&mut self, fired: Vec<usize>, now: Timestamp) -> FrameStatus {
        let just_fired = !fired.is_empty();

        // One playback request per firing, throttled by the cooldown so
        // rapid-fire rules don't stack audio.
        let play_sound = just_fired
            && self
                .last_sound_at
                .map_or(true, |last| now.since(last) >= self.settings.sound_cooldown_us);
        if play_sound {
            self.last_sound_at = Some(now);
        }

        let effects: Vec<EffectSnapshot> = self
            .running
            .iter()
            .map(|effect| EffectSnapshot {
                rule_index: effect.rule_index,
                size: effect.size_at(now, &self.settings),
                color: self.rule_color(effect.rule_index),
            })
            .collect();

        let size = effects
            .iter()
            .map(|e| e.size)
            .fold(self.settings.base_size, f64::max);
        let color = effects
            .iter()
            .min_by_key(|e| e.rule_index)
            .map(|e| e.color.clone())
            .unwrap_or_else(|| self.settings.idle_color.clone());

        FrameStatus {
            active: !self.running.is_empty(),
            just_fired,
            play_sound,
            size,
            color,
            fired,
            effects,
        }
    }

    fn rule_color(&self, index: usize) -> String {
        self.rules.rules()[index]
            .color
            .clone()
            .unwrap_or_else(|| self.settings.idle_color.clone())
    }
}
