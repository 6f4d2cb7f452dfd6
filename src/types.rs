// Strong typing over strings. Newtypes for wall-clock timestamps, video time,
// and pose labels. All JS-facing IO is serde JSON.

use serde::{Deserialize, Serialize};

/// Wall-clock timestamp in microseconds. Newtype for type safety.
/// Independent of the reference video's playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us)
    }

    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms * 1000)
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_millis(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Elapsed microseconds since `earlier` (zero if `earlier` is in the future).
    pub fn since(&self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Playback position of the reference video, in seconds.
/// Kept separate from `Timestamp`: pausing or seeking the video must not
/// affect effect animation, which runs on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
pub struct VideoTime(f64);

impl VideoTime {
    pub fn from_secs(secs: f64) -> Self {
        VideoTime(secs)
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }
}

/// Pose class label emitted by the external classifier (e.g. "pose 1", "pose 2l").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoseId(String);

impl PoseId {
    pub fn new(label: impl Into<String>) -> Self {
        PoseId(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One labeled classification for one tick. Not retained after evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub pose_id: PoseId,
    /// Classifier confidence in [0, 1]. Out-of-range values simply fail the
    /// threshold predicate; they are not an error.
    pub probability: f64,
    /// Reference-video playback position when this observation was taken.
    pub video_time: VideoTime,
}

/// Batch of observations for one animation-frame tick (minimizes JS↔WASM
/// crossings; the classifier emits every class each tick).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationBatch {
    pub observations: Vec<Observation>,
}

/// Whether effects are mutually exclusive or may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TriggerMode {
    /// At most one effect runs at a time; the first qualifying rule per tick
    /// wins and further rules wait for the effect to expire.
    #[default]
    Exclusive,
    /// Every qualifying rule fires independently; a rule only waits for its
    /// own effect to expire before re-qualifying.
    Independent,
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub mode: TriggerMode,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    #[serde(default)]
    pub effect_settings: EffectSettings,
}

/// JSON-friendly rule definition. Validated into a `PoseWindowRule` at
/// engine construction; rules are immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub pose_id: String,
    /// Exclusive threshold: the rule matches only when probability is
    /// strictly greater than this.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Window start in video seconds (inclusive).
    pub window_start_secs: f64,
    /// Window end in video seconds (inclusive).
    pub window_end_secs: f64,
    /// Fire at most once per session; `false` allows refiring after the
    /// effect expires.
    #[serde(default = "default_true")]
    pub one_shot: bool,
    /// CSS color painted while this rule's effect runs.
    #[serde(default)]
    pub color: Option<String>,
}

fn default_threshold() -> f64 {
    0.85
}

fn default_true() -> bool {
    true
}

/// Effect animation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSettings {
    /// Overlay size when no effect is running.
    #[serde(default = "default_base_size")]
    pub base_size: f64,
    /// Overlay size at the midpoint of the ramp. Equal to `base_size`
    /// degenerates to a constant-size effect.
    #[serde(default = "default_peak_size")]
    pub peak_size: f64,
    /// Total effect lifetime in microseconds. The size ramps up over the
    /// first half and back down over the second half.
    #[serde(default = "default_duration")]
    pub duration_us: u64,
    /// Minimum wall-clock gap between sound playback requests.
    #[serde(default = "default_sound_cooldown")]
    pub sound_cooldown_us: u64,
    /// Color reported while no effect is running.
    #[serde(default = "default_idle_color")]
    pub idle_color: String,
}

fn default_base_size() -> f64 {
    5.0
}

fn default_peak_size() -> f64 {
    20.0
}

fn default_duration() -> u64 {
    500_000 // 500ms
}

fn default_sound_cooldown() -> u64 {
    1_000_000 // 1s
}

fn default_idle_color() -> String {
    "#800080".to_string() // purple
}

impl Default for EffectSettings {
    fn default() -> Self {
        EffectSettings {
            base_size: default_base_size(),
            peak_size: default_peak_size(),
            duration_us: default_duration(),
            sound_cooldown_us: default_sound_cooldown(),
            idle_color: default_idle_color(),
        }
    }
}

/// Snapshot of one running effect, for per-rule rendering in independent mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSnapshot {
    /// Index of the owning rule in declaration order.
    pub rule_index: usize,
    pub size: f64,
    pub color: String,
}

/// Per-tick result returned to the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameStatus {
    /// Any effect currently running.
    pub active: bool,
    /// At least one rule fired on this tick. True at most once per one-shot
    /// rule per session.
    pub just_fired: bool,
    /// The renderer should start sound playback now. Firing requests
    /// playback only when the sound cooldown has elapsed.
    pub play_sound: bool,
    /// Overlay size: the largest running effect's eased size, or the base
    /// size when idle.
    pub size: f64,
    /// Color of the earliest-declared running effect, or the idle color.
    pub color: String,
    /// Declaration-order indices of the rules that fired this tick.
    pub fired: Vec<usize>,
    /// All running effects (one entry per rule in independent mode, at most
    /// one in exclusive mode).
    pub effects: Vec<EffectSnapshot>,
}
