// Rule table: which pose, how confident, and when in the reference video.
// Rules are declared in order, validated once, and immutable afterwards.
// Rule identity is the declaration-order index, so the same pose id may
// appear with multiple disjoint windows.

use crate::error::EngineError;
use crate::types::{Observation, PoseId, RuleConfig, VideoTime};

/// A contiguous interval of reference-video playback time, inclusive at
/// both ends (an observation landing exactly on either boundary qualifies).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: VideoTime,
    pub end: VideoTime,
}

impl TimeWindow {
    pub fn new(start: VideoTime, end: VideoTime) -> Self {
        TimeWindow { start, end }
    }

    pub fn contains(&self, t: VideoTime) -> bool {
        t >= self.start && t <= self.end
    }
}

/// One configured trigger: pose id, exclusive confidence threshold, video
/// time window, one-shot flag, and the highlight color painted while the
/// resulting effect runs.
#[derive(Debug, Clone)]
pub struct PoseWindowRule {
    pub pose_id: PoseId,
    pub threshold: f64,
    pub window: TimeWindow,
    pub one_shot: bool,
    pub color: Option<String>,
}

impl PoseWindowRule {
    /// Whether this observation satisfies the rule's predicates.
    /// The threshold comparison is strictly greater-than: probability equal
    /// to the threshold does not match.
    pub fn matches(&self, obs: &Observation) -> bool {
        obs.pose_id == self.pose_id
            && obs.probability > self.threshold
            && self.window.contains(obs.video_time)
    }
}

/// Ordered, validated rule set. Evaluation order is declaration order, which
/// is also the tie-break order when several rules qualify in the same tick.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<PoseWindowRule>,
}

impl RuleSet {
    /// Validate and freeze a rule table from configuration.
    pub fn from_configs(configs: &[RuleConfig]) -> Result<RuleSet, EngineError> {
        let mut rules = Vec::with_capacity(configs.len());

        for (index, config) in configs.iter().enumerate() {
            if config.pose_id.is_empty() {
                return Err(EngineError::InvalidRule {
                    index,
                    message: "pose id is empty".to_string(),
                });
            }
            if !(config.threshold > 0.0 && config.threshold <= 1.0) {
                return Err(EngineError::InvalidRule {
                    index,
                    message: format!("threshold {} outside (0, 1]", config.threshold),
                });
            }
            if !config.window_start_secs.is_finite() || !config.window_end_secs.is_finite() {
                return Err(EngineError::InvalidRule {
                    index,
                    message: format!(
                        "window bounds [{}, {}] are not finite",
                        config.window_start_secs, config.window_end_secs
                    ),
                });
            }
            if config.window_start_secs < 0.0 {
                return Err(EngineError::InvalidRule {
                    index,
                    message: format!("window start {} is negative", config.window_start_secs),
                });
            }
            if config.window_end_secs < config.window_start_secs {
                return Err(EngineError::InvalidRule {
                    index,
                    message: format!(
                        "window end {} precedes start {}",
                        config.window_end_secs, config.window_start_secs
                    ),
                });
            }

            rules.push(PoseWindowRule {
                pose_id: PoseId::new(config.pose_id.clone()),
                threshold: config.threshold,
                window: TimeWindow::new(
                    VideoTime::from_secs(config.window_start_secs),
                    VideoTime::from_secs(config.window_end_secs),
                ),
                one_shot: config.one_shot,
                color: config.color.clone(),
            });
        }

        Ok(RuleSet { rules })
    }

    /// The pose/window table used by the original choreography demo:
    /// threshold 0.85 everywhere, one color per pose.
    pub fn classic_demo() -> RuleSet {
        let configs: Vec<RuleConfig> = [
            ("pose 1", 4.0, 8.0, "red"),
            ("pose 2l", 9.0, 13.0, "green"),
            ("pose 2r", 9.0, 13.0, "green"),
            ("pose 3", 15.0, 17.0, "orange"),
            ("pose 4", 17.0, 18.0, "yellow"),
            ("pose 5", 15.0, 17.0, "pink"),
        ]
        .iter()
        .map(|(pose, start, end, color)| RuleConfig {
            pose_id: pose.to_string(),
            threshold: 0.85,
            window_start_secs: *start,
            window_end_secs: *end,
            one_shot: true,
            color: Some(color.to_string()),
        })
        .collect();

        // Static table above always validates.
        RuleSet::from_configs(&configs).expect("built-in rule table is valid")
    }

    pub fn rules(&self) -> &[PoseWindowRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_config(pose: &str, start: f64, end: f64) -> RuleConfig {
        RuleConfig {
            pose_id: pose.to_string(),
            threshold: 0.85,
            window_start_secs: start,
            window_end_secs: end,
            one_shot: true,
            color: None,
        }
    }

    fn observation(pose: &str, probability: f64, secs: f64) -> Observation {
        Observation {
            pose_id: PoseId::new(pose),
            probability,
            video_time: VideoTime::from_secs(secs),
        }
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        let window = TimeWindow::new(VideoTime::from_secs(4.0), VideoTime::from_secs(8.0));
        assert!(window.contains(VideoTime::from_secs(4.0)));
        assert!(window.contains(VideoTime::from_secs(6.0)));
        assert!(window.contains(VideoTime::from_secs(8.0)));
        assert!(!window.contains(VideoTime::from_secs(3.999)));
        assert!(!window.contains(VideoTime::from_secs(8.001)));
    }

    #[test]
    fn threshold_is_exclusive() {
        let rules = RuleSet::from_configs(&[rule_config("pose 1", 4.0, 8.0)]).unwrap();
        let rule = &rules.rules()[0];
        assert!(!rule.matches(&observation("pose 1", 0.85, 6.0)));
        assert!(rule.matches(&observation("pose 1", 0.86, 6.0)));
    }

    #[test]
    fn wrong_pose_never_matches() {
        let rules = RuleSet::from_configs(&[rule_config("pose 1", 4.0, 8.0)]).unwrap();
        assert!(!rules.rules()[0].matches(&observation("pose 2l", 0.99, 6.0)));
    }

    #[test]
    fn out_of_range_probability_fails_predicate() {
        let rules = RuleSet::from_configs(&[rule_config("pose 1", 4.0, 8.0)]).unwrap();
        // Garbage input filters out, no error path.
        assert!(!rules.rules()[0].matches(&observation("pose 1", -1.0, 6.0)));
    }

    #[test]
    fn same_pose_may_hold_multiple_windows() {
        let rules = RuleSet::from_configs(&[
            rule_config("pose 3", 11.5, 13.0),
            rule_config("pose 3", 17.5, 19.5),
        ])
        .unwrap();
        assert_eq!(rules.len(), 2);
        let obs = observation("pose 3", 0.9, 12.0);
        assert!(rules.rules()[0].matches(&obs));
        assert!(!rules.rules()[1].matches(&obs));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let result = RuleSet::from_configs(&[rule_config("pose 1", 8.0, 4.0)]);
        assert!(matches!(
            result,
            Err(EngineError::InvalidRule { index: 0, .. })
        ));
    }

    #[test]
    fn nan_window_bounds_are_rejected() {
        // NaN passes every ordered comparison, so it needs its own check.
        let mut config = rule_config("pose 1", f64::NAN, 8.0);
        assert!(matches!(
            RuleSet::from_configs(&[config.clone()]),
            Err(EngineError::InvalidRule { index: 0, .. })
        ));

        config = rule_config("pose 1", 4.0, f64::NAN);
        assert!(RuleSet::from_configs(&[config]).is_err());
    }

    #[test]
    fn infinite_window_end_is_rejected() {
        let config = rule_config("pose 1", 4.0, f64::INFINITY);
        assert!(RuleSet::from_configs(&[config]).is_err());
    }

    #[test]
    fn threshold_of_zero_is_rejected() {
        let mut config = rule_config("pose 1", 4.0, 8.0);
        config.threshold = 0.0;
        assert!(RuleSet::from_configs(&[config]).is_err());
    }

    #[test]
    fn classic_demo_table_shape() {
        let rules = RuleSet::classic_demo();
        assert_eq!(rules.len(), 6);
        assert_eq!(rules.rules()[0].pose_id.as_str(), "pose 1");
        assert_eq!(rules.rules()[0].color.as_deref(), Some("red"));
        assert!(rules.rules().iter().all(|r| r.threshold == 0.85));
    }
}
