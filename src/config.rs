use crate::error::TrackError;
use serde::{Deserialize, Serialize};

/// Tracker parameters, fixed once the tracker is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Detections scoring above this are "high" and may start new tracks.
    pub track_thresh: f32,
    /// Detections scoring at or below this are discarded as noise.
    pub low_thresh: f32,
    /// Minimum IoU for a first-stage match.
    pub match_thresh: f32,
    /// Second-stage gate as a fraction of `match_thresh`.
    pub low_match_ratio: f32,
    /// Consecutive missed frames tolerated before a track is removed.
    pub buffer_size: usize,
    /// Run the second association stage against low-score detections.
    pub low_score_association: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            track_thresh: 0.5,
            low_thresh: 0.1,
            match_thresh: 0.8,
            low_match_ratio: 0.9,
            buffer_size: 30,
            low_score_association: true,
        }
    }
}

impl TrackerConfig {
    pub fn new(
        track_thresh: f32,
        match_thresh: f32,
        buffer_size: usize,
    ) -> Self {
        Self {
            track_thresh,
            match_thresh,
            buffer_size,
            ..Default::default()
        }
    }

    pub fn with_low_thresh(self, low_thresh: f32) -> Self {
        Self { low_thresh, ..self }
    }

    pub fn with_low_match_ratio(self, low_match_ratio: f32) -> Self {
        Self {
            low_match_ratio,
            ..self
        }
    }

    /// Disable the low-score recovery pass, leaving a single-stage tracker.
    pub fn single_stage(self) -> Self {
        Self {
            low_score_association: false,
            ..self
        }
    }

    /// IoU gate of the second association stage.
    pub fn low_match_thresh(&self) -> f32 {
        self.match_thresh * self.low_match_ratio
    }

    pub fn validate(&self) -> Result<(), TrackError> {
        let unit = |name: &str, value: f32| {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(TrackError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )))
            }
        };
        unit("track_thresh", self.track_thresh)?;
        unit("low_thresh", self.low_thresh)?;
        unit("match_thresh", self.match_thresh)?;
        unit("low_match_ratio", self.low_match_ratio)?;

        if self.low_thresh > self.track_thresh {
            return Err(TrackError::InvalidConfig(format!(
                "low_thresh ({}) must not exceed track_thresh ({})",
                self.low_thresh, self.track_thresh
            )));
        }
        if self.low_match_ratio == 0.0 {
            return Err(TrackError::InvalidConfig(
                "low_match_ratio must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    #[test]
    fn test_default_is_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_nearly_eq!(config.low_match_thresh(), 0.72, 1e-5);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = TrackerConfig::new(1.5, 0.8, 30);
        assert!(matches!(
            config.validate(),
            Err(TrackError::InvalidConfig(_))
        ));

        let config = TrackerConfig::new(0.5, f32::NAN, 30);
        assert!(config.validate().is_err());

        let config = TrackerConfig::new(0.05, 0.8, 30);
        assert!(config.validate().is_err(), "low_thresh above track_thresh");

        let config = TrackerConfig::default().with_low_match_ratio(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{ "match_thresh": 0.6, "buffer_size": 5 }"#)
                .unwrap();
        assert_eq!(config.match_thresh, 0.6);
        assert_eq!(config.buffer_size, 5);
        assert_eq!(config.track_thresh, 0.5);
        assert!(config.low_score_association);

        let json =
            serde_json::to_string(&config.clone().single_stage()).unwrap();
        let back: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert!(!back.low_score_association);
    }
}
