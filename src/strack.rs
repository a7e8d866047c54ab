use crate::{
    error::TrackError,
    kalman_filter::{KalmanFilter, StateCov, StateMean},
    object::{Detection, TrackedObject},
    rect::Rect,
};
use std::fmt::Debug;

/*----------------------------------------------------------------------------
STrack State enums
----------------------------------------------------------------------------*/
/// Lifecycle of a track.
///
/// Only `Tracked` and `Removed` are ever stored. `Lost` is what
/// [`STrack::state`] reports for a tracked object that missed at least one
/// frame but is still inside its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum STrackState {
    Tracked,
    Lost,
    Removed,
}

/*----------------------------------------------------------------------------
STrack struct
----------------------------------------------------------------------------*/

impl Debug for STrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "STrack {{ track_id: {}, frame_id: {}, start_frame_id: {}, hits: {}, time_since_update: {}, state: {:?}, score: {}, rect: {:?} }}",
            self.track_id,
            self.frame_id,
            self.start_frame_id,
            self.hits,
            self.time_since_update,
            self.state(),
            self.score,
            self.get_rect()
        )
    }
}

#[derive(Clone)]
pub struct STrack {
    mean: StateMean,
    covariance: StateCov,
    state: STrackState,
    score: f32,
    track_id: usize,
    hits: usize,
    time_since_update: usize,
    frame_id: usize,
    start_frame_id: usize,
}

impl STrack {
    /// Birth of a track from an unmatched detection.
    pub(crate) fn new(
        kalman_filter: &KalmanFilter,
        detection: &Detection,
        track_id: usize,
        frame_id: usize,
    ) -> Self {
        let (mean, covariance) =
            kalman_filter.initiate(&detection.get_rect().get_xyah());
        Self {
            mean,
            covariance,
            state: STrackState::Tracked,
            score: detection.get_score(),
            track_id,
            hits: 1,
            time_since_update: 0,
            frame_id,
            start_frame_id: frame_id,
        }
    }

    /// Current box, derived from the state mean.
    pub fn get_rect(&self) -> Rect<f32> {
        Rect::from_xyah(&self.mean.fixed_view::<1, 4>(0, 0).into_owned())
    }

    pub fn get_mean(&self) -> &StateMean {
        &self.mean
    }

    pub fn get_covariance(&self) -> &StateCov {
        &self.covariance
    }

    /// Reported lifecycle state; see [`STrackState`].
    pub fn state(&self) -> STrackState {
        match self.state {
            STrackState::Tracked if self.time_since_update > 0 => {
                STrackState::Lost
            }
            state => state,
        }
    }

    pub fn is_removed(&self) -> bool {
        self.state == STrackState::Removed
    }

    pub fn get_score(&self) -> f32 {
        self.score
    }

    pub fn get_track_id(&self) -> usize {
        self.track_id
    }

    pub fn get_hits(&self) -> usize {
        self.hits
    }

    pub fn get_time_since_update(&self) -> usize {
        self.time_since_update
    }

    /// Frame of the last successful association (or of birth).
    pub fn get_frame_id(&self) -> usize {
        self.frame_id
    }

    pub fn get_start_frame_id(&self) -> usize {
        self.start_frame_id
    }

    pub(crate) fn predict(&mut self, kalman_filter: &KalmanFilter) {
        (self.mean, self.covariance) =
            kalman_filter.predict(&self.mean, &self.covariance);
    }

    pub(crate) fn update(
        &mut self,
        kalman_filter: &KalmanFilter,
        detection: &Detection,
        frame_id: usize,
    ) -> Result<(), TrackError> {
        (self.mean, self.covariance) = kalman_filter.update(
            &self.mean,
            &self.covariance,
            &detection.get_rect().get_xyah(),
        )?;

        self.state = STrackState::Tracked;
        self.score = detection.get_score();
        self.hits += 1;
        self.time_since_update = 0;
        self.frame_id = frame_id;
        Ok(())
    }

    /// Count one more frame without a measurement; past `buffer_size` the
    /// track is removed.
    pub(crate) fn mark_missed(&mut self, buffer_size: usize) {
        self.time_since_update += 1;
        if self.time_since_update > buffer_size {
            self.state = STrackState::Removed;
        }
    }

    pub(crate) fn to_tracked_object(&self) -> TrackedObject {
        TrackedObject::new(self.track_id, self.get_rect())
    }
}

impl PartialEq for STrack {
    fn eq(&self, other: &Self) -> bool {
        self.track_id == other.track_id
    }
}
