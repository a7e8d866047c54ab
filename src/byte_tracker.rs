use crate::{
    assoc::associate,
    config::TrackerConfig,
    error::TrackError,
    kalman_filter::KalmanFilter,
    object::{Detection, TrackedObject},
    rect::Rect,
    strack::STrack,
};

/*-----------------------------------------------------------------------------
ByteTracker
-----------------------------------------------------------------------------*/

/// Two-stage IoU tracker.
///
/// `update` must be called once per frame, in temporal order: every call
/// predicts from the posterior left by the previous one.
#[derive(Debug)]
pub struct ByteTracker {
    config: TrackerConfig,
    kalman_filter: KalmanFilter,

    frame_id: usize,
    track_id_count: usize,

    tracked_stracks: Vec<STrack>,
}

impl Default for ByteTracker {
    fn default() -> Self {
        Self::from_valid_config(TrackerConfig::default())
    }
}

impl ByteTracker {
    /// Build a tracker with the standard two-stage association.
    ///
    /// Thresholds are taken as given; use [`ByteTracker::with_config`] to have
    /// them validated.
    pub fn new(
        track_thresh: f32,
        match_thresh: f32,
        buffer_size: usize,
    ) -> Self {
        Self::from_valid_config(TrackerConfig::new(
            track_thresh,
            match_thresh,
            buffer_size,
        ))
    }

    pub fn with_config(config: TrackerConfig) -> Result<Self, TrackError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: TrackerConfig) -> Self {
        Self {
            config,
            kalman_filter: KalmanFilter::default(),
            frame_id: 0,
            track_id_count: 0,
            tracked_stracks: Vec::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Number of frames processed since construction or the last reset.
    pub fn frame_id(&self) -> usize {
        self.frame_id
    }

    /// Live tracks in birth order.
    pub fn tracks(&self) -> &[STrack] {
        &self.tracked_stracks
    }

    pub fn track_count(&self) -> usize {
        self.tracked_stracks.len()
    }

    /// Drop every track and restart the frame counter. Track ids keep
    /// increasing so they stay unique over the tracker's lifetime.
    pub fn reset(&mut self) {
        self.tracked_stracks.clear();
        self.frame_id = 0;
    }

    /// Split detections into (high, low) by score; the rest is noise.
    /// Detections with a non-finite coordinate or score are noise too.
    fn split_detections<'a>(
        &self,
        objects: &'a [Detection],
    ) -> (Vec<&'a Detection>, Vec<&'a Detection>) {
        let mut high = Vec::new();
        let mut low = Vec::new();
        for obj in objects {
            if !obj.is_finite() {
                log::debug!("dropping non-finite detection {:?}", obj);
                continue;
            }
            let score = obj.get_score();
            if score > self.config.track_thresh {
                high.push(obj);
            } else if score > self.config.low_thresh {
                low.push(obj);
            }
        }
        (high, low)
    }

    /// `update` for raw `[x1, y1, x2, y2, score]` rows.
    pub fn update_from_rows(
        &mut self,
        rows: &[[f32; 5]],
    ) -> Result<Vec<TrackedObject>, TrackError> {
        let objects: Vec<Detection> =
            rows.iter().copied().map(Detection::from).collect();
        self.update(&objects)
    }

    /// Advance the tracker by one frame and report every live track.
    ///
    /// On error the tracker is left exactly as it was before the call.
    pub fn update(
        &mut self,
        objects: &[Detection],
    ) -> Result<Vec<TrackedObject>, TrackError> {
        let frame_id = self.frame_id + 1;
        let kalman_filter = &self.kalman_filter;

        // Step 1: Predict every live track. Nothing is written back to
        // `self` until both associations have succeeded.
        let mut stracks = self.tracked_stracks.clone();
        for strack in stracks.iter_mut() {
            strack.predict(kalman_filter);
        }

        // Step 2: Split detections by score
        let (high_dets, low_dets) = self.split_detections(objects);

        // Step 3: First association, high scores against every track
        let track_rects: Vec<Rect<f32>> =
            stracks.iter().map(STrack::get_rect).collect();
        let high_rects: Vec<Rect<f32>> =
            high_dets.iter().map(|d| d.get_rect().clone()).collect();

        let first =
            associate(&track_rects, &high_rects, self.config.match_thresh)?;

        // Step 4: Second association, low scores against the tracks left
        // unmatched by the first
        let mut second_matches = Vec::new();
        let mut unmatched_tracks = first.unmatched_tracks.clone();

        if self.config.low_score_association
            && !low_dets.is_empty()
            && !first.unmatched_tracks.is_empty()
        {
            let remain_rects: Vec<Rect<f32>> = first
                .unmatched_tracks
                .iter()
                .map(|&i| track_rects[i].clone())
                .collect();
            let low_rects: Vec<Rect<f32>> =
                low_dets.iter().map(|d| d.get_rect().clone()).collect();

            let second = associate(
                &remain_rects,
                &low_rects,
                self.config.low_match_thresh(),
            )?;

            // map rows back from the remaining subset to live track indices
            second_matches = second
                .matches
                .iter()
                .map(|&(r, d)| (first.unmatched_tracks[r], d))
                .collect();
            unmatched_tracks = second
                .unmatched_tracks
                .iter()
                .map(|&r| first.unmatched_tracks[r])
                .collect();
        }

        // Step 5: Correct matched tracks. A correction the filter cannot
        // compute counts as a missed frame for that track.
        let corrections = first
            .matches
            .iter()
            .map(|&(itracked, idet)| (itracked, high_dets[idet]))
            .chain(
                second_matches
                    .iter()
                    .map(|&(itracked, idet)| (itracked, low_dets[idet])),
            );
        for (itracked, det) in corrections {
            let strack = &mut stracks[itracked];
            if let Err(err) = strack.update(kalman_filter, det, frame_id) {
                log::warn!(
                    "frame {}: track {} counted as missed: {}",
                    frame_id,
                    strack.get_track_id(),
                    err
                );
                strack.mark_missed(self.config.buffer_size);
            }
        }

        // Step 6: Age unmatched tracks
        for &itracked in unmatched_tracks.iter() {
            stracks[itracked].mark_missed(self.config.buffer_size);
        }

        // Step 7: Spawn from unmatched high detections
        for &idet in first.unmatched_detections.iter() {
            self.track_id_count += 1;
            let strack = STrack::new(
                kalman_filter,
                high_dets[idet],
                self.track_id_count,
                frame_id,
            );
            log::trace!(
                "frame {}: new track {}",
                frame_id,
                strack.get_track_id()
            );
            stracks.push(strack);
        }

        // Step 8: Prune removed tracks
        let before = stracks.len();
        stracks.retain(|strack| {
            if strack.is_removed() {
                log::trace!(
                    "frame {}: removed track {} after {} missed frames",
                    frame_id,
                    strack.get_track_id(),
                    strack.get_time_since_update()
                );
            }
            !strack.is_removed()
        });

        log::debug!(
            "frame {}: {} high / {} low detections, {} + {} matched, \
             {} new, {} removed, {} live",
            frame_id,
            high_dets.len(),
            low_dets.len(),
            first.matches.len(),
            second_matches.len(),
            first.unmatched_detections.len(),
            before - stracks.len(),
            stracks.len()
        );

        self.tracked_stracks = stracks;
        self.frame_id = frame_id;

        // Step 9: Report
        Ok(self
            .tracked_stracks
            .iter()
            .map(STrack::to_tracked_object)
            .collect())
    }
}
