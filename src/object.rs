use crate::{error::TrackError, rect::Rect};

/*------------------------------------------------------------------------------
Detection struct
------------------------------------------------------------------------------*/

/// One unassociated detector output for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub rect: Rect<f32>,
    pub score: f32,
}

impl Detection {
    pub fn new(rect: Rect<f32>, score: f32) -> Self {
        Self { rect, score }
    }

    pub fn from_xyxy(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> Self {
        Self::new(Rect::from_xyxy(x1, y1, x2, y2), score)
    }

    pub fn get_rect(&self) -> &Rect<f32> {
        &self.rect
    }

    pub fn get_score(&self) -> f32 {
        self.score
    }

    /// True when every corner and the score are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.score.is_finite()
            && self.rect.get_xyxy().iter().all(|v| v.is_finite())
    }
}

impl From<[f32; 5]> for Detection {
    fn from(row: [f32; 5]) -> Self {
        Self::from_xyxy(row[0], row[1], row[2], row[3], row[4])
    }
}

/// Checked conversion from a raw `[x1, y1, x2, y2, score]` row.
///
/// Inverted corners are accepted (they are clamped to zero area downstream);
/// a wrong row length or a non-finite value is not.
impl TryFrom<&[f32]> for Detection {
    type Error = TrackError;

    fn try_from(row: &[f32]) -> Result<Self, Self::Error> {
        let row: [f32; 5] = row.try_into().map_err(|_| {
            TrackError::MalformedDetection(format!(
                "expected 5 values [x1, y1, x2, y2, score], got {}",
                row.len()
            ))
        })?;
        if let Some(v) = row.iter().find(|v| !v.is_finite()) {
            return Err(TrackError::MalformedDetection(format!(
                "non-finite value {} in {:?}",
                v, row
            )));
        }
        Ok(Self::from(row))
    }
}

/*------------------------------------------------------------------------------
TrackedObject struct
------------------------------------------------------------------------------*/

/// A live track as reported at the end of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub track_id: usize,
    pub rect: Rect<f32>,
}

impl TrackedObject {
    pub fn new(track_id: usize, rect: Rect<f32>) -> Self {
        Self { track_id, rect }
    }

    pub fn get_track_id(&self) -> usize {
        self.track_id
    }

    pub fn get_rect(&self) -> &Rect<f32> {
        &self.rect
    }

    /// `(track_id, x1, y1, x2, y2)`
    pub fn to_tuple(&self) -> (usize, f32, f32, f32, f32) {
        let [x1, y1, x2, y2] = self.rect.get_xyxy();
        (self.track_id, x1, y1, x2, y2)
    }
}
