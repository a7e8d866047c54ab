//! Two-stage IoU multi-object tracker.
//!
//! Each frame, [`ByteTracker::update`] predicts every live track with a
//! constant-velocity Kalman filter, matches high-score detections to tracks by
//! optimal IoU assignment, gives low-score detections a second, looser chance
//! to recover tracks left unmatched, and ages out tracks that stay unmatched
//! for longer than the track buffer.
//!
//! ```
//! use bytetrack_core::{ByteTracker, Detection};
//!
//! let mut tracker = ByteTracker::new(0.5, 0.8, 30);
//! let tracks = tracker
//!     .update(&[Detection::from_xyxy(0.0, 0.0, 10.0, 10.0, 0.9)])
//!     .unwrap();
//! assert_eq!(tracks[0].to_tuple(), (1, 0.0, 0.0, 10.0, 10.0));
//! ```

pub mod assoc;
pub mod byte_tracker;
pub mod config;
pub mod error;
pub mod kalman_filter;
pub mod object;
pub mod rect;
pub mod strack;

mod lapjv;

pub use byte_tracker::ByteTracker;
pub use config::TrackerConfig;
pub use error::TrackError;
pub use object::{Detection, TrackedObject};
pub use rect::Rect;
pub use strack::{STrack, STrackState};
