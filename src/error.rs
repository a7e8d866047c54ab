use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Malformed detection: {0}")]
    MalformedDetection(String),
    #[error("Linear assignment failed: {0}")]
    LapjvError(String),
    #[error("Kalman filter failed: {0}")]
    KalmanError(String),
}
