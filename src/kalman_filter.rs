use crate::error::TrackError;
use crate::rect::MIN_EXTENT;
use nalgebra::SMatrix;

/* -----------------------------------------------------------------------------
 * Type aliases
 * ----------------------------------------------------------------------------- */
// 1x4, [cx, cy, a, h]
pub type DetectBox = SMatrix<f32, 1, 4>;
// 1x8, [cx, cy, a, h, vcx, vcy, va, vh]
pub type StateMean = SMatrix<f32, 1, 8>;
// 8x8
pub type StateCov = SMatrix<f32, 8, 8>;
// 1x4
pub type StateHMean = SMatrix<f32, 1, 4>;
// 4x4
pub type StateHCov = SMatrix<f32, 4, 4>;

const NDIM: usize = 4;
const DT: f32 = 1.0;

/* -----------------------------------------------------------------------------
 * Kalman Filter
 * ----------------------------------------------------------------------------- */
/// Constant-velocity Kalman filter over `[cx, cy, a, h]` and their rates.
///
/// Every noise term is proportional to the box height, so uncertainty is
/// expressed relative to object size. The filter holds no per-track state;
/// the caller owns `(mean, covariance)`.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    std_weight_position: f32,
    std_weight_velocity: f32,
    motion_mat: SMatrix<f32, 8, 8>, // 8x8
    update_mat: SMatrix<f32, 4, 8>, // 4x8
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new(1. / 20., 1. / 160.)
    }
}

impl KalmanFilter {
    pub fn new(std_weight_position: f32, std_weight_velocity: f32) -> Self {
        let mut motion_mat = SMatrix::<f32, 8, 8>::identity();
        for i in 0..NDIM {
            motion_mat[(i, i + NDIM)] = DT;
        }

        // identity on the first four state components
        let mut update_mat = SMatrix::<f32, 4, 8>::zeros();
        for i in 0..NDIM {
            update_mat[(i, i)] = 1.0;
        }

        Self {
            std_weight_position,
            std_weight_velocity,
            motion_mat,
            update_mat,
        }
    }

    /// Height used to scale noise; never zero, whatever the box looks like.
    #[inline(always)]
    fn noise_height(height: f32) -> f32 {
        height.abs().max(MIN_EXTENT as f32)
    }

    /// Diagonal covariance from per-component standard deviations.
    #[inline(always)]
    fn diag_cov<const D: usize>(std: [f32; D]) -> SMatrix<f32, D, D> {
        let var = SMatrix::<f32, D, 1>::from_iterator(std.map(|s| s * s));
        SMatrix::<f32, D, D>::from_diagonal(&var)
    }

    pub fn initiate(&self, measurement: &DetectBox) -> (StateMean, StateCov) {
        let mut mean = StateMean::zeros();
        mean.as_mut_slice()[0..4].copy_from_slice(measurement.as_slice());

        let h = Self::noise_height(measurement[(0, 3)]);
        let pos = 2.0 * self.std_weight_position * h;
        let vel = 10.0 * self.std_weight_velocity * h;
        let covariance =
            Self::diag_cov([pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        (mean, covariance)
    }

    pub fn predict(
        &self,
        mean: &StateMean,
        covariance: &StateCov,
    ) -> (StateMean, StateCov) {
        let h = Self::noise_height(mean[(0, 3)]);
        let pos = self.std_weight_position * h;
        let vel = self.std_weight_velocity * h;
        let motion_cov =
            Self::diag_cov([pos, pos, 1e-2, pos, vel, vel, 1e-5, vel]);

        let mean = (self.motion_mat * mean.transpose()).transpose();
        let covariance =
            self.motion_mat * covariance * self.motion_mat.transpose()
                + motion_cov;

        (mean, covariance)
    }

    /// Project the state into measurement space, adding measurement noise.
    pub fn project(
        &self,
        mean: &StateMean,
        covariance: &StateCov,
    ) -> (StateHMean, StateHCov) {
        let h = Self::noise_height(mean[(0, 3)]);
        let pos = self.std_weight_position * h;
        let innovation_cov = Self::diag_cov([pos, pos, 1e-1, pos]);

        let projected_mean = mean * self.update_mat.transpose();
        let projected_cov =
            self.update_mat * covariance * self.update_mat.transpose()
                + innovation_cov;

        (projected_mean, projected_cov)
    }

    /// Kalman correction. The gain comes from a Cholesky solve on the
    /// innovation covariance, never from its explicit inverse.
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCov,
        measurement: &DetectBox,
    ) -> Result<(StateMean, StateCov), TrackError> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);

        let cholesky_factor = projected_cov.cholesky().ok_or_else(|| {
            TrackError::KalmanError(format!(
                "innovation covariance is not positive definite: {:?}",
                projected_cov
            ))
        })?;

        // kalman_gain: 4x8, transposed gain in row-vector layout
        let b = (covariance * self.update_mat.transpose()).transpose();
        let kalman_gain = cholesky_factor.solve(&b);
        // innovation: 1x4
        let innovation = measurement - projected_mean;

        let new_mean = mean + innovation * kalman_gain;
        let new_covariance =
            covariance - kalman_gain.transpose() * projected_cov * kalman_gain;

        Ok((new_mean, new_covariance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    fn assert_cov_eq<const D: usize>(
        actual: &SMatrix<f32, D, D>,
        expected: &SMatrix<f32, D, D>,
    ) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert_nearly_eq!(*a, *e, 1e-4);
        }
    }

    #[rustfmt::skip]
    fn predicted_covariance() -> StateCov {
        StateCov::from_row_slice(&[
            4.24, 0.0,  0.0,     0.0,  4.0,      0.0,      0.0,    0.0,
            0.0,  4.24, 0.0,     0.0,  0.0,      4.0,      0.0,    0.0,
            0.0,  0.0,  1.01e-2, 0.0,  0.0,      0.0,      1.0e-6, 0.0,
            0.0,  0.0,  0.0,     4.24, 0.0,      0.0,      0.0,    4.0,
            4.0,  0.0,  0.0,     0.0,  4.000625, 0.0,      0.0,    0.0,
            0.0,  4.0,  0.0,     0.0,  0.0,      4.000625, 0.0,    0.0,
            0.0,  0.0,  1.0e-6,  0.0,  0.0,      0.0,      1.0e-6, 0.0,
            0.0,  0.0,  0.0,     4.0,  0.0,      0.0,      0.0,    4.000625,
        ])
    }

    #[test]
    fn test_initiate() {
        let kalman_filter = KalmanFilter::default();
        let measurement = DetectBox::new(1.0, 2.0, 3.0, 4.0);

        let (mean, covariance) = kalman_filter.initiate(&measurement);

        assert_eq!(
            mean,
            StateMean::from_row_slice(&[1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0])
        );
        let expected = StateCov::from_diagonal(
            &SMatrix::<f32, 8, 1>::from_row_slice(&[
                0.16, 0.16, 1.0e-4, 0.16, 6.25e-2, 6.25e-2, 1e-10, 6.25e-2,
            ]),
        );
        assert_cov_eq(&covariance, &expected);
    }

    #[test]
    fn test_initiate_scales_with_height() {
        let kalman_filter = KalmanFilter::default();
        let (_, small) =
            kalman_filter.initiate(&DetectBox::new(0., 0., 1., 10.));
        let (_, large) =
            kalman_filter.initiate(&DetectBox::new(0., 0., 1., 100.));
        assert!(large[(0, 0)] > small[(0, 0)]);
        assert!(large[(4, 4)] > small[(4, 4)]);
        // aspect-ratio terms are size independent
        assert_eq!(large[(2, 2)], small[(2, 2)]);
    }

    #[test]
    fn test_predict() {
        let kalman_filter = KalmanFilter::default();
        let mean =
            StateMean::from_row_slice(&[
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0,
            ]);
        let covariance = StateCov::from_diagonal(
            &SMatrix::<f32, 8, 1>::from_row_slice(&[
                0.2, 0.2, 0.01, 0.2, 4.0, 4.0, 0.000001, 4.0,
            ]),
        );

        let (mean, covariance) = kalman_filter.predict(&mean, &covariance);

        assert_eq!(
            mean,
            StateMean::from_row_slice(&[
                6.0, 8.0, 10.0, 12.0, 5.0, 6.0, 7.0, 8.0,
            ])
        );
        assert_cov_eq(&covariance, &predicted_covariance());
    }

    #[test]
    fn test_project() {
        let kalman_filter = KalmanFilter::default();
        let mean =
            StateMean::from_row_slice(&[
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0,
            ]);

        let (projected_mean, projected_cov) =
            kalman_filter.project(&mean, &predicted_covariance());

        assert_eq!(projected_mean, StateHMean::new(1., 2., 3., 4.));
        let expected = StateHCov::from_diagonal(
            &SMatrix::<f32, 4, 1>::new(4.28, 4.28, 0.0201, 4.28),
        );
        assert_cov_eq(&projected_cov, &expected);
    }

    #[test]
    fn test_update() {
        let kalman_filter = KalmanFilter::default();
        let mean =
            StateMean::from_row_slice(&[
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0,
            ]);
        let measurement = DetectBox::new(1.0, 2.0, 3.0, 4.0);

        let (mean, covariance) = kalman_filter
            .update(&mean, &predicted_covariance(), &measurement)
            .unwrap();

        // zero innovation leaves the mean untouched
        assert_eq!(
            mean,
            StateMean::from_row_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
        );
        #[rustfmt::skip]
        let expected = StateCov::from_row_slice(&[
            3.96261682e-02, 0.0, 0.0, 0.0, 3.73831776e-02, 0.0, 0.0, 0.0,
            0.0, 3.96261682e-02, 0.0, 0.0, 0.0, 3.73831776e-02, 0.0, 0.0,
            0.0, 0.0, 5.02487562e-03, 0.0, 0.0, 0.0, 4.97512438e-07, 0.0,
            0.0, 0.0, 0.0, 3.96261682e-02, 0.0, 0.0, 0.0, 3.73831776e-02,
            3.73831776e-02, 0.0, 0.0, 0.0, 2.62307243e-01, 0.0, 0.0, 0.0,
            0.0, 3.73831776e-02, 0.0, 0.0, 0.0, 2.62307243e-01, 0.0, 0.0,
            0.0, 0.0, 4.97512438e-07, 0.0, 0.0, 0.0, 9.99950249e-07, 0.0,
            0.0, 0.0, 0.0, 3.73831776e-02, 0.0, 0.0, 0.0, 2.62307243e-01,
        ]);
        assert_cov_eq(&covariance, &expected);
    }

    #[test]
    fn test_update_moves_mean_towards_measurement() {
        let kalman_filter = KalmanFilter::default();
        let (mean, covariance) =
            kalman_filter.initiate(&DetectBox::new(50.0, 50.0, 1.0, 20.0));
        let (mean, covariance) = kalman_filter.predict(&mean, &covariance);

        let (updated, _) = kalman_filter
            .update(&mean, &covariance, &DetectBox::new(54.0, 50.0, 1.0, 20.0))
            .unwrap();

        assert!(updated[(0, 0)] > 50.0 && updated[(0, 0)] < 54.0);
        // positive x velocity is inferred from the shift
        assert!(updated[(0, 4)] > 0.0);
    }

    #[test]
    fn test_degenerate_height_keeps_update_well_posed() {
        let kalman_filter = KalmanFilter::default();
        let (mean, covariance) =
            kalman_filter.initiate(&DetectBox::new(5.0, 5.0, 0.0, 0.0));
        let (mean, covariance) = kalman_filter.predict(&mean, &covariance);

        let res = kalman_filter.update(
            &mean,
            &covariance,
            &DetectBox::new(5.0, 5.0, 0.0, 0.0),
        );
        assert!(res.is_ok(), "expected Ok, got {:?}", res);
        let (mean, covariance) = res.unwrap();
        assert!(mean.iter().all(|v| v.is_finite()));
        assert!(covariance.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_repeated_static_measurement_converges() {
        let kalman_filter = KalmanFilter::default();
        let measurement = DetectBox::new(1.0, 2.0, 3.0, 4.0);
        let (mut mean, mut covariance) = kalman_filter.initiate(&measurement);

        for _ in 0..10 {
            (mean, covariance) =
                kalman_filter.update(&mean, &covariance, &measurement).unwrap();
            (mean, covariance) = kalman_filter.predict(&mean, &covariance);
        }

        let expected = [1.0f32, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0];
        for (a, e) in mean.iter().zip(expected) {
            assert_nearly_eq!(*a, e, 1e-4);
        }
        assert_nearly_eq!(covariance[(0, 0)], covariance[(1, 1)], 1e-6);
    }
}
