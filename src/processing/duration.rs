// Signal duration models
// Magnitude regression and a source/path/site significant-duration model

use crate::config::{DurationModelConfig, MagnitudeDurationConfig};

/// Seconds of signal after the origin predicted from magnitude alone
pub fn magnitude_duration(config: &MagnitudeDurationConfig, magnitude: f64) -> f64 {
    (config.intercept + config.slope * magnitude).max(0.0)
}

/// Seconds of signal after the origin from distance over a minimum velocity
pub fn velocity_duration(distance_km: f64, vmin: f64, floor: f64) -> f64 {
    (distance_km / vmin).max(floor)
}

/// Significant duration as the sum of a source term (inverse Brune corner
/// frequency) and a piecewise-linear path term, scaled by a site term.
pub struct DurationModel<'a> {
    config: &'a DurationModelConfig,
}

impl<'a> DurationModel<'a> {
    pub fn new(config: &'a DurationModelConfig) -> Self {
        DurationModel { config }
    }

    /// Brune corner frequency (Hz) for a moment magnitude
    pub fn corner_frequency(&self, magnitude: f64) -> f64 {
        // Seismic moment in dyne-cm
        let m0 = 10f64.powf(1.5 * magnitude + 16.05);
        4.9e6 * self.config.beta * (self.config.stress_drop / m0).powf(1.0 / 3.0)
    }

    fn path_term(&self, distance_km: f64) -> f64 {
        let c = self.config;
        let r = distance_km.max(0.0);
        c.c1 * r.min(c.r1) + c.c2 * (r.max(c.r1).min(c.r2) - c.r1) + c.c3 * (r.max(c.r2) - c.r2)
    }

    fn site_term(&self, vs30: f64) -> f64 {
        let c = self.config;
        c.c4 * (vs30.min(c.v1) / c.vref).ln()
    }

    /// Natural-log mean and standard deviation of the duration
    pub fn ln_mean_and_std(&self, magnitude: f64, distance_km: f64, vs30: f64) -> (f64, f64) {
        let source = 1.0 / self.corner_frequency(magnitude);
        let path = self.path_term(distance_km);
        let ln_mean = (source + path).ln() + self.site_term(vs30);
        (ln_mean, self.config.sigma)
    }

    /// Duration in seconds at `epsilon` standard deviations above the mean
    pub fn duration(&self, magnitude: f64, distance_km: f64, vs30: f64, epsilon: f64) -> f64 {
        let (ln_mean, ln_std) = self.ln_mean_and_std(magnitude, distance_km, vs30);
        (ln_mean + epsilon * ln_std).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_duration() {
        let config = MagnitudeDurationConfig::default();
        assert!((magnitude_duration(&config, 7.1) - 183.0).abs() < 1e-9);
        assert_eq!(magnitude_duration(&config, 0.5), 0.0);
    }

    #[test]
    fn test_velocity_duration_floor() {
        assert_eq!(velocity_duration(30.0, 1.0, 120.0), 120.0);
        assert_eq!(velocity_duration(300.0, 1.0, 120.0), 300.0);
    }

    #[test]
    fn test_model_scales_with_magnitude_and_distance() {
        let config = DurationModelConfig::default();
        let model = DurationModel::new(&config);

        let small = model.duration(5.0, 30.0, 760.0, 0.0);
        let large = model.duration(7.0, 30.0, 760.0, 0.0);
        let far = model.duration(7.0, 150.0, 760.0, 0.0);

        assert!(small < large);
        assert!(large < far);
    }

    #[test]
    fn test_model_reference_values() {
        let config = DurationModelConfig::default();
        let model = DurationModel::new(&config);

        assert!((model.duration(6.0, 20.0, 760.0, 0.0) - 4.749480014).abs() < 1e-8);
        assert!((model.duration(7.0, 100.0, 400.0, 1.0) - 31.569699978).abs() < 1e-8);
        assert!((model.duration(7.1, 5.083408811, 760.0, 3.0) - 53.675503292).abs() < 1e-8);
    }

    #[test]
    fn test_epsilon_raises_duration() {
        let config = DurationModelConfig::default();
        let model = DurationModel::new(&config);
        let mean = model.duration(6.0, 20.0, 760.0, 0.0);
        let plus = model.duration(6.0, 20.0, 760.0, 1.0);
        assert!((plus / mean - config.sigma.exp()).abs() < 1e-9);
    }

    #[test]
    fn test_corner_frequency_drops_with_magnitude() {
        let config = DurationModelConfig::default();
        let model = DurationModel::new(&config);
        assert!(model.corner_frequency(4.0) > model.corner_frequency(7.0));
    }
}
