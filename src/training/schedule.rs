// ============================================================
// Layer 5 — Learning-Rate Schedule
// ============================================================
// Inverse-sqrt schedule with linear warmup, scaled by the
// embedding width: rate rises for `warmup_steps`, then decays as
// step^-0.5, with a hard ceiling of 1e-3 before the user's
// scaling factor. With warmup disabled the configured fixed rate
// is used unchanged.

use crate::training::TrainSettings;

const RATE_CEILING: f64 = 1e-3;

#[derive(Debug, Clone)]
pub struct LearningRateSchedule {
    fixed_rate: f64,
    warmup_steps: usize,
    scaling: f64,
    coordinates: usize,
}

impl LearningRateSchedule {
    pub fn new(settings: &TrainSettings, coordinates: usize) -> Self {
        Self {
            fixed_rate: settings.learning_rate,
            warmup_steps: settings.warmup_steps,
            scaling: settings.schedule_scaling,
            coordinates,
        }
    }

    /// Learning rate for a 1-based step counter.
    pub fn rate(&self, step: usize) -> f64 {
        if self.warmup_steps == 0 {
            return self.fixed_rate;
        }
        let step = step.max(1) as f64;
        let warmup = self.warmup_steps as f64;

        let rate = f64::min(step.powf(-0.5), step * warmup.powf(-1.5));
        let rate = rate * (self.coordinates as f64).powf(-0.5);
        rate.min(RATE_CEILING) * self.scaling
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(warmup_steps: usize) -> LearningRateSchedule {
        let settings = TrainSettings {
            warmup_steps,
            schedule_scaling: 1.0,
            learning_rate: 5e-4,
            ..TrainSettings::default()
        };
        LearningRateSchedule::new(&settings, 64)
    }

    #[test]
    fn test_zero_warmup_means_fixed_rate() {
        let schedule = schedule(0);
        assert_eq!(schedule.rate(1), 5e-4);
        assert_eq!(schedule.rate(10_000), 5e-4);
    }

    #[test]
    fn test_rate_rises_through_warmup_then_decays() {
        let schedule = schedule(100);
        assert!(schedule.rate(10) < schedule.rate(50));
        assert!(schedule.rate(50) < schedule.rate(100));
        assert!(schedule.rate(100) > schedule.rate(400));
        assert!(schedule.rate(400) > schedule.rate(1600));
    }

    #[test]
    fn test_rate_never_exceeds_the_ceiling() {
        let schedule = schedule(2);
        for step in 1..2000 {
            assert!(schedule.rate(step) <= 1e-3);
        }
    }
}
