//! Predicts where inertial motion (e.g. a mouse-wheel flick) naturally
//! settles and animates a position toward it: linear interpolation for
//! negligible or contradictory motion, a cubic Bezier "S-curve" blended
//! with an exponential-decay progress function otherwise.

use std::time::Duration;

const ANIM_DUR_SECS: f32 = 1.0;
const FPS: f32 = 60.0;
const MAX_ITERS: u32 = 10;
const CONVERGE_THRESHOLD: f32 = 0.001;
const INIT_MAGNITUDE: f32 = 1.1;
const MIN_PROGRESS: f32 = 0.1;
const MAX_PROGRESS: f32 = 0.5;
/// Empirically measured: initial displacement to predicted travel
/// distance, observed from real-world scroll behavior.
const INERTIAL_PROJECTION_FACTOR: f32 = 16.7;

fn project_inertial(delta: f32) -> f32 {
    INERTIAL_PROJECTION_FACTOR * delta
}

pub struct MomentumCalculator {
    delta: f32,
    #[allow(dead_code)]
    vel: f32,
    pos: f32,
    target: f32,
    linear_only: bool,
    coeffs: [f32; 4],
    curve_mag: f32,
    decay: f32,
}

impl MomentumCalculator {
    pub fn new(pos: f32, delta: f32, vel: f32) -> Self {
        let target = pos + project_inertial(delta);
        let mut calc = MomentumCalculator {
            delta,
            vel,
            pos,
            target,
            linear_only: true,
            coeffs: [0.0; 4],
            curve_mag: INIT_MAGNITUDE,
            decay: 1.0,
        };
        calc.init_curve();
        calc.init_interp();
        calc
    }

    pub fn pos_at(&self, time: Duration) -> f32 {
        let progress = self.progress_at(time);
        if self.linear_only {
            self.linear_pos_at(progress)
        } else {
            self.cubic_pos_at(progress)
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f32(ANIM_DUR_SECS)
    }

    pub fn pred_dest(&self) -> f32 {
        self.pos + project_inertial(self.delta)
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn is_linear(&self) -> bool {
        self.linear_only
    }

    fn linear_pos_at(&self, progress: f32) -> f32 {
        self.pos + progress * (self.target - self.pos)
    }

    fn cubic_pos_at(&self, progress: f32) -> f32 {
        (0..4).fold(0.0, |acc, i| acc + progress.powi(i) * self.coeffs[i as usize])
    }

    fn init_interp(&mut self) {
        self.linear_only = true;

        if self.delta.abs() < 1.0 {
            return;
        }

        let to_target = self.target - self.pos;
        let to_target_dist = to_target.abs();
        if to_target_dist < 0.001 {
            return;
        }

        let delta_dir = if self.delta > 0.0 { 1.0 } else { -1.0 };
        let target_dir = if to_target > 0.0 { 1.0 } else { -1.0 };
        if delta_dir != target_dir {
            return;
        }

        let side = to_target_dist / (2.0 * self.delta.abs() / (self.delta.abs() + to_target_dist) + 1.0);
        let ctrl1 = self.pos + side * delta_dir;
        let ctrl2 = ctrl1 + side * target_dir;

        self.coeffs[0] = self.pos;
        self.coeffs[1] = 3.0 * (ctrl1 - self.pos);
        self.coeffs[2] = 3.0 * (self.pos - 2.0 * ctrl1 + ctrl2);
        self.coeffs[3] = 3.0 * (ctrl1 - ctrl2) - self.pos + self.target;

        self.linear_only = false;
    }

    fn init_curve(&mut self) {
        let mut prog = MIN_PROGRESS;
        let to_target = (self.target - self.pos).abs();
        if to_target > 0.001 {
            let ratio = self.delta.abs() / to_target;
            prog = ratio.clamp(MIN_PROGRESS, MAX_PROGRESS);
        }

        let mut prev_decay = 1.0f32;
        self.curve_mag = INIT_MAGNITUDE;

        for _ in 0..MAX_ITERS {
            self.decay = self.curve_mag / (self.curve_mag - prog);
            let exponent = -FPS * ANIM_DUR_SECS;
            self.curve_mag = 1.0 / (1.0 - self.decay.powf(exponent));

            if (self.decay - prev_decay).abs() < CONVERGE_THRESHOLD {
                break;
            }
            prev_decay = self.decay;
        }
    }

    fn progress_at(&self, time: Duration) -> f32 {
        let t = (time.as_secs_f32() / ANIM_DUR_SECS).clamp(0.0, 1.0);
        let exponent = -FPS * ANIM_DUR_SECS * t;
        (self.curve_mag * (1.0 - self.decay.powf(exponent))).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicts_final_position() {
        let calc = MomentumCalculator::new(100.0, 5.0, 20.0);
        assert!((calc.pred_dest() - (100.0 + 16.7 * 5.0)).abs() < 1e-4);
    }

    #[test]
    fn has_correct_duration() {
        let calc = MomentumCalculator::new(0.0, 5.0, 20.0);
        assert_eq!(calc.duration(), Duration::from_secs_f32(1.0));
    }

    #[test]
    fn position_at_key_times_reaches_destination() {
        let calc = MomentumCalculator::new(0.0, 5.0, 20.0);
        let start = calc.pos_at(Duration::from_secs_f32(0.0));
        let end = calc.pos_at(Duration::from_secs_f32(1.0));
        let past_end = calc.pos_at(Duration::from_secs_f32(1.5));
        assert!((start - 0.0).abs() < 1e-3);
        assert!((end - calc.pred_dest()).abs() < 1e-2);
        assert!((end - past_end).abs() < 1e-6);
    }

    #[test]
    fn uses_linear_interpolation_for_small_delta() {
        let calc = MomentumCalculator::new(0.0, 0.5, 1.0);
        assert!(calc.is_linear());
    }

    #[test]
    fn uses_linear_interpolation_for_zero_delta() {
        let calc = MomentumCalculator::new(0.0, 0.0, 0.0);
        assert!(calc.is_linear());
    }

    #[test]
    fn handles_negative_movement() {
        let calc = MomentumCalculator::new(100.0, -5.0, -20.0);
        assert!(calc.pred_dest() < 100.0);
    }

    #[test]
    fn curve_parameters_converge_within_budget() {
        let calc = MomentumCalculator::new(0.0, 10.0, 30.0);
        assert!(calc.curve_mag.is_finite());
        assert!(calc.decay.is_finite());
    }
}
