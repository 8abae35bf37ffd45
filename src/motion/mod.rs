//! Inertial-projection animation: a velocity tracker feeding a momentum
//! calculator that predicts where motion naturally settles and animates
//! toward it.

pub mod momentum;
pub mod velocity;

pub use momentum::MomentumCalculator;
pub use velocity::VelocityTracker;
