use foresight::transform::Quantizer;
use proptest::prelude::*;

proptest! {
    /// Whatever remains after `consume_steps` is always strictly smaller
    /// than one step, so calling it again with no new motion in between
    /// never yields another step.
    #[test]
    fn consuming_twice_in_a_row_is_idempotent(step in 1i32..500, deltas in proptest::collection::vec(-1000i32..1000, 0..200)) {
        let mut q = Quantizer::new(step);
        for &d in &deltas {
            q.process(1, 1, d);
            let _ = q.consume_steps();
        }
        prop_assert_eq!(q.consume_steps(), 0);
    }

    /// A single delta can only ever be reported back in whole steps, sign
    /// preserved, bounded by how many steps actually fit in it. Integer
    /// division already truncates toward zero, so this is the same value
    /// as `sign(delta) * floor(|delta|/step)`.
    #[test]
    fn single_delta_never_yields_more_steps_than_it_contains(step in 1i32..500, delta in -100_000i32..100_000) {
        let mut q = Quantizer::new(step);
        q.process(1, 1, delta);
        let steps = q.consume_steps();
        prop_assert_eq!(steps, delta / step);
    }
}
