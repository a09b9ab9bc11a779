use crate::Bdd;

/// A mutable wrapper around a BDD that detects convergence of a fixpoint
/// iteration. Construct with the appropriate seed (`true` for a greatest
/// fixpoint, `false` for a least fixpoint), call [`update`](Self::update)
/// once per iteration, and stop once [`reached`](Self::reached) is true.
///
/// Equality between iterations is the BDD's structural (canonical) equality,
/// so convergence is detected exactly, not by an iteration-count heuristic.
pub struct FixedPoint {
    value: Bdd,
    reached: bool,
}

impl FixedPoint {
    pub fn new(seed: Bdd) -> Self {
        FixedPoint { value: seed, reached: false }
    }

    /// The current approximation.
    pub fn value(&self) -> &Bdd {
        &self.value
    }

    /// Stores `new_value`, marking the fixpoint reached if it equals the
    /// previous value.
    pub fn update(&mut self, new_value: Bdd) {
        self.reached = new_value == self.value;
        self.value = new_value;
    }

    /// True once an `update` call left the value unchanged.
    pub fn is_fixed_point_reached(&self) -> bool {
        self.reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BddOps;
    use crate::Manager;

    #[test]
    fn test_convergence_on_repeated_value() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();

        let mut fp = FixedPoint::new(manager.t());
        assert!(!fp.is_fixed_point_reached());

        fp.update(a.clone());
        assert!(!fp.is_fixed_point_reached());

        fp.update(a.clone());
        assert!(fp.is_fixed_point_reached());
        assert_eq!(*fp.value(), a);
    }

    #[test]
    fn test_monotone_increase_terminates() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();
        let b = manager.new_var().unwrap();

        // A least fixpoint computing a ∨ b step by step.
        let mut fp = FixedPoint::new(manager.f());
        let mut iterations = 0;
        while !fp.is_fixed_point_reached() {
            let next = if iterations == 0 {
                fp.value().or(&a).unwrap()
            } else {
                fp.value().or(&b).unwrap()
            };
            fp.update(next);
            iterations += 1;
            assert!(iterations <= 3, "fixpoint should converge within a few iterations");
        }

        assert_eq!(*fp.value(), a.or(&b).unwrap());
    }
}
