use gr1_bdd::Bdd;
use gr1_bdd::BddOps;
use gr1_bdd::Manager;
use gr1_utilities::Gr1Error;
use rand::Rng;

/// Picks one concrete valuation of `vs` consistent with `s`, returning a BDD
/// that assigns every bit in `vs` a fixed value while staying `<= s`. Bits
/// outside `vs` are left exactly as constrained by `s`.
///
/// Ties are broken in favor of `true`, matching the preference order the
/// explicit strategy extractor relies on for determinism.
pub fn determinize(s: &Bdd, vs: &[Bdd], manager: &Manager) -> Result<Bdd, Gr1Error> {
    determinize_with(s, vs, manager, |pos_nonfalse, _neg_nonfalse| pos_nonfalse)
}

/// As [`determinize`], but when both the `true` and `false` cofactor of a
/// bit are live, the tie is broken by a coin flip from `rng` instead of
/// always favoring `true`. Used to produce varied-but-reproducible example
/// runs for the same winning region.
pub fn determinize_randomized<R: Rng + ?Sized>(s: &Bdd, vs: &[Bdd], manager: &Manager, rng: &mut R) -> Result<Bdd, Gr1Error> {
    determinize_with(s, vs, manager, |_pos_nonfalse, _neg_nonfalse| rng.gen_bool(0.5))
}

fn determinize_with(s: &Bdd, vs: &[Bdd], manager: &Manager, mut choose_true_on_tie: impl FnMut(bool, bool) -> bool) -> Result<Bdd, Gr1Error> {
    let mut current = s.clone();
    let mut cube = manager.t();

    for var in vs {
        let pos = current.restrict(var)?;
        let neg = current.restrict(&var.not()?)?;

        let take_true = match (pos.is_false(), neg.is_false()) {
            (true, true) => {
                return Err(Gr1Error::Invariant(
                    "determinize: both cofactors are false, the input predicate was already unsatisfiable".to_string(),
                ));
            }
            (true, false) => false,
            (false, true) => true,
            (false, false) => choose_true_on_tie(true, true),
        };

        if take_true {
            cube = cube.and(var)?;
            current = pos;
        } else {
            cube = cube.and(&var.not()?)?;
            current = neg;
        }
    }

    cube.and(&current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinize_prefers_true_on_unconstrained_bit() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();

        let valuation = determinize(&manager.t(), &[a.clone()], &manager).unwrap();
        assert_eq!(valuation, a);
    }

    #[test]
    fn test_determinize_respects_forced_value() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();
        let not_a = a.not().unwrap();

        let valuation = determinize(&not_a, &[a.clone()], &manager).unwrap();
        assert_eq!(valuation, not_a);
    }

    #[test]
    fn test_determinize_result_implies_source() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();
        let b = manager.new_var().unwrap();
        let s = a.or(&b).unwrap();

        let valuation = determinize(&s, &[a.clone(), b.clone()], &manager).unwrap();
        assert!(valuation.implies(&s).unwrap().is_true());
    }

    #[test]
    fn test_determinize_fixes_every_requested_bit() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();
        let b = manager.new_var().unwrap();
        let s = manager.t();

        let valuation = determinize(&s, &[a.clone(), b.clone()], &manager).unwrap();
        // A fully fixed valuation over two bits is one of four minterms: its
        // cofactor on either literal is either the valuation itself or false.
        let pos = valuation.restrict(&a).unwrap();
        assert!(pos == valuation || pos.is_false());
    }
}
