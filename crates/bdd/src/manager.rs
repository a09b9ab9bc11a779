use std::cell::RefCell;

use gr1_utilities::Gr1Error;
use oxidd::BooleanFunction;
use oxidd::Manager as _;
use oxidd::ManagerRef;
use oxidd::bdd::BDDFunction;
use oxidd::bdd::BDDManagerRef;
use oxidd_core::function::BooleanFunctionQuant;

use crate::VarCube;
use crate::VarVector;

/// A reference-counted handle to a node in the shared BDD. Cloning bumps the
/// node's reference count; dropping the last handle lets the manager collect
/// it. Two handles compare equal exactly when they reference the same node.
pub type Bdd = BDDFunction;

/// Owns the shared decision diagram. Every [`Bdd`] handle produced by a
/// [`Manager`] is only valid relative to that same manager.
///
/// There is exactly one `Manager` per run of the synthesis pipeline; it is
/// passed by reference to every component that builds or combines formulas,
/// rather than hidden behind a process-wide singleton.
pub struct Manager {
    manager_ref: BDDManagerRef,
    swap_scratch: RefCell<Vec<Bdd>>,
}

impl Manager {
    /// Creates a new manager.
    ///
    /// `inner_node_capacity` and `apply_cache_capacity` bound the resident
    /// set of the underlying node table and operation cache; they are the
    /// memory-cap tunables from the external configuration. `threads`
    /// controls how many worker threads oxidd may use for apply operations;
    /// the synthesis pipeline itself is single-threaded, so `1` is the
    /// sensible default.
    pub fn new(inner_node_capacity: usize, apply_cache_capacity: usize, threads: u32) -> Self {
        Manager {
            manager_ref: oxidd::bdd::new_manager(inner_node_capacity, apply_cache_capacity, threads),
            swap_scratch: RefCell::new(Vec::new()),
        }
    }

    /// The constant `true` BDD.
    pub fn t(&self) -> Bdd {
        self.manager_ref.with_manager_shared(|manager| BDDFunction::t(manager))
    }

    /// The constant `false` BDD.
    pub fn f(&self) -> Bdd {
        self.manager_ref.with_manager_shared(|manager| BDDFunction::f(manager))
    }

    /// Allocates a fresh BDD variable, appended to the current variable
    /// order, and returns the handle representing it.
    pub fn new_var(&self) -> Result<Bdd, Gr1Error> {
        Ok(self.manager_ref.with_manager_exclusive(|manager| BDDFunction::new_var(manager))?)
    }

    /// Number of live nodes in the shared diagram, for diagnostics.
    pub fn num_inner_nodes(&self) -> usize {
        self.manager_ref.with_manager_shared(|manager| manager.num_inner_nodes())
    }

    /// Returns (allocating more if needed) at least `count` variables set
    /// aside for [`BddOps::swap`]'s intermediate relabeling pass. These never
    /// appear in any formula outside of a single `swap` call, so the same
    /// pool is reused by every call rather than growing the diagram on every
    /// fixpoint iteration.
    fn swap_scratch_vars(&self, count: usize) -> Result<Vec<Bdd>, Gr1Error> {
        let mut scratch = self.swap_scratch.borrow_mut();
        while scratch.len() < count {
            let var = self.new_var()?;
            scratch.push(var);
        }
        Ok(scratch[..count].to_vec())
    }
}

/// Algebraic combinators on [`Bdd`] handles. These mirror the operations of
/// §4.1: they cannot fail except through node table exhaustion, which
/// surfaces as [`Gr1Error::ResourceExhausted`].
pub trait BddOps: Sized {
    fn not(&self) -> Result<Bdd, Gr1Error>;
    fn and(&self, other: &Bdd) -> Result<Bdd, Gr1Error>;
    fn or(&self, other: &Bdd) -> Result<Bdd, Gr1Error>;
    fn xor(&self, other: &Bdd) -> Result<Bdd, Gr1Error>;

    /// `self ∧ ¬other`.
    fn minus(&self, other: &Bdd) -> Result<Bdd, Gr1Error>;

    /// `¬self ∨ other`.
    fn implies(&self, other: &Bdd) -> Result<Bdd, Gr1Error>;

    fn exists(&self, cube: &VarCube) -> Result<Bdd, Gr1Error>;
    fn forall(&self, cube: &VarCube) -> Result<Bdd, Gr1Error>;

    /// `exists(cube, self ∧ other)`, computed in two steps. oxidd does not
    /// expose a fused and-exist primitive on the public `BDDFunction` type,
    /// so this is not faster than composing the two operations by hand; it
    /// exists so call sites read the same way the fixpoint formulas do.
    fn and_abstract(&self, other: &Bdd, cube: &VarCube) -> Result<Bdd, Gr1Error>;

    /// Exchanges `from` and `to` a variable at a time: every occurrence of
    /// `from[i]` becomes `to[i]` *and* every occurrence of `to[i]` becomes
    /// `from[i]`, simultaneously. `from` and `to` must have equal length;
    /// pairing is positional.
    ///
    /// This is a genuine permutation — its own inverse when applied again
    /// with the two vectors reversed — so it stays correct even when `self`
    /// already depends on variables from both sides, not only when `self`
    /// is known to mention just one of them.
    fn swap(&self, manager: &Manager, from: &VarVector, to: &VarVector) -> Result<Bdd, Gr1Error>;

    /// Simplifies `self` using `care` as a don't-care set: any BDD that
    /// agrees with `self` wherever `care` holds is an acceptable result.
    fn restrict(&self, care: &Bdd) -> Result<Bdd, Gr1Error>;

    fn is_false(&self) -> bool;
    fn is_true(&self) -> bool;

    /// A structural hash of the node, stable only while the manager does not
    /// reorder variables. Used by the extractors as a state key.
    fn hash_code(&self) -> u64;
}

impl BddOps for Bdd {
    fn not(&self) -> Result<Bdd, Gr1Error> {
        Ok(BooleanFunction::not(self)?)
    }

    fn and(&self, other: &Bdd) -> Result<Bdd, Gr1Error> {
        Ok(BooleanFunction::and(self, other)?)
    }

    fn or(&self, other: &Bdd) -> Result<Bdd, Gr1Error> {
        Ok(BooleanFunction::or(self, other)?)
    }

    fn xor(&self, other: &Bdd) -> Result<Bdd, Gr1Error> {
        Ok(BooleanFunction::xor(self, other)?)
    }

    fn minus(&self, other: &Bdd) -> Result<Bdd, Gr1Error> {
        self.and(&other.not()?)
    }

    fn implies(&self, other: &Bdd) -> Result<Bdd, Gr1Error> {
        self.not()?.or(other)
    }

    fn exists(&self, cube: &VarCube) -> Result<Bdd, Gr1Error> {
        Ok(BooleanFunctionQuant::exist(self, cube.as_bdd())?)
    }

    fn forall(&self, cube: &VarCube) -> Result<Bdd, Gr1Error> {
        Ok(BooleanFunctionQuant::forall(self, cube.as_bdd())?)
    }

    fn and_abstract(&self, other: &Bdd, cube: &VarCube) -> Result<Bdd, Gr1Error> {
        self.and(other)?.exists(cube)
    }

    fn swap(&self, manager: &Manager, from: &VarVector, to: &VarVector) -> Result<Bdd, Gr1Error> {
        assert_eq!(from.len(), to.len(), "swap requires equal-length variable vectors");

        // A direct chain of `from[i] -> to[i]` substitutions is only correct
        // when `self` never mentions `to` to begin with (a one-directional
        // rename, not a swap). To get a real simultaneous exchange, route
        // `from` through a scratch variable set first: `from -> temp`, then
        // `to -> from` (now safe, since every original `from` occurrence has
        // already moved to `temp`), then `temp -> to`. Each of the three
        // passes substitutes into a variable that is provably absent from
        // the formula at that point, so every step is an exact rename.
        let temp = manager.swap_scratch_vars(from.len())?;

        let mut result = self.clone();
        for (from_var, temp_var) in from.iter().zip(temp.iter()) {
            result = substitute_one(&result, from_var, temp_var)?;
        }
        for (to_var, from_var) in to.iter().zip(from.iter()) {
            result = substitute_one(&result, to_var, from_var)?;
        }
        for (temp_var, to_var) in temp.iter().zip(to.iter()) {
            result = substitute_one(&result, temp_var, to_var)?;
        }
        Ok(result)
    }

    fn restrict(&self, care: &Bdd) -> Result<Bdd, Gr1Error> {
        Ok(BooleanFunctionQuant::restrict(self, care)?)
    }

    fn is_false(&self) -> bool {
        !BooleanFunction::satisfiable(self)
    }

    fn is_true(&self) -> bool {
        !BooleanFunction::satisfiable(&self.not().expect("negation cannot fail"))
    }

    fn hash_code(&self) -> u64 {
        use std::hash::Hash;
        use std::hash::Hasher;

        // `BDDFunction` hashes by node identity, which is exactly the
        // "structural identity" notion the extractors key state tables on.
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Replaces every occurrence of the variable `from` in `f` with `to`,
/// implemented as `ite(to, f|_{from=1}, f|_{from=0})`. `from` must be a
/// single-variable BDD.
fn substitute_one(f: &Bdd, from: &Bdd, to: &Bdd) -> Result<Bdd, Gr1Error> {
    let pos = f.restrict(&cofactor_cube(from, true)?)?;
    let neg = f.restrict(&cofactor_cube(from, false)?)?;
    Ok(BooleanFunction::ite(to, &pos, &neg)?)
}

/// Builds the single-literal cube fixing `var` to `value`, used to take an
/// exact Shannon cofactor via `restrict`.
fn cofactor_cube(var: &Bdd, value: bool) -> Result<Bdd, Gr1Error> {
    if value {
        Ok(var.clone())
    } else {
        var.not()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_and_algebra() {
        let manager = Manager::new(1024, 1024, 1);
        let t = manager.t();
        let f = manager.f();

        assert!(t.is_true());
        assert!(f.is_false());
        assert!(t.not().unwrap().is_false());
        assert!(f.not().unwrap().is_true());
    }

    #[test]
    fn test_double_negation() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();

        assert_eq!(a.not().unwrap().not().unwrap(), a);
    }

    #[test]
    fn test_commutativity() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();
        let b = manager.new_var().unwrap();

        assert_eq!(a.and(&b).unwrap(), b.and(&a).unwrap());
        assert_eq!(a.or(&b).unwrap(), b.or(&a).unwrap());
    }

    #[test]
    fn test_excluded_middle() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();

        assert!(a.or(&a.not().unwrap()).unwrap().is_true());
    }

    #[test]
    fn test_swap_is_involutive() {
        let manager = Manager::new(1024, 1024, 1);
        let pre = manager.new_var().unwrap();
        let post = manager.new_var().unwrap();

        let from = VarVector::new(vec![pre.clone()]);
        let to = VarVector::new(vec![post.clone()]);

        let formula = pre.and(&post.not().unwrap()).unwrap();
        let swapped_twice = formula.swap(&manager, &from, &to).unwrap().swap(&manager, &to, &from).unwrap();

        assert_eq!(formula, swapped_twice);
    }

    #[test]
    fn test_swap_exchanges_both_sides_simultaneously() {
        let manager = Manager::new(1024, 1024, 1);
        let pre = manager.new_var().unwrap();
        let post = manager.new_var().unwrap();

        let from = VarVector::new(vec![pre.clone()]);
        let to = VarVector::new(vec![post.clone()]);

        // A formula mentioning both sides: pre is true, post is false.
        let formula = pre.and(&post.not().unwrap()).unwrap();
        let swapped = formula.swap(&manager, &from, &to).unwrap();

        // After the exchange, post should be true and pre should be false.
        let expected = post.and(&pre.not().unwrap()).unwrap();
        assert_eq!(swapped, expected);
    }
}
