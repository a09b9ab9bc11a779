use gr1_utilities::Gr1Error;

use crate::Bdd;
use crate::BddOps;
use crate::Manager;

/// An unordered set of BDD variables, represented as the conjunction of the
/// individual variables. Used as the quantification set passed to
/// [`BddOps::exists`]/[`BddOps::forall`].
///
/// Invariant: the cube's size always equals the number of variables it was
/// built from; conjoining distinct variables can never collapse the cube to
/// something smaller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarCube {
    conjunction: Bdd,
    size: usize,
}

impl VarCube {
    /// Builds a cube from a set of distinct variables.
    pub fn from_variables(manager: &Manager, variables: &[Bdd]) -> Result<Self, Gr1Error> {
        let mut conjunction = manager.t();
        for var in variables {
            conjunction = conjunction.and(var)?;
        }
        Ok(VarCube {
            conjunction,
            size: variables.len(),
        })
    }

    /// The empty cube (no quantified variables); `exists`/`forall` over it
    /// is the identity.
    pub fn empty(manager: &Manager) -> Self {
        VarCube {
            conjunction: manager.t(),
            size: 0,
        }
    }

    pub fn as_bdd(&self) -> &Bdd {
        &self.conjunction
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// An ordered sequence of BDD variables, used as one side of a simultaneous
/// exchange ([`BddOps::swap`]). Two vectors passed to the same swap must
/// have equal length; the pairing is positional.
#[derive(Clone, Debug)]
pub struct VarVector {
    variables: Vec<Bdd>,
}

impl VarVector {
    pub fn new(variables: Vec<Bdd>) -> Self {
        VarVector { variables }
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bdd> {
        self.variables.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_size() {
        let manager = Manager::new(1024, 1024, 1);
        let a = manager.new_var().unwrap();
        let b = manager.new_var().unwrap();

        let cube = VarCube::from_variables(&manager, &[a, b]).unwrap();
        assert_eq!(cube.len(), 2);
    }

    #[test]
    fn test_exists_of_disjunction_distributes() {
        let manager = Manager::new(1024, 1024, 1);
        let x = manager.new_var().unwrap();
        let a = manager.new_var().unwrap();
        let b = manager.new_var().unwrap();
        let cube = VarCube::from_variables(&manager, &[x.clone()]).unwrap();

        let lhs = x.and(&a).unwrap().or(&x.and(&b).unwrap()).unwrap().exists(&cube).unwrap();
        let rhs = x
            .and(&a)
            .unwrap()
            .exists(&cube)
            .unwrap()
            .or(&x.and(&b).unwrap().exists(&cube).unwrap())
            .unwrap();

        assert_eq!(lhs, rhs);
    }
}
