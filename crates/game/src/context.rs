use gr1_bdd::Bdd;
use gr1_bdd::BddOps;
use gr1_bdd::Manager;
use gr1_bdd::VarCube;
use gr1_bdd::VarVector;
use gr1_utilities::Gr1Error;

use crate::variables::VariableClass;
use crate::variables::VariableManager;

/// The five BDDs plus two BDD lists that describe one GR(1) game, plus the
/// variable vectors and cubes the fixpoint engine needs and would otherwise
/// have to recompute on every iteration.
pub struct GameContext {
    pub vars: VariableManager,

    pub init_e: Bdd,
    pub init_s: Bdd,
    pub safe_e: Bdd,
    pub safe_s: Bdd,
    pub liv_e: Vec<Bdd>,
    pub liv_g: Vec<Bdd>,

    /// All pre-variables (inputs then outputs, declaration order).
    pub pre_vars: VarVector,
    /// The corresponding post-variables, same order as `pre_vars`.
    pub post_vars: VarVector,

    pub pre_input_cube: VarCube,
    pub pre_output_cube: VarCube,
    pub post_input_cube: VarCube,
    pub post_output_cube: VarCube,

    /// All pre-variables as a single cube, for projecting a predicate down
    /// to a pure post-state (or quantifying pre-state away entirely).
    pub pre_cube: VarCube,
    /// All post-variables as a single cube, for projecting a pre/post
    /// transition relation down to its pre-state domain.
    pub post_cube: VarCube,
}

impl GameContext {
    /// Number of distinct system liveness guarantees, after the
    /// empty-list-becomes-`[true]` normalization has been applied.
    pub fn goal_count(&self) -> usize {
        self.liv_g.len()
    }
}

/// Accumulates a [`GameContext`] while a specification is being read. Each
/// safety/init section is conjoined in as its lines are parsed; each
/// liveness section appends one list entry per line. Call
/// [`finalize`](Self::finalize) once every variable and formula has been
/// added.
pub struct GameContextBuilder {
    vars: VariableManager,
    init_e: Bdd,
    init_s: Bdd,
    safe_e: Bdd,
    safe_s: Bdd,
    liv_e: Vec<Bdd>,
    liv_g: Vec<Bdd>,
}

impl GameContextBuilder {
    pub fn new(manager: &Manager) -> Self {
        GameContextBuilder {
            vars: VariableManager::new(),
            init_e: manager.t(),
            init_s: manager.t(),
            safe_e: manager.t(),
            safe_s: manager.t(),
            liv_e: Vec::new(),
            liv_g: Vec::new(),
        }
    }

    pub fn vars(&self) -> &VariableManager {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut VariableManager {
        &mut self.vars
    }

    pub fn conjoin_init_e(&mut self, formula: &Bdd) -> Result<(), Gr1Error> {
        self.init_e = self.init_e.and(formula)?;
        Ok(())
    }

    pub fn conjoin_init_s(&mut self, formula: &Bdd) -> Result<(), Gr1Error> {
        self.init_s = self.init_s.and(formula)?;
        Ok(())
    }

    pub fn conjoin_safe_e(&mut self, formula: &Bdd) -> Result<(), Gr1Error> {
        self.safe_e = self.safe_e.and(formula)?;
        Ok(())
    }

    pub fn conjoin_safe_s(&mut self, formula: &Bdd) -> Result<(), Gr1Error> {
        self.safe_s = self.safe_s.and(formula)?;
        Ok(())
    }

    pub fn push_liv_e(&mut self, formula: Bdd) {
        self.liv_e.push(formula);
    }

    pub fn push_liv_g(&mut self, formula: Bdd) {
        self.liv_g.push(formula);
    }

    /// Materializes the variable vectors and cubes and applies the
    /// empty-liveness-list normalization. Consumes the builder.
    pub fn finalize(self, manager: &Manager) -> Result<GameContext, Gr1Error> {
        let pre_vars = self.vars.vector_of_class(VariableClass::Pre);
        let post_vars = self.vars.vector_of_class(VariableClass::Post);

        let pre_input_cube = self.vars.cube_of_class(manager, VariableClass::Exact(crate::variables::VariableType::PreInput))?;
        let pre_output_cube = self.vars.cube_of_class(manager, VariableClass::Exact(crate::variables::VariableType::PreOutput))?;
        let post_input_cube = self.vars.cube_of_class(manager, VariableClass::Exact(crate::variables::VariableType::PostInput))?;
        let post_output_cube = self.vars.cube_of_class(manager, VariableClass::Exact(crate::variables::VariableType::PostOutput))?;
        let pre_cube = self.vars.cube_of_class(manager, VariableClass::Pre)?;
        let post_cube = self.vars.cube_of_class(manager, VariableClass::Post)?;

        let liv_e = if self.liv_e.is_empty() { vec![manager.t()] } else { self.liv_e };
        let liv_g = if self.liv_g.is_empty() { vec![manager.t()] } else { self.liv_g };

        Ok(GameContext {
            vars: self.vars,
            init_e: self.init_e,
            init_s: self.init_s,
            safe_e: self.safe_e,
            safe_s: self.safe_s,
            liv_e,
            liv_g,
            pre_vars,
            post_vars,
            pre_input_cube,
            pre_output_cube,
            post_input_cube,
            post_output_cube,
            pre_cube,
            post_cube,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::VariableType;

    #[test]
    fn test_empty_liveness_lists_default_to_true() {
        let manager = Manager::new(1024, 1024, 1);
        let builder = GameContextBuilder::new(&manager);
        let ctx = builder.finalize(&manager).unwrap();

        assert_eq!(ctx.liv_e.len(), 1);
        assert!(ctx.liv_e[0].is_true());
        assert_eq!(ctx.liv_g.len(), 1);
        assert!(ctx.liv_g[0].is_true());
    }

    #[test]
    fn test_pre_post_vectors_equal_length() {
        let manager = Manager::new(1024, 1024, 1);
        let mut builder = GameContextBuilder::new(&manager);
        builder
            .vars_mut()
            .add_variable_pair(&manager, VariableType::PreInput, VariableType::PostInput, "a")
            .unwrap();
        builder
            .vars_mut()
            .add_variable_pair(&manager, VariableType::PreOutput, VariableType::PostOutput, "b")
            .unwrap();

        let ctx = builder.finalize(&manager).unwrap();
        assert_eq!(ctx.pre_vars.len(), ctx.post_vars.len());
        assert_eq!(ctx.pre_vars.len(), 2);
    }

    #[test]
    fn test_conjoin_accumulates() {
        let manager = Manager::new(1024, 1024, 1);
        let mut builder = GameContextBuilder::new(&manager);
        let a = builder
            .vars_mut()
            .add_variable_pair(&manager, VariableType::PreInput, VariableType::PostInput, "a")
            .unwrap()
            .0;
        let a_handle = builder.vars().handle(a).clone();

        builder.conjoin_safe_e(&a_handle).unwrap();
        builder.conjoin_safe_e(&a_handle.not().unwrap()).unwrap();

        let ctx = builder.finalize(&manager).unwrap();
        assert!(ctx.safe_e.is_false());
    }
}
