use gr1_bdd::Bdd;
use gr1_bdd::Manager;
use gr1_bdd::VarCube;
use gr1_bdd::VarVector;
use gr1_utilities::Gr1Error;

/// The four variable kinds a GR(1) specification distinguishes. Every
/// declared name produces exactly one pre-bit and one primed post-bit of
/// the matching category.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum VariableType {
    PreInput,
    PreOutput,
    PostInput,
    PostOutput,
}

/// A query over the variable type hierarchy. `PreInput`/`PreOutput` both
/// inherit from the abstract `Pre`; `PostInput`/`PostOutput` from `Post`.
/// Modeled as a per-value predicate rather than replaying the source's
/// compile-time ancestor registration, since nothing here needs to be known
/// before the variable is declared.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VariableClass {
    Pre,
    Post,
    Exact(VariableType),
}

impl VariableType {
    /// Does this concrete type inherit from `class`?
    pub fn inherits(self, class: VariableClass) -> bool {
        match class {
            VariableClass::Pre => matches!(self, VariableType::PreInput | VariableType::PreOutput),
            VariableClass::Post => matches!(self, VariableType::PostInput | VariableType::PostOutput),
            VariableClass::Exact(t) => self == t,
        }
    }
}

struct VariableEntry {
    handle: Bdd,
    name: String,
    kind: VariableType,
}

/// Maps declared variable names to BDD bits and types. Bits are appended in
/// declaration order and never removed, so an index into the registry is
/// stable for the lifetime of a [`VariableManager`].
#[derive(Default)]
pub struct VariableManager {
    entries: Vec<VariableEntry>,
}

impl VariableManager {
    pub fn new() -> Self {
        VariableManager { entries: Vec::new() }
    }

    /// Declares a single bit. Fails if the name has already been used
    /// (including as an automatically paired primed name).
    pub fn add_variable(&mut self, manager: &Manager, kind: VariableType, name: &str) -> Result<usize, Gr1Error> {
        if self.find_by_name(name).is_some() {
            return Err(Gr1Error::Semantic {
                line: 0,
                message: format!("variable name '{name}' has already been used"),
            });
        }

        let handle = manager.new_var()?;
        let index = self.entries.len();
        self.entries.push(VariableEntry {
            handle,
            name: name.to_string(),
            kind,
        });
        Ok(index)
    }

    /// Declares a pre/post pair for a surface-level name: `name` gets
    /// `pre_kind`, `name'` gets `post_kind`. This is how `[INPUT]`/`[OUTPUT]`
    /// declarations are registered.
    pub fn add_variable_pair(
        &mut self,
        manager: &Manager,
        pre_kind: VariableType,
        post_kind: VariableType,
        name: &str,
    ) -> Result<(usize, usize), Gr1Error> {
        let pre = self.add_variable(manager, pre_kind, name)?;
        let post = self.add_variable(manager, post_kind, &format!("{name}'"))?;
        Ok((pre, post))
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn name(&self, index: usize) -> &str {
        &self.entries[index].name
    }

    pub fn handle(&self, index: usize) -> &Bdd {
        &self.entries[index].handle
    }

    pub fn kind(&self, index: usize) -> VariableType {
        self.entries[index].kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices of every declared bit that inherits `class`, in declaration
    /// order. Filtering by complementary predicates over the same
    /// declaration sequence keeps pre/post vectors positionally
    /// corresponding, which is what lets `swap` rename bit-for-bit.
    pub fn indices_of_class(&self, class: VariableClass) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind.inherits(class))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn handles_of_class(&self, class: VariableClass) -> Vec<Bdd> {
        self.indices_of_class(class).into_iter().map(|i| self.handle(i).clone()).collect()
    }

    pub fn cube_of_class(&self, manager: &Manager, class: VariableClass) -> Result<VarCube, Gr1Error> {
        VarCube::from_variables(manager, &self.handles_of_class(class))
    }

    pub fn vector_of_class(&self, class: VariableClass) -> VarVector {
        VarVector::new(self.handles_of_class(class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicate_names() {
        let manager = Manager::new(1024, 1024, 1);
        let mut vars = VariableManager::new();

        vars.add_variable(&manager, VariableType::PreInput, "a").unwrap();
        let err = vars.add_variable(&manager, VariableType::PreInput, "a");
        assert!(err.is_err());
    }

    #[test]
    fn test_pair_creates_primed_post() {
        let manager = Manager::new(1024, 1024, 1);
        let mut vars = VariableManager::new();

        let (pre, post) = vars
            .add_variable_pair(&manager, VariableType::PreInput, VariableType::PostInput, "a")
            .unwrap();

        assert_eq!(vars.name(pre), "a");
        assert_eq!(vars.name(post), "a'");
        assert_eq!(vars.kind(pre), VariableType::PreInput);
        assert_eq!(vars.kind(post), VariableType::PostInput);
    }

    #[test]
    fn test_pre_post_vectors_correspond_positionally() {
        let manager = Manager::new(1024, 1024, 1);
        let mut vars = VariableManager::new();

        vars.add_variable_pair(&manager, VariableType::PreInput, VariableType::PostInput, "in1")
            .unwrap();
        vars.add_variable_pair(&manager, VariableType::PreOutput, VariableType::PostOutput, "out1")
            .unwrap();

        let pre = vars.indices_of_class(VariableClass::Pre);
        let post = vars.indices_of_class(VariableClass::Post);

        assert_eq!(pre.len(), post.len());
        for (p, q) in pre.iter().zip(post.iter()) {
            let base_name = vars.name(*p);
            assert_eq!(vars.name(*q), format!("{base_name}'"));
        }
    }
}
