use std::collections::HashMap;
use std::collections::VecDeque;

use gr1_bdd::Bdd;
use gr1_bdd::BddOps;
use gr1_bdd::Manager;
use gr1_bdd::ReorderPolicy;
use gr1_utilities::Gr1Error;
use serde::Serialize;

use crate::context::GameContext;
use crate::determinize::determinize;
use crate::fixpoint::PreferredTransition;
use crate::fixpoint::RealizabilityMode;

/// One numbered state of an extracted explicit strategy: a full valuation of
/// the pre-variables, the liveness-goal rank currently being pursued, and
/// the ids of its Mealy successors.
pub struct ExplicitState {
    pub id: usize,
    pub rank: usize,
    pub valuation: Bdd,
    pub successors: Vec<usize>,
}

pub struct ExplicitStrategy {
    pub states: Vec<ExplicitState>,
}

/// Builds the per-goal positional strategy: for each pre-state, the first
/// (highest-priority) logged transition set under `goal` that reaches it.
/// Later entries in the log never override a pre-state an earlier entry
/// already claimed.
fn positional_from_entries<'a>(
    ctx: &GameContext,
    manager: &Manager,
    entries: impl Iterator<Item = &'a PreferredTransition>,
) -> Result<Bdd, Gr1Error> {
    let mut covered = manager.f();
    let mut strategy = manager.f();

    for entry in entries {
        let pre_states = entry.transitions.exists(&ctx.post_cube)?;
        let new_pre_states = pre_states.minus(&covered)?;
        if new_pre_states.is_false() {
            continue;
        }
        strategy = strategy.or(&entry.transitions.and(&new_pre_states)?)?;
        covered = covered.or(&new_pre_states)?;
    }

    Ok(strategy)
}

pub(crate) fn positional_strategy(ctx: &GameContext, manager: &Manager, log: &[PreferredTransition], goal: usize) -> Result<Bdd, Gr1Error> {
    positional_from_entries(ctx, manager, log.iter().filter(|e| e.goal_index == goal))
}

/// Builds a single positional strategy out of every logged entry regardless
/// of which goal it was recorded under, in log order. Used by the
/// counterstrategy extractor, where the attacked system guarantee is
/// decided once per state by whichever entry first claims its pre-state,
/// rather than selected by a state-carried rank.
pub(crate) fn positional_merge_all(ctx: &GameContext, manager: &Manager, log: &[PreferredTransition]) -> Result<Bdd, Gr1Error> {
    positional_from_entries(ctx, manager, log.iter())
}

/// Scans a liveness list starting at `rank`, wrapping around, for the first
/// entry that holds on `transition` (a fully fixed pre/post minterm). The
/// new rank is the one immediately after it, so satisfying an entry always
/// hands pursuit to the next one in rotation; if none hold, pursuit
/// continues unchanged. Used both for the system extractor's goal rotation
/// and, dually, for the counterstrategy's assumption rotation.
pub(crate) fn advance_rank_over(live: &[Bdd], rank: usize, transition: &Bdd) -> Result<usize, Gr1Error> {
    let count = live.len();
    for offset in 0..count {
        let candidate = (rank + offset) % count;
        if transition.implies(&live[candidate])?.is_true() {
            return Ok((candidate + 1) % count);
        }
    }
    Ok(rank)
}

fn advance_rank(ctx: &GameContext, rank: usize, transition: &Bdd) -> Result<usize, Gr1Error> {
    advance_rank_over(&ctx.liv_g, rank, transition)
}

pub(crate) struct StateTable {
    by_key: HashMap<(u64, usize), usize>,
    states: Vec<ExplicitState>,
}

impl StateTable {
    pub(crate) fn new() -> Self {
        StateTable { by_key: HashMap::new(), states: Vec::new() }
    }

    pub(crate) fn state(&self, id: usize) -> &ExplicitState {
        &self.states[id]
    }

    pub(crate) fn set_successors(&mut self, id: usize, successors: Vec<usize>) {
        self.states[id].successors = successors;
    }

    pub(crate) fn into_states(self) -> Vec<ExplicitState> {
        self.states
    }

    pub(crate) fn get_or_allocate(&mut self, worklist: &mut VecDeque<usize>, valuation: Bdd, rank: usize) -> usize {
        let key = (valuation.hash_code(), rank);
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = self.states.len();
        self.states.push(ExplicitState {
            id,
            rank,
            valuation,
            successors: Vec::new(),
        });
        self.by_key.insert(key, id);
        worklist.push_back(id);
        id
    }
}

/// Extracts the explicit-state system strategy described in the preferred
/// transition log. Only meaningful when the specification is realizable.
pub fn extract_explicit_strategy(
    ctx: &GameContext,
    manager: &Manager,
    reorder: &ReorderPolicy,
    winning: &Bdd,
    log: &[PreferredTransition],
    mode: RealizabilityMode,
) -> Result<ExplicitStrategy, Gr1Error> {
    reorder.disable();

    let goal_count = ctx.liv_g.len();
    let mut positional = Vec::with_capacity(goal_count);
    for goal in 0..goal_count {
        positional.push(positional_strategy(ctx, manager, log, goal)?);
    }

    let seed = match mode {
        RealizabilityMode::Classical => winning.and(&ctx.init_s)?.and(&ctx.init_e)?,
        RealizabilityMode::Robotics => winning.and(&ctx.init_s)?,
    };

    let pre_vars: Vec<Bdd> = ctx.pre_vars.iter().cloned().collect();
    let post_vars: Vec<Bdd> = ctx.post_vars.iter().cloned().collect();

    let mut table = StateTable::new();
    let mut worklist = VecDeque::new();

    let mut remaining_seed = seed;
    while !remaining_seed.is_false() {
        let valuation = determinize(&remaining_seed, &pre_vars, manager)?;
        table.get_or_allocate(&mut worklist, valuation.clone(), 0);
        remaining_seed = remaining_seed.minus(&valuation)?;
    }

    while let Some(id) = worklist.pop_front() {
        let (valuation, rank) = {
            let state = &table.states[id];
            (state.valuation.clone(), state.rank)
        };

        let mut remaining = positional[rank].and(&ctx.safe_e)?.and(&valuation)?;
        let mut successors = Vec::new();

        while !remaining.is_false() {
            let transition = determinize(&remaining, &post_vars, manager)?;
            let new_rank = advance_rank(ctx, rank, &transition)?;

            let dest_valuation = transition.exists(&ctx.pre_cube)?.swap(manager, &ctx.post_vars, &ctx.pre_vars)?;
            let dest_id = table.get_or_allocate(&mut worklist, dest_valuation, new_rank);
            successors.push(dest_id);

            let chosen_post_input = transition.exists(&ctx.pre_cube)?.exists(&ctx.post_output_cube)?;
            remaining = remaining.minus(&chosen_post_input)?;
        }

        table.states[id].successors = successors;
    }

    Ok(ExplicitStrategy { states: table.states })
}

/// Reads off the boolean value of every pre-variable in declaration order
/// from a fully determinized pre-state valuation.
fn decode_valuation(ctx: &GameContext, valuation: &Bdd) -> Result<Vec<bool>, Gr1Error> {
    let mut bits = Vec::with_capacity(ctx.pre_vars.len());
    for var in ctx.pre_vars.iter() {
        bits.push(!valuation.restrict(var)?.is_false());
    }
    Ok(bits)
}

fn pre_variable_names(ctx: &GameContext) -> Vec<String> {
    (0..ctx.vars.len())
        .filter(|&i| matches!(ctx.vars.kind(i), crate::variables::VariableType::PreInput | crate::variables::VariableType::PreOutput))
        .map(|i| ctx.vars.name(i).to_string())
        .collect()
}

/// Renders the strategy in the textual form of §6: one block per state.
pub fn format_text(strategy: &ExplicitStrategy, ctx: &GameContext) -> Result<String, Gr1Error> {
    let names = pre_variable_names(ctx);
    let mut out = String::new();

    for state in &strategy.states {
        let bits = decode_valuation(ctx, &state.valuation)?;
        let assignment: Vec<String> = names
            .iter()
            .zip(bits.iter())
            .map(|(name, value)| format!("{name}:{}", *value as u8))
            .collect();
        out.push_str(&format!("State {} with rank {} -> <{}>\n", state.id, state.rank, assignment.join(", ")));
        let successors: Vec<String> = state.successors.iter().map(|s| s.to_string()).collect();
        out.push_str(&format!("\tWith successors : {}\n", successors.join(", ")));
    }

    Ok(out)
}

#[derive(Serialize)]
struct JsonNode {
    rank: usize,
    state: Vec<u8>,
    trans: Vec<usize>,
}

#[derive(Serialize)]
struct JsonStrategy {
    version: u32,
    slugs: String,
    variables: Vec<String>,
    nodes: HashMap<String, JsonNode>,
}

/// Renders the strategy in the JSON form of §6.
pub fn format_json(strategy: &ExplicitStrategy, ctx: &GameContext) -> Result<serde_json::Value, Gr1Error> {
    let mut nodes = HashMap::new();
    for state in &strategy.states {
        let bits = decode_valuation(ctx, &state.valuation)?;
        nodes.insert(
            state.id.to_string(),
            JsonNode {
                rank: state.rank,
                state: bits.into_iter().map(|b| b as u8).collect(),
                trans: state.successors.clone(),
            },
        );
    }

    let document = JsonStrategy {
        version: 0,
        slugs: "0.0.1".to_string(),
        variables: pre_variable_names(ctx),
        nodes,
    };

    serde_json::to_value(document).map_err(|e| Gr1Error::Invariant(format!("failed to serialize strategy: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixpoint::solve;
    use crate::parser::parse_specification;

    fn extract(text: &str) -> (GameContext, ExplicitStrategy) {
        let manager = Manager::new(1 << 16, 1 << 16, 1);
        let ctx = parse_specification(text.as_bytes(), &manager).unwrap();
        let result = solve(&ctx, &manager, RealizabilityMode::Classical).unwrap();
        assert!(result.realizable);
        let reorder = ReorderPolicy::new();
        let strategy = extract_explicit_strategy(
            &ctx,
            &manager,
            &reorder,
            &result.winning,
            &result.preferred_transitions,
            RealizabilityMode::Classical,
        )
        .unwrap();
        (ctx, strategy)
    }

    #[test]
    fn test_s1_sets_b_unconditionally() {
        let (ctx, strategy) = extract("[INPUT]\na\n[OUTPUT]\nb\n[SYS_LIVENESS]\nb\n");
        assert!(!strategy.states.is_empty());
        for state in &strategy.states {
            let bits = decode_valuation(&ctx, &state.valuation).unwrap();
            let b_index = (0..ctx.vars.len())
                .find(|&i| ctx.vars.name(i) == "b")
                .unwrap();
            let b_pos_among_pre = ctx
                .pre_vars
                .iter()
                .position(|v| v == ctx.vars.handle(b_index))
                .unwrap();
            assert!(bits[b_pos_among_pre]);
        }
    }

    #[test]
    fn test_s4_two_state_toggle() {
        let text = "[OUTPUT]\nx\n[SYS_TRANS]\n| & x ! x' & ! x x'\n[SYS_LIVENESS]\nx\n[SYS_LIVENESS]\n! x\n";
        let (_ctx, strategy) = extract(text);
        assert_eq!(strategy.states.len(), 2);
        for state in &strategy.states {
            assert_eq!(state.successors.len(), 1);
        }
    }

    #[test]
    fn test_s6_rank_rotates_deterministically() {
        let text = "[OUTPUT]\nx\n[SYS_LIVENESS]\nx\n[SYS_LIVENESS]\n! x\n";
        let (_ctx, strategy) = extract(text);

        let by_id: std::collections::HashMap<usize, &ExplicitState> = strategy.states.iter().map(|s| (s.id, s)).collect();
        let initial = strategy.states.iter().find(|s| s.rank == 0).expect("an initial state at rank 0");

        // Every successor of a rank-0 state advances to rank 1, and vice versa:
        // rotation never stalls on the same goal once it has been satisfied.
        let mut seen_ranks = std::collections::HashSet::new();
        let mut frontier = vec![initial.id];
        for _ in 0..4 {
            let mut next = Vec::new();
            for id in frontier {
                let state = by_id[&id];
                seen_ranks.insert(state.rank);
                for dest in &state.successors {
                    assert_ne!(by_id[dest].rank, state.rank, "rotation must hand off to the other goal");
                    next.push(*dest);
                }
            }
            frontier = next;
        }
        assert_eq!(seen_ranks, std::collections::HashSet::from([0, 1]));
    }

    #[test]
    fn test_every_state_covers_every_admissible_input() {
        let text = "[INPUT]\nr\n[OUTPUT]\ng\n[SYS_TRANS]\n! & g r'\n[SYS_LIVENESS]\ng\n[ENV_LIVENESS]\n! r\n";
        let (_ctx, strategy) = extract(text);
        for state in &strategy.states {
            assert!(!state.successors.is_empty());
        }
    }

    #[test]
    fn test_text_and_json_rendering_agree_on_state_count() {
        let (ctx, strategy) = extract("[INPUT]\na\n[OUTPUT]\nb\n[SYS_LIVENESS]\nb\n");
        let text = format_text(&strategy, &ctx).unwrap();
        let json = format_json(&strategy, &ctx).unwrap();

        assert_eq!(text.matches("State ").count(), strategy.states.len());
        assert_eq!(json["nodes"].as_object().unwrap().len(), strategy.states.len());
    }
}
