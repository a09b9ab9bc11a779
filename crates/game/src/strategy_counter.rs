use std::collections::VecDeque;

use gr1_bdd::Bdd;
use gr1_bdd::BddOps;
use gr1_bdd::Manager;
use gr1_bdd::ReorderPolicy;
use gr1_utilities::Gr1Error;

use crate::context::GameContext;
use crate::determinize::determinize;
use crate::fixpoint::PreferredTransition;
use crate::strategy_explicit::ExplicitStrategy;
use crate::strategy_explicit::StateTable;
use crate::strategy_explicit::advance_rank_over;
use crate::strategy_explicit::positional_merge_all;

/// Extracts a finite counterstrategy when the specification is unrealizable:
/// a strategy for the environment that drives every play to falsify some
/// system guarantee while honoring every environment assumption.
///
/// The attacked guarantee is decided once per state by whichever logged
/// transition set first claims its pre-state (the outer disjunction over
/// guarantees in the losing fixpoint needs only one witness, never all of
/// them, so there is nothing to rotate there). The state's rank instead
/// rotates over the environment assumptions, exactly dual to how the system
/// extractor rotates over guarantees: the assumption list was combined by
/// conjunction in the losing fixpoint, so honoring all of them on an
/// infinite run requires visiting each one's witness in turn.
///
/// A state whose successor search comes up empty is a deadlock: the system
/// has no safety-compliant response left at all. This falls out of the
/// ordinary search (`remaining` is false from the start) rather than
/// needing a special case, and is emitted as a terminal, zero-successor
/// node.
pub fn extract_counterstrategy(
    ctx: &GameContext,
    manager: &Manager,
    reorder: &ReorderPolicy,
    losing: &Bdd,
    log: &[PreferredTransition],
) -> Result<ExplicitStrategy, Gr1Error> {
    reorder.disable();

    let positional = positional_merge_all(ctx, manager, log)?;
    let seed = losing.and(&ctx.init_e)?;

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
            let state = table.state(id);
            (state.valuation.clone(), state.rank)
        };

        let mut remaining = positional.and(&ctx.safe_s)?.and(&valuation)?;
        let mut successors = Vec::new();

        while !remaining.is_false() {
            let transition = determinize(&remaining, &post_vars, manager)?;
            let new_rank = advance_rank_over(&ctx.liv_e, rank, &transition)?;

            let dest_valuation = transition.exists(&ctx.pre_cube)?.swap(manager, &ctx.post_vars, &ctx.pre_vars)?;
            let dest_id = table.get_or_allocate(&mut worklist, dest_valuation, new_rank);
            successors.push(dest_id);

            // Mask by the chosen post-output (the system's move), the dual
            // of masking by post-input in the explicit extractor: a
            // different system response gets its own edge, but the
            // environment's reply to a fixed response is deterministic.
            let chosen_post_output = transition.exists(&ctx.pre_cube)?.exists(&ctx.post_input_cube)?;
            remaining = remaining.minus(&chosen_post_output)?;
        }

        table.set_successors(id, successors);
    }

    Ok(ExplicitStrategy { states: table.into_states() })
}
