use gr1_bdd::Bdd;
use gr1_bdd::BddOps;
use gr1_bdd::FixedPoint;
use gr1_bdd::Manager;
use gr1_io::TimeProgress;
use gr1_utilities::Gr1Error;
use log::debug;

use crate::context::GameContext;

/// Which quantifier pattern decides realizability from the winning-position
/// predicate. The two disagree on specifications where the environment can
/// start outside `initE ∧ initS`; see the module-level note in `DESIGN.md`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RealizabilityMode {
    /// `∀preInput. (initE ⇒ ∃preOutput. (winning ∧ initS))`
    Classical,
    /// `∀preInput. ∀preOutput. ((initE ∧ initS) ⇒ winning)`
    Robotics,
}

/// One entry of the preferred-transition log: the system-liveness goal this
/// transition set was computed under, and the transition relation itself
/// (already conjoined with `safeS`).
#[derive(Clone)]
pub struct PreferredTransition {
    pub goal_index: usize,
    pub transitions: Bdd,
}

pub struct SynthesisResult {
    pub winning: Bdd,
    pub preferred_transitions: Vec<PreferredTransition>,
    pub realizable: bool,
}

/// `cox(T) = ∀postInput. (safeE ⇒ ∃postOutput. T)`: the states from which the
/// system can force play into `T` against any environment input.
fn cox(ctx: &GameContext, t: &Bdd) -> Result<Bdd, Gr1Error> {
    let exists_post_output = t.exists(&ctx.post_output_cube)?;
    let implication = ctx.safe_e.implies(&exists_post_output)?;
    implication.forall(&ctx.post_input_cube)
}

fn swap_pre_to_post(ctx: &GameContext, manager: &Manager, f: &Bdd) -> Result<Bdd, Gr1Error> {
    f.swap(manager, &ctx.pre_vars, &ctx.post_vars)
}

/// `(livG[j] ∧ swap(Z)) ∨ swap(Y) ∨ (¬livE[i] ∧ swap(X))`.
fn transition_set(
    ctx: &GameContext,
    manager: &Manager,
    live_g: &Bdd,
    z: &Bdd,
    y: &Bdd,
    live_e: &Bdd,
    x: &Bdd,
) -> Result<Bdd, Gr1Error> {
    let z_term = live_g.and(&swap_pre_to_post(ctx, manager, z)?)?;
    let y_term = swap_pre_to_post(ctx, manager, y)?;
    let x_term = live_e.not()?.and(&swap_pre_to_post(ctx, manager, x)?)?;
    z_term.or(&y_term)?.or(&x_term)
}

/// Computes the winning-position BDD and the preferred-transition log via
/// the nested `νZ. ⋀_j μY. ⋁_i νX` fixpoint. Goal and assumption indices are
/// visited in declaration order on every iteration, so the result does not
/// depend on the iteration count, only on the (stable) index order.
pub fn compute_winning_positions(ctx: &GameContext, manager: &Manager) -> Result<(Bdd, Vec<PreferredTransition>), Gr1Error> {
    let mut z = FixedPoint::new(manager.t());
    let mut log: Vec<PreferredTransition> = Vec::new();
    let mut progress = TimeProgress::new(|iteration| debug!("winning-position fixpoint: outer iteration {iteration}"), 5);
    let mut iteration = 0usize;

    loop {
        progress.print(iteration);
        iteration += 1;
        log.clear();
        let mut new_z = manager.t();

        for (j, live_g) in ctx.liv_g.iter().enumerate() {
            let mut y = FixedPoint::new(manager.f());

            loop {
                let mut new_y = manager.f();

                for (i, live_e) in ctx.liv_e.iter().enumerate() {
                    let mut x = FixedPoint::new(manager.t());
                    loop {
                        let body = ctx.safe_s.and(&transition_set(ctx, manager, live_g, z.value(), y.value(), live_e, x.value())?)?;
                        let next_x = cox(ctx, &body)?;
                        x.update(next_x);
                        if x.is_fixed_point_reached() {
                            break;
                        }
                    }

                    let logged = ctx.safe_s.and(&transition_set(ctx, manager, live_g, z.value(), y.value(), live_e, x.value())?)?;
                    log.push(PreferredTransition { goal_index: j, transitions: logged });

                    new_y = new_y.or(x.value())?;
                }

                y.update(new_y);
                if y.is_fixed_point_reached() {
                    break;
                }
            }

            new_z = new_z.and(y.value())?;
        }

        z.update(new_z);
        if z.is_fixed_point_reached() {
            break;
        }
    }

    Ok((z.value().clone(), log))
}

/// `cox_env(T) = ∀postOutput. (safeS ⇒ ∃postInput. T) ∧ safeE`: the states
/// from which the environment can force play into `T` against any system
/// response, while itself staying inside its own safety assumption.
fn cox_env(ctx: &GameContext, t: &Bdd) -> Result<Bdd, Gr1Error> {
    let exists_post_input = t.exists(&ctx.post_input_cube)?;
    let implication = ctx.safe_s.implies(&exists_post_input)?;
    let universal = implication.forall(&ctx.post_output_cube)?;
    universal.and(&ctx.safe_e)
}

/// `(¬livG[j] ∨ swap(Z)) ∧ swap(Y) ∧ (swap(X) ∨ livE[i])`.
fn transition_set_env(
    ctx: &GameContext,
    manager: &Manager,
    live_g: &Bdd,
    z: &Bdd,
    y: &Bdd,
    live_e: &Bdd,
    x: &Bdd,
) -> Result<Bdd, Gr1Error> {
    let z_term = live_g.not()?.or(&swap_pre_to_post(ctx, manager, z)?)?;
    let y_term = swap_pre_to_post(ctx, manager, y)?;
    let x_term = swap_pre_to_post(ctx, manager, x)?.or(live_e)?;
    z_term.and(&y_term)?.and(&x_term)
}

/// Computes the losing-position BDD (states from which the environment can
/// force a guarantee violation) and the preferred-transition log the
/// counterstrategy extractor partitions per attacked goal. This is the
/// dual of [`compute_winning_positions`]: `μZ. ⋁_j νY. ⋀_i μX`, with the
/// safety relation baked into the log the same way `safeS` is baked into
/// the primal log, but with `safeE` in its place since here it is the
/// environment's own move being recorded.
pub fn compute_losing_positions(ctx: &GameContext, manager: &Manager) -> Result<(Bdd, Vec<PreferredTransition>), Gr1Error> {
    let mut z = FixedPoint::new(manager.f());
    let mut log: Vec<PreferredTransition> = Vec::new();
    let mut progress = TimeProgress::new(|iteration| debug!("losing-position fixpoint: outer iteration {iteration}"), 5);
    let mut iteration = 0usize;

    loop {
        progress.print(iteration);
        iteration += 1;
        log.clear();
        let mut new_z = manager.f();

        for (j, live_g) in ctx.liv_g.iter().enumerate() {
            let mut y = FixedPoint::new(manager.t());

            loop {
                let mut new_y = manager.t();

                for (i, live_e) in ctx.liv_e.iter().enumerate() {
                    let mut x = FixedPoint::new(manager.f());
                    loop {
                        let body = transition_set_env(ctx, manager, live_g, z.value(), y.value(), live_e, x.value())?;
                        let next_x = cox_env(ctx, &body)?;
                        x.update(next_x);
                        if x.is_fixed_point_reached() {
                            break;
                        }
                    }

                    let logged = ctx.safe_e.and(&transition_set_env(ctx, manager, live_g, z.value(), y.value(), live_e, x.value())?)?;
                    log.push(PreferredTransition { goal_index: j, transitions: logged });

                    new_y = new_y.and(x.value())?;
                }

                y.update(new_y);
                if y.is_fixed_point_reached() {
                    break;
                }
            }

            new_z = new_z.or(y.value())?;
        }

        z.update(new_z);
        if z.is_fixed_point_reached() {
            break;
        }
    }

    Ok((z.value().clone(), log))
}

/// Evaluates the realizability predicate and asserts it collapses to a
/// constant, per the fatal-invariant contract in the error design.
fn realizability(ctx: &GameContext, winning: &Bdd, mode: RealizabilityMode) -> Result<bool, Gr1Error> {
    let r = match mode {
        RealizabilityMode::Classical => {
            let exists_pre_output = winning.and(&ctx.init_s)?.exists(&ctx.pre_output_cube)?;
            ctx.init_e.implies(&exists_pre_output)?.forall(&ctx.pre_input_cube)?
        }
        RealizabilityMode::Robotics => {
            let body = ctx.init_e.and(&ctx.init_s)?.implies(winning)?;
            body.forall(&ctx.pre_input_cube)?.forall(&ctx.pre_output_cube)?
        }
    };

    if r.is_true() {
        Ok(true)
    } else if r.is_false() {
        Ok(false)
    } else {
        Err(Gr1Error::Invariant(
            "realizability predicate did not collapse to a constant".to_string(),
        ))
    }
}

/// Runs the full engine: winning positions, the preferred-transition log,
/// and the realizability verdict.
pub fn solve(ctx: &GameContext, manager: &Manager, mode: RealizabilityMode) -> Result<SynthesisResult, Gr1Error> {
    let (winning, preferred_transitions) = compute_winning_positions(ctx, manager)?;
    let realizable = realizability(ctx, &winning, mode)?;
    Ok(SynthesisResult {
        winning,
        preferred_transitions,
        realizable,
    })
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::parser::parse_specification;

    fn solve_text(text: &str, mode: RealizabilityMode) -> SynthesisResult {
        let manager = Manager::new(1 << 16, 1 << 16, 1);
        let ctx = parse_specification(text.as_bytes(), &manager).unwrap();
        solve(&ctx, &manager, mode).unwrap()
    }

    #[test]
    fn test_s1_unconditional_guarantee_is_realizable() {
        let result = solve_text("[INPUT]\na\n[OUTPUT]\nb\n[SYS_LIVENESS]\nb\n", RealizabilityMode::Classical);
        assert!(result.realizable);
    }

    #[test]
    fn test_s2_contradictory_guarantee_is_unrealizable() {
        let result = solve_text("[INPUT]\na\n[OUTPUT]\nb\n[SYS_LIVENESS]\n& b ! b\n", RealizabilityMode::Classical);
        assert!(!result.realizable);
    }

    #[test]
    fn test_s3_reactive_guard_is_realizable() {
        let text = "[INPUT]\nr\n[OUTPUT]\ng\n[SYS_TRANS]\n! & g r'\n[SYS_LIVENESS]\ng\n[ENV_LIVENESS]\n! r\n";
        let result = solve_text(text, RealizabilityMode::Classical);
        assert!(result.realizable);
    }

    #[test]
    fn test_s4_toggle_is_realizable() {
        let text = "[OUTPUT]\nx\n[SYS_TRANS]\n^ x x'\n[SYS_LIVENESS]\nx\n[SYS_LIVENESS]\n! x\n";
        // The input file grammar only has `|`, `&`, `!`, `0`, `1` as primitive
        // connectives; `^` is not part of it, so this is written out in full.
        let text = text.replace("^ x x'", "| & x ! x' & ! x x'");
        let result = solve_text(&text, RealizabilityMode::Classical);
        assert!(result.realizable);
    }

    #[test]
    fn test_s5_deadlock_is_unrealizable() {
        let text = "[INPUT]\na\n[OUTPUT]\nb\n[SYS_TRANS]\n& b ! b\n";
        let result = solve_text(text, RealizabilityMode::Classical);
        assert!(!result.realizable);
    }

    #[test]
    fn test_verdict_is_independent_of_liveness_declaration_order() {
        let forward = "[OUTPUT]\nx\n[SYS_LIVENESS]\nx\n[SYS_LIVENESS]\n! x\n";
        let reversed = "[OUTPUT]\nx\n[SYS_LIVENESS]\n! x\n[SYS_LIVENESS]\nx\n";

        let a = solve_text(forward, RealizabilityMode::Classical);
        let b = solve_text(reversed, RealizabilityMode::Classical);
        assert_eq!(a.realizable, b.realizable);
    }
}
