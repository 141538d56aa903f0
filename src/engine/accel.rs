//! Accelerated bounded model checking.
//!
//! Both engines reason in exponentially growing step jumps: level `n`
//! reasons about `2^n` transition steps at once, through a hierarchy of
//! *step relations* composed from the level below. A per-level incremental
//! solver holds two chained copies of its relation and answers
//! reachability queries `from(x₀) ∧ T(x₀,x₁) ∧ T(x₁,x₂) ∧ to(x₂)`;
//! satisfiable queries are split at a midpoint extracted from the model
//! and recursed into the level below, and query results are cached per
//! level, refined target included.
//!
//! [`AcceleratedBmcSingle`] keeps one hierarchy of *at-most*-`2^n`-step
//! relations. [`AcceleratedBmc`] splits it into *exactly*-`2^n` and
//! *fewer-than*-`2^n` hierarchies. Either way, when the query is
//! unreachable at a level whose next relation adds no new pair (the fixed
//! point), the system is safe and an inductive invariant is recovered from
//! the interpolants the level accumulated.
//!
//! The interpolants are instantiated by exact projection through trivial
//! quantifier elimination; a system whose transition relation defeats the
//! projection yields `Unknown` rather than an unsound answer.
//!
//! [`AcceleratedBmcSingle`]: struct.AcceleratedBmcSingle.html
//! (the at-most variant)
//! [`AcceleratedBmc`]: struct.AcceleratedBmc.html
//! (the exact/fewer-than variant)

use crate::common::smt::SmtCtx;
use crate::common::*;
use crate::engine::bmc::{absorb_unknown, safe_empty_init};
use crate::engine::{
    Engine, InvalidityWitness, ValidityWitness, VerificationAnswer, VerificationResult,
};
use crate::graph::{ChcDirectedGraph, ChcDirectedHyperGraph};
use crate::term::{qe, version};
use crate::ts::{self, TransitionSystem};

/// Outcome of a reachability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachabilityResult {
    /// The target is reachable.
    Reachable,
    /// The target is not reachable within the level's step count.
    Unreachable,
}

/// A cached reachability answer.
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// The outcome.
    pub result: ReachabilityResult,
    /// On reachable queries, the part of the target actually reached.
    pub refined_target: Option<Term>,
    /// On reachable queries, the concrete path length.
    pub steps: usize,
}

impl QueryResult {
    /// The unreachable answer.
    fn unreachable() -> Self {
        QueryResult {
            result: ReachabilityResult::Unreachable,
            refined_target: None,
            steps: 0,
        }
    }
    /// A reachable answer.
    fn reachable(refined_target: Term, steps: usize) -> Self {
        QueryResult {
            result: ReachabilityResult::Reachable,
            refined_target: Some(refined_target),
            steps,
        }
    }
    /// True if the outcome is reachable.
    fn is_reachable(&self) -> bool {
        self.result == ReachabilityResult::Reachable
    }
}

/// Lifecycle of a level's solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelState {
    /// Relation asserted.
    Initialized,
    /// Answered at least one query.
    Queried,
    /// Relation strengthened since.
    Refined,
    /// Retired by a fixed point.
    Closed,
}

/// The capability set of a per-level solver.
pub trait SolverWrapper {
    /// Consistency of a query with the level's chained step relation.
    fn check_consistent(&mut self, query: &Term) -> Res<ReachabilityResult>;
    /// Conjoins a strengthening onto both copies of the relation.
    fn strengthen_transition(&mut self, extra: &Term) -> Res<()>;
    /// Model of the last reachable query.
    fn last_query_model(&mut self) -> Res<Vec<(Var, Val)>>;
    /// Interpolant of the chained relation over the outer versions, or
    /// `None` when the projection is defeated.
    fn last_query_transition_interpolant(&mut self) -> Res<Option<Term>>;
}

/// One SMT context preloaded with two chained copies of a step relation:
/// `first(x₀,x₁) ∧ second(x₁,x₂)`.
struct StepSolver {
    /// The context.
    ctx: SmtCtx,
    /// Accumulated first-copy relation, over versions 0 and 1.
    first: Term,
    /// Accumulated second-copy relation, over versions 0 and 1 before the
    /// shift.
    second: Term,
    /// Cached projection onto the outer versions.
    projection: Option<Option<Term>>,
    /// True while the last query's scope is still open, for models.
    scope_open: bool,
    /// Lifecycle state.
    state: LevelState,
}

impl StepSolver {
    /// Spawns the solver and asserts the chained relation.
    fn new(name: &str, first: Term, second: Term) -> Res<Self> {
        let mut ctx = SmtCtx::new(name)?;
        ctx.assert(&first)?;
        ctx.assert(&version::shift(&second, 1))?;
        Ok(StepSolver {
            ctx,
            first,
            second,
            projection: None,
            scope_open: false,
            state: LevelState::Initialized,
        })
    }

    /// Closes the pending query scope, if any.
    fn settle(&mut self) -> Res<()> {
        if self.scope_open {
            self.ctx.pop()?;
            self.scope_open = false
        }
        Ok(())
    }

    /// Marks the level retired.
    fn close(&mut self) {
        self.state = LevelState::Closed
    }
}

impl SolverWrapper for StepSolver {
    fn check_consistent(&mut self, query: &Term) -> Res<ReachabilityResult> {
        debug_assert! { self.state != LevelState::Closed }
        self.settle()?;
        self.ctx.push()?;
        self.ctx.assert(query)?;
        match self.ctx.check_sat() {
            Ok(true) => {
                self.scope_open = true;
                self.state = LevelState::Queried;
                Ok(ReachabilityResult::Reachable)
            }
            Ok(false) => {
                self.ctx.pop()?;
                self.state = LevelState::Queried;
                Ok(ReachabilityResult::Unreachable)
            }
            Err(e) => {
                let _ = self.ctx.pop();
                Err(e)
            }
        }
    }

    fn strengthen_transition(&mut self, extra: &Term) -> Res<()> {
        self.settle()?;
        self.ctx.assert(extra)?;
        self.ctx.assert(&version::shift(extra, 1))?;
        self.first = term::and(vec![self.first.clone(), extra.clone()]);
        self.second = term::and(vec![self.second.clone(), extra.clone()]);
        self.projection = None;
        self.state = LevelState::Refined;
        Ok(())
    }

    fn last_query_model(&mut self) -> Res<Vec<(Var, Val)>> {
        debug_assert! { self.scope_open }
        self.ctx.model()
    }

    fn last_query_transition_interpolant(&mut self) -> Res<Option<Term>> {
        if let Some(ref projection) = self.projection {
            return Ok(projection.clone());
        }
        let combined = term::and(vec![self.first.clone(), version::shift(&self.second, 1)]);
        let mids: VarSet = term::vars(&combined)
            .into_iter()
            .filter(|v| v.version() == Some(1))
            .collect();
        let projected = qe::try_eliminate_vars(&mids, &combined);
        let projection = if qe::residual_vars(&projected, &mids).is_empty() {
            Some(projected)
        } else {
            None
        };
        self.projection = Some(projection.clone());
        Ok(projection)
    }
}

/// Bound on spurious-midpoint refinement rounds within one query.
const REFINEMENT_BOUND: usize = 32;

/// The versioned transition system an engine works on.
struct SystemData {
    /// State variables, version 0.
    state_vars: Vec<Term>,
    /// Initial states.
    init: Term,
    /// One-step transition relation.
    transition: Term,
    /// Bad states.
    query: Term,
}

impl SystemData {
    /// Captures a transition system.
    fn of(system: &TransitionSystem) -> Self {
        debug_assert! { version::is_pure_state_formula(system.init()) }
        debug_assert! { version::is_pure_state_formula(system.query()) }
        debug_assert! { version::is_pure_transition_formula(system.transition()) }
        SystemData {
            state_vars: system.state_vars().to_vec(),
            init: system.init().clone(),
            transition: system.transition().clone(),
            query: system.query().clone(),
        }
    }

    /// The stutter relation `x₁ = x₀`.
    fn identity_relation(&self) -> Term {
        let conj = self
            .state_vars
            .iter()
            .map(|v| term::eq(version::shift(v, 1), v.clone()))
            .collect();
        term::and(conj)
    }
}

/// Shifts only the version-1 variables to version 2.
fn shift_only_next_vars(term: &Term) -> Term {
    term.map_vars(|v| if v.version() == Some(1) { v.shift(1) } else { v })
}

/// Shifts only the version-2 variables back to version 1, turning a
/// projected two-copy composition into a step relation again.
fn clean_interpolant(term: &Term) -> Term {
    term.map_vars(|v| if v.version() == Some(2) { v.shift(-1) } else { v })
}

/// The state formula a model assigns at some version, moved to version 0.
fn point_formula_at(model: &[(Var, Val)], version_wanted: i32) -> Term {
    let mut conj = vec![];
    for (var, val) in model {
        if var.version() == Some(version_wanted) {
            conj.push(term::eq(
                term::var(var.shift(-version_wanted)),
                val.to_term(),
            ))
        }
    }
    term::and(conj)
}

/// The midpoint of a satisfied chained query
/// `start(x₀) ∧ T(x₀,x₁) ∧ T(x₁,x₂) ∧ goal(x₂)`: the concrete version-1
/// state of the model, as a version-0 formula.
fn extract_mid_point(model: &[(Var, Val)]) -> Term {
    point_formula_at(model, 1)
}

/// The refined target of a satisfied query
/// `start(x₀) ∧ T(x₀,x₁) ∧ goal(x₁)`: the concrete state reached from
/// `start` by one application of `T`, as a version-0 formula.
fn refine_two_step_target(model: &[(Var, Val)]) -> Term {
    point_formula_at(model, 1)
}

/// Zero-step reachability: `from ∧ to`.
fn reach_zero_step(scratch: &mut SmtCtx, from: &Term, to: &Term) -> Res<QueryResult> {
    scratch.push()?;
    scratch.assert(from)?;
    scratch.assert(to)?;
    let res = match scratch.check_sat() {
        Ok(true) => {
            let model = scratch.model()?;
            Ok(QueryResult::reachable(point_formula_at(&model, 0), 0))
        }
        Ok(false) => Ok(QueryResult::unreachable()),
        Err(e) => Err(e),
    };
    scratch.pop()?;
    res
}

/// One-step reachability: `from(x₀) ∧ transition(x₀,x₁) ∧ to(x₁)`.
///
/// On success the refined target is the concrete state reached, extracted
/// from the model.
fn reach_one_step(
    scratch: &mut SmtCtx,
    from: &Term,
    transition: &Term,
    to: &Term,
) -> Res<QueryResult> {
    scratch.push()?;
    scratch.assert(from)?;
    scratch.assert(transition)?;
    scratch.assert(&version::shift(to, 1))?;
    let res = match scratch.check_sat() {
        Ok(true) => {
            let model = scratch.model()?;
            Ok(QueryResult::reachable(refine_two_step_target(&model), 1))
        }
        Ok(false) => Ok(QueryResult::unreachable()),
        Err(e) => Err(e),
    };
    scratch.pop()?;
    res
}

/// True if `finer ⇒ coarser`, by an unsatisfiability check.
fn implied_by(finer: &Term, coarser: &Term) -> Res<bool> {
    let mut solver = SmtCtx::new("accel-fixed-point")?;
    solver.assert(finer)?;
    solver.assert(&term::not(coarser.clone()))?;
    let sat = solver.check_sat()?;
    solver.kill()?;
    Ok(!sat)
}

/// Recovers the inductive invariant at a fixed point: the projection of
/// `init(x₀) ∧ relation(x₀,x₁)` onto `x₁`, rebased to version 0.
///
/// `None` when the projection is defeated; the engine then answers safe
/// without a witness.
fn recover_invariant(init: &Term, relation: &Term) -> Option<Term> {
    let combined = term::and(vec![init.clone(), relation.clone()]);
    let currents: VarSet = term::vars(&combined)
        .into_iter()
        .filter(|v| v.version() == Some(0))
        .collect();
    let projected = qe::try_eliminate_vars(&currents, &combined);
    if !qe::residual_vars(&projected, &currents).is_empty() {
        return None;
    }
    Some(version::shift(&projected, -1))
}

/// The unsafe result at a concrete counterexample length.
fn unsafe_at(graph: &ChcDirectedGraph, steps: usize) -> VerificationResult {
    log! { @1 "ACCEL: bug found, counterexample length {}", steps }
    if conf.witness {
        VerificationResult::unsafe_with(InvalidityWitness::from_transition_system(graph, steps))
    } else {
        VerificationResult::new(VerificationAnswer::Unsafe)
    }
}

/// The safe result with an invariant recovered at a fixed point.
fn safe_with_invariant(graph: &ChcDirectedGraph, invariant: Option<Term>) -> VerificationResult {
    match invariant {
        Some(invariant) if conf.witness => VerificationResult::safe_with(
            ValidityWitness::from_transition_system(graph, term::simplify(&invariant)),
        ),
        _ => VerificationResult::new(VerificationAnswer::Safe),
    }
}

/// The at-most variant: one hierarchy of `≤ 2^n`-step relations.
pub struct AcceleratedBmcSingle {
    /// The system being solved.
    system: Option<SystemData>,
    /// `transition_hierarchy[n]` is the at-most-`2^n`-step relation.
    transition_hierarchy: Vec<Term>,
    /// `solvers[n]` chains two copies of `transition_hierarchy[n]`.
    solvers: Vec<StepSolver>,
    /// Query cache per level.
    query_cache: Vec<HashMap<(Term, Term), QueryResult>>,
    /// Scratch solver for the zero/one-step base cases.
    scratch: Option<SmtCtx>,
}

impl AcceleratedBmcSingle {
    /// Constructor.
    pub fn new() -> Self {
        AcceleratedBmcSingle {
            system: None,
            transition_hierarchy: vec![],
            solvers: vec![],
            query_cache: vec![],
            scratch: None,
        }
    }

    /// Resets all per-system state.
    fn reset_transition_system(&mut self, system: &TransitionSystem) -> Res<()> {
        let data = SystemData::of(system);
        let base = term::or(vec![data.identity_relation(), data.transition.clone()]);
        self.transition_hierarchy = vec![base];
        self.solvers = vec![];
        self.query_cache = vec![];
        self.scratch = Some(SmtCtx::new("accel-single-base")?);
        self.system = Some(data);
        Ok(())
    }

    /// The at-most-`2^n` relation.
    fn level_transition(&self, level: usize) -> &Term {
        &self.transition_hierarchy[level]
    }

    /// Makes sure the hierarchy reaches `level` and the solvers reach
    /// `level - 1`. False when a composition cannot be projected.
    fn ensure_level(&mut self, level: usize) -> Res<bool> {
        while self.transition_hierarchy.len() <= level || self.solvers.len() < level {
            let next = self.solvers.len();
            if next == self.transition_hierarchy.len() {
                // compose level `next` from the solver below
                let itp = match self.solvers[next - 1].last_query_transition_interpolant()? {
                    Some(itp) => itp,
                    None => return Ok(false),
                };
                let relation = term::simplify(&clean_interpolant(&itp));
                log! { @3 "ACCEL: initialized level {}", next }
                self.transition_hierarchy.push(relation);
                if conf.verb >= 3 {
                    self.verify_level(next)?;
                }
                continue;
            }
            let relation = self.transition_hierarchy[next].clone();
            self.solvers.push(StepSolver::new(
                &format!("accel-single-{}", next),
                relation.clone(),
                relation,
            )?);
        }
        while self.query_cache.len() <= level {
            self.query_cache.push(HashMap::new())
        }
        Ok(true)
    }

    /// Debug check: the level's relation is the composition of two copies
    /// of the level below.
    fn verify_level(&mut self, level: usize) -> Res<bool> {
        let below = self.level_transition(level - 1).clone();
        let chained = term::and(vec![below.clone(), version::shift(&below, 1)]);
        let ok = implied_by(
            &chained,
            &shift_only_next_vars(self.level_transition(level)),
        )?;
        if !ok {
            log! { @1 "ACCEL: level {} relation fails verification", level }
        }
        Ok(ok)
    }

    /// Reachability within at most `2^level` steps.
    fn reachability_query(&mut self, from: &Term, to: &Term, level: usize) -> Res<QueryResult> {
        if level < self.query_cache.len() {
            if let Some(cached) = self.query_cache[level].get(&(from.clone(), to.clone())) {
                return Ok(cached.clone());
            }
        }
        let result = self.reachability_query_raw(from, to, level)?;
        while self.query_cache.len() <= level {
            self.query_cache.push(HashMap::new())
        }
        self.query_cache[level].insert((from.clone(), to.clone()), result.clone());
        Ok(result)
    }

    /// The uncached query.
    fn reachability_query_raw(
        &mut self,
        from: &Term,
        to: &Term,
        level: usize,
    ) -> Res<QueryResult> {
        debug_assert! { version::is_pure_state_formula(from) }
        debug_assert! { version::is_pure_state_formula(to) }
        if level == 0 {
            let (transition, mut scratch) = {
                let data = self.system.as_ref().expect("system is set by solve");
                (
                    data.transition.clone(),
                    self.scratch.take().expect("scratch solver is set by solve"),
                )
            };
            let res = reach_zero_step(&mut scratch, from, to).and_then(|zero| {
                if zero.is_reachable() {
                    Ok(zero)
                } else {
                    reach_one_step(&mut scratch, from, &transition, to)
                }
            });
            self.scratch = Some(scratch);
            return res;
        }

        if !self.ensure_level(level)? {
            bail!(ErrorKind::SmtUnknown)
        }
        let query = term::and(vec![from.clone(), version::shift(to, 2)]);
        for _ in 0..REFINEMENT_BOUND {
            match self.solvers[level - 1].check_consistent(&query)? {
                ReachabilityResult::Unreachable => return Ok(QueryResult::unreachable()),
                ReachabilityResult::Reachable => {
                    let model = self.solvers[level - 1].last_query_model()?;
                    let mid = extract_mid_point(&model);
                    let first = self.reachability_query(from, &mid, level - 1)?;
                    if !first.is_reachable() {
                        log! { @2 "ACCEL: spurious midpoint at level {}", level }
                        continue;
                    }
                    let reached = first
                        .refined_target
                        .clone()
                        .expect("reachable results carry a refined target");
                    let second = self.reachability_query(&reached, to, level - 1)?;
                    if !second.is_reachable() {
                        log! { @2 "ACCEL: spurious second half at level {}", level }
                        continue;
                    }
                    let refined = second
                        .refined_target
                        .clone()
                        .expect("reachable results carry a refined target");
                    return Ok(QueryResult::reachable(refined, first.steps + second.steps));
                }
            }
        }
        bail!(ErrorKind::SmtUnknown)
    }

    /// True if the next level adds no new pair: `T_{n+1} ⇒ T_n`.
    fn check_fixed_point(&mut self, level: usize) -> Res<bool> {
        let finer = self.level_transition(level + 1).clone();
        let coarser = self.level_transition(level).clone();
        implied_by(&finer, &coarser)
    }

    /// The level loop.
    fn solve_transition_system(
        &mut self,
        system: &TransitionSystem,
        graph: &ChcDirectedGraph,
    ) -> Res<VerificationResult> {
        self.reset_transition_system(system)?;
        {
            let scratch = self.scratch.as_mut().expect("scratch solver was just set");
            scratch.push()?;
            scratch.assert(system.init())?;
            let init_sat = scratch.check_sat()?;
            scratch.pop()?;
            if !init_sat {
                log! { @1 "ACCEL: system has no initial states" }
                return Ok(safe_empty_init(graph));
            }
        }

        let init = system.init().clone();
        let query = system.query().clone();
        for level in 0..=conf.max_level {
            log! { @2 "ACCEL: exploring level {} (at most 2^{} steps)", level, level }
            let res = self.reachability_query(&init, &query, level)?;
            if res.is_reachable() {
                return Ok(unsafe_at(graph, res.steps));
            }
            if !self.ensure_level(level + 1)? {
                return Ok(VerificationResult::unknown());
            }
            if self.check_fixed_point(level)? {
                log! { @1 "ACCEL: fixed point at level {}", level }
                for solver in &mut self.solvers {
                    solver.close()
                }
                let invariant = recover_invariant(&init, self.level_transition(level));
                return Ok(safe_with_invariant(graph, invariant));
            }
        }
        Ok(VerificationResult::unknown())
    }
}

impl Engine for AcceleratedBmcSingle {
    fn name(&self) -> &'static str {
        "accelerated bmc (single)"
    }

    fn solve(&mut self, graph: &ChcDirectedGraph) -> Res<VerificationResult> {
        if !ts::is_transition_system(graph) {
            return Ok(VerificationResult::unknown());
        }
        let system = ts::to_transition_system(graph)?;
        absorb_unknown(self.solve_transition_system(&system, graph))
    }

    fn solve_hyper(&mut self, _graph: ChcDirectedHyperGraph) -> Res<VerificationResult> {
        bail!(ErrorKind::Unsupported(
            "accelerated bmc expects a normalized single-loop graph".into()
        ))
    }
}

/// The split variant: an *exactly*-`2^n` hierarchy and a
/// *fewer-than*-`2^n` hierarchy.
pub struct AcceleratedBmc {
    /// The system being solved.
    system: Option<SystemData>,
    /// `exact_powers[n]` is the exactly-`2^n`-step relation.
    exact_powers: Vec<Term>,
    /// `less_than_powers[n]` is the fewer-than-`2^n`-step relation.
    less_than_powers: Vec<Term>,
    /// `exact_solvers[n]` chains two copies of `exact_powers[n]`.
    exact_solvers: Vec<StepSolver>,
    /// `less_than_solvers[n]` chains `exact_powers[n]` with
    /// `less_than_powers[n]`.
    less_than_solvers: Vec<StepSolver>,
    /// Exact-query cache per level.
    exact_cache: Vec<HashMap<(Term, Term), QueryResult>>,
    /// Fewer-than-query cache per level.
    less_than_cache: Vec<HashMap<(Term, Term), QueryResult>>,
    /// Scratch solver for the zero/one-step base cases.
    scratch: Option<SmtCtx>,
}

impl AcceleratedBmc {
    /// Constructor.
    pub fn new() -> Self {
        AcceleratedBmc {
            system: None,
            exact_powers: vec![],
            less_than_powers: vec![],
            exact_solvers: vec![],
            less_than_solvers: vec![],
            exact_cache: vec![],
            less_than_cache: vec![],
            scratch: None,
        }
    }

    /// Resets all per-system state.
    fn reset_transition_system(&mut self, system: &TransitionSystem) -> Res<()> {
        let data = SystemData::of(system);
        self.exact_powers = vec![data.transition.clone()];
        self.less_than_powers = vec![data.identity_relation()];
        self.exact_solvers = vec![];
        self.less_than_solvers = vec![];
        self.exact_cache = vec![];
        self.less_than_cache = vec![];
        self.scratch = Some(SmtCtx::new("accel-split-base")?);
        self.system = Some(data);
        Ok(())
    }

    /// The exactly-`2^n` relation.
    fn get_exact_power(&self, level: usize) -> &Term {
        &self.exact_powers[level]
    }
    /// The fewer-than-`2^n` relation.
    fn get_less_than_power(&self, level: usize) -> &Term {
        &self.less_than_powers[level]
    }

    /// Makes sure both hierarchies reach `level` and both solver stacks
    /// reach `level - 1`. False when a composition cannot be projected.
    fn ensure_level(&mut self, level: usize) -> Res<bool> {
        loop {
            let exact_len = self.exact_powers.len();
            let solver_len = self.exact_solvers.len();
            if exact_len > level && solver_len >= level {
                break;
            }
            if solver_len < exact_len {
                let exact = self.exact_powers[solver_len].clone();
                self.exact_solvers.push(StepSolver::new(
                    &format!("accel-exact-{}", solver_len),
                    exact.clone(),
                    exact.clone(),
                )?);
                let less_than = self.less_than_powers[solver_len].clone();
                self.less_than_solvers.push(StepSolver::new(
                    &format!("accel-less-than-{}", solver_len),
                    exact,
                    less_than,
                )?);
                continue;
            }
            // compose level `exact_len` from the solvers below
            let exact_itp = match self.exact_solvers[exact_len - 1]
                .last_query_transition_interpolant()?
            {
                Some(itp) => itp,
                None => return Ok(false),
            };
            let less_than_itp = match self.less_than_solvers[exact_len - 1]
                .last_query_transition_interpolant()?
            {
                Some(itp) => itp,
                None => return Ok(false),
            };
            let exact = term::simplify(&clean_interpolant(&exact_itp));
            let less_than = term::or(vec![
                self.less_than_powers[exact_len - 1].clone(),
                term::simplify(&clean_interpolant(&less_than_itp)),
            ]);
            log! { @3 "ACCEL: initialized level {}", exact_len }
            self.exact_powers.push(exact);
            self.less_than_powers.push(less_than);
            if conf.verb >= 3 {
                self.verify_exact_power(exact_len)?;
                self.verify_less_than_power(exact_len)?;
            }
        }
        while self.exact_cache.len() <= level {
            self.exact_cache.push(HashMap::new())
        }
        while self.less_than_cache.len() <= level {
            self.less_than_cache.push(HashMap::new())
        }
        Ok(true)
    }

    /// Debug check: the exact relation is the composition of two copies of
    /// the exact relation below.
    fn verify_exact_power(&mut self, level: usize) -> Res<bool> {
        let below = self.get_exact_power(level - 1).clone();
        let chained = term::and(vec![below.clone(), version::shift(&below, 1)]);
        let ok = implied_by(&chained, &shift_only_next_vars(self.get_exact_power(level)))?;
        if !ok {
            log! { @1 "ACCEL: exact level {} relation fails verification", level }
        }
        Ok(ok)
    }

    /// Debug check: the fewer-than relation covers the level below and its
    /// exact-then-fewer-than composition.
    fn verify_less_than_power(&mut self, level: usize) -> Res<bool> {
        let exact_below = self.get_exact_power(level - 1).clone();
        let less_below = self.get_less_than_power(level - 1).clone();
        let this = self.get_less_than_power(level).clone();
        let direct = implied_by(&less_below, &this)?;
        let chained = term::and(vec![exact_below, version::shift(&less_below, 1)]);
        let composed = implied_by(&chained, &shift_only_next_vars(&this))?;
        let ok = direct && composed;
        if !ok {
            log! { @1 "ACCEL: fewer-than level {} relation fails verification", level }
        }
        Ok(ok)
    }

    /// Reachability in exactly `2^level` steps.
    fn reachability_query_exact(
        &mut self,
        from: &Term,
        to: &Term,
        level: usize,
    ) -> Res<QueryResult> {
        if level < self.exact_cache.len() {
            if let Some(cached) = self.exact_cache[level].get(&(from.clone(), to.clone())) {
                return Ok(cached.clone());
            }
        }
        let result = self.reachability_query_exact_raw(from, to, level)?;
        while self.exact_cache.len() <= level {
            self.exact_cache.push(HashMap::new())
        }
        self.exact_cache[level].insert((from.clone(), to.clone()), result.clone());
        Ok(result)
    }

    /// The uncached exact query.
    fn reachability_query_exact_raw(
        &mut self,
        from: &Term,
        to: &Term,
        level: usize,
    ) -> Res<QueryResult> {
        if level == 0 {
            let (transition, mut scratch) = {
                let data = self.system.as_ref().expect("system is set by solve");
                (
                    data.transition.clone(),
                    self.scratch.take().expect("scratch solver is set by solve"),
                )
            };
            let res = reach_one_step(&mut scratch, from, &transition, to);
            self.scratch = Some(scratch);
            return res;
        }
        if !self.ensure_level(level)? {
            bail!(ErrorKind::SmtUnknown)
        }
        let query = term::and(vec![from.clone(), version::shift(to, 2)]);
        for _ in 0..REFINEMENT_BOUND {
            match self.exact_solvers[level - 1].check_consistent(&query)? {
                ReachabilityResult::Unreachable => return Ok(QueryResult::unreachable()),
                ReachabilityResult::Reachable => {
                    let model = self.exact_solvers[level - 1].last_query_model()?;
                    let mid = extract_mid_point(&model);
                    let first = self.reachability_query_exact(from, &mid, level - 1)?;
                    if !first.is_reachable() {
                        log! { @2 "ACCEL: spurious midpoint in exact query at level {}", level }
                        continue;
                    }
                    let reached = first
                        .refined_target
                        .clone()
                        .expect("reachable results carry a refined target");
                    let second = self.reachability_query_exact(&reached, to, level - 1)?;
                    if !second.is_reachable() {
                        log! { @2 "ACCEL: spurious second half in exact query at level {}", level }
                        continue;
                    }
                    let refined = second
                        .refined_target
                        .clone()
                        .expect("reachable results carry a refined target");
                    return Ok(QueryResult::reachable(refined, first.steps + second.steps));
                }
            }
        }
        bail!(ErrorKind::SmtUnknown)
    }

    /// Reachability in fewer than `2^level` steps.
    fn reachability_query_less_than(
        &mut self,
        from: &Term,
        to: &Term,
        level: usize,
    ) -> Res<QueryResult> {
        if level < self.less_than_cache.len() {
            if let Some(cached) = self.less_than_cache[level].get(&(from.clone(), to.clone())) {
                return Ok(cached.clone());
            }
        }
        let result = self.reachability_query_less_than_raw(from, to, level)?;
        while self.less_than_cache.len() <= level {
            self.less_than_cache.push(HashMap::new())
        }
        self.less_than_cache[level].insert((from.clone(), to.clone()), result.clone());
        Ok(result)
    }

    /// The uncached fewer-than query, by the decomposition
    /// `m < 2^{n}` iff `m < 2^{n-1}`, or `m = 2^{n-1} + r` with
    /// `r < 2^{n-1}`.
    fn reachability_query_less_than_raw(
        &mut self,
        from: &Term,
        to: &Term,
        level: usize,
    ) -> Res<QueryResult> {
        if level == 0 {
            // fewer than one step: zero steps
            let mut scratch = self.scratch.take().expect("scratch solver is set by solve");
            let res = reach_zero_step(&mut scratch, from, to);
            self.scratch = Some(scratch);
            return res;
        }
        let direct = self.reachability_query_less_than(from, to, level - 1)?;
        if direct.is_reachable() {
            return Ok(direct);
        }
        if !self.ensure_level(level)? {
            bail!(ErrorKind::SmtUnknown)
        }
        let query = term::and(vec![from.clone(), version::shift(to, 2)]);
        for _ in 0..REFINEMENT_BOUND {
            match self.less_than_solvers[level - 1].check_consistent(&query)? {
                ReachabilityResult::Unreachable => return Ok(QueryResult::unreachable()),
                ReachabilityResult::Reachable => {
                    let model = self.less_than_solvers[level - 1].last_query_model()?;
                    let mid = extract_mid_point(&model);
                    let first = self.reachability_query_exact(from, &mid, level - 1)?;
                    if !first.is_reachable() {
                        log! { @2 "ACCEL: spurious midpoint in fewer-than query at level {}", level }
                        continue;
                    }
                    let reached = first
                        .refined_target
                        .clone()
                        .expect("reachable results carry a refined target");
                    let second = self.reachability_query_less_than(&reached, to, level - 1)?;
                    if !second.is_reachable() {
                        log! { @2 "ACCEL: spurious second half in fewer-than query at level {}", level }
                        continue;
                    }
                    let refined = second
                        .refined_target
                        .clone()
                        .expect("reachable results carry a refined target");
                    return Ok(QueryResult::reachable(refined, first.steps + second.steps));
                }
            }
        }
        bail!(ErrorKind::SmtUnknown)
    }

    /// True if the next fewer-than relation adds no new pair:
    /// `LT_{n+1} ⇒ LT_n`.
    fn check_less_than_fixed_point(&mut self, level: usize) -> Res<bool> {
        let finer = self.get_less_than_power(level + 1).clone();
        let coarser = self.get_less_than_power(level).clone();
        implied_by(&finer, &coarser)
    }

    /// The level loop.
    fn solve_transition_system(
        &mut self,
        system: &TransitionSystem,
        graph: &ChcDirectedGraph,
    ) -> Res<VerificationResult> {
        self.reset_transition_system(system)?;
        {
            let scratch = self.scratch.as_mut().expect("scratch solver was just set");
            scratch.push()?;
            scratch.assert(system.init())?;
            let init_sat = scratch.check_sat()?;
            scratch.pop()?;
            if !init_sat {
                log! { @1 "ACCEL: system has no initial states" }
                return Ok(safe_empty_init(graph));
            }
        }

        let init = system.init().clone();
        let query = system.query().clone();
        for level in 0..=conf.max_level {
            log! { @2 "ACCEL: exploring level {} (up to 2^{} steps)", level, level }
            let shorter = self.reachability_query_less_than(&init, &query, level)?;
            if shorter.is_reachable() {
                return Ok(unsafe_at(graph, shorter.steps));
            }
            let exact = self.reachability_query_exact(&init, &query, level)?;
            if exact.is_reachable() {
                return Ok(unsafe_at(graph, exact.steps));
            }
            if !self.ensure_level(level + 1)? {
                return Ok(VerificationResult::unknown());
            }
            if self.check_less_than_fixed_point(level)? {
                log! { @1 "ACCEL: fixed point at level {}", level }
                for solver in self
                    .exact_solvers
                    .iter_mut()
                    .chain(self.less_than_solvers.iter_mut())
                {
                    solver.close()
                }
                let invariant = recover_invariant(&init, self.get_less_than_power(level));
                return Ok(safe_with_invariant(graph, invariant));
            }
        }
        Ok(VerificationResult::unknown())
    }
}

impl Engine for AcceleratedBmc {
    fn name(&self) -> &'static str {
        "accelerated bmc"
    }

    fn solve(&mut self, graph: &ChcDirectedGraph) -> Res<VerificationResult> {
        if !ts::is_transition_system(graph) {
            return Ok(VerificationResult::unknown());
        }
        let system = ts::to_transition_system(graph)?;
        absorb_unknown(self.solve_transition_system(&system, graph))
    }

    fn solve_hyper(&mut self, _graph: ChcDirectedHyperGraph) -> Res<VerificationResult> {
        bail!(ErrorKind::Unsupported(
            "accelerated bmc expects a normalized single-loop graph".into()
        ))
    }
}
