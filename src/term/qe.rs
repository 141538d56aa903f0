//! Trivial quantifier elimination.
//!
//! Eliminates existentially quantified variables that are *defined* by a
//! top-level equational conjunct (`x = t` with `x` not free in `t`) by
//! substituting the definition away. Distributes over disjunction. Best
//! effort: variables without a definitional conjunct are left in place and
//! the caller decides whether that is acceptable.

use crate::common::*;
use crate::term::{self, Op, RTerm, Term, TermExt};

/// Eliminates `vars` from `term`, best effort.
///
/// The result is implied by the input and equivalent to it wherever all
/// requested variables could be eliminated.
pub fn try_eliminate_vars(vars: &VarSet, term: &Term) -> Term {
    if vars.is_empty() {
        return term.clone();
    }
    // ∃x (A ∨ B) is (∃x A) ∨ (∃x B)
    if let RTerm::App {
        op: Op::Or,
        ref args,
    } = *term.get()
    {
        let args = args
            .iter()
            .map(|disjunct| try_eliminate_vars(vars, disjunct))
            .collect();
        return term::or(args);
    }

    let mut conjuncts = term.conjuncts();
    let mut changed = true;
    while changed {
        changed = false;
        let mut def = None;
        'scan: for (pos, conjunct) in conjuncts.iter().enumerate() {
            if let RTerm::App {
                op: Op::Eql,
                ref args,
            } = *conjunct.get()
            {
                debug_assert_eq! { args.len(), 2 }
                for (lhs, rhs) in &[(&args[0], &args[1]), (&args[1], &args[0])] {
                    if let Some(v) = lhs.get().var() {
                        if vars.contains(&v) && !term::vars(rhs).contains(&v) {
                            def = Some((pos, v, (*rhs).clone()));
                            break 'scan;
                        }
                    }
                }
            }
        }
        if let Some((pos, v, rhs)) = def {
            conjuncts.remove(pos);
            let mut map = VarHMap::with_capacity(1);
            map.insert(v, rhs);
            for conjunct in conjuncts.iter_mut() {
                *conjunct = conjunct.subst(&map)
            }
            changed = true
        }
    }

    // a variable whose remaining occurrences all sit inside one disjunctive
    // conjunct can be pushed under that disjunction
    let mut occurrences: VarHMap<usize> = VarHMap::new();
    for conjunct in &conjuncts {
        for v in term::vars(conjunct) {
            if vars.contains(&v) {
                *occurrences.entry(v).or_insert(0) += 1
            }
        }
    }
    let conjuncts: Vec<Term> = conjuncts
        .into_iter()
        .map(|conjunct| {
            let private: VarSet = term::vars(&conjunct)
                .into_iter()
                .filter(|v| vars.contains(v) && occurrences.get(v) == Some(&1))
                .collect();
            if private.is_empty() {
                conjunct
            } else {
                try_eliminate_sub(&private, &conjunct)
            }
        })
        .collect();
    let result = term::and(conjuncts);
    if residual_vars(&result, vars).is_empty() {
        return result;
    }

    // last resort: distribute conjunction over disjunction (bounded) and
    // retry on each cube
    if let Some(cubes) = dnf_cubes(&result.conjuncts()) {
        if cubes.len() > 1 {
            let disjuncts = cubes
                .into_iter()
                .map(|cube| try_eliminate_vars(vars, &term::and(cube)))
                .collect();
            return term::or(disjuncts);
        }
    }
    result
}

/// Bound on the cube count of the DNF distribution.
const DNF_LIMIT: usize = 512;

/// Distributes a conjunction over its disjunctive conjuncts; `None` above
/// [`DNF_LIMIT`] cubes.
///
/// [`DNF_LIMIT`]: constant.DNF_LIMIT.html (DNF_LIMIT constant)
fn dnf_cubes(conjuncts: &[Term]) -> Option<Vec<Vec<Term>>> {
    let mut cubes: Vec<Vec<Term>> = vec![vec![]];
    for conjunct in conjuncts {
        let disjuncts: Vec<Term> = match *conjunct.get() {
            RTerm::App {
                op: Op::Or,
                ref args,
            } => args.clone(),
            _ => vec![conjunct.clone()],
        };
        if cubes.len() * disjuncts.len() > DNF_LIMIT {
            return None;
        }
        let mut next = Vec::with_capacity(cubes.len() * disjuncts.len());
        for cube in &cubes {
            for disjunct in &disjuncts {
                let mut cube = cube.clone();
                cube.extend(disjunct.conjuncts());
                next.push(cube);
            }
        }
        cubes = next
    }
    Some(cubes)
}

/// Eliminates everything but `keep` from `term`, best effort.
pub fn try_eliminate_vars_except(keep: &VarSet, term: &Term) -> Term {
    let to_elim: VarSet = term::vars(term)
        .into_iter()
        .filter(|v| !keep.contains(v))
        .collect();
    try_eliminate_vars(&to_elim, term)
}

/// Variables of `vars` that survived elimination, if any.
pub fn residual_vars(term: &Term, vars: &VarSet) -> VarSet {
    term::vars(term)
        .into_iter()
        .filter(|v| vars.contains(v))
        .collect()
}

/// Recurses into a conjunct that is itself a disjunction.
fn try_eliminate_sub(vars: &VarSet, conjunct: &Term) -> Term {
    match *conjunct.get() {
        RTerm::App { op: Op::Or, .. } => try_eliminate_vars(vars, conjunct),
        _ => conjunct.clone(),
    }
}
