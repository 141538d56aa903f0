//! Tests for the term factory, versioning and trivial QE.

use crate::common::*;
use crate::term::{self, qe, version, TermExt, VarTag};

fn x() -> Var {
    Var::base(term::var_sym("x", Typ::Int))
}
fn y() -> Var {
    Var::base(term::var_sym("y", Typ::Int))
}

#[test]
fn truth_constants_are_canonical() {
    assert_eq!(term::tru(), term::bool(true));
    assert_eq!(term::fls(), term::bool(false));
    assert!(term::fls().is_false());
    assert!(!term::tru().is_false());
    assert_eq!(term::and(vec![term::tru(), term::fls()]), term::fls());
    assert_eq!(term::or(vec![term::fls(), term::tru()]), term::tru());
}

#[test]
fn conjunction_flattens_and_dedups() {
    let x0 = term::var(x().version_zero());
    let atom = term::ge(x0.clone(), term::int(0));
    let nested = term::and(vec![atom.clone(), term::and(vec![atom.clone(), term::tru()])]);
    assert_eq!(nested, atom);
}

#[test]
fn literal_folding() {
    assert_eq!(term::add(vec![term::int(3), term::int(4)]), term::int(7));
    assert_eq!(
        term::eq(term::int(1), term::int(9)),
        term::fls()
    );
    assert_eq!(term::le(term::int(3), term::int(9)), term::tru());
    assert_eq!(term::sub(vec![term::int(3)]), term::int(-3));
    assert_eq!(term::not(term::not(term::tru())), term::tru());
}

#[test]
fn equality_is_order_insensitive() {
    let x0 = term::var(x().version_zero());
    let y0 = term::var(y().version_zero());
    assert_eq!(term::eq(x0.clone(), y0.clone()), term::eq(y0, x0));
}

#[test]
fn shift_composes_additively() {
    let x0 = term::var(x().version_zero());
    let fla = term::eq(
        term::var(x().version_zero().shift(1)),
        term::add(vec![x0, term::int(1)]),
    );
    let there = version::shift(&fla, 3);
    let back = version::shift(&there, -3);
    assert_eq!(back, fla);
    assert_eq!(
        version::shift(&version::shift(&fla, 2), 1),
        version::shift(&fla, 3)
    );
    assert_eq!(version::shift(&fla, 0), fla);
}

#[test]
fn shift_ignores_unversioned() {
    let base = term::var(x());
    assert_eq!(version::shift(&base, 5), base);
}

#[test]
fn versioning_round_trip() {
    let v = x().version_zero();
    assert!(v.is_versioned());
    assert_eq!(v.unversioned(), x());
    assert_eq!(v.shift(2).version(), Some(2));
    assert!(!x().is_versioned());
    assert_eq!(x().tag, VarTag::Base);
}

#[test]
fn purity_predicates() {
    let x0 = term::var(x().version_zero());
    let x1 = term::var(x().version_zero().shift(1));
    let state = term::ge(x0.clone(), term::int(0));
    let trans = term::eq(x1, term::add(vec![x0, term::int(1)]));
    assert!(version::is_pure_state_formula(&state));
    assert!(!version::is_pure_state_formula(&trans));
    assert!(version::is_pure_transition_formula(&trans));
    assert!(version::is_pure_transition_formula(&state));
    assert!(!version::is_pure_transition_formula(&version::shift(
        &trans, 1
    )));
}

#[test]
fn qe_eliminates_defined_variable() {
    let x0 = x().version_zero();
    let y0 = y().version_zero();
    // x = y + 1 ∧ y > 0, eliminating x
    let fla = term::and(vec![
        term::eq(
            term::var(x0),
            term::add(vec![term::var(y0), term::int(1)]),
        ),
        term::gt(term::var(y0), term::int(0)),
    ]);
    let mut elim = VarSet::new();
    elim.insert(x0);
    let res = qe::try_eliminate_vars(&elim, &fla);
    assert!(!term::vars(&res).contains(&x0));
    assert_eq!(res, term::gt(term::var(y0), term::int(0)));
}

#[test]
fn qe_substitutes_through_other_conjuncts() {
    let x0 = x().version_zero();
    let y0 = y().version_zero();
    // y = x + 1 ∧ y > 5, eliminating y leaves x + 1 > 5
    let fla = term::and(vec![
        term::eq(
            term::var(y0),
            term::add(vec![term::var(x0), term::int(1)]),
        ),
        term::gt(term::var(y0), term::int(5)),
    ]);
    let mut elim = VarSet::new();
    elim.insert(y0);
    let res = qe::try_eliminate_vars(&elim, &fla);
    assert!(!term::vars(&res).contains(&y0));
    assert_eq!(
        res,
        term::gt(
            term::add(vec![term::var(x0), term::int(1)]),
            term::int(5)
        )
    );
}

#[test]
fn qe_distributes_over_disjunction() {
    let x0 = x().version_zero();
    let y0 = y().version_zero();
    let disjunct = |cst: isize| {
        term::and(vec![
            term::eq(term::var(y0), term::int(cst)),
            term::eq(term::var(x0), term::var(y0)),
        ])
    };
    let fla = term::or(vec![disjunct(1), disjunct(2)]);
    let mut elim = VarSet::new();
    elim.insert(y0);
    let res = qe::try_eliminate_vars(&elim, &fla);
    assert!(!term::vars(&res).contains(&y0));
}

#[test]
fn qe_keeps_undefinable_variables() {
    let x0 = x().version_zero();
    let y0 = y().version_zero();
    // y only bounded, not defined: nothing to do
    let fla = term::and(vec![
        term::gt(term::var(y0), term::var(x0)),
        term::gt(term::var(x0), term::int(0)),
    ]);
    let mut elim = VarSet::new();
    elim.insert(y0);
    let res = qe::try_eliminate_vars(&elim, &fla);
    assert_eq!(res, fla);
    assert_eq!(qe::residual_vars(&res, &elim), elim);
}

#[test]
fn qe_except_keeps_outer_variables() {
    let x0 = x().version_zero();
    let y0 = y().version_zero();
    let fla = term::and(vec![
        term::eq(
            term::var(y0),
            term::add(vec![term::var(x0), term::int(2)]),
        ),
        term::lt(term::var(y0), term::int(10)),
    ]);
    let mut keep = VarSet::new();
    keep.insert(x0);
    let res = qe::try_eliminate_vars_except(&keep, &fla);
    assert!(!term::vars(&res).contains(&y0));
    assert!(term::vars(&res).contains(&x0));
}

#[test]
fn subst_is_simultaneous() {
    let x0 = x().version_zero();
    let y0 = y().version_zero();
    // swap x and y in x - y
    let fla = term::sub(vec![term::var(x0), term::var(y0)]);
    let mut map = VarHMap::new();
    map.insert(x0, term::var(y0));
    map.insert(y0, term::var(x0));
    let swapped = fla.subst(&map);
    assert_eq!(swapped, term::sub(vec![term::var(y0), term::var(x0)]));
    assert_eq!(swapped.subst(&map), fla);
}
