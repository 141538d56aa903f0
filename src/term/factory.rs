//! Term creation functions.

use std::sync::RwLock;

use hashconsing::coll::HConMap;
use hashconsing::{HConsign, HashConsign};

use crate::common::*;
use crate::term::{Op, RTerm, Term, Typ, Var};

/// Type of the term factory.
type Factory = RwLock<HConsign<RTerm>>;

/// Initial capacity of the factory.
const TERM_CAPA: usize = 1_024;

lazy_static! {
    /// Term factory.
    static ref factory: Factory = RwLock::new(
        HConsign::with_capacity(TERM_CAPA)
    );
}

lazy_static! {
    /// Cache for terms' variables.
    static ref var_cache: RwLock<HConMap<Term, VarSet>> = RwLock::new(
        HConMap::default()
    );
}

/// Information about a variable base symbol.
struct VarSymInfo {
    /// Name.
    name: String,
    /// Sort.
    typ: Typ,
}

lazy_static! {
    /// Interned variable base symbols.
    static ref var_syms: RwLock<(Vec<VarSymInfo>, HashMap<String, VarSym>)> =
        RwLock::new((vec![], HashMap::new()));
}

/// Interns a variable base symbol.
///
/// Names must not contain `@` or `!`, which the tag mangling owns. Interning
/// the same name twice with different sorts is a programming error.
pub fn var_sym<S: AsRef<str>>(name: S, typ: Typ) -> VarSym {
    let name = name.as_ref();
    debug_assert! { !name.contains('@') && !name.contains('!') }
    if let Some(sym) = find_var_sym(name) {
        debug_assert_eq! { sym_typ(sym), typ }
        return sym;
    }
    let mut table = var_syms.write().expect("variable table poisoned");
    if let Some(sym) = table.1.get(name) {
        return *sym;
    }
    let sym: VarSym = table.0.len().into();
    table.0.push(VarSymInfo {
        name: name.to_string(),
        typ,
    });
    table.1.insert(name.to_string(), sym);
    sym
}

/// Looks an interned base symbol up by name.
pub fn find_var_sym(name: &str) -> Option<VarSym> {
    var_syms
        .read()
        .expect("variable table poisoned")
        .1
        .get(name)
        .cloned()
}

/// Name of a variable base symbol.
pub(crate) fn sym_name(sym: VarSym) -> String {
    var_syms.read().expect("variable table poisoned").0[sym.get()]
        .name
        .clone()
}

/// Sort of a variable base symbol.
pub(crate) fn sym_typ(sym: VarSym) -> Typ {
    var_syms.read().expect("variable table poisoned").0[sym.get()].typ
}

/// Hashconses a real term.
fn hcons(term: RTerm) -> Term {
    factory.write().expect("term factory poisoned").mk(term)
}

/// The truth constant.
pub fn tru() -> Term {
    hcons(RTerm::Bool(true))
}
/// The falsehood constant.
pub fn fls() -> Term {
    hcons(RTerm::Bool(false))
}
/// A boolean constant.
pub fn bool(b: bool) -> Term {
    hcons(RTerm::Bool(b))
}
/// An integer constant.
pub fn int<I: Into<Int>>(i: I) -> Term {
    hcons(RTerm::Int(i.into()))
}
/// A variable.
pub fn var(v: Var) -> Term {
    hcons(RTerm::Var(v))
}

/// An operator application, normalized.
///
/// Normalization is syntactic and local: flattening of `and`/`or`/`+`,
/// neutral/absorbing element propagation, literal folding, double-negation
/// removal. It keeps the truth constants canonical.
pub fn app(op: Op, args: Vec<Term>) -> Term {
    match op {
        Op::And => nary_bool(Op::And, args),
        Op::Or => nary_bool(Op::Or, args),
        Op::Not => not_norm(args),
        Op::Impl => impl_norm(args),
        Op::Eql => eq_norm(args),
        Op::Ge | Op::Gt | Op::Le | Op::Lt => cmp_norm(op, args),
        Op::Add => add_norm(args),
        Op::Sub => sub_norm(args),
        Op::Mul => mul_norm(args),
    }
}

/// A conjunction.
pub fn and(args: Vec<Term>) -> Term {
    app(Op::And, args)
}
/// A disjunction.
pub fn or(args: Vec<Term>) -> Term {
    app(Op::Or, args)
}
/// A negation.
pub fn not(arg: Term) -> Term {
    app(Op::Not, vec![arg])
}
/// An implication.
pub fn implies(lhs: Term, rhs: Term) -> Term {
    app(Op::Impl, vec![lhs, rhs])
}
/// An equality.
pub fn eq(lhs: Term, rhs: Term) -> Term {
    app(Op::Eql, vec![lhs, rhs])
}
/// Greater than or equal to.
pub fn ge(lhs: Term, rhs: Term) -> Term {
    app(Op::Ge, vec![lhs, rhs])
}
/// Greater than.
pub fn gt(lhs: Term, rhs: Term) -> Term {
    app(Op::Gt, vec![lhs, rhs])
}
/// Less than or equal to.
pub fn le(lhs: Term, rhs: Term) -> Term {
    app(Op::Le, vec![lhs, rhs])
}
/// Less than.
pub fn lt(lhs: Term, rhs: Term) -> Term {
    app(Op::Lt, vec![lhs, rhs])
}
/// An addition.
pub fn add(args: Vec<Term>) -> Term {
    app(Op::Add, args)
}
/// A subtraction (unary minus when given one argument).
pub fn sub(args: Vec<Term>) -> Term {
    app(Op::Sub, args)
}
/// A multiplication.
pub fn mul(args: Vec<Term>) -> Term {
    app(Op::Mul, args)
}

/// Rebuilds a term bottom-up through the normalizing constructors.
pub fn simplify(term: &Term) -> Term {
    match *term.get() {
        RTerm::Var(_) | RTerm::Int(_) | RTerm::Bool(_) => term.clone(),
        RTerm::App { op, ref args } => {
            let args = args.iter().map(simplify).collect();
            app(op, args)
        }
    }
}

/// Variables appearing in a term (cached).
pub fn vars(term: &Term) -> VarSet {
    if let Some(vars) = var_cache
        .read()
        .expect("variable cache poisoned")
        .get(term)
    {
        return vars.clone();
    }
    let vars = scan_vars(term);
    var_cache
        .write()
        .expect("variable cache poisoned")
        .insert(term.clone(), vars.clone());
    vars
}

/// Scans a term to extract the variables that appear in it.
fn scan_vars(term: &Term) -> VarSet {
    let mut to_do = vec![term.get()];
    let mut set = VarSet::with_capacity(7);
    while let Some(term) = to_do.pop() {
        match *term {
            RTerm::Var(v) => {
                let _ = set.insert(v);
            }
            RTerm::Int(_) | RTerm::Bool(_) => (),
            RTerm::App { ref args, .. } => {
                for arg in args {
                    to_do.push(arg.get())
                }
            }
        }
    }
    set.shrink_to_fit();
    set
}

/// Normalizes `and` / `or`: flattening, neutral and absorbing elements,
/// duplicate removal.
fn nary_bool(op: Op, args: Vec<Term>) -> Term {
    let absorbing = op == Op::Or;
    let mut flat = Vec::with_capacity(args.len());
    let mut seen = HashSet::with_capacity(args.len());
    let mut to_do: Vec<_> = args.into_iter().rev().collect();
    while let Some(arg) = to_do.pop() {
        let nested = match *arg.get() {
            RTerm::Bool(b) => {
                if b == absorbing {
                    return bool(absorbing);
                }
                continue;
            }
            RTerm::App {
                op: inner,
                ref args,
            } if inner == op => Some(args.clone()),
            _ => None,
        };
        if let Some(args) = nested {
            for sub in args.into_iter().rev() {
                to_do.push(sub)
            }
        } else if seen.insert(arg.uid()) {
            flat.push(arg)
        }
    }
    match flat.len() {
        0 => bool(!absorbing),
        1 => flat.pop().expect("flat has exactly one element"),
        _ => hcons(RTerm::App { op, args: flat }),
    }
}

/// Normalizes a negation.
fn not_norm(mut args: Vec<Term>) -> Term {
    debug_assert_eq! { args.len(), 1 }
    let arg = args.pop().expect("not is unary");
    match *arg.get() {
        RTerm::Bool(b) => return bool(!b),
        RTerm::App {
            op: Op::Not,
            ref args,
        } => return args[0].clone(),
        _ => (),
    }
    hcons(RTerm::App {
        op: Op::Not,
        args: vec![arg],
    })
}

/// Normalizes an implication.
fn impl_norm(mut args: Vec<Term>) -> Term {
    debug_assert_eq! { args.len(), 2 }
    let rhs = args.pop().expect("impl is binary");
    let lhs = args.pop().expect("impl is binary");
    match (lhs.get().bool(), rhs.get().bool()) {
        (Some(true), _) => rhs,
        (Some(false), _) => tru(),
        (_, Some(true)) => tru(),
        (_, Some(false)) => not(lhs),
        _ => hcons(RTerm::App {
            op: Op::Impl,
            args: vec![lhs, rhs],
        }),
    }
}

/// Normalizes an equality.
fn eq_norm(mut args: Vec<Term>) -> Term {
    debug_assert_eq! { args.len(), 2 }
    let rhs = args.pop().expect("eq is binary");
    let lhs = args.pop().expect("eq is binary");
    if lhs == rhs {
        return tru();
    }
    match (lhs.get(), rhs.get()) {
        (&RTerm::Int(ref l), &RTerm::Int(ref r)) => return bool(l == r),
        (&RTerm::Bool(l), &RTerm::Bool(r)) => return bool(l == r),
        _ => (),
    }
    // canonical argument order, so that `x = y` and `y = x` share a handle
    let args = if lhs.uid() <= rhs.uid() {
        vec![lhs, rhs]
    } else {
        vec![rhs, lhs]
    };
    hcons(RTerm::App { op: Op::Eql, args })
}

/// Normalizes an arithmetic comparison.
fn cmp_norm(op: Op, args: Vec<Term>) -> Term {
    debug_assert_eq! { args.len(), 2 }
    if let (Some(l), Some(r)) = (args[0].get().int(), args[1].get().int()) {
        let res = match op {
            Op::Ge => l >= r,
            Op::Gt => l > r,
            Op::Le => l <= r,
            Op::Lt => l < r,
            _ => unreachable!("cmp_norm only handles comparisons"),
        };
        return bool(res);
    }
    hcons(RTerm::App { op, args })
}

/// Normalizes an addition.
fn add_norm(args: Vec<Term>) -> Term {
    let mut cst = Int::from(0);
    let mut rest = Vec::with_capacity(args.len());
    let mut to_do: Vec<_> = args.into_iter().rev().collect();
    while let Some(arg) = to_do.pop() {
        let nested = match *arg.get() {
            RTerm::Int(ref i) => {
                cst += i;
                continue;
            }
            RTerm::App {
                op: Op::Add,
                ref args,
            } => Some(args.clone()),
            _ => None,
        };
        if let Some(args) = nested {
            for sub in args.into_iter().rev() {
                to_do.push(sub)
            }
        } else {
            rest.push(arg)
        }
    }
    use num::Zero;
    if rest.is_empty() {
        return int(cst);
    }
    if !cst.is_zero() {
        rest.push(int(cst))
    }
    if rest.len() == 1 {
        rest.pop().expect("rest has exactly one element")
    } else {
        hcons(RTerm::App {
            op: Op::Add,
            args: rest,
        })
    }
}

/// Normalizes a subtraction.
fn sub_norm(args: Vec<Term>) -> Term {
    debug_assert! { args.len() == 1 || args.len() == 2 }
    if args.len() == 1 {
        if let Some(i) = args[0].get().int() {
            return int(-i);
        }
        return hcons(RTerm::App {
            op: Op::Sub,
            args,
        });
    }
    match (args[0].get().int(), args[1].get().int()) {
        (Some(l), Some(r)) => int(l - r),
        (_, Some(ref r)) if num::Zero::is_zero(r) => args[0].clone(),
        _ => hcons(RTerm::App {
            op: Op::Sub,
            args,
        }),
    }
}

/// Normalizes a multiplication.
fn mul_norm(args: Vec<Term>) -> Term {
    use num::{One, Zero};
    let mut cst = Int::from(1);
    let mut rest = Vec::with_capacity(args.len());
    for arg in args {
        if let Some(i) = arg.get().int() {
            if i.is_zero() {
                return int(0);
            }
            cst *= i
        } else {
            rest.push(arg)
        }
    }
    if rest.is_empty() {
        return int(cst);
    }
    if !cst.is_one() {
        rest.insert(0, int(cst))
    }
    if rest.len() == 1 {
        rest.pop().expect("rest has exactly one element")
    } else {
        hcons(RTerm::App {
            op: Op::Mul,
            args: rest,
        })
    }
}
