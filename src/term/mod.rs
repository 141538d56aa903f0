//! Hashconsed terms.
//!
//! The factory is a `static_ref` for easy creation. Terms are built through
//! the constructors at the root of this module ([`var`], [`int`], [`app`],
//! [`and`], ...) which normalize on construction: the truth constants are
//! canonical, so syntactic `⊥` checks are handle comparisons.
//!
//! Variables are copyable values carrying an interned base symbol and a
//! *tag*: the time coordinate of the linear representation (`@k`), or the
//! source/target-occurrence namespace of the nonlinear one (`!s<i>`, `!t`).
//!
//! [`var`]: fn.var.html (var function)
//! [`int`]: fn.int.html (int function)
//! [`app`]: fn.app.html (app function)
//! [`and`]: fn.and.html (and function)

use hashconsing::HConsed;

use crate::common::*;

mod factory;
pub mod qe;
pub mod version;

#[cfg(test)]
mod test;

pub use self::factory::{
    add, and, app, bool, eq, find_var_sym, fls, ge, gt, implies, int, le, lt, mul, not, or,
    simplify, sub, tru, var, var_sym, vars,
};

/// Sorts.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Typ {
    /// Booleans.
    Bool,
    /// Integers.
    Int,
}
impl Typ {
    /// String representation, as it goes to the solver.
    pub fn as_str(self) -> &'static str {
        match self {
            Typ::Bool => "Bool",
            Typ::Int => "Int",
        }
    }
}
impl fmt::Display for Typ {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}
impl ::rsmt2::print::Sort2Smt for Typ {
    fn sort_to_smt2<Writer: Write>(&self, w: &mut Writer) -> SmtRes<()> {
        write!(w, "{}", self.as_str())?;
        Ok(())
    }
}

/// Time coordinate or occurrence namespace of a variable.
///
/// `Base` is an unversioned variable, a name without time coordinate.
/// `At(k)` is the version-`k` instance: version 0 is the current state,
/// version 1 the next state. `Src(i)` and `Tgt` are the disjoint namespaces
/// of the nonlinear canonical representation, one per source occurrence and
/// one for the target.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum VarTag {
    /// Unversioned.
    Base,
    /// Versioned, the payload is the time coordinate.
    At(i32),
    /// Source-occurrence namespace of the nonlinear representation.
    Src(usize),
    /// Target namespace of the nonlinear representation.
    Tgt,
}

/// A variable: an interned base symbol and a tag.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Var {
    /// Base symbol (name and sort).
    pub sym: VarSym,
    /// Time coordinate or occurrence namespace.
    pub tag: VarTag,
}
impl Var {
    /// Unversioned variable over some base symbol.
    pub fn base(sym: VarSym) -> Self {
        Var {
            sym,
            tag: VarTag::Base,
        }
    }

    /// Sort of the variable.
    pub fn typ(self) -> Typ {
        factory::sym_typ(self.sym)
    }

    /// Base name of the variable, tag excluded.
    pub fn base_name(self) -> String {
        factory::sym_name(self.sym)
    }

    /// Writes the variable the way it goes to the solver.
    ///
    /// The tag mangling only uses characters legal in SMT-LIB simple
    /// symbols, and is parsed back by the model parser.
    pub fn write<W: Write>(self, w: &mut W) -> ::std::io::Result<()> {
        let name = self.base_name();
        match self.tag {
            VarTag::Base => write!(w, "{}", name),
            VarTag::At(v) => write!(w, "{}@{}", name, v),
            VarTag::Src(i) => write!(w, "{}!s{}", name, i),
            VarTag::Tgt => write!(w, "{}!t", name),
        }
    }
}
impl fmt::Display for Var {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = vec![];
        self.write(&mut buf).expect("writing to a vec cannot fail");
        fmt.write_str(::std::str::from_utf8(&buf).expect("variable names are utf8"))
    }
}
impl ::rsmt2::print::Sym2Smt<()> for Var {
    fn sym_to_smt2<Writer: Write>(&self, w: &mut Writer, _: ()) -> SmtRes<()> {
        self.write(w)?;
        Ok(())
    }
}

/// Operators.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Op {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Negation.
    Not,
    /// Implication.
    Impl,
    /// Equal to.
    Eql,
    /// Greater than or equal to.
    Ge,
    /// Greater than.
    Gt,
    /// Less than or equal to.
    Le,
    /// Less than.
    Lt,
    /// Addition.
    Add,
    /// Subtraction (or unary minus).
    Sub,
    /// Multiplication.
    Mul,
}
impl Op {
    /// String representation.
    pub fn as_str(self) -> &'static str {
        use self::Op::*;
        match self {
            And => "and",
            Or => "or",
            Not => "not",
            Impl => "=>",
            Eql => "=",
            Ge => ">=",
            Gt => ">",
            Le => "<=",
            Lt => "<",
            Add => "+",
            Sub => "-",
            Mul => "*",
        }
    }
}
impl fmt::Display for Op {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// A real term.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum RTerm {
    /// A variable.
    Var(Var),
    /// An integer.
    Int(Int),
    /// A boolean.
    Bool(bool),
    /// An operator application.
    App {
        /// The operator.
        op: Op,
        /// The arguments.
        args: Vec<Term>,
    },
}

/// A hashconsed term.
pub type Term = HConsed<RTerm>;

/// A value, as extracted from a solver model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Val {
    /// Boolean value.
    B(bool),
    /// Integer value.
    I(Int),
}
impl Val {
    /// The constant term denoting this value.
    pub fn to_term(&self) -> Term {
        match *self {
            Val::B(b) => bool(b),
            Val::I(ref i) => int(i.clone()),
        }
    }
}
impl fmt::Display for Val {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Val::B(b) => write!(fmt, "{}", b),
            Val::I(ref i) => write!(fmt, "{}", i),
        }
    }
}

impl fmt::Display for RTerm {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = vec![];
        self.write(&mut buf).expect("writing to a vec cannot fail");
        fmt.write_str(::std::str::from_utf8(&buf).expect("terms are utf8"))
    }
}

impl RTerm {
    /// Writes a term in SMT-LIB syntax.
    pub fn write<W: Write>(&self, w: &mut W) -> ::std::io::Result<()> {
        let mut stack = vec![(vec![self], "", "")];
        while let Some((mut to_do, sep, end)) = stack.pop() {
            if let Some(term) = to_do.pop() {
                stack.push((to_do, sep, end));
                match *term {
                    RTerm::Var(v) => {
                        write!(w, "{}", sep)?;
                        v.write(w)?
                    }
                    RTerm::Int(ref i) => {
                        use num::Signed;
                        write!(w, "{}", sep)?;
                        if i.is_negative() {
                            write!(w, "(- {})", -i)?
                        } else {
                            write!(w, "{}", i)?
                        }
                    }
                    RTerm::Bool(b) => write!(w, "{}{}", sep, b)?,
                    RTerm::App { op, ref args } => {
                        write!(w, "{}({}", sep, op)?;
                        stack.push((args.iter().rev().map(|t| t.get()).collect(), " ", ")"))
                    }
                }
            } else {
                w.write_all(end.as_bytes())?
            }
        }
        Ok(())
    }

    /// The boolean value of the term, if it is a boolean literal.
    pub fn bool(&self) -> Option<bool> {
        match *self {
            RTerm::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The integer value of the term, if it is an integer literal.
    pub fn int(&self) -> Option<Int> {
        match *self {
            RTerm::Int(ref i) => Some(i.clone()),
            _ => None,
        }
    }

    /// The variable of the term, if it is a variable.
    pub fn var(&self) -> Option<Var> {
        match *self {
            RTerm::Var(v) => Some(v),
            _ => None,
        }
    }
}

/// Extension trait bringing term-level helpers to the hashconsed handle.
pub trait TermExt {
    /// True if the term is the canonical truth constant.
    fn is_true(&self) -> bool;
    /// True if the term is the canonical falsehood constant.
    fn is_false(&self) -> bool;
    /// The conjuncts of the term: its arguments if it is a conjunction,
    /// the term itself otherwise.
    fn conjuncts(&self) -> Vec<Term>;
    /// Applies a simultaneous substitution.
    fn subst(&self, map: &VarHMap<Term>) -> Term;
    /// Rebuilds the term, mapping every variable.
    fn map_vars<F: Fn(Var) -> Var>(&self, f: F) -> Term;
}
impl TermExt for Term {
    fn is_true(&self) -> bool {
        *self == tru()
    }
    fn is_false(&self) -> bool {
        *self == fls()
    }

    fn conjuncts(&self) -> Vec<Term> {
        match *self.get() {
            RTerm::App {
                op: Op::And,
                ref args,
            } => args.clone(),
            _ => vec![self.clone()],
        }
    }

    fn subst(&self, map: &VarHMap<Term>) -> Term {
        if map.is_empty() {
            return self.clone();
        }
        match *self.get() {
            RTerm::Var(v) => {
                if let Some(term) = map.get(&v) {
                    term.clone()
                } else {
                    self.clone()
                }
            }
            RTerm::Int(_) | RTerm::Bool(_) => self.clone(),
            RTerm::App { op, ref args } => {
                let args = args.iter().map(|arg| arg.subst(map)).collect();
                app(op, args)
            }
        }
    }

    fn map_vars<F: Fn(Var) -> Var>(&self, f: F) -> Term {
        fn go<F: Fn(Var) -> Var>(term: &Term, f: &F) -> Term {
            match *term.get() {
                RTerm::Var(v) => {
                    let img = f(v);
                    if img == v {
                        term.clone()
                    } else {
                        var(img)
                    }
                }
                RTerm::Int(_) | RTerm::Bool(_) => term.clone(),
                RTerm::App { op, ref args } => {
                    let args = args.iter().map(|arg| go(arg, f)).collect();
                    app(op, args)
                }
            }
        }
        go(self, &f)
    }
}

/// Builds the substitution mapping one variable tuple to another.
///
/// Both tuples must be variable terms of the same length; this is the
/// `mapFromPredicate` workhorse of label rewriting.
pub fn tuple_subst(from: &[Term], to: &[Term]) -> VarHMap<Term> {
    debug_assert_eq! { from.len(), to.len() }
    let mut map = VarHMap::with_capacity(from.len());
    for (src, tgt) in from.iter().zip(to.iter()) {
        let src = src.get().var().expect("tuple_subst expects variable tuples");
        let _prev = map.insert(src, tgt.clone());
        debug_assert! { _prev.is_none() }
    }
    map
}
