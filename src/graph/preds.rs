//! Predicate symbols and their canonical variable tuples.
//!
//! Each predicate symbol has a fixed signature. For the linear graphs, a
//! symbol's canonical representation is a tuple of version-0 variables (the
//! *state tuple*), the next-state tuple being its shift by one. For the
//! hypergraphs, the canonical tuple is unversioned and every use goes
//! through a *source occurrence* or *target* renaming, so that distinct
//! occurrences of a symbol in one hyperedge live in disjoint namespaces.

use crate::common::*;
use crate::term::version;

/// Information about one predicate symbol.
#[derive(Clone, Debug)]
pub struct PredInfo {
    /// Name.
    pub name: String,
    /// Argument sorts.
    pub sig: Vec<Typ>,
}

/// The predicate symbol table of a graph.
///
/// The first two symbols are the sentinels: `entry` is the truth constant
/// (no incoming edges), `exit` the falsehood constant (no outgoing edges).
/// Both are nullary.
#[derive(Clone, Debug)]
pub struct Preds {
    /// Symbol infos.
    infos: SymMap<PredInfo>,
}

impl Preds {
    /// A fresh table holding only the sentinels.
    pub fn new() -> Self {
        let mut infos = SymMap::with_capacity(7);
        let _entry = infos.push(PredInfo {
            name: "true".into(),
            sig: vec![],
        });
        let _exit = infos.push(PredInfo {
            name: "false".into(),
            sig: vec![],
        });
        debug_assert_eq! { _entry.get(), 0 }
        debug_assert_eq! { _exit.get(), 1 }
        Preds { infos }
    }

    /// The entry sentinel, the truth constant.
    pub fn entry(&self) -> SymIdx {
        0.into()
    }
    /// The exit sentinel, the falsehood constant.
    pub fn exit(&self) -> SymIdx {
        1.into()
    }

    /// Registers a predicate symbol.
    pub fn add<S: Into<String>>(&mut self, name: S, sig: Vec<Typ>) -> SymIdx {
        self.infos.push(PredInfo {
            name: name.into(),
            sig,
        })
    }

    /// Name of a symbol.
    pub fn name(&self, sym: SymIdx) -> &str {
        &self.infos[sym].name
    }
    /// Signature of a symbol.
    pub fn sig(&self, sym: SymIdx) -> &[Typ] {
        &self.infos[sym].sig
    }
    /// Arity of a symbol.
    pub fn arity(&self, sym: SymIdx) -> usize {
        self.infos[sym].sig.len()
    }

    /// Iterator over all symbols.
    pub fn indices(&self) -> impl Iterator<Item = SymIdx> {
        self.infos.indices()
    }

    /// The canonical base variables of a symbol, unversioned.
    ///
    /// Base names embed the symbol name and the argument position, which
    /// keeps tuples of distinct symbols disjoint.
    pub fn base_vars(&self, sym: SymIdx) -> Vec<Var> {
        let info = &self.infos[sym];
        info.sig
            .iter()
            .enumerate()
            .map(|(pos, typ)| Var::base(term::var_sym(format!("{}.{}", info.name, pos), *typ)))
            .collect()
    }
}

impl Var {
    /// Strips any namespace or version, back to the base variable.
    pub fn to_base(self) -> Var {
        Var {
            sym: self.sym,
            tag: VarTag::Base,
        }
    }
    /// The `instance`-th source-occurrence renaming of a base variable.
    pub fn to_source(self, instance: usize) -> Var {
        debug_assert_eq! { self.tag, VarTag::Base }
        Var {
            sym: self.sym,
            tag: VarTag::Src(instance),
        }
    }
    /// The target renaming of a base variable.
    pub fn to_target(self) -> Var {
        debug_assert_eq! { self.tag, VarTag::Base }
        Var {
            sym: self.sym,
            tag: VarTag::Tgt,
        }
    }
}

/// Linear canonical representation: one version-0 state tuple per symbol.
#[derive(Clone, Debug)]
pub struct LinearRepr {
    /// State tuples, all variables at version 0.
    state: SymHMap<Vec<Term>>,
}

impl LinearRepr {
    /// Empty representation.
    pub fn new() -> Self {
        LinearRepr {
            state: SymHMap::new(),
        }
    }

    /// The canonical representation of a symbol table.
    pub fn of_preds(preds: &Preds) -> Self {
        let mut repr = Self::new();
        for sym in preds.indices() {
            let vars = preds
                .base_vars(sym)
                .into_iter()
                .map(|v| term::var(v.version_zero()))
                .collect();
            repr.add_representation(sym, vars);
        }
        repr
    }

    /// Registers the state tuple of a symbol.
    ///
    /// All variables must be at version 0.
    pub fn add_representation(&mut self, sym: SymIdx, vars: Vec<Term>) {
        debug_assert! {
            vars.iter().all(
                |v| v.get().var().map(|v| v.version() == Some(0)).unwrap_or(false)
            )
        }
        let _prev = self.state.insert(sym, vars);
        debug_assert! { _prev.is_none() }
    }

    /// State tuple of a symbol (version 0).
    pub fn state_tuple(&self, sym: SymIdx) -> &[Term] {
        &self.state[&sym]
    }

    /// The symbols with a representation, sorted.
    pub fn syms(&self) -> Vec<SymIdx> {
        let mut syms: Vec<_> = self.state.keys().cloned().collect();
        syms.sort();
        syms
    }

    /// Next-state tuple of a symbol (version 1).
    pub fn next_tuple(&self, sym: SymIdx) -> Vec<Term> {
        self.state[&sym]
            .iter()
            .map(|t| version::shift(t, 1))
            .collect()
    }
}

/// Nonlinear canonical representation: an unversioned base tuple per
/// symbol, used through source-occurrence and target renamings.
#[derive(Clone, Debug)]
pub struct NonlinearRepr {
    /// Base tuples, all variables unversioned.
    base: SymHMap<Vec<Term>>,
}

impl NonlinearRepr {
    /// Empty representation.
    pub fn new() -> Self {
        NonlinearRepr {
            base: SymHMap::new(),
        }
    }

    /// The canonical representation of a symbol table.
    pub fn of_preds(preds: &Preds) -> Self {
        let mut repr = Self::new();
        for sym in preds.indices() {
            let vars = preds
                .base_vars(sym)
                .into_iter()
                .map(term::var)
                .collect();
            repr.add_representation(sym, vars);
        }
        repr
    }

    /// Registers the base tuple of a symbol.
    ///
    /// All variables must be unversioned.
    pub fn add_representation(&mut self, sym: SymIdx, vars: Vec<Term>) {
        debug_assert! {
            vars.iter().all(
                |v| v.get().var().map(|v| v.tag == VarTag::Base).unwrap_or(false)
            )
        }
        let _prev = self.base.insert(sym, vars);
        debug_assert! { _prev.is_none() }
    }

    /// Base tuple of a symbol.
    pub fn base_tuple(&self, sym: SymIdx) -> &[Term] {
        &self.base[&sym]
    }

    /// The symbols with a representation, sorted.
    pub fn syms(&self) -> Vec<SymIdx> {
        let mut syms: Vec<_> = self.base.keys().cloned().collect();
        syms.sort();
        syms
    }

    /// Source tuple of the `instance`-th occurrence of a symbol.
    pub fn source_tuple(&self, sym: SymIdx, instance: usize) -> Vec<Term> {
        self.base[&sym]
            .iter()
            .map(|t| {
                let v = t.get().var().expect("base tuples hold variables");
                term::var(v.to_source(instance))
            })
            .collect()
    }

    /// Target tuple of a symbol.
    pub fn target_tuple(&self, sym: SymIdx) -> Vec<Term> {
        self.base[&sym]
            .iter()
            .map(|t| {
                let v = t.get().var().expect("base tuples hold variables");
                term::var(v.to_target())
            })
            .collect()
    }
}
