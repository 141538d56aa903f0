//! SMT-related zero-cost wrappers.

use rsmt2::parse::{IdentParser, ModelParser, SmtParser, ValueParser};
use rsmt2::print::Expr2Smt;
use rsmt2::Solver;

use crate::common::*;
use crate::term::VarTag;

/// SMT-prints a term.
pub struct SmtTerm<'a> {
    /// The term.
    pub term: &'a Term,
}
impl<'a> SmtTerm<'a> {
    /// Constructor.
    pub fn new(term: &'a Term) -> Self {
        SmtTerm { term }
    }
}
impl<'a> Expr2Smt<()> for SmtTerm<'a> {
    fn expr_to_smt2<Writer: Write>(&self, w: &mut Writer, _: ()) -> SmtRes<()> {
        self.term.get().write(w)?;
        Ok(())
    }
}

/// Parser for the output of the SMT solver.
///
/// Parses the crate's variable mangling back into `Var` values and constant
/// values into `Val`.
#[derive(Clone, Copy)]
pub struct FullParser;

impl<'a> IdentParser<Var, Typ, &'a str> for FullParser {
    fn parse_ident(self, input: &'a str) -> SmtRes<Var> {
        match parse_var(input) {
            Some(var) => Ok(var),
            None => bail!("could not parse model ident `{}`", input),
        }
    }
    fn parse_type(self, input: &'a str) -> SmtRes<Typ> {
        match input {
            "Int" => Ok(Typ::Int),
            "Bool" => Ok(Typ::Bool),
            _ => bail!("unexpected sort `{}` in model", input),
        }
    }
}

/// Parses a constant value off the solver output.
fn parse_val<Br>(input: &mut SmtParser<Br>) -> SmtRes<Val>
where
    Br: ::std::io::BufRead,
{
    use std::str::FromStr;
    if let Some(val) = input.try_int::<_, _, ::num::bigint::ParseBigIntError>(|int, pos| {
        let int = Int::from_str(int)?;
        Ok(if !pos { -int } else { int })
    })? {
        Ok(Val::I(val))
    } else if let Some(val) = input.try_bool()? {
        Ok(Val::B(val))
    } else {
        input.fail_with("unexpected value")
    }
}

impl<'a, Br> ValueParser<Val, &'a mut SmtParser<Br>> for FullParser
where
    Br: ::std::io::BufRead,
{
    fn parse_value(self, input: &'a mut SmtParser<Br>) -> SmtRes<Val> {
        parse_val(input)
    }
}

impl<'a, Br> ModelParser<Var, Typ, Val, &'a mut SmtParser<Br>> for FullParser
where
    Br: ::std::io::BufRead,
{
    fn parse_value(
        self,
        input: &'a mut SmtParser<Br>,
        _: &Var,
        _: &[(Var, Typ)],
        _: &Typ,
    ) -> SmtRes<Val> {
        parse_val(input)
    }
}

/// Parses a mangled variable name back into a `Var`.
fn parse_var(input: &str) -> Option<Var> {
    let (name, tag) = if let Some(pos) = input.find('@') {
        let version: i32 = input[pos + 1..].parse().ok()?;
        (&input[..pos], VarTag::At(version))
    } else if let Some(pos) = input.find("!s") {
        let instance: usize = input[pos + 2..].parse().ok()?;
        (&input[..pos], VarTag::Src(instance))
    } else if input.ends_with("!t") {
        (&input[..input.len() - 2], VarTag::Tgt)
    } else {
        (input, VarTag::Base)
    };
    let sym = term::find_var_sym(name)?;
    Some(Var { sym, tag })
}

/// An incremental solver context tracking declarations per scope.
///
/// Declarations made inside a `push`ed scope disappear with its `pop`, so
/// the context mirrors the solver's scoping to declare each shifted
/// variable exactly once per scope.
pub struct SmtCtx {
    /// Underlying solver.
    solver: Solver<FullParser>,
    /// Variables declared and still in scope.
    declared: VarSet,
    /// Declarations made in each open scope.
    frames: Vec<Vec<Var>>,
}

impl SmtCtx {
    /// Spawns a solver context.
    pub fn new(name: &str) -> Res<Self> {
        let solver = conf.solver.spawn(name, FullParser)?;
        Ok(SmtCtx {
            solver,
            declared: VarSet::new(),
            frames: vec![],
        })
    }

    /// Declares the variables of a term that are not declared yet.
    fn declare(&mut self, term: &Term) -> Res<()> {
        let mut vars: Vec<Var> = term::vars(term)
            .into_iter()
            .filter(|v| !self.declared.contains(v))
            .collect();
        vars.sort();
        for var in vars {
            self.solver
                .declare_const(&var, &var.typ())
                .chain_err(|| format!("while declaring `{}`", var))?;
            self.declared.insert(var);
            if let Some(frame) = self.frames.last_mut() {
                frame.push(var)
            }
        }
        Ok(())
    }

    /// Asserts a term, declaring its variables first.
    pub fn assert(&mut self, term: &Term) -> Res<()> {
        self.declare(term)?;
        self.solver
            .assert(&SmtTerm::new(term))
            .chain_err(|| "while asserting formula")?;
        Ok(())
    }

    /// Opens a scope.
    pub fn push(&mut self) -> Res<()> {
        self.solver.push(1)?;
        self.frames.push(vec![]);
        Ok(())
    }

    /// Closes the innermost scope, forgetting its declarations.
    pub fn pop(&mut self) -> Res<()> {
        self.solver.pop(1)?;
        if let Some(frame) = self.frames.pop() {
            for var in frame {
                self.declared.remove(&var);
            }
        }
        Ok(())
    }

    /// Satisfiability of the current assertions.
    ///
    /// An `unknown` from the solver surfaces as [`ErrorKind::SmtUnknown`],
    /// which the engines turn into an `Unknown` answer.
    ///
    /// [`ErrorKind::SmtUnknown`]: ../../errors/enum.ErrorKind.html#variant.SmtUnknown
    /// (SmtUnknown variant of the ErrorKind enum)
    pub fn check_sat(&mut self) -> Res<bool> {
        match self.solver.check_sat_or_unk()? {
            Some(res) => Ok(res),
            None => bail!(ErrorKind::SmtUnknown),
        }
    }

    /// Model of the last `sat` check, restricted to declared constants.
    pub fn model(&mut self) -> Res<Vec<(Var, Val)>> {
        let model = self.solver.get_model()?;
        Ok(model
            .into_iter()
            .filter(|&(_, ref args, _, _)| args.is_empty())
            .map(|(var, _, _, val)| (var, val))
            .collect())
    }

    /// Kills the underlying solver.
    pub fn kill(mut self) -> Res<()> {
        self.solver.kill().chain_err(|| "while killing solver")?;
        Ok(())
    }
}
