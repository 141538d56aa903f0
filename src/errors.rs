//! Error types.
//!
//! Two kinds deserve a mention:
//!
//! - [`ErrorKind::GraphShape`][shape]: a structural operation was attempted
//!   on a graph of an incompatible shape (normalizing a true hypergraph,
//!   contracting through a hyperedge, ...). Transformations surface these
//!   to the caller, they never swallow them.
//! - [`ErrorKind::SmtUnknown`][unk]: the backend solver gave up on a check.
//!   Engines catch this one and turn it into an `Unknown` verification
//!   answer instead of crashing.
//!
//! [shape]: enum.ErrorKind.html#variant.GraphShape
//! (GraphShape variant of the ErrorKind enum)
//! [unk]: enum.ErrorKind.html#variant.SmtUnknown
//! (SmtUnknown variant of the ErrorKind enum)

error_chain! {
    types {
        Error, ErrorKind, ResultExt, Res;
    }

    links {
        SmtError(
            ::rsmt2::errors::Error, ::rsmt2::errors::ErrorKind
        ) #[doc = "Error at SMT level."];
    }

    foreign_links {
        Io(::std::io::Error) #[doc = "IO error."];
    }

    errors {
        #[doc = "Operation attempted on an incompatible graph shape."]
        GraphShape(blah: String) {
            description("illegal operation for this graph shape")
            display("{}", blah)
        }
        #[doc = "Input the engine refuses by contract."]
        Unsupported(blah: String) {
            description("unsupported feature")
            display("unsupported: {}", blah)
        }
        #[doc = "The solver answered `unknown` on a check."]
        SmtUnknown {
            description("smt solver answered unknown")
            display("smt solver answered unknown")
        }
        #[doc = "Could not spawn z3."]
        Z3SpawnError {
            description("could not spawn z3")
            display("could not spawn z3")
        }
    }
}

impl Error {
    /// True if the kind of the error is [`ErrorKind::SmtUnknown`][unk].
    ///
    /// [unk]: enum.ErrorKind.html#variant.SmtUnknown
    /// (ErrorKind's SmtUnknown variant)
    pub fn is_smt_unknown(&self) -> bool {
        match *self.kind() {
            ErrorKind::SmtUnknown => true,
            _ => false,
        }
    }

    /// True if the kind of the error is [`ErrorKind::Unsupported`][uns].
    ///
    /// [uns]: enum.ErrorKind.html#variant.Unsupported
    /// (ErrorKind's Unsupported variant)
    pub fn is_unsupported(&self) -> bool {
        match *self.kind() {
            ErrorKind::Unsupported(_) => true,
            _ => false,
        }
    }
}

/// Prints an error.
pub fn print_err(errs: &Error) {
    println!("({} \"", crate::common::conf.bad("error"));
    for err in errs.iter() {
        for line in format!("{}", err).lines() {
            println!("  {}", line)
        }
    }
    println!("\")")
}
