//! Global configuration.

use std::path::PathBuf;

use ansi_term::{Colour, Style};
use clap::Arg;

use crate::errors::*;

/// Clap `App` with static lifetimes.
pub type App = ::clap::App<'static, 'static>;
/// Clap `ArgMatches` with static lifetime.
pub type Matches = ::clap::ArgMatches<'static>;

/// Validates boolean arguments.
fn bool_validator(s: String) -> Result<(), String> {
    match s.as_str() {
        "on" | "true" | "off" | "false" => Ok(()),
        _ => Err(format!("expected `on/true` or `off/false`, got `{}`", s)),
    }
}

/// Validates integer arguments.
fn int_validator(s: String) -> Result<(), String> {
    match s.parse::<usize>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("expected integer, got `{}`", s)),
    }
}

/// Boolean value of a flag in some matches.
fn bool_of_matches(matches: &Matches, key: &str) -> bool {
    matches
        .value_of(key)
        .map(|s| s == "on" || s == "true")
        .expect("unreachable: default is provided")
}

/// Integer value of a flag in some matches.
fn int_of_matches(matches: &Matches, key: &str) -> usize {
    matches
        .value_of(key)
        .map(|s| s.parse().expect("unreachable: validated"))
        .expect("unreachable: default is provided")
}

/// Solver configuration.
pub struct SmtConf {
    /// Command used to spawn z3.
    pub z3_cmd: String,
    /// Directory the solver traces are mirrored into, if any.
    pub log_dir: Option<PathBuf>,
}

impl SmtConf {
    /// Adds its clap options to an app.
    pub fn add_args(app: App) -> App {
        app.arg(
            Arg::with_name("z3_cmd")
                .long("--z3")
                .help("sets the command used to call z3")
                .default_value("z3")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("smt_log")
                .long("--smt_log")
                .help("mirrors the solver traces to this directory")
                .value_name("DIR")
                .takes_value(true),
        )
    }

    /// Creates itself from some matches.
    pub fn new(matches: &Matches) -> Self {
        let z3_cmd = matches
            .value_of("z3_cmd")
            .expect("unreachable: default is provided")
            .to_string();
        let log_dir = matches.value_of("smt_log").map(PathBuf::from);
        SmtConf { z3_cmd, log_dir }
    }

    /// Actual `rsmt2` solver configuration.
    pub fn conf(&self) -> ::rsmt2::SmtConf {
        let mut conf = ::rsmt2::SmtConf::z3(self.z3_cmd.clone());
        conf.models();
        conf
    }

    /// Spawns a solver.
    ///
    /// The `name` identifies the trace file when smt logging is active.
    pub fn spawn<Parser>(&self, name: &str, parser: Parser) -> Res<::rsmt2::Solver<Parser>> {
        let mut solver =
            ::rsmt2::Solver::new(self.conf(), parser).chain_err(|| ErrorKind::Z3SpawnError)?;
        if let Some(dir) = self.log_dir.as_ref() {
            ::std::fs::DirBuilder::new()
                .recursive(true)
                .create(dir)
                .chain_err(|| format!("while creating smt log directory `{}`", dir.display()))?;
            let mut path = dir.clone();
            path.push(name);
            path.set_extension("smt2");
            solver
                .path_tee(path)
                .chain_err(|| "while setting up solver tee")?
        }
        Ok(solver)
    }

    /// True if the configured z3 command can be spawned.
    ///
    /// Used by tests to stay green on solver-less machines.
    pub fn z3_available(&self) -> bool {
        ::std::process::Command::new(&self.z3_cmd)
            .arg("-version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

/// The global configuration.
pub struct Config {
    /// Verbosity level.
    pub verb: usize,
    /// Compute witnesses for safe/unsafe answers.
    pub witness: bool,
    /// Bound on the k-induction loop.
    pub max_k: usize,
    /// Bound on the accelerated engines' level loop.
    pub max_level: usize,
    /// Solver configuration.
    pub solver: SmtConf,
    /// Colored output flag.
    color: bool,
}

impl Config {
    /// Creates the configuration from the process arguments.
    ///
    /// Falls back to default values when the arguments cannot be parsed,
    /// so that the library stays usable under foreign harnesses.
    pub fn clap() -> Self {
        match Self::app().get_matches_safe() {
            Ok(matches) => Self::new(&matches),
            Err(_) => Self::new(&Self::app().get_matches_from(vec!["hornbeam"])),
        }
    }

    /// The clap application.
    fn app() -> App {
        let app = App::new("hornbeam")
            .version(crate_version!())
            .about("Solver core for Constrained Horn Clause verification.")
            .arg(
                Arg::with_name("verb")
                    .short("v")
                    .multiple(true)
                    .help("increases verbosity"),
            )
            .arg(
                Arg::with_name("witness")
                    .long("--witness")
                    .help("(de)activates witness computation")
                    .validator(bool_validator)
                    .value_name("bool")
                    .default_value("on")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("max_k")
                    .long("--max_k")
                    .help("bound on the k-induction loop")
                    .validator(int_validator)
                    .value_name("int")
                    .default_value("18446744073709551615")
                    .takes_value(true),
            )
            .arg(
                Arg::with_name("max_level")
                    .long("--max_level")
                    .help("bound on the accelerated engines' level loop")
                    .validator(int_validator)
                    .value_name("int")
                    .default_value("18446744073709551615")
                    .takes_value(true),
            );
        SmtConf::add_args(app)
    }

    /// Creates itself from some matches.
    fn new(matches: &Matches) -> Self {
        let verb = matches.occurrences_of("verb") as usize;
        let witness = bool_of_matches(matches, "witness");
        let max_k = int_of_matches(matches, "max_k");
        let max_level = int_of_matches(matches, "max_level");
        let solver = SmtConf::new(matches);
        let color = atty::is(atty::Stream::Stdout);
        Config {
            verb,
            witness,
            max_k,
            max_level,
            solver,
            color,
        }
    }

    /// Styles some text as emphasized.
    pub fn emph<S: AsRef<str>>(&self, s: S) -> String {
        if self.color {
            format!("{}", Style::new().bold().paint(s.as_ref().to_string()))
        } else {
            s.as_ref().to_string()
        }
    }
    /// Styles some text as bad.
    pub fn bad<S: AsRef<str>>(&self, s: S) -> String {
        if self.color {
            format!("{}", Colour::Red.bold().paint(s.as_ref().to_string()))
        } else {
            s.as_ref().to_string()
        }
    }
    /// Styles some text as good.
    pub fn happy<S: AsRef<str>>(&self, s: S) -> String {
        if self.color {
            format!("{}", Colour::Green.bold().paint(s.as_ref().to_string()))
        } else {
            s.as_ref().to_string()
        }
    }
}
