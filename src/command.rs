//! Line-oriented command driver.
//!
//! Reads one instruction per line and applies it to a [`TreeIndex`]:
//!
//! ```text
//! Initialize(3)
//! Insert(21, 0.3)
//! Delete(21)
//! Search(21)          -> value, or Null
//! Search(10, 200)     -> values joined by ','
//! ```
//!
//! A bad line never stops the run. It is reported to the diagnostics sink as
//! `{error}. Operation is ignored. Line: {n}` and processing moves on.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::common::{Error, Key, Order, Result, Value};
use crate::index::TreeIndex;

/// Instruction names recognised by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Initialize,
    Insert,
    Delete,
    Search,
}

impl Verb {
    fn from_token(token: &str) -> Result<Self> {
        match token {
            "Initialize" => Ok(Verb::Initialize),
            "Insert" => Ok(Verb::Insert),
            "Delete" => Ok(Verb::Delete),
            "Search" => Ok(Verb::Search),
            other => Err(Error::MalformedCommand {
                reason: format!("unknown instruction {:?}", other),
            }),
        }
    }

    /// Every verb except `Initialize` needs an existing tree.
    fn needs_tree(self) -> bool {
        self != Verb::Initialize
    }
}

/// A parsed instruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Raw branching factor; validated when the tree is created.
    Initialize(i64),
    Insert(Key, Value),
    Delete(Key),
    Search(Key),
    SearchRange(Key, Key),
}

impl Command {
    /// Parse a single line. Blank lines parse to `None`.
    ///
    /// # Errors
    /// - `Error::MalformedCommand` for an unknown verb or wrong arity
    /// - `Error::InvalidNumber` for an unparsable key, value or order
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let tokens = tokenize(line);
        let Some((&verb, args)) = tokens.split_first() else {
            return Ok(None);
        };
        Command::from_tokens(Verb::from_token(verb)?, args).map(Some)
    }

    fn from_tokens(verb: Verb, args: &[&str]) -> Result<Command> {
        match (verb, args) {
            (Verb::Initialize, [order]) => Ok(Command::Initialize(parse_number(order)?)),
            (Verb::Insert, [key, value]) => Ok(Command::Insert(parse_number(key)?, parse_number(value)?)),
            (Verb::Delete, [key]) => Ok(Command::Delete(parse_number(key)?)),
            (Verb::Search, [key]) => Ok(Command::Search(parse_number(key)?)),
            (Verb::Search, [low, high]) => Ok(Command::SearchRange(parse_number(low)?, parse_number(high)?)),
            (verb, args) => Err(Error::MalformedCommand {
                reason: format!("{:?} does not take {} argument(s)", verb, args.len()),
            }),
        }
    }
}

/// Split on `(`, `,` and `)`, trim each token and drop trailing empties.
fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = line.split(['(', ',', ')']).map(str::trim).collect();
    while tokens.last().is_some_and(|token| token.is_empty()) {
        tokens.pop();
    }
    tokens
}

fn parse_number<T: std::str::FromStr>(token: &str) -> Result<T> {
    token.parse().map_err(|_| Error::InvalidNumber {
        token: token.to_string(),
    })
}

/// Counts from one driver run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines that ran successfully.
    pub executed: u64,
    /// Lines reported to diagnostics and skipped.
    pub rejected: u64,
    /// Non-blank lines seen.
    pub lines: u64,
}

/// Drives a [`TreeIndex`] from a stream of instructions.
pub struct Driver {
    index: TreeIndex,
}

impl Driver {
    pub fn new() -> Self {
        Self {
            index: TreeIndex::new(),
        }
    }

    /// The index instructions are applied to.
    pub fn index(&self) -> &TreeIndex {
        &self.index
    }

    /// Apply one line. Returns the text to print for a search.
    ///
    /// # Errors
    /// Any error here rejects the line; the caller reports it and moves on.
    pub fn execute_line(&self, line: &str) -> Result<Option<String>> {
        let tokens = tokenize(line);
        let Some((&verb, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let verb = Verb::from_token(verb)?;
        // Checked before arity so an early Search reports the missing tree.
        if verb.needs_tree() && !self.index.is_initialized() && !self.index.is_poisoned() {
            return Err(Error::NotInitialized);
        }
        self.execute(Command::from_tokens(verb, args)?)
    }

    pub fn execute(&self, command: Command) -> Result<Option<String>> {
        match command {
            Command::Initialize(m) => {
                self.index.initialize(Order::try_from(m)?)?;
                Ok(None)
            }
            Command::Insert(key, value) => {
                self.index.insert(key, value)?;
                Ok(None)
            }
            Command::Delete(key) => {
                self.index.delete(key)?;
                Ok(None)
            }
            Command::Search(key) => Ok(Some(match self.index.get(key)? {
                Some(value) => format!("{:?}", value),
                None => "Null".to_string(),
            })),
            Command::SearchRange(low, high) => {
                let values = self.index.range(low, high)?;
                Ok(Some(
                    values
                        .iter()
                        .map(|value| format!("{:?}", value))
                        .collect::<Vec<_>>()
                        .join(","),
                ))
            }
        }
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

/// Run every line of `input`, writing search results to `output` and
/// rejected lines to `diagnostics`.
///
/// # Errors
/// Only I/O failures on the three streams abort the run.
pub fn run<R: BufRead, W: Write, D: Write>(input: R, mut output: W, mut diagnostics: D) -> Result<RunSummary> {
    let driver = Driver::new();
    let mut summary = RunSummary::default();

    for (line_number, line) in (1u64..).zip(input.lines()) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        summary.lines += 1;

        match driver.execute_line(&line) {
            Ok(printed) => {
                summary.executed += 1;
                if let Some(text) = printed {
                    writeln!(output, "{}", text)?;
                }
            }
            Err(e) => {
                summary.rejected += 1;
                warn!(line = line_number, error = %e, "instruction rejected");
                writeln!(diagnostics, "{}. Operation is ignored. Line: {}", e, line_number)?;
            }
        }
    }

    output.flush()?;
    debug!(executed = summary.executed, rejected = summary.rejected, "run finished");
    Ok(summary)
}

/// Run the instructions in the file at `input`, writing results to a new
/// file at `output` and diagnostics to stderr.
///
/// # Errors
/// `Error::Io` if either file cannot be opened or written.
pub fn run_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<RunSummary> {
    let reader = BufReader::new(File::open(input)?);
    let writer = BufWriter::new(File::create(output)?);
    run(reader, writer, io::stderr().lock())
}
