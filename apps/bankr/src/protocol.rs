//! Text input format for snapshots and worker jobs
//!
//! Everything is whitespace-delimited, so line breaks are cosmetic. A
//! snapshot is `P R`, then `R` available counts, then `P` allocation rows and
//! `P` max rows of `R` counts each. A worker job prefixes the snapshot with
//! a command keyword and may append command arguments.

use bankr_engine::ResourceRequest;
use bankr_errors::InputError;
use bankr_types::{check_dimension, StateLimits, SystemState};
use std::iter::Peekable;
use std::str::{FromStr, SplitWhitespace};

/// Worker command keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Detect,
    Rag,
    Resolve,
    Simulate,
    Step,
}

impl Command {
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Detect => "DETECT",
            Self::Rag => "RAG",
            Self::Resolve => "RESOLVE",
            Self::Simulate => "SIMULATE",
            Self::Step => "STEP",
        }
    }
}

impl FromStr for Command {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Detect,
            Self::Rag,
            Self::Resolve,
            Self::Simulate,
            Self::Step,
        ]
        .into_iter()
        .find(|command| command.keyword() == s)
        .ok_or_else(|| InputError::UnknownCommand {
            command: s.to_string(),
        })
    }
}

/// Request line of a SIMULATE job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestArg {
    /// Fewer than three numbers followed the snapshot
    Missing,
    /// Three numbers were given but at least one was negative
    OutOfRange,
    Request(ResourceRequest),
}

/// One parsed worker job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub command: Command,
    pub state: SystemState,
    /// RESOLVE only: explicit victim, `None` for automatic selection
    pub victim: Option<usize>,
    /// SIMULATE only
    pub request: Option<RequestArg>,
}

/// Token cursor that remembers its 1-based position for error messages
struct Tokens<'a> {
    inner: Peekable<SplitWhitespace<'a>>,
    position: usize,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            inner: input.split_whitespace().peekable(),
            position: 0,
        }
    }

    fn next_token(&mut self, expected: &str) -> Result<&'a str, InputError> {
        let token = self.inner.next().ok_or_else(|| InputError::UnexpectedEof {
            expected: expected.to_string(),
        })?;
        self.position += 1;
        Ok(token)
    }

    fn next_number<T: FromStr>(&mut self, expected: &str) -> Result<T, InputError> {
        let token = self.next_token(expected)?;
        token.parse().map_err(|_| InputError::Parse {
            position: self.position,
            expected: expected.to_string(),
            found: token.to_string(),
        })
    }

    /// Trailing command argument; a token that is not an integer ends the arguments
    fn next_argument(&mut self) -> Option<i64> {
        let value = self.inner.next_if(|token| token.parse::<i64>().is_ok())?;
        self.position += 1;
        value.parse().ok()
    }

    fn next_row(&mut self, len: usize, expected: &str) -> Result<Vec<u32>, InputError> {
        (0..len).map(|_| self.next_number(expected)).collect()
    }
}

fn read_state(tokens: &mut Tokens<'_>, limits: &StateLimits) -> Result<SystemState, InputError> {
    let num_processes: usize = tokens.next_number("number of processes")?;
    let num_resources: usize = tokens.next_number("number of resources")?;
    // Checked before any matrix is allocated.
    check_dimension("num_processes", num_processes, limits.max_processes)?;
    check_dimension("num_resources", num_resources, limits.max_resources)?;

    let available = tokens.next_row(num_resources, "available count")?;
    let allocation = (0..num_processes)
        .map(|_| tokens.next_row(num_resources, "allocation count"))
        .collect::<Result<Vec<_>, _>>()?;
    let max_need = (0..num_processes)
        .map(|_| tokens.next_row(num_resources, "max_need count"))
        .collect::<Result<Vec<_>, _>>()?;

    let state = SystemState::new(available, allocation, max_need)?;
    state.validate(limits)?;
    Ok(state)
}

/// Parse a bare snapshot. Trailing tokens are ignored.
///
/// # Errors
///
/// Returns an [`InputError`] for unparseable or negative numbers, truncated
/// input, dimensions outside `limits`, or `allocation > max_need`.
pub fn parse_state(input: &str, limits: &StateLimits) -> Result<SystemState, InputError> {
    read_state(&mut Tokens::new(input), limits)
}

/// Parse a worker job: keyword, snapshot, then command arguments.
///
/// The keyword is checked only after the snapshot has been read.
///
/// # Errors
///
/// Returns [`InputError::MissingCommand`] on empty input,
/// [`InputError::UnknownCommand`] for an unrecognised keyword, and any
/// snapshot error from [`parse_state`].
pub fn parse_job(input: &str, limits: &StateLimits) -> Result<Job, InputError> {
    let mut tokens = Tokens::new(input);
    let keyword = tokens
        .next_token("command")
        .map_err(|_| InputError::MissingCommand)?;
    let state = read_state(&mut tokens, limits)?;
    let command = keyword.parse::<Command>()?;

    let mut job = Job {
        command,
        state,
        victim: None,
        request: None,
    };
    match command {
        Command::Resolve => job.victim = read_victim(&mut tokens),
        Command::Simulate => job.request = Some(read_request(&mut tokens)),
        Command::Detect | Command::Rag | Command::Step => {}
    }
    Ok(job)
}

/// Absent, non-numeric or negative means automatic selection
fn read_victim(tokens: &mut Tokens<'_>) -> Option<usize> {
    tokens
        .next_argument()
        .and_then(|victim| usize::try_from(victim).ok())
}

fn read_request(tokens: &mut Tokens<'_>) -> RequestArg {
    let mut values = [0i64; 3];
    for slot in &mut values {
        match tokens.next_argument() {
            Some(value) => *slot = value,
            None => return RequestArg::Missing,
        }
    }

    let [process, resource, amount] = values;
    match (
        usize::try_from(process),
        usize::try_from(resource),
        u32::try_from(amount),
    ) {
        (Ok(process), Ok(resource), Ok(amount)) => {
            RequestArg::Request(ResourceRequest::new(process, resource, amount))
        }
        _ => RequestArg::OutOfRange,
    }
}
