use crate::error::{MarketError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// The closed set of operations accepted over the wire.
///
/// Command names are matched here, at the boundary; past this point commands
/// travel as typed values and an unknown name can no longer occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketOp {
    /// Create a task (customer).
    Post,
    /// Escrow the cost and start executing (any authenticated user).
    Acquire,
    /// Deliver a solution (executioner).
    Finish,
    /// Release the escrow to the executioner (customer).
    Accept,
    /// Withdraw an unacquired task (customer).
    Close,
    /// Set an account balance (admin).
    Balance,
}

impl TryFrom<&str> for MarketOp {
    type Error = MarketError;

    fn try_from(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(Self::Post),
            "acquire" => Ok(Self::Acquire),
            "finish" => Ok(Self::Finish),
            "accept" => Ok(Self::Accept),
            "close" => Ok(Self::Close),
            "balance" => Ok(Self::Balance),
            _ => Err(MarketError::UnknownCommand(value.to_string())),
        }
    }
}

/// One row of a command script.
///
/// Columns beyond `op` and `actor` are optional; which ones a row needs
/// depends on the operation. Amounts cross the wire as decimal numbers.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CommandRecord {
    pub op: String,
    pub actor: u64,
    pub task: Option<u64>,
    pub target: Option<u64>,
    pub amount: Option<Decimal>,
    pub title: Option<String>,
    pub text: Option<String>,
}

/// Reads marketplace commands from a CSV source.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<CommandRecord>`.
/// Whitespace is trimmed and record lengths are flexible, so scripts can
/// leave trailing columns off.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands,
    /// allowing large scripts to stream without loading everything at once.
    pub fn commands(self) -> impl Iterator<Item = Result<CommandRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(MarketError::from))
    }
}
