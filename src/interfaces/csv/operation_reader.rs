use crate::error::{Result, TontineError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum VaultOpKind {
    Deposit,
    Withdraw,
}

/// One row of a vault-operation replay file.
///
/// The `user` column is a free-form label; the CLI maps labels to vaults,
/// creating each vault on first sight.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct VaultOperation {
    pub op: VaultOpKind,
    pub user: String,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
}

/// Reads vault operations from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths,
/// yielding rows lazily so large files stream.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn operations(self) -> impl Iterator<Item = Result<VaultOperation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(TontineError::from))
    }
}
