use crate::domain::money::Money;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Final state of one vault after a replay.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct VaultStatement {
    pub user: String,
    pub balance: Money,
    pub transactions: usize,
}

/// Writes vault statements as CSV, sorted by user label for deterministic
/// output.
pub struct StatementWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StatementWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_statements(&mut self, mut statements: Vec<VaultStatement>) -> Result<()> {
        statements.sort_by(|a, b| a.user.cmp(&b.user));
        for statement in statements {
            self.writer.serialize(statement)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
