use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

/// Writes the final account table as CSV.
pub struct AccountWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> AccountWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    /// Writes all accounts, lowest id first. Amounts are rendered through the
    /// decimal boundary with trailing zeros stripped.
    pub fn write_accounts(&mut self, mut accounts: Vec<Account>) -> Result<()> {
        accounts.sort_by_key(|account| account.id);
        self.writer
            .write_record(["account", "balance", "frozen", "available"])?;
        for account in accounts {
            self.writer.write_record([
                account.id.to_string(),
                account.balance.to_decimal().normalize().to_string(),
                account.frozen.to_decimal().normalize().to_string(),
                account.available().to_decimal().normalize().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
