use clap::Parser;
use ditontine_core::application::engine::{Stores, TontineEngine};
use ditontine_core::domain::clock::SystemClock;
use ditontine_core::domain::meta::{UserId, VaultId};
use ditontine_core::domain::money::Amount;
use ditontine_core::error::TontineError;
use ditontine_core::infrastructure::in_memory::{
    InMemoryJackpotStore, InMemoryParticipationStore, InMemoryPaymentStore, InMemoryTontineStore,
    InMemoryVaultStore,
};
use ditontine_core::interfaces::csv::operation_reader::{
    OperationReader, VaultOpKind, VaultOperation,
};
use ditontine_core::interfaces::csv::statement_writer::{StatementWriter, VaultStatement};
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::PathBuf;

/// Replays a CSV of vault operations and prints the resulting statements.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input vault-operations CSV file
    input: PathBuf,
}

async fn apply_operation(
    engine: &TontineEngine,
    vaults: &mut HashMap<String, VaultId>,
    op: VaultOperation,
) -> std::result::Result<(), TontineError> {
    let amount = op.amount.ok_or_else(|| {
        TontineError::InvariantViolation(format!("{:?} for {} is missing an amount", op.op, op.user))
    })?;
    let amount = Amount::new(amount)?;

    let vault_id = match vaults.get(&op.user) {
        Some(id) => *id,
        None => {
            let id = engine.open_vault(UserId::new()).await?;
            vaults.insert(op.user.clone(), id);
            id
        }
    };

    let description = op.description.as_deref().unwrap_or("");
    match op.op {
        VaultOpKind::Deposit => engine.deposit(vault_id, amount, description).await?,
        VaultOpKind::Withdraw => engine.withdraw(vault_id, amount, description).await?,
    };
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let engine = TontineEngine::new(
        Stores {
            tontines: Box::new(InMemoryTontineStore::new()),
            participations: Box::new(InMemoryParticipationStore::new()),
            payments: Box::new(InMemoryPaymentStore::new()),
            jackpots: Box::new(InMemoryJackpotStore::new()),
            vaults: Box::new(InMemoryVaultStore::new()),
        },
        Box::new(SystemClock),
    );

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);

    let mut vaults: HashMap<String, VaultId> = HashMap::new();
    let mut applied = 0usize;
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => match apply_operation(&engine, &mut vaults, op).await {
                Ok(()) => applied += 1,
                Err(e) => eprintln!("Error applying operation: {e}"),
            },
            Err(e) => eprintln!("Error reading operation: {e}"),
        }
    }
    log::info!("applied {applied} operations across {} vaults", vaults.len());

    let final_vaults = engine.vault_statements().await.into_diagnostic()?;
    let statements = vaults
        .iter()
        .filter_map(|(user, id)| {
            final_vaults.iter().find(|v| v.id == *id).map(|vault| VaultStatement {
                user: user.clone(),
                balance: vault.balance,
                transactions: vault.transactions.len(),
            })
        })
        .collect();

    let stdout = io::stdout();
    let mut writer = StatementWriter::new(stdout.lock());
    writer.write_statements(statements).into_diagnostic()?;

    Ok(())
}
