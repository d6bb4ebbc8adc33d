use clap::Parser;
use gigmarket::application::directory::Directory;
use gigmarket::application::lifecycle::{TaskDraft, TaskLifecycle};
use gigmarket::domain::money::MoneyValue;
use gigmarket::domain::ports::{
    AccountStore, AccountStoreBox, TaskStore, TaskStoreBox, UserStore, UserStoreBox,
};
use gigmarket::domain::task::TaskCommand;
use gigmarket::domain::user::Identity;
use gigmarket::domain::TaskId;
use gigmarket::error::{MarketError, Result as MarketResult};
use gigmarket::infrastructure::in_memory::InMemoryStore;
#[cfg(feature = "storage-rocksdb")]
use gigmarket::infrastructure::rocksdb::RocksDbStore;
use gigmarket::infrastructure::sample::seed_sample_data;
use gigmarket::interfaces::csv::account_writer::AccountWriter;
use gigmarket::interfaces::csv::command_reader::{CommandReader, CommandRecord, MarketOp};
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input command script CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Preload the store with the bundled sample users and tasks
    #[arg(long)]
    seed: bool,
}

struct Services {
    users: UserStoreBox,
    accounts: AccountStoreBox,
    tasks: TaskStoreBox,
    lifecycle: TaskLifecycle,
    directory: Directory,
}

fn build_services<S>(store: S) -> Services
where
    S: UserStore + AccountStore + TaskStore + Clone + 'static,
{
    Services {
        users: Box::new(store.clone()),
        accounts: Box::new(store.clone()),
        tasks: Box::new(store.clone()),
        lifecycle: TaskLifecycle::new(Box::new(store.clone()), Box::new(store.clone())),
        directory: Directory::new(
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Keep stdout clean for the account table; diagnostics go to stderr.
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();

    let services = match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            let store = RocksDbStore::open(db_path).into_diagnostic()?;
            build_services(store)
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' \
                 feature is not enabled. Falling back to In-Memory storage."
            );
            build_services(InMemoryStore::new())
        }
        None => build_services(InMemoryStore::new()),
    };

    if cli.seed {
        seed_sample_data(&*services.users, &*services.accounts, &*services.tasks)
            .await
            .into_diagnostic()?;
    }

    // Process the command script
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for record in reader.commands() {
        match record {
            Ok(record) => {
                if let Err(e) = apply_command(&services, record).await {
                    eprintln!("Error processing command: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading command: {}", e);
            }
        }
    }

    // Output the final account state
    let accounts = services.accounts.all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = AccountWriter::new(stdout.lock());
    writer.write_accounts(accounts).into_diagnostic()?;

    Ok(())
}

async fn apply_command(services: &Services, record: CommandRecord) -> MarketResult<()> {
    let op = MarketOp::try_from(record.op.as_str())?;
    let caller = resolve_identity(&services.users, record.actor).await?;
    match op {
        MarketOp::Post => {
            let draft = TaskDraft {
                title: record.title.unwrap_or_default(),
                cost: MoneyValue::from_decimal(required_amount(record.amount)?)?,
                problem: record.text.unwrap_or_default(),
            };
            services.lifecycle.post(caller, draft).await?;
        }
        MarketOp::Acquire => {
            services
                .lifecycle
                .execute(caller, required_task(record.task)?, TaskCommand::Acquire)
                .await?;
        }
        MarketOp::Finish => {
            let command = TaskCommand::Finish {
                solution: record.text.unwrap_or_default(),
            };
            services
                .lifecycle
                .execute(caller, required_task(record.task)?, command)
                .await?;
        }
        MarketOp::Accept => {
            services
                .lifecycle
                .execute(caller, required_task(record.task)?, TaskCommand::Accept)
                .await?;
        }
        MarketOp::Close => {
            services
                .lifecycle
                .execute(caller, required_task(record.task)?, TaskCommand::Close)
                .await?;
        }
        MarketOp::Balance => {
            let target = record.target.ok_or_else(|| {
                MarketError::Validation("balance requires a target account".to_string())
            })?;
            let amount = MoneyValue::from_decimal(required_amount(record.amount)?)?;
            services.directory.set_balance(caller, target, amount).await?;
        }
    }
    Ok(())
}

/// The batch interface stands in for the session layer: the actor column is
/// the caller's user id, trusted as given once it resolves to a profile.
async fn resolve_identity(users: &UserStoreBox, actor: u64) -> MarketResult<Identity> {
    let user = users
        .get(actor)
        .await?
        .ok_or(MarketError::UserNotFound(actor))?;
    Ok(user.identity())
}

fn required_amount(amount: Option<Decimal>) -> MarketResult<Decimal> {
    amount.ok_or_else(|| MarketError::Validation("command requires an amount".to_string()))
}

fn required_task(task: Option<u64>) -> MarketResult<TaskId> {
    task.ok_or_else(|| MarketError::Validation("command requires a task id".to_string()))
}
