use crate::domain::account::Account;
use crate::domain::ledger;
use crate::domain::money::MoneyValue;
use crate::domain::ports::{AccountStore, AccountStoreBox, TaskStore, TaskStoreBox};
use crate::domain::task::{Task, TaskCommand, TaskState};
use crate::domain::user::Identity;
use crate::domain::{AccountId, TaskId};
use crate::error::{MarketError, Result};
use chrono::Utc;
use tracing::info;

/// A new task as posted by a customer.
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub cost: MoneyValue,
    pub problem: String,
}

/// Field edits requested against an existing task.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub cost: Option<MoneyValue>,
    pub problem: Option<String>,
    pub solution: Option<String>,
}

/// The task state machine.
///
/// Validates commands against the task's state and the caller's identity,
/// applies the ledger operations the transition calls for, and persists the
/// result through the store's atomic commit. A rejected command leaves task
/// and accounts untouched.
pub struct TaskLifecycle {
    tasks: TaskStoreBox,
    accounts: AccountStoreBox,
}

impl TaskLifecycle {
    pub fn new(tasks: TaskStoreBox, accounts: AccountStoreBox) -> Self {
        Self { tasks, accounts }
    }

    /// Creates a task in `Free` state on behalf of the caller.
    pub async fn post(&self, caller: Identity, draft: TaskDraft) -> Result<Task> {
        let task = self
            .tasks
            .insert(Task::new(
                caller.account,
                draft.title,
                draft.cost,
                draft.problem,
            ))
            .await?;
        info!(task = task.id, customer = caller.account, "task posted");
        Ok(task)
    }

    /// Runs one command against a task and returns the updated task.
    pub async fn execute(
        &self,
        caller: Identity,
        task_id: TaskId,
        command: TaskCommand,
    ) -> Result<Task> {
        let name = command.name();
        let task = self.load(task_id).await?;
        let task = match command {
            TaskCommand::Acquire => self.acquire(caller, task).await?,
            TaskCommand::Finish { solution } => self.finish(caller, task, solution).await?,
            TaskCommand::Accept => self.accept(caller, task).await?,
            TaskCommand::Close => self.close(caller, task).await?,
        };
        info!(
            task = task.id,
            caller = caller.account,
            command = name,
            state = task.state.as_str(),
            "command applied"
        );
        Ok(task)
    }

    /// Free -> Executing: the caller escrows the cost and becomes the
    /// executioner. Nothing stops a customer from acquiring their own task.
    async fn acquire(&self, caller: Identity, mut task: Task) -> Result<Task> {
        if task.state != TaskState::Free {
            return Err(MarketError::InvalidStateTransition {
                command: "acquire",
                required: TaskState::Free,
            });
        }
        let account = self.load_account(caller.account).await?;
        let frozen = ledger::freeze(&account, task.cost)?;

        task.state = TaskState::Executing;
        task.executioner = caller.account;
        task.begin_time = Some(Utc::now());
        self.commit(TaskState::Free, "acquire", task, vec![frozen])
            .await
    }

    /// Executing -> Completed: only the executioner may deliver a solution.
    async fn finish(&self, caller: Identity, mut task: Task, solution: String) -> Result<Task> {
        if task.executioner != caller.account {
            return Err(MarketError::NotAuthorized(
                "task was not acquired by this user",
            ));
        }
        if task.state != TaskState::Executing {
            return Err(MarketError::InvalidStateTransition {
                command: "finish",
                required: TaskState::Executing,
            });
        }
        task.state = TaskState::Completed;
        task.solution = solution;
        task.end_time = Some(Utc::now());
        self.commit(TaskState::Executing, "finish", task, vec![])
            .await
    }

    /// Completed -> Accepted: the customer pays the cost to the executioner.
    async fn accept(&self, caller: Identity, mut task: Task) -> Result<Task> {
        if task.customer != caller.account {
            return Err(MarketError::NotAuthorized(
                "task was not posted by this user",
            ));
        }
        if task.state != TaskState::Completed {
            return Err(MarketError::InvalidStateTransition {
                command: "accept",
                required: TaskState::Completed,
            });
        }
        let customer = self.load_account(task.customer).await?;
        let accounts = if task.customer == task.executioner {
            // A customer who acquired their own task pays themself;
            // settlement degenerates to releasing the frozen funds.
            vec![ledger::unfreeze(&customer, task.cost)]
        } else {
            let executioner = self.load_account(task.executioner).await?;
            let (payer, payee) = ledger::settle(&customer, &executioner, task.cost);
            vec![payer, payee]
        };
        task.state = TaskState::Accepted;
        self.commit(TaskState::Completed, "accept", task, accounts)
            .await
    }

    /// Free -> Closed: the customer withdraws an unacquired task. No balance
    /// change.
    async fn close(&self, caller: Identity, mut task: Task) -> Result<Task> {
        if task.customer != caller.account {
            return Err(MarketError::NotAuthorized(
                "task was not posted by this user",
            ));
        }
        if task.state != TaskState::Free {
            return Err(MarketError::InvalidStateTransition {
                command: "close",
                required: TaskState::Free,
            });
        }
        task.state = TaskState::Closed;
        self.commit(TaskState::Free, "close", task, vec![]).await
    }

    pub async fn task(&self, task_id: TaskId) -> Result<Task> {
        self.load(task_id).await
    }

    /// All tasks except closed ones, lowest id first.
    pub async fn open_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .all()
            .await?
            .into_iter()
            .filter(|task| task.state != TaskState::Closed)
            .collect();
        tasks.sort_by_key(|task| task.id);
        Ok(tasks)
    }

    /// Edits task fields subject to the caller's permissions.
    ///
    /// Admins may edit everything. The customer may retitle at any time but
    /// may touch cost and problem only while the task is still `Free`; the
    /// solution belongs to the executioner and is set through `finish`.
    pub async fn update(&self, caller: Identity, task_id: TaskId, edit: TaskEdit) -> Result<Task> {
        let mut task = self.load(task_id).await?;
        if !caller.is_admin {
            if task.customer != caller.account {
                return Err(MarketError::NotAuthorized(
                    "task can only be edited by its customer",
                ));
            }
            if edit.solution.is_some() {
                return Err(MarketError::NotAuthorized(
                    "solution is set by the executioner on finish",
                ));
            }
            if (edit.cost.is_some() || edit.problem.is_some()) && task.state != TaskState::Free {
                return Err(MarketError::NotAuthorized(
                    "cost and problem can only be edited while the task is free",
                ));
            }
        }
        if let Some(title) = edit.title {
            task.title = title;
        }
        if let Some(cost) = edit.cost {
            task.cost = cost;
        }
        if let Some(problem) = edit.problem {
            task.problem = problem;
        }
        if let Some(solution) = edit.solution {
            task.solution = solution;
        }
        self.tasks.put(task.clone()).await?;
        Ok(task)
    }

    /// Deletes a task. The customer may delete only a `Free` task; admins may
    /// delete anything.
    pub async fn remove(&self, caller: Identity, task_id: TaskId) -> Result<()> {
        let task = self.load(task_id).await?;
        if !caller.is_admin {
            if task.customer != caller.account {
                return Err(MarketError::NotAuthorized(
                    "task can only be deleted by its customer",
                ));
            }
            if task.state != TaskState::Free {
                return Err(MarketError::InvalidStateTransition {
                    command: "remove",
                    required: TaskState::Free,
                });
            }
        }
        self.tasks.remove(task_id).await?;
        Ok(())
    }

    async fn load(&self, task_id: TaskId) -> Result<Task> {
        self.tasks
            .get(task_id)
            .await?
            .ok_or(MarketError::TaskNotFound(task_id))
    }

    async fn load_account(&self, account_id: AccountId) -> Result<Account> {
        self.accounts
            .get(account_id)
            .await?
            .ok_or(MarketError::AccountNotFound(account_id))
    }

    /// Persists a transition through the store's atomic compare-and-swap.
    /// A stale read (the task left `expected` state concurrently) surfaces
    /// as the same error a failed precondition check would produce.
    async fn commit(
        &self,
        expected: TaskState,
        command: &'static str,
        task: Task,
        accounts: Vec<Account>,
    ) -> Result<Task> {
        if self
            .tasks
            .commit_transition(expected, task.clone(), accounts)
            .await?
        {
            Ok(task)
        } else {
            Err(MarketError::InvalidStateTransition {
                command,
                required: expected,
            })
        }
    }
}
