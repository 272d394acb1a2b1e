use hashrace_types::{AccountAddress, Amount, BlockHash, Score};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompetitionError {
    #[error("Stake {attached} is below the minimum bet of {required}")]
    InsufficientStake { required: Amount, attached: Amount },

    #[error("Task {0} is not ongoing")]
    TaskNotOngoing(BlockHash),

    #[error("Account {account} already claimed task {task}")]
    AlreadyClaimed {
        task: BlockHash,
        account: AccountAddress,
    },

    #[error("Better solution for the task already exists: current {current}, submitted {submitted}")]
    BetterSolutionExists { current: Score, submitted: Score },

    #[error("Task {0} is still ongoing")]
    TaskStillOngoing(BlockHash),

    #[error("No commitment from {account} for task {task}")]
    NoCommitmentFound {
        task: BlockHash,
        account: AccountAddress,
    },

    #[error("Commitment mismatch: expected {expected}, got {actual}")]
    CommitmentMismatch { expected: String, actual: String },

    #[error("Unknown task {0}")]
    UnknownTask(BlockHash),

    #[error("Insufficient balance for {account}: has {available}, needs {required}")]
    InsufficientBalance {
        account: AccountAddress,
        available: Amount,
        required: Amount,
    },

    #[error("Balance overflow for {0}")]
    BalanceOverflow(AccountAddress),

    #[error("Bank overflow for task {0}")]
    BankOverflow(BlockHash),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type Result<T> = std::result::Result<T, CompetitionError>;
