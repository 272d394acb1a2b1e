pub mod account;
pub mod amount;
pub mod hashes;

pub use account::AccountAddress;
pub use amount::Amount;
pub use hashes::{BlockHash, CommitmentHash, Score};
