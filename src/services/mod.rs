pub mod balance;
pub mod monitor;
pub mod notifier;
pub mod retry;
pub mod state;
