pub mod types;
pub mod ntfy;
pub mod pushover;
pub mod uptime_kuma;
pub mod dispatcher;

pub use types::*;
pub use ntfy::*;
pub use pushover::*;
pub use uptime_kuma::*;
pub use dispatcher::*;
