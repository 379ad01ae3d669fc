pub mod source;
pub mod etherscan;
pub mod fetcher;

pub use source::*;
pub use etherscan::*;
pub use fetcher::*;
