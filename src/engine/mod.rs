pub mod discovery;
pub mod expiry;
pub mod filter;
pub mod ranking;
