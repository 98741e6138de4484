pub mod fabric;
pub mod gateway;
pub mod profile;
pub mod proposal;
pub mod proto;

pub use fabric::Gateway;
pub use gateway::Contract;
