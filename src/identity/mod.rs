pub mod bootstrap;
pub mod wallet;
pub mod x509;

pub use bootstrap::ensure_identity;
pub use wallet::FileSystemWallet;
