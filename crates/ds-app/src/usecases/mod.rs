pub mod app_inventory;
mod blocking;
pub mod discovery;
pub mod remote_files;
pub mod session;
pub mod transfer;

pub use app_inventory::ListApps;
pub use discovery::ScanDevices;
pub use remote_files::RemoteFileClient;
pub use session::{ChainError, ChainFactory, ChainStage, DeviceSession, ServiceChain};
pub use transfer::{BatchOutcome, SelectionEffect, TransferEngine};
