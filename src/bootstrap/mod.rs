pub mod tracing;
pub mod wiring;

pub use ds_infra::config::{load_config, resolve_config};
pub use self::tracing::init_tracing_subscriber;
pub use wiring::{build_runtime, wire_dependencies};
