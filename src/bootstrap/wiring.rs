//! # Dependency Injection
//!
//! ## Responsibilities
//!
//! - Create infra implementations (local filesystem)
//! - Create platform implementations (device transport, notifications)
//! - Inject all dependencies into the browser runtime
//!
//! ## Prohibited
//!
//! - No business logic
//! - No configuration validation (config is already resolved)
//!
//! This is the only place allowed to depend on ds-infra, ds-platform and
//! ds-app at once, and only for assembly.

use std::sync::Arc;

use ds_app::{AppDeps, BrowserRuntime, CoreHandle, RuntimeOptions};
use ds_core::config::AppConfig;
use ds_core::ports::NotificationPort;
use ds_infra::StdLocalFs;
use ds_platform::{TracingNotifier, UsbmuxTransport};
use tracing::info;

/// Build the port implementations for `config`.
pub fn wire_dependencies(config: &AppConfig, notifier: Arc<dyn NotificationPort>) -> AppDeps {
    let transport = UsbmuxTransport::from_config(config);
    info!(
        client_label = %config.client_label,
        scan_interval_secs = config.scan_interval_secs,
        "wiring device transport"
    );
    AppDeps {
        transport: Arc::new(transport),
        local_fs: Arc::new(StdLocalFs::new()),
        notifier,
    }
}

/// Runtime plus its handle, notices going to the log.
pub fn build_runtime(config: &AppConfig) -> (BrowserRuntime, CoreHandle) {
    let deps = wire_dependencies(config, Arc::new(TracingNotifier));
    BrowserRuntime::new(deps, RuntimeOptions::from_config(config))
}
