use ds_core::app::{compare_by_display_name, keys, App};
use ds_core::ids::DeviceId;
use ds_core::ports::BrowseOptions;
use tracing::{debug, warn};

use super::blocking::run_blocking;
use super::session::ChainFactory;

/// Lists the user-installed apps on a device that expose a document store.
///
/// Nothing is cached: every call browses the device again through its own
/// service chain.
#[derive(Clone)]
pub struct ListApps {
    chains: ChainFactory,
}

impl ListApps {
    pub fn new(chains: ChainFactory) -> Self {
        Self { chains }
    }

    /// File-sharing apps on `device`, sorted case-insensitively by display
    /// name. `None` when the device or the listing service is unavailable.
    pub fn execute_blocking(&self, device: &DeviceId) -> Option<Vec<App>> {
        let mut chain = match self.chains.app_listing(device) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(error = %e, "app listing unavailable");
                return None;
            }
        };
        let records = match chain.client().browse(&BrowseOptions::user_apps(&keys::ALL)) {
            Ok(records) => records,
            Err(e) => {
                warn!(device_id = %device, error = %e, "browse failed");
                return None;
            }
        };
        drop(chain);

        let total = records.len();
        let mut apps: Vec<App> = records
            .iter()
            .filter_map(App::from_record)
            .filter(|app| {
                if !app.file_sharing {
                    debug!(app_id = %app.id, "skipping app without file sharing");
                }
                app.file_sharing
            })
            .collect();
        apps.sort_by(compare_by_display_name);
        debug!(device_id = %device, total, sharing = apps.len(), "apps listed");
        Some(apps)
    }

    #[tracing::instrument(name = "usecase.list_apps", skip(self), fields(device_id = %device))]
    pub async fn execute(&self, device: &DeviceId) -> Option<Vec<App>> {
        let (this, device) = (self.clone(), device.clone());
        run_blocking(move || this.execute_blocking(&device)).await.flatten()
    }
}
