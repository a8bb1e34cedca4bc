//! Identifier value objects.
//!
//! Only identity strings survive between device operations; no handle or
//! session is ever kept alongside them.

mod id_macro;

use id_macro::impl_id;
use serde::{Deserialize, Serialize};

/// Unique hardware identifier of an attached device (its UDID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

/// Bundle identifier of an installed application, unique per device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(String);

impl_id!(DeviceId, AppId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_from_str() {
        let id: DeviceId = "A1B2".into();
        assert_eq!(id.as_str(), "A1B2");
        assert_eq!(id.to_string(), "A1B2");
    }

    #[test]
    fn test_app_id_round_trips_inner_string() {
        let id = AppId::new("com.foo");
        assert_eq!(id.into_inner(), "com.foo".to_string());
    }
}
