//! Installed application models.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::ids::AppId;
use crate::wire::{non_empty_str, WireRecord, WireValue};

/// Record keys requested from the installation-listing service.
pub mod keys {
    pub const BUNDLE_IDENTIFIER: &str = "CFBundleIdentifier";
    pub const DISPLAY_NAME: &str = "CFBundleDisplayName";
    pub const BUNDLE_NAME: &str = "CFBundleName";
    pub const SHORT_VERSION: &str = "CFBundleShortVersionString";
    pub const BUNDLE_VERSION: &str = "CFBundleVersion";
    pub const FILE_SHARING_ENABLED: &str = "UIFileSharingEnabled";

    pub const ALL: [&str; 6] = [
        BUNDLE_IDENTIFIER,
        DISPLAY_NAME,
        BUNDLE_NAME,
        SHORT_VERSION,
        BUNDLE_VERSION,
        FILE_SHARING_ENABLED,
    ];
}

/// Decoded file-sharing capability flag.
///
/// The wire encodes the flag as a native boolean, a string or an integer
/// depending on how the app's Info.plist was authored. Anything that is not one
/// of those encodings decodes to [`FileSharingCapability::Unrecognized`], which
/// counts as "not capable".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSharingCapability {
    Enabled,
    Disabled,
    Absent,
    Unrecognized(&'static str),
}

impl FileSharingCapability {
    pub fn decode(value: Option<&WireValue>) -> Self {
        match value {
            None => FileSharingCapability::Absent,
            Some(WireValue::Bool(true)) => FileSharingCapability::Enabled,
            Some(WireValue::Bool(false)) => FileSharingCapability::Disabled,
            Some(WireValue::Integer(i)) if *i != 0 => FileSharingCapability::Enabled,
            Some(WireValue::Integer(_)) => FileSharingCapability::Disabled,
            Some(WireValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => FileSharingCapability::Enabled,
                "false" | "no" | "0" => FileSharingCapability::Disabled,
                _ => FileSharingCapability::Unrecognized("string"),
            },
            Some(other) => FileSharingCapability::Unrecognized(other.kind()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, FileSharingCapability::Enabled)
    }
}

/// An installed application exposing (or not) a document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: AppId,
    pub name: String,
    pub version: String,
    pub file_sharing: bool,
}

impl App {
    /// Project an installation-listing record into an [`App`].
    ///
    /// Returns `None` when the record carries no bundle identifier.
    /// Display name falls back from the localized display name to the bundle
    /// name to the bundle identifier.
    pub fn from_record(record: &WireRecord) -> Option<Self> {
        let id = non_empty_str(record, keys::BUNDLE_IDENTIFIER)?;
        let name = non_empty_str(record, keys::DISPLAY_NAME)
            .or_else(|| non_empty_str(record, keys::BUNDLE_NAME))
            .unwrap_or(id);
        let version = non_empty_str(record, keys::SHORT_VERSION)
            .or_else(|| non_empty_str(record, keys::BUNDLE_VERSION))
            .unwrap_or_default();
        let file_sharing =
            FileSharingCapability::decode(record.get(keys::FILE_SHARING_ENABLED)).is_enabled();

        Some(Self {
            id: AppId::new(id),
            name: name.to_string(),
            version: version.to_string(),
            file_sharing,
        })
    }
}

/// Case-insensitive display-name order, ties broken by bundle identifier.
pub fn compare_by_display_name(a: &App, b: &App) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, WireValue)]) -> WireRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn capability_true_encodings_decode_enabled() {
        for value in [
            WireValue::Bool(true),
            WireValue::from("true"),
            WireValue::from("yes"),
            WireValue::from("1"),
            WireValue::Integer(1),
        ] {
            assert!(
                FileSharingCapability::decode(Some(&value)).is_enabled(),
                "{value:?} should be enabled"
            );
        }
    }

    #[test]
    fn capability_false_and_unknown_encodings_decode_disabled() {
        for value in [
            WireValue::Bool(false),
            WireValue::from("no"),
            WireValue::from("0"),
            WireValue::Integer(0),
            WireValue::Real(1.0),
            WireValue::Data(vec![1]),
            WireValue::Array(vec![WireValue::Bool(true)]),
            WireValue::from("enabled"),
        ] {
            assert!(
                !FileSharingCapability::decode(Some(&value)).is_enabled(),
                "{value:?} should not be enabled"
            );
        }
        assert_eq!(
            FileSharingCapability::decode(None),
            FileSharingCapability::Absent
        );
    }

    #[test]
    fn capability_reports_unrecognized_type() {
        assert_eq!(
            FileSharingCapability::decode(Some(&WireValue::Real(1.0))),
            FileSharingCapability::Unrecognized("real")
        );
    }

    #[test]
    fn display_name_falls_back_in_order() {
        let full = record(&[
            (keys::BUNDLE_IDENTIFIER, "com.foo".into()),
            (keys::DISPLAY_NAME, "Foo".into()),
            (keys::BUNDLE_NAME, "FooBundle".into()),
        ]);
        assert_eq!(App::from_record(&full).unwrap().name, "Foo");

        let bundle_only = record(&[
            (keys::BUNDLE_IDENTIFIER, "com.foo".into()),
            (keys::BUNDLE_NAME, "FooBundle".into()),
        ]);
        assert_eq!(App::from_record(&bundle_only).unwrap().name, "FooBundle");

        let id_only = record(&[(keys::BUNDLE_IDENTIFIER, "com.foo".into())]);
        assert_eq!(App::from_record(&id_only).unwrap().name, "com.foo");
    }

    #[test]
    fn record_without_identifier_is_skipped() {
        let rec = record(&[(keys::DISPLAY_NAME, "Orphan".into())]);
        assert!(App::from_record(&rec).is_none());
    }

    #[test]
    fn version_prefers_short_version_string() {
        let rec = record(&[
            (keys::BUNDLE_IDENTIFIER, "com.foo".into()),
            (keys::SHORT_VERSION, "2.1".into()),
            (keys::BUNDLE_VERSION, "2100".into()),
        ]);
        assert_eq!(App::from_record(&rec).unwrap().version, "2.1");
    }

    #[test]
    fn ordering_ignores_case() {
        let mut apps = vec![
            App { id: "b".into(), name: "beta".into(), version: String::new(), file_sharing: true },
            App { id: "a".into(), name: "Alpha".into(), version: String::new(), file_sharing: true },
            App { id: "c".into(), name: "Gamma".into(), version: String::new(), file_sharing: true },
        ];
        apps.sort_by(compare_by_display_name);
        let names: Vec<_> = apps.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "Gamma"]);
    }
}
