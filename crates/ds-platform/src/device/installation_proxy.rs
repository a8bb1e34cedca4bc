//! Installation proxy client: enumerates installed applications.

use std::io::{Read, Write};

use ds_core::ports::{AppListingPort, BrowseOptions, DeviceError, INSTALLATION_PROXY_SERVICE};
use ds_core::wire::WireRecord;
use plist::{Dictionary, Value};
use tracing::{debug, trace};

use super::framing::{recv_plist, send_plist};
use super::plist_codec::{self, dict, reply_error, string_at};
use super::stream::ServiceStream;

pub struct InstallationProxyClient<S: Read + Write + Send = ServiceStream> {
    stream: S,
}

impl<S: Read + Write + Send> InstallationProxyClient<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    fn browse_request(options: &BrowseOptions) -> Dictionary {
        let attributes = options
            .attributes
            .iter()
            .map(|a| Value::String(a.clone()))
            .collect();
        dict([
            ("Command", Value::String("Browse".into())),
            (
                "ClientOptions",
                Value::Dictionary(dict([
                    ("ApplicationType", Value::String(options.application_type.clone())),
                    ("ReturnAttributes", Value::Array(attributes)),
                ])),
            ),
        ])
    }
}

impl<S: Read + Write + Send> AppListingPort for InstallationProxyClient<S> {
    /// Results arrive in pages; collect until `Status` is `Complete`.
    fn browse(&mut self, options: &BrowseOptions) -> Result<Vec<WireRecord>, DeviceError> {
        send_plist(&mut self.stream, Self::browse_request(options))?;

        let mut records = Vec::new();
        loop {
            let page = recv_plist(&mut self.stream)?;
            if let Some(error) = reply_error(&page) {
                return Err(DeviceError::ServiceUnavailable {
                    service: INSTALLATION_PROXY_SERVICE.to_string(),
                    reason: error.to_string(),
                });
            }
            if let Some(list) = page.get("CurrentList").and_then(Value::as_array) {
                trace!(page_len = list.len(), "browse page");
                records.extend(
                    list.iter()
                        .filter_map(Value::as_dictionary)
                        .map(plist_codec::record_from),
                );
            }
            if string_at(&page, "Status") == Some("Complete") {
                break;
            }
        }
        debug!(count = records.len(), "browse complete");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_support::Scripted;
    use ds_core::wire::WireValue;
    use std::io::Cursor;

    fn app(bundle: &str) -> Value {
        Value::Dictionary(dict([("CFBundleIdentifier", Value::String(bundle.into()))]))
    }

    fn frames(pages: Vec<Dictionary>) -> Vec<u8> {
        let mut wire = Vec::new();
        for page in pages {
            send_plist(&mut wire, page).unwrap();
        }
        wire
    }

    #[test]
    fn browse_collects_every_page() {
        let stream = Scripted::new(frames(vec![
            dict([
                ("Status", Value::String("BrowsingApplications".into())),
                ("CurrentList", Value::Array(vec![app("com.a"), app("com.b")])),
            ]),
            dict([
                ("Status", Value::String("BrowsingApplications".into())),
                ("CurrentList", Value::Array(vec![app("com.c")])),
            ]),
            dict([("Status", Value::String("Complete".into()))]),
        ]));
        let mut client = InstallationProxyClient::new(stream);

        let records = client
            .browse(&BrowseOptions::user_apps(&["CFBundleIdentifier"]))
            .unwrap();

        let ids: Vec<_> = records
            .iter()
            .filter_map(|r| r.get("CFBundleIdentifier").and_then(WireValue::as_str))
            .collect();
        assert_eq!(ids, vec!["com.a", "com.b", "com.c"]);

        let sent = recv_plist(&mut Cursor::new(client.stream.written.clone())).unwrap();
        let options = sent.get("ClientOptions").and_then(Value::as_dictionary).unwrap();
        assert_eq!(string_at(options, "ApplicationType"), Some("User"));
    }

    #[test]
    fn error_page_fails_the_browse() {
        let stream = Scripted::new(frames(vec![dict([(
            "Error",
            Value::String("InvalidArgument".into()),
        )])]));
        let mut client = InstallationProxyClient::new(stream);

        let err = client
            .browse(&BrowseOptions::user_apps(&[]))
            .expect_err("error page");
        assert!(matches!(err, DeviceError::ServiceUnavailable { .. }));
    }
}
