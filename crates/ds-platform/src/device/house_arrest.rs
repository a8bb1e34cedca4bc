//! House arrest: vends an application's sandbox, after which the same
//! stream speaks AFC.

use std::io::{Read, Write};

use ds_core::ids::AppId;
use ds_core::ports::{DeviceError, FileAccessPort, FileVendingPort, HOUSE_ARREST_SERVICE};
use plist::Value;
use tracing::debug;

use super::afc::AfcClient;
use super::framing::{recv_plist, send_plist};
use super::plist_codec::{dict, reply_error, string_at};
use super::stream::ServiceStream;

pub struct HouseArrestClient<S: Read + Write + Send = ServiceStream> {
    stream: S,
}

impl<S: Read + Write + Send> HouseArrestClient<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

impl<S: Read + Write + Send + 'static> FileVendingPort for HouseArrestClient<S> {
    fn vend_documents(self: Box<Self>, app: &AppId) -> Result<Box<dyn FileAccessPort>, DeviceError> {
        let HouseArrestClient { mut stream } = *self;
        send_plist(
            &mut stream,
            dict([
                ("Command", Value::String("VendDocuments".into())),
                ("Identifier", Value::String(app.to_string())),
            ]),
        )?;
        let reply = recv_plist(&mut stream)?;

        if let Some(error) = reply_error(&reply) {
            return Err(DeviceError::ServiceUnavailable {
                service: HOUSE_ARREST_SERVICE.to_string(),
                reason: format!("{app}: {error}"),
            });
        }
        if string_at(&reply, "Status") != Some("Complete") {
            return Err(DeviceError::Codec(format!(
                "VendDocuments for {app} did not complete"
            )));
        }
        debug!(app = %app, "documents vended");
        Ok(Box::new(AfcClient::new(stream)))
    }
}
