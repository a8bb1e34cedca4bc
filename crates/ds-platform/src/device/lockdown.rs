//! Lockdown: the device's session and service-activation endpoint.

use std::io::{Read, Write};

use ds_core::ports::{DeviceError, DeviceSessionPort, ServiceDescriptor};
use ds_core::wire::WireValue;
use plist::{Dictionary, Value};
use tracing::{debug, info, warn};

use super::framing::{recv_plist, send_plist};
use super::pair_record::PairRecord;
use super::plist_codec::{self, dict, reply_error, string_at};
use super::stream::{MuxStream, ServiceStream};
use super::tls;

pub const LOCKDOWN_PORT: u16 = 62078;

const EXPECTED_TYPE: &str = "com.apple.mobile.lockdown";

/// A lockdown connection. Once a session is started it is stopped when the
/// client is dropped.
pub struct LockdownClient<S: Read + Write + Send = ServiceStream> {
    stream: S,
    label: String,
    session_id: Option<String>,
}

impl LockdownClient<ServiceStream> {
    /// Query type, start a session with `pair`, and switch to TLS if the
    /// device asks for it.
    pub fn establish(stream: MuxStream, label: &str, pair: &PairRecord) -> Result<Self, DeviceError> {
        let mut stream = stream;
        query_type(&mut stream, label)?;
        let (session_id, ssl) = start_session(&mut stream, label, pair)?;

        let stream = if ssl {
            ServiceStream::Tls(Box::new(tls::upgrade(stream, pair)?))
        } else {
            ServiceStream::Plain(stream)
        };
        info!(ssl, "lockdown session started");
        Ok(LockdownClient {
            stream,
            label: label.to_string(),
            session_id: Some(session_id),
        })
    }
}

fn request<S: Read + Write + ?Sized>(
    stream: &mut S,
    label: &str,
    request: &'static str,
    args: Dictionary,
) -> Result<Dictionary, DeviceError> {
    let mut message = dict([
        ("Label", Value::String(label.to_string())),
        ("Request", Value::String(request.into())),
    ]);
    message.extend(args);
    send_plist(stream, message)?;
    recv_plist(stream)
}

pub fn query_type<S: Read + Write + ?Sized>(stream: &mut S, label: &str) -> Result<(), DeviceError> {
    let reply = request(stream, label, "QueryType", Dictionary::new())?;
    match string_at(&reply, "Type") {
        Some(EXPECTED_TYPE) => Ok(()),
        other => Err(DeviceError::TransportUnavailable(format!(
            "unexpected lockdown type {other:?}"
        ))),
    }
}

/// Returns the session id and whether the device wants TLS.
pub fn start_session<S: Read + Write + ?Sized>(
    stream: &mut S,
    label: &str,
    pair: &PairRecord,
) -> Result<(String, bool), DeviceError> {
    let reply = request(
        stream,
        label,
        "StartSession",
        dict([
            ("HostID", Value::String(pair.host_id.clone())),
            ("SystemBUID", Value::String(pair.system_buid.clone())),
        ]),
    )?;
    if let Some(error) = reply_error(&reply) {
        return Err(DeviceError::TransportUnavailable(format!(
            "lockdown refused session: {error}"
        )));
    }
    let session_id = string_at(&reply, "SessionID")
        .ok_or_else(|| DeviceError::Codec("StartSession reply without SessionID".into()))?
        .to_string();
    let ssl = reply
        .get("EnableSessionSSL")
        .and_then(Value::as_boolean)
        .unwrap_or(false);
    Ok((session_id, ssl))
}

impl<S: Read + Write + Send> LockdownClient<S> {
    pub fn new(stream: S, label: &str) -> Self {
        Self {
            stream,
            label: label.to_string(),
            session_id: None,
        }
    }

    fn request(&mut self, name: &'static str, args: Dictionary) -> Result<Dictionary, DeviceError> {
        request(&mut self.stream, &self.label, name, args)
    }

    pub fn get_value(&mut self, key: &str) -> Result<Value, DeviceError> {
        let reply = self.request("GetValue", dict([("Key", Value::String(key.to_string()))]))?;
        if let Some(error) = reply_error(&reply) {
            return Err(DeviceError::ServiceUnavailable {
                service: format!("lockdown value {key}"),
                reason: error.to_string(),
            });
        }
        reply
            .get("Value")
            .cloned()
            .ok_or_else(|| DeviceError::Codec(format!("GetValue {key} without Value")))
    }

    pub fn start_service_raw(&mut self, service: &str) -> Result<ServiceDescriptor, DeviceError> {
        let reply = self.request(
            "StartService",
            dict([("Service", Value::String(service.to_string()))]),
        )?;
        if let Some(error) = reply_error(&reply) {
            return Err(DeviceError::ServiceUnavailable {
                service: service.to_string(),
                reason: error.to_string(),
            });
        }
        let port = reply
            .get("Port")
            .and_then(Value::as_unsigned_integer)
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| DeviceError::Codec(format!("StartService {service} without Port")))?;
        let ssl = reply
            .get("EnableServiceSSL")
            .and_then(Value::as_boolean)
            .unwrap_or(false);
        debug!(service, port, ssl, "service started");
        Ok(ServiceDescriptor {
            service: service.to_string(),
            port,
            ssl,
        })
    }

    fn stop_session(&mut self) {
        let Some(session_id) = self.session_id.take() else {
            return;
        };
        let result = self
            .request("StopSession", dict([("SessionID", Value::String(session_id))]))
            .and_then(|reply| match reply_error(&reply) {
                Some(error) => Err(DeviceError::Codec(error.to_string())),
                None => Ok(()),
            });
        match result {
            Ok(()) => debug!("lockdown session stopped"),
            Err(e) => warn!(error = %e, "failed to stop lockdown session"),
        }
    }
}

impl<S: Read + Write + Send> Drop for LockdownClient<S> {
    fn drop(&mut self) {
        self.stop_session();
    }
}

impl<S: Read + Write + Send> DeviceSessionPort for LockdownClient<S> {
    fn value(&mut self, key: &str) -> Result<WireValue, DeviceError> {
        self.get_value(key).map(|v| plist_codec::to_wire(&v))
    }

    fn start_service(&mut self, service: &str) -> Result<ServiceDescriptor, DeviceError> {
        self.start_service_raw(service)
    }
}
