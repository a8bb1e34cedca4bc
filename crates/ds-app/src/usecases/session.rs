//! Per-call service chains.
//!
//! Every device operation acquires its own chain and drops it when done.
//! Nothing is pooled: two operations on one device run as independent chains.
//! Field order in [`DeviceSession`] and [`ServiceChain`] is the release order,
//! the reverse of acquisition, and it holds on every exit path because release
//! is plain `Drop`.

use std::fmt::{self, Display};
use std::sync::Arc;

use ds_core::ids::{AppId, DeviceId};
use ds_core::ports::{
    AppListingPort, DeviceConnectionPort, DeviceError, DeviceSessionPort, DeviceTransportPort,
    FileAccessPort, ServiceDescriptor, HOUSE_ARREST_SERVICE, INSTALLATION_PROXY_SERVICE,
};
use thiserror::Error;
use tracing::{debug, trace};

/// Chain stage at which an acquisition failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStage {
    OpenDevice,
    Handshake,
    StartService,
    OpenClient,
}

impl Display for ChainStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainStage::OpenDevice => "open_device",
            ChainStage::Handshake => "handshake",
            ChainStage::StartService => "start_service",
            ChainStage::OpenClient => "open_client",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("{device} unavailable at {stage}: {source}")]
pub struct ChainError {
    pub device: DeviceId,
    pub stage: ChainStage,
    #[source]
    pub source: DeviceError,
}

impl ChainError {
    fn at(device: &DeviceId, stage: ChainStage) -> impl FnOnce(DeviceError) -> ChainError + '_ {
        move |source| ChainError {
            device: device.clone(),
            stage,
            source,
        }
    }
}

/// Stages 1 and 2: device connection plus handshake session.
pub struct DeviceSession {
    session: Box<dyn DeviceSessionPort>,
    connection: Box<dyn DeviceConnectionPort>,
    device: DeviceId,
}

impl DeviceSession {
    pub fn open(
        transport: &dyn DeviceTransportPort,
        device: &DeviceId,
        client_label: &str,
    ) -> Result<Self, ChainError> {
        let mut connection = transport
            .open_device(device)
            .map_err(ChainError::at(device, ChainStage::OpenDevice))?;
        trace!(device_id = %device, stage = "open_device", "acquired");

        let session = connection
            .handshake(client_label)
            .map_err(ChainError::at(device, ChainStage::Handshake))?;
        trace!(device_id = %device, stage = "handshake", "acquired");

        Ok(Self {
            session,
            connection,
            device: device.clone(),
        })
    }

    pub fn session(&mut self) -> &mut dyn DeviceSessionPort {
        self.session.as_mut()
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    fn start_service(&mut self, service: &str) -> Result<ServiceDescriptor, ChainError> {
        let descriptor = self
            .session
            .start_service(service)
            .map_err(ChainError::at(&self.device, ChainStage::StartService))?;
        debug!(
            device_id = %self.device,
            service,
            port = descriptor.port,
            ssl = descriptor.ssl,
            "service activated"
        );
        Ok(descriptor)
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        trace!(device_id = %self.device, "releasing device session");
    }
}

/// All four stages, ending in a service client of type `C`.
pub struct ServiceChain<C> {
    client: C,
    descriptor: ServiceDescriptor,
    session: DeviceSession,
}

impl<C> ServiceChain<C> {
    /// Run stages 1-4, building the client with `open_client`.
    pub fn open<F>(
        transport: &dyn DeviceTransportPort,
        device: &DeviceId,
        client_label: &str,
        service: &str,
        open_client: F,
    ) -> Result<Self, ChainError>
    where
        F: FnOnce(&mut dyn DeviceConnectionPort, &ServiceDescriptor) -> Result<C, DeviceError>,
    {
        let mut session = DeviceSession::open(transport, device, client_label)?;
        let descriptor = session.start_service(service)?;
        let client = open_client(session.connection.as_mut(), &descriptor)
            .map_err(ChainError::at(device, ChainStage::OpenClient))?;
        trace!(device_id = %device, service, stage = "open_client", "acquired");

        Ok(Self {
            client,
            descriptor,
            session,
        })
    }

    pub fn client(&mut self) -> &mut C {
        &mut self.client
    }

    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    pub fn device(&self) -> &DeviceId {
        self.session.device()
    }
}

pub type AppListingChain = ServiceChain<Box<dyn AppListingPort>>;
pub type FileAccessChain = ServiceChain<Box<dyn FileAccessPort>>;

/// Chain ending in an installation-listing client.
pub fn open_app_listing(
    transport: &dyn DeviceTransportPort,
    device: &DeviceId,
    client_label: &str,
) -> Result<AppListingChain, ChainError> {
    ServiceChain::open(
        transport,
        device,
        client_label,
        INSTALLATION_PROXY_SERVICE,
        |connection, descriptor| connection.open_app_listing(descriptor),
    )
}

/// Chain ending in a file-access channel vended for `app`'s document store.
pub fn open_file_access(
    transport: &dyn DeviceTransportPort,
    device: &DeviceId,
    app: &AppId,
    client_label: &str,
) -> Result<FileAccessChain, ChainError> {
    ServiceChain::open(
        transport,
        device,
        client_label,
        HOUSE_ARREST_SERVICE,
        |connection, descriptor| connection.open_file_vending(descriptor)?.vend_documents(app),
    )
}

/// Shared inputs every chain needs.
#[derive(Clone)]
pub struct ChainFactory {
    transport: Arc<dyn DeviceTransportPort>,
    client_label: String,
}

impl ChainFactory {
    pub fn new(transport: Arc<dyn DeviceTransportPort>, client_label: impl Into<String>) -> Self {
        Self {
            transport,
            client_label: client_label.into(),
        }
    }

    pub fn transport(&self) -> &dyn DeviceTransportPort {
        self.transport.as_ref()
    }

    pub fn device_session(&self, device: &DeviceId) -> Result<DeviceSession, ChainError> {
        DeviceSession::open(self.transport.as_ref(), device, &self.client_label)
    }

    pub fn app_listing(&self, device: &DeviceId) -> Result<AppListingChain, ChainError> {
        open_app_listing(self.transport.as_ref(), device, &self.client_label)
    }

    pub fn file_access(&self, device: &DeviceId, app: &AppId) -> Result<FileAccessChain, ChainError> {
        open_file_access(self.transport.as_ref(), device, app, &self.client_label)
    }
}
