//! TLS upgrade of a device stream.
//!
//! Devices present self-signed certificates issued at pairing time, so the
//! server certificate chain is not validated; signatures are still checked
//! against the presented key. The client authenticates with the host
//! certificate from the pair record.

use std::sync::Arc;

use ds_core::ports::DeviceError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme, StreamOwned};
use tracing::debug;

use super::pair_record::PairRecord;
use super::stream::MuxStream;

const DEVICE_SERVER_NAME: &str = "device.local";

#[derive(Debug)]
struct PairedDeviceVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for PairedDeviceVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

fn tls_error(e: impl std::fmt::Display) -> DeviceError {
    DeviceError::TransportUnavailable(format!("tls: {e}"))
}

pub fn client_config(pair: &PairRecord) -> Result<Arc<ClientConfig>, DeviceError> {
    let provider = Arc::new(ring::default_provider());
    let certs = CertificateDer::pem_slice_iter(&pair.host_certificate)
        .collect::<Result<Vec<_>, _>>()
        .map_err(tls_error)?;
    let key = PrivateKeyDer::from_pem_slice(&pair.host_private_key).map_err(tls_error)?;

    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(tls_error)?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(PairedDeviceVerifier { provider }))
        .with_client_auth_cert(certs, key)
        .map_err(tls_error)?;
    Ok(Arc::new(config))
}

/// Run the client handshake to completion on `stream`.
pub fn upgrade(
    stream: MuxStream,
    pair: &PairRecord,
) -> Result<StreamOwned<ClientConnection, MuxStream>, DeviceError> {
    let server_name = ServerName::try_from(DEVICE_SERVER_NAME).map_err(tls_error)?;
    let mut connection = ClientConnection::new(client_config(pair)?, server_name).map_err(tls_error)?;
    let mut stream = stream;
    while connection.is_handshaking() {
        connection.complete_io(&mut stream)?;
    }
    debug!(version = ?connection.protocol_version(), "tls session established");
    Ok(StreamOwned::new(connection, stream))
}
