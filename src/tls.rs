//! rustls setup for the listener and the query client
use crate::config::TlsFiles;
use crate::error::{ProbeError, Result};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore, ServerConfig};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::{TlsAcceptor, TlsConnector};

fn provider() -> Arc<rustls::crypto::CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn open(path: &Path, what: &str) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| {
        ProbeError::Config(format!("cannot open {what} {}: {e}", path.display()))
    })
}

/// Every certificate in a PEM file, in file order.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = open(path, "certificate file")?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ProbeError::Config(format!("invalid PEM in {}: {e}", path.display())))?;
    if certs.is_empty() {
        return Err(ProbeError::Config(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

/// The first private key (PKCS#8, PKCS#1 or SEC1) in a PEM file.
pub fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let mut reader = open(path, "key file")?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ProbeError::Config(format!("invalid PEM in {}: {e}", path.display())))?
        .ok_or_else(|| ProbeError::Config(format!("no private key found in {}", path.display())))
}

/// TLS 1.2 and 1.3, no client authentication.
pub fn server_acceptor(files: &TlsFiles) -> Result<TlsAcceptor> {
    let certs = load_certs(&files.cert_file)?;
    let key = load_key(&files.key_file)?;
    let config = ServerConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Trusts exactly the certificates in `ca_file`; a self-signed server
/// certificate can be passed directly.
pub fn client_connector(ca_file: &Path) -> Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(ca_file)? {
        roots.add(cert)?;
    }
    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

pub fn server_name(name: &str) -> Result<ServerName<'static>> {
    ServerName::try_from(name.to_string())
        .map_err(|e| ProbeError::Config(format!("invalid TLS server name '{name}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_pair(dir: &TempDir) -> TlsFiles {
        let rcgen::CertifiedKey { cert, key_pair } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let cert_file = dir.path().join("server.crt");
        let key_file = dir.path().join("server.key");
        fs::write(&cert_file, cert.pem()).unwrap();
        fs::write(&key_file, key_pair.serialize_pem()).unwrap();
        TlsFiles {
            cert_file,
            key_file,
        }
    }

    #[test]
    fn builds_acceptor_and_connector_from_generated_pair() {
        let dir = TempDir::new().unwrap();
        let files = write_pair(&dir);
        assert!(server_acceptor(&files).is_ok());
        assert!(client_connector(&files.cert_file).is_ok());
    }

    #[test]
    fn key_file_without_key_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let files = write_pair(&dir);
        // a certificate is valid PEM but not a key
        let err = load_key(&files.cert_file).unwrap_err();
        assert!(err.to_string().contains("no private key"));
    }

    #[test]
    fn missing_certificate_is_reported() {
        let err = load_certs(Path::new("/nonexistent/server.crt")).unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
    }

    #[test]
    fn rejects_invalid_server_names() {
        assert!(server_name("localhost").is_ok());
        assert!(server_name("127.0.0.1").is_ok());
        assert!(server_name("not a host").is_err());
    }
}
