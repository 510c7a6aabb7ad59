//! Transport credentials.

use std::fs;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no PEM certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("no PEM private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),
}

/// Credential material for the server. Opaque to everything but the
/// server's serve step.
#[derive(Clone, PartialEq, Eq)]
pub enum TransportCredentials {
    Plaintext,
    Tls { cert_pem: Vec<u8>, key_pem: Vec<u8> },
}

impl std::fmt::Debug for TransportCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportCredentials::Plaintext => f.write_str("Plaintext"),
            TransportCredentials::Tls { .. } => f.write_str("Tls(..)"),
        }
    }
}

impl TransportCredentials {
    /// Read and check PEM material when TLS is configured.
    pub fn load(config: &TlsConfig) -> Result<Self, TlsError> {
        let (Some(cert_path), Some(key_path)) = (&config.cert_path, &config.key_path) else {
            return Ok(TransportCredentials::Plaintext);
        };

        let cert_pem = read(cert_path)?;
        let key_pem = read(key_path)?;

        let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TlsError::Read {
                path: cert_path.clone(),
                source,
            })?;
        if certs.is_empty() {
            return Err(TlsError::NoCertificates(cert_path.clone()));
        }

        match rustls_pemfile::private_key(&mut key_pem.as_slice()) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(TlsError::NoPrivateKey(key_path.clone())),
            Err(source) => {
                return Err(TlsError::Read {
                    path: key_path.clone(),
                    source,
                })
            }
        }

        tracing::info!(
            cert = %cert_path.display(),
            certificates = certs.len(),
            "TLS credentials loaded"
        );

        Ok(TransportCredentials::Tls { cert_pem, key_pem })
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, TransportCredentials::Tls { .. })
    }

    /// Build the rustls server config. `None` for plaintext.
    pub async fn rustls_config(&self) -> Result<Option<RustlsConfig>, std::io::Error> {
        match self {
            TransportCredentials::Plaintext => Ok(None),
            TransportCredentials::Tls { cert_pem, key_pem } => {
                RustlsConfig::from_pem(cert_pem.clone(), key_pem.clone())
                    .await
                    .map(Some)
            }
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, TlsError> {
    fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_tls_config_is_plaintext() {
        let creds = TransportCredentials::load(&TlsConfig::default()).unwrap();
        assert_eq!(creds, TransportCredentials::Plaintext);
        assert!(!creds.is_tls());
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[tokio::test]
    async fn self_signed_fixture_loads_into_rustls() {
        let config = TlsConfig {
            cert_path: Some(fixture("cert.pem")),
            key_path: Some(fixture("key.pem")),
        };
        let creds = TransportCredentials::load(&config).unwrap();
        assert!(creds.is_tls());
        assert!(creds.rustls_config().await.unwrap().is_some());
    }

    #[test]
    fn key_file_without_key_is_rejected() {
        let config = TlsConfig {
            cert_path: Some(fixture("cert.pem")),
            key_path: Some(fixture("cert.pem")),
        };
        assert!(matches!(
            TransportCredentials::load(&config),
            Err(TlsError::NoPrivateKey(_))
        ));
    }

    #[test]
    fn missing_cert_file_is_read_error() {
        let config = TlsConfig {
            cert_path: Some("/nonexistent/cert.pem".into()),
            key_path: Some("/nonexistent/key.pem".into()),
        };
        assert!(matches!(TransportCredentials::load(&config), Err(TlsError::Read { .. })));
    }

    #[test]
    fn file_without_pem_blocks_is_rejected() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(b"not a certificate").unwrap();
        let config = TlsConfig {
            cert_path: Some(cert.path().to_path_buf()),
            key_path: Some(cert.path().to_path_buf()),
        };
        assert!(matches!(
            TransportCredentials::load(&config),
            Err(TlsError::NoCertificates(_))
        ));
    }
}
