//! Extra TLS trust roots from `SSL_CERT_FILE`
//!
//! Some distributions ship their CA bundle at a path the TLS stack does not
//! probe by default, so certificate verification against the executioner
//! fails. Pointing `SSL_CERT_FILE` at the bundle fixes it; this module loads
//! that bundle explicitly so it is honoured regardless of TLS backend.

use reqwest::Certificate;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming the CA bundle
pub const SSL_CERT_FILE: &str = "SSL_CERT_FILE";

/// Well-known bundle locations, suggested when `SSL_CERT_FILE` is wrong
pub const KNOWN_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/pki/tls/certs/ca-bundle.crt",
    "/etc/ssl/ca-bundle.pem",
    "/etc/ssl/cert.pem",
];

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse PEM bundle {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("no certificates in {0}")]
    Empty(PathBuf),
}

/// Load every certificate from a PEM bundle
pub fn load_bundle(path: &Path) -> Result<Vec<Certificate>, TlsError> {
    let pem = std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| TlsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    if certs.is_empty() {
        return Err(TlsError::Empty(path.to_path_buf()));
    }
    Ok(certs)
}

/// Certificates from `SSL_CERT_FILE`, if set and loadable
///
/// A set but broken value is logged with a hint and otherwise ignored, so the
/// client falls back to the platform roots.
pub fn extra_root_certificates() -> Vec<Certificate> {
    root_certificates_from(|key| std::env::var(key).ok())
}

/// Same as [`extra_root_certificates`] with an injectable variable lookup
pub fn root_certificates_from<F>(lookup: F) -> Vec<Certificate>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(SSL_CERT_FILE).filter(|v| !v.trim().is_empty()) else {
        return Vec::new();
    };
    let path = PathBuf::from(raw.trim());

    match load_bundle(&path) {
        Ok(certs) => {
            info!(
                path = %path.display(),
                count = certs.len(),
                "Loaded CA bundle from SSL_CERT_FILE"
            );
            certs
        }
        Err(e) => {
            let suggestion = KNOWN_BUNDLE_PATHS
                .iter()
                .find(|candidate| Path::new(candidate).exists())
                .copied()
                .unwrap_or("/etc/ssl/certs/ca-certificates.crt");
            warn!(
                error = %e,
                "SSL_CERT_FILE is set but unusable; certificate verification may fail. \
                 Point it at your distribution's CA bundle, e.g. SSL_CERT_FILE={}",
                suggestion
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ome_tls_{}_{}", std::process::id(), name))
    }

    // Self-signed P-256 CA, valid until 2126
    const TEST_CA_PEM: &str = "\
-----BEGIN CERTIFICATE-----
MIIBgjCCASmgAwIBAgIUESZDsN1X6Ze/XxEUm3eAXXDDiHkwCgYIKoZIzj0EAwIw
FjEUMBIGA1UEAwwLb21lLXRlc3QtY2EwIBcNMjYxMDE2MTAzMjAxWhgPMjEyNjA5
MjIxMDMyMDFaMBYxFDASBgNVBAMMC29tZS10ZXN0LWNhMFkwEwYHKoZIzj0CAQYI
KoZIzj0DAQcDQgAEf9/HIsel7PRutlgdJzRKF7+hBEuRaUy041pysw4t89NhmHS+
N/2EA7TWiQDXedKndbWuKNjuuGnczrnY7lzb0qNTMFEwHQYDVR0OBBYEFPiEqrxA
+8mvxyPM6is/F6MSBwKEMB8GA1UdIwQYMBaAFPiEqrxA+8mvxyPM6is/F6MSBwKE
MA8GA1UdEwEB/wQFMAMBAf8wCgYIKoZIzj0EAwIDRwAwRAIgBaP979l75Fup6Raw
OcWAXRrmpAyoX1bETmkZ6IhGrLsCIFDrTnEha9gve1WFQJ41fDIXiRYcI+t+GDA1
vWg1HDse
-----END CERTIFICATE-----
";

    fn lookup_for(path: &Path) -> impl Fn(&str) -> Option<String> {
        let value = path.display().to_string();
        move |key| (key == SSL_CERT_FILE).then(|| value.clone())
    }

    #[test]
    fn test_valid_bundle_loads() {
        let path = temp_path("valid.pem");
        std::fs::write(&path, TEST_CA_PEM).unwrap();

        let result = load_bundle(&path);
        let _ = std::fs::remove_file(&path);

        assert_eq!(result.unwrap().len(), 1);
    }

    #[test]
    fn test_unset_variable_adds_nothing() {
        assert!(root_certificates_from(|_| None).is_empty());
        assert!(root_certificates_from(|_| Some("  ".to_string())).is_empty());
    }

    #[test]
    fn test_readable_bundle_adds_roots() {
        let path = temp_path("roots.pem");
        std::fs::write(&path, format!("{}\n{}", TEST_CA_PEM, TEST_CA_PEM)).unwrap();

        let certs = root_certificates_from(lookup_for(&path));
        let _ = std::fs::remove_file(&path);

        assert_eq!(certs.len(), 2);
    }

    #[test]
    fn test_unusable_path_falls_back_to_default_roots() {
        let path = temp_path("nowhere.pem");
        let _ = std::fs::remove_file(&path);
        assert!(root_certificates_from(lookup_for(&path)).is_empty());
    }

    #[test]
    fn test_missing_bundle_is_read_error() {
        let path = temp_path("missing.pem");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(load_bundle(&path), Err(TlsError::Read { .. })));
    }

    #[test]
    fn test_garbage_bundle_is_rejected() {
        let path = temp_path("garbage.pem");
        std::fs::write(&path, b"this is not a certificate").unwrap();

        let result = load_bundle(&path);
        let _ = std::fs::remove_file(&path);

        assert!(result.is_err());
    }

    #[test]
    fn test_error_mentions_path() {
        let path = temp_path("absent.pem");
        let _ = std::fs::remove_file(&path);
        let err = load_bundle(&path).unwrap_err();
        assert!(err.to_string().contains("absent.pem"));
    }
}
