//! TLS certificate loading for the terminating listener.

use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load TLS configuration from PEM certificate and key files.
///
/// Existence is checked up front so a missing file fails with a clear error
/// instead of a rustls parse failure.
pub async fn load_tls_config(
    cert_path: &Path,
    key_path: &Path,
) -> Result<RustlsConfig, std::io::Error> {
    if !cert_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("certificate file not found: {}", cert_path.display()),
        ));
    }
    if !key_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("private key file not found: {}", key_path.display()),
        ));
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
