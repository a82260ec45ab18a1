//! Endpoint URL construction

use drift_core::ApiKind;

/// Full URL for an operation.
///
/// SOAP services are addressed by their base URL alone. For REST the path
/// is appended to the base unless it is blank or the base already ends
/// with it.
pub fn construct_url(base_url: &str, path: Option<&str>, kind: ApiKind) -> String {
    if kind == ApiKind::Soap {
        return base_url.to_string();
    }

    let base = base_url.strip_suffix('/').unwrap_or(base_url);
    let path = match path.map(str::trim) {
        Some(path) if !path.is_empty() => path,
        _ => return base.to_string(),
    };

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if base.ends_with(&path) {
        base.to_string()
    } else {
        format!("{}{}", base, path)
    }
}
