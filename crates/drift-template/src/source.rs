//! Template source resolution

use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Turn a configured template source into template text.
///
/// If `source` names an existing regular file its content is the template;
/// anything else (missing path, directory, inline JSON/XML) is used as the
/// literal template. Never fails.
pub fn resolve_template(source: &str) -> String {
    let path = Path::new(source);
    if !path.is_file() {
        return source.to_string();
    }

    match fs::read_to_string(path) {
        Ok(content) => {
            debug!("Loaded payload template from {:?}", path);
            content
        }
        Err(e) => {
            warn!(
                "Could not read payload template {:?}, using it as literal text: {}",
                path, e
            );
            source.to_string()
        }
    }
}
