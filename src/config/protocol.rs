//! Supported protocol versions and the methods each one allows.
//!
//! Built once at startup and shared read-only by every connection.

use std::collections::HashMap;

/// Version string used for requests with a two-token request line.
pub const HTTP_09: &str = "0.9";
pub const HTTP_10: &str = "1.0";
pub const HTTP_11: &str = "1.1";

#[derive(Debug, Clone)]
pub struct Protocol {
    versions: HashMap<&'static str, &'static [&'static str]>,
}

impl Protocol {
    pub fn new() -> Self {
        let mut versions: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        versions.insert(HTTP_09, &["GET"]);
        versions.insert(HTTP_10, &["GET", "POST", "HEAD", "OPTIONS", "TRACE"]);
        versions.insert(
            HTTP_11,
            &["GET", "HEAD", "POST", "PUT", "DELETE", "TRACE", "OPTIONS", "CONNECT", "PATCH"],
        );
        Self { versions }
    }

    pub fn supports(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }

    /// Whether `method` may be used with `version`. Unknown versions allow nothing.
    pub fn allows(&self, version: &str, method: &str) -> bool {
        self.versions
            .get(version)
            .map(|methods| methods.contains(&method))
            .unwrap_or(false)
    }

    pub fn methods(&self, version: &str) -> &[&'static str] {
        self.versions.get(version).copied().unwrap_or(&[])
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new()
    }
}
