//! Host name lookup used by the `$HOSTNAME` keyword.

use std::process::{Command, Stdio};

/// Source of the local host name.
///
/// Failures are not errors: a resolver that cannot find the name returns an
/// empty string and the keyword expands to nothing.
pub trait HostnameResolver: Send + Sync {
    fn hostname(&self) -> String;
}

/// Queries `hostname -f` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostname;

impl HostnameResolver for SystemHostname {
    fn hostname(&self) -> String {
        let output = Command::new("hostname")
            .arg("-f")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        match output {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
            Ok(out) => {
                tracing::debug!(status = %out.status, "hostname lookup exited unsuccessfully");
                String::new()
            }
            Err(e) => {
                tracing::debug!(error = %e, "hostname lookup failed");
                String::new()
            }
        }
    }
}

/// A constant host name.
#[derive(Debug, Clone, Default)]
pub struct FixedHostname(String);

impl FixedHostname {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl HostnameResolver for FixedHostname {
    fn hostname(&self) -> String {
        self.0.clone()
    }
}
