//! Server endpoint presets.
//!
//! The client talks to one of two kinds of server: a local development
//! server over plain WebSocket, or the hosted server over TLS.

use std::fmt;

/// Default address of a local development server.
pub const DEFAULT_LOCAL_ADDR: &str = "localhost:8080";

/// URL of the hosted server.
pub const DEFAULT_REMOTE_URL: &str = "wss://terminal-chat-server-golang.onrender.com/ws";

/// Which server preset to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServerMode {
    /// Plain `ws://` to a caller supplied `host:port`.
    #[default]
    Local,
    /// Encrypted `wss://` to the hosted server.
    Remote,
}

impl fmt::Display for ServerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMode::Local => f.write_str("local"),
            ServerMode::Remote => f.write_str("remote"),
        }
    }
}

/// A resolved server endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    mode: ServerMode,
    url: String,
}

impl Endpoint {
    /// Local endpoint at `ws://<addr>/`.
    #[must_use]
    pub fn local(addr: &str) -> Self {
        Self {
            mode: ServerMode::Local,
            url: format!("ws://{addr}/"),
        }
    }

    /// The hosted endpoint.
    #[must_use]
    pub fn remote() -> Self {
        Self::remote_at(DEFAULT_REMOTE_URL)
    }

    /// A hosted endpoint at a custom URL.
    #[must_use]
    pub fn remote_at(url: impl Into<String>) -> Self {
        Self {
            mode: ServerMode::Remote,
            url: url.into(),
        }
    }

    /// Select an endpoint from a mode flag.
    ///
    /// `local_addr` is used in [`ServerMode::Local`]; `remote_url` in
    /// [`ServerMode::Remote`].
    #[must_use]
    pub fn from_mode(mode: ServerMode, local_addr: &str, remote_url: &str) -> Self {
        match mode {
            ServerMode::Local => Self::local(local_addr),
            ServerMode::Remote => Self::remote_at(remote_url),
        }
    }

    /// The URL to dial.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The preset this endpoint was built from.
    #[must_use]
    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    /// Whether the endpoint uses TLS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.starts_with("wss://")
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::local(DEFAULT_LOCAL_ADDR)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
