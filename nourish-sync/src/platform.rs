//! Platform capability probe.
//!
//! Backend selection happens exactly once, at startup, from an injected
//! probe value. No call path re-checks the platform afterwards; the chosen
//! backend's identity is fixed for the process lifetime.

/// Name of the native preference-store plugin.
pub const PREFERENCES_PLUGIN: &str = "Preferences";

/// Capability probe answering the two questions backend selection asks.
///
/// Implementations are expected to be cheap and constant: the probe is
/// queried once at selection time and never again.
pub trait PlatformProbe: Send + Sync {
    /// Whether the app runs inside the native (mobile) runtime.
    fn is_native_runtime(&self) -> bool;

    /// Whether the named native plugin is installed.
    fn is_plugin_available(&self, name: &str) -> bool;
}

/// A probe with fixed answers.
///
/// Production builds construct one from the embedding runtime's flags;
/// tests construct whichever platform they need.
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    native: bool,
    plugins: Vec<String>,
}

impl FixedProbe {
    /// A web runtime: not native, no plugins.
    pub fn web() -> Self {
        Self::default()
    }

    /// A native runtime with the given plugins installed.
    pub fn native(plugins: &[&str]) -> Self {
        Self {
            native: true,
            plugins: plugins.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PlatformProbe for FixedProbe {
    fn is_native_runtime(&self) -> bool {
        self.native
    }

    fn is_plugin_available(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p == name)
    }
}
