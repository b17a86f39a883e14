//! Naming utilities for applications, environments, and state stores
//!
//! Store and bucket names are derived deterministically from an application
//! name and a deployment environment, so repeated runs land on the same
//! backend.

/// Lower-cases `text`, replaces spaces with hyphens, and strips every
/// character outside `[a-z0-9-]`.
///
/// Total and idempotent: sanitizing an already-sanitized string is a no-op.
pub fn sanitize_name(text: &str) -> String {
    text.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Like [`sanitize_name`] but keeps dots, for identifiers that are allowed
/// to carry them (project names, DNS-style labels).
pub fn sanitize_identifier(text: &str) -> String {
    text.to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect()
}

/// Deployment environment a stack is provisioned for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Sandbox,
    Development,
    Integration,
    Production,
    /// Fallback for values this layer does not recognize; degrades to a
    /// generic short code instead of failing.
    Unknown,
}

impl Environment {
    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Environment::Sandbox => "Sandbox",
            Environment::Development => "Development",
            Environment::Integration => "Integration",
            Environment::Production => "Production",
            Environment::Unknown => "Unknown",
        }
    }

    /// Fixed three-letter code used in derived resource names.
    pub fn short_code(self) -> &'static str {
        match self {
            Environment::Sandbox => "sbx",
            Environment::Development => "dev",
            Environment::Integration => "int",
            Environment::Production => "prd",
            Environment::Unknown => "etc",
        }
    }

    /// Parse an environment from a name or short code, case-insensitively.
    /// Unrecognized input falls back to [`Environment::Unknown`].
    pub fn parse(text: &str) -> Self {
        match text.to_lowercase().as_str() {
            "sandbox" | "sbx" => Environment::Sandbox,
            "development" | "dev" => Environment::Development,
            "integration" | "int" => Environment::Integration,
            "production" | "prd" => Environment::Production,
            _ => Environment::Unknown,
        }
    }
}

impl From<u8> for Environment {
    fn from(value: u8) -> Self {
        match value {
            0 => Environment::Sandbox,
            1 => Environment::Development,
            2 => Environment::Integration,
            3 => Environment::Production,
            _ => Environment::Unknown,
        }
    }
}

/// An application name as supplied by the caller, before sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application(String);

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Sanitized identifier, safe for store and bucket names.
    pub fn id(&self) -> String {
        sanitize_name(&self.0)
    }
}

impl From<&str> for Application {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Application {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Derive the state store name for an application in an environment:
/// `<application-id>-<environment-code>`.
pub fn state_store_name(app: &Application, env: Environment) -> String {
    format!("{}-{}", app.id(), env.short_code())
}
