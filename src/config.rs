//! Environment selection, client credentials, service endpoints, and crate settings.
//!
//! `endpoints` exposes validated base URLs (`ServiceEndpoints`) for the token endpoint and the
//! three API families, with built-in hosts for each [`Environment`]. `settings` defines the
//! serde-backed [`Settings`] document that feeds the token manager, API client, and room catalog.

pub mod endpoints;
pub mod settings;

pub use endpoints::*;
pub use settings::*;

// self
use crate::_prelude::*;

/// Deployment environment of the upstream hotel platform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	#[default]
	/// User acceptance testing hosts.
	Uat,
	/// Live hosts.
	Production,
}
impl Environment {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Environment::Uat => "uat",
			Environment::Production => "production",
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Redacted client secret wrapper keeping credentials out of logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientSecret(String);
impl ClientSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when no secret has been configured.
	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl Debug for ClientSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ClientSecret").field(&"<redacted>").finish()
	}
}

/// OAuth client credentials issued for one environment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: ClientSecret,
	/// Environment the credentials were issued for.
	pub environment: Environment,
}
impl Credentials {
	/// Creates credentials for the provided environment.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		environment: Environment,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: ClientSecret::new(client_secret),
			environment,
		}
	}

	/// Returns `true` when both the identifier and the secret are present.
	pub fn is_complete(&self) -> bool {
		!self.client_id.trim().is_empty() && !self.client_secret.is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_secret_debug_redacts() {
		let credentials = Credentials::new("client", "super-secret", Environment::Production);
		let rendered = format!("{credentials:?}");

		assert!(!rendered.contains("super-secret"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn incomplete_credentials_are_detected() {
		assert!(!Credentials::default().is_complete());
		assert!(!Credentials::new("client", "   ", Environment::Uat).is_complete());
		assert!(Credentials::new("client", "secret", Environment::Uat).is_complete());
	}

	#[test]
	fn environment_deserializes_from_snake_case() {
		let environment: Environment = serde_json::from_str("\"production\"")
			.expect("Environment label should deserialize.");

		assert_eq!(environment, Environment::Production);
		assert_eq!(environment.to_string(), "production");
	}
}
