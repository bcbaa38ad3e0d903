//! Base URLs for the token endpoint and the shop, distribution, and generic API families.

// self
use crate::{_prelude::*, config::Environment};

/// API family a data request targets; selects the base URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiClass {
	/// Shop API (room lists).
	Shop,
	/// IDS distribution/content API (OTA descriptive info).
	Distribution,
	/// Generic API host (rate calendar and everything else).
	Generic,
}
impl ApiClass {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApiClass::Shop => "shop",
			ApiClass::Distribution => "distribution",
			ApiClass::Generic => "generic",
		}
	}
}
impl Display for ApiClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Errors raised while constructing or validating endpoint sets.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum EndpointError {
	/// A required endpoint was not supplied.
	#[error("Missing {endpoint} endpoint.")]
	Missing {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS (loopback hosts excepted).
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Hard-coded environment host failed to parse.
	#[error("Built-in {endpoint} endpoint `{url}` is invalid.")]
	InvalidBuiltIn {
		/// Which endpoint failed to parse.
		endpoint: &'static str,
		/// Offending URL.
		url: &'static str,
	},
}

/// Validated endpoint set consumed by the token manager and API client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
	/// OAuth token endpoint (`/connect/token`).
	pub token: Url,
	/// Shop API base URL.
	pub shop: Url,
	/// IDS distribution API base URL.
	pub distribution: Url,
	/// Generic API base URL.
	pub generic: Url,
}
impl ServiceEndpoints {
	/// Creates a new builder.
	pub fn builder() -> ServiceEndpointsBuilder {
		ServiceEndpointsBuilder::default()
	}

	/// Returns the built-in SHR hosts for an environment.
	pub fn for_environment(environment: Environment) -> Result<Self, EndpointError> {
		let [token, shop, distribution, generic] = match environment {
			Environment::Uat => [
				"https://iduat.shrglobal.com/connect/token",
				"https://apiuat.shrglobal.com/shop",
				"https://idsuat.shrglobal.com",
				"https://apiuat.shrglobal.com",
			],
			Environment::Production => [
				"https://id.shrglobal.com/connect/token",
				"https://api.shrglobal.com/shop",
				"https://ids.shrglobal.com",
				"https://api.shrglobal.com",
			],
		};

		Self::builder()
			.token(built_in("token", token)?)
			.shop(built_in("shop", shop)?)
			.distribution(built_in("distribution", distribution)?)
			.generic(built_in("generic", generic)?)
			.build()
	}

	/// Base URL for an API family.
	pub fn base_for(&self, class: ApiClass) -> &Url {
		match class {
			ApiClass::Shop => &self.shop,
			ApiClass::Distribution => &self.distribution,
			ApiClass::Generic => &self.generic,
		}
	}

	/// Joins an endpoint path (with optional query) onto the family's base URL.
	///
	/// The path is appended verbatim so base URLs that carry a path prefix (`…/shop`) keep it.
	pub fn url_for(&self, class: ApiClass, endpoint: &str) -> Result<Url, crate::error::ConfigError> {
		let base = self.base_for(class).as_str().trim_end_matches('/');
		let joined = if endpoint.starts_with('/') {
			format!("{base}{endpoint}")
		} else {
			format!("{base}/{endpoint}")
		};

		Url::parse(&joined)
			.map_err(|source| crate::error::ConfigError::InvalidRequestUrl { url: joined, source })
	}

	fn validate(&self) -> Result<(), EndpointError> {
		validate_endpoint("token", &self.token)?;
		validate_endpoint("shop", &self.shop)?;
		validate_endpoint("distribution", &self.distribution)?;
		validate_endpoint("generic", &self.generic)?;

		Ok(())
	}
}

/// Builder for [`ServiceEndpoints`] values.
#[derive(Debug, Default)]
pub struct ServiceEndpointsBuilder {
	/// OAuth token endpoint.
	pub token: Option<Url>,
	/// Shop API base URL.
	pub shop: Option<Url>,
	/// IDS distribution API base URL.
	pub distribution: Option<Url>,
	/// Generic API base URL.
	pub generic: Option<Url>,
}
impl ServiceEndpointsBuilder {
	/// Sets the token endpoint.
	pub fn token(mut self, url: Url) -> Self {
		self.token = Some(url);

		self
	}

	/// Sets the shop API base URL.
	pub fn shop(mut self, url: Url) -> Self {
		self.shop = Some(url);

		self
	}

	/// Sets the distribution API base URL.
	pub fn distribution(mut self, url: Url) -> Self {
		self.distribution = Some(url);

		self
	}

	/// Sets the generic API base URL.
	pub fn generic(mut self, url: Url) -> Self {
		self.generic = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting endpoint set.
	pub fn build(self) -> Result<ServiceEndpoints, EndpointError> {
		let endpoints = ServiceEndpoints {
			token: self.token.ok_or(EndpointError::Missing { endpoint: "token" })?,
			shop: self.shop.ok_or(EndpointError::Missing { endpoint: "shop" })?,
			distribution: self
				.distribution
				.ok_or(EndpointError::Missing { endpoint: "distribution" })?,
			generic: self.generic.ok_or(EndpointError::Missing { endpoint: "generic" })?,
		};

		endpoints.validate()?;

		Ok(endpoints)
	}
}

fn built_in(endpoint: &'static str, url: &'static str) -> Result<Url, EndpointError> {
	Url::parse(url).map_err(|_| EndpointError::InvalidBuiltIn { endpoint, url })
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), EndpointError> {
	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(EndpointError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse endpoint fixture URL.")
	}

	#[test]
	fn environments_resolve_distinct_hosts() {
		let uat = ServiceEndpoints::for_environment(Environment::Uat)
			.expect("UAT endpoints should validate.");
		let production = ServiceEndpoints::for_environment(Environment::Production)
			.expect("Production endpoints should validate.");

		assert_eq!(uat.token.as_str(), "https://iduat.shrglobal.com/connect/token");
		assert_eq!(production.token.as_str(), "https://id.shrglobal.com/connect/token");
		assert_eq!(production.base_for(ApiClass::Shop).as_str(), "https://api.shrglobal.com/shop");
		assert_eq!(uat.base_for(ApiClass::Distribution).as_str(), "https://idsuat.shrglobal.com/");
	}

	#[test]
	fn url_for_keeps_base_path_prefix() {
		let endpoints = ServiceEndpoints::for_environment(Environment::Uat)
			.expect("UAT endpoints should validate.");
		let joined = endpoints
			.url_for(ApiClass::Shop, "/hotelDetails/HTL1/room?channelId=1")
			.expect("Room endpoint should join onto the shop base.");

		assert_eq!(
			joined.as_str(),
			"https://apiuat.shrglobal.com/shop/hotelDetails/HTL1/room?channelId=1"
		);
	}

	#[test]
	fn builder_rejects_insecure_and_missing_endpoints() {
		let err = ServiceEndpoints::builder()
			.token(url("https://id.example.com/connect/token"))
			.shop(url("https://api.example.com/shop"))
			.generic(url("https://api.example.com"))
			.build()
			.expect_err("Builder should reject a missing distribution endpoint.");

		assert_eq!(err, EndpointError::Missing { endpoint: "distribution" });

		let err = ServiceEndpoints::builder()
			.token(url("http://id.example.com/connect/token"))
			.shop(url("https://api.example.com/shop"))
			.distribution(url("https://ids.example.com"))
			.generic(url("https://api.example.com"))
			.build()
			.expect_err("Builder should reject plain HTTP on public hosts.");

		assert!(matches!(err, EndpointError::InsecureEndpoint { endpoint: "token", .. }));
	}

	#[test]
	fn loopback_hosts_may_use_plain_http() {
		let endpoints = ServiceEndpoints::builder()
			.token(url("http://127.0.0.1:8080/connect/token"))
			.shop(url("http://127.0.0.1:8080/shop"))
			.distribution(url("http://localhost:8080/ids"))
			.generic(url("http://127.0.0.1:8080"))
			.build();

		assert!(endpoints.is_ok());
	}
}
