//! Post-login hook that mirrors authorization roles into custom token claims.
//!
//! The hook is independent of the rotation pipeline. The login runtime hands over a
//! [`PostLoginEvent`] and a [`PostLoginApi`]; [`ClaimDecorator`] writes
//! `"<namespace>/roles"` on both the ID token and the access token when the event carries
//! an authorization context.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Claim namespace used when none is configured.
pub const DEFAULT_CLAIM_NAMESPACE: &str = "https://my-app.example.com";

/// Login event as delivered by the runtime. Fields other than `authorization` are ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PostLoginEvent {
	/// Authorization context, absent when RBAC is disabled for the application.
	#[serde(default)]
	pub authorization: Option<AuthorizationContext>,
}

/// Roles assigned to the user logging in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationContext {
	/// Role names, in the order the runtime supplied them. `null` reads as no roles.
	#[serde(default, deserialize_with = "null_as_empty")]
	pub roles: Vec<String>,
}

/// A token under construction that accepts custom claims.
pub trait ClaimSink {
	/// Sets (or overwrites) the claim `name`.
	fn set_custom_claim(&mut self, name: &str, value: Value);
}

/// Mutation surface the login runtime exposes to the hook.
pub trait PostLoginApi {
	/// ID token being issued.
	fn id_token(&mut self) -> &mut dyn ClaimSink;

	/// Access token being issued.
	fn access_token(&mut self) -> &mut dyn ClaimSink;
}

/// Custom claims recorded on one issued token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssuedTokenClaims(BTreeMap<String, Value>);
impl IssuedTokenClaims {
	/// Returns the claim stored under `name`.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Number of custom claims set.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// `true` when no custom claim was set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl ClaimSink for IssuedTokenClaims {
	fn set_custom_claim(&mut self, name: &str, value: Value) {
		self.0.insert(name.to_owned(), value);
	}
}

/// In-process [`PostLoginApi`] that records the claims set on each token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordedLogin {
	/// Claims set on the ID token.
	pub id_token: IssuedTokenClaims,
	/// Claims set on the access token.
	pub access_token: IssuedTokenClaims,
}
impl PostLoginApi for RecordedLogin {
	fn id_token(&mut self) -> &mut dyn ClaimSink {
		&mut self.id_token
	}

	fn access_token(&mut self) -> &mut dyn ClaimSink {
		&mut self.access_token
	}
}

/// Copies authorization roles into namespaced custom claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimDecorator {
	namespace: String,
}
impl ClaimDecorator {
	/// Creates a decorator writing claims under `namespace` (a trailing `/` is dropped).
	pub fn new(namespace: impl Into<String>) -> Self {
		let namespace = namespace.into().trim_end_matches('/').to_owned();

		Self { namespace }
	}

	/// Full claim name for the role list.
	pub fn roles_claim(&self) -> String {
		format!("{}/roles", self.namespace)
	}

	/// Sets the roles claim on both tokens when `event` carries an authorization context.
	///
	/// Without one, nothing is mutated. Running the hook twice yields the same claims.
	pub fn on_execute_post_login(&self, event: &PostLoginEvent, api: &mut dyn PostLoginApi) {
		let Some(authorization) = &event.authorization else {
			return;
		};
		let claim = self.roles_claim();
		let roles = Value::Array(authorization.roles.iter().cloned().map(Value::String).collect());

		api.id_token().set_custom_claim(&claim, roles.clone());
		api.access_token().set_custom_claim(&claim, roles);
	}
}
impl Default for ClaimDecorator {
	fn default() -> Self {
		Self::new(DEFAULT_CLAIM_NAMESPACE)
	}
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Option::<Vec<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn event(raw: Value) -> PostLoginEvent {
		serde_json::from_value(raw).expect("Login event fixture should deserialize.")
	}

	#[test]
	fn roles_are_copied_to_both_tokens() {
		let event = event(json!({
			"user": { "user_id": "auth0|123" },
			"authorization": { "roles": ["admin"] }
		}));
		let mut api = RecordedLogin::default();

		ClaimDecorator::default().on_execute_post_login(&event, &mut api);

		let expected = json!(["admin"]);

		assert_eq!(api.id_token.get("https://my-app.example.com/roles"), Some(&expected));
		assert_eq!(api.access_token.get("https://my-app.example.com/roles"), Some(&expected));
		assert_eq!(api.id_token.len(), 1);
	}

	#[test]
	fn missing_authorization_sets_nothing() {
		let mut api = RecordedLogin::default();

		ClaimDecorator::default().on_execute_post_login(&event(json!({ "user": {} })), &mut api);

		assert!(api.id_token.is_empty());
		assert!(api.access_token.is_empty());
	}

	#[test]
	fn decoration_is_idempotent() {
		let event = event(json!({ "authorization": { "roles": ["admin", "auditor"] } }));
		let decorator = ClaimDecorator::new("https://tenant.example.org/");
		let mut once = RecordedLogin::default();
		let mut twice = RecordedLogin::default();

		decorator.on_execute_post_login(&event, &mut once);
		decorator.on_execute_post_login(&event, &mut twice);
		decorator.on_execute_post_login(&event, &mut twice);

		assert_eq!(once, twice);
		assert_eq!(
			once.access_token.get("https://tenant.example.org/roles"),
			Some(&json!(["admin", "auditor"]))
		);
	}

	#[test]
	fn empty_role_list_is_still_written() {
		let event = event(json!({ "authorization": {} }));
		let mut api = RecordedLogin::default();

		ClaimDecorator::default().on_execute_post_login(&event, &mut api);

		assert_eq!(api.id_token.get(&ClaimDecorator::default().roles_claim()), Some(&json!([])));
	}

	#[test]
	fn null_roles_are_written_as_empty_list() {
		let event = event(json!({ "authorization": { "roles": null } }));
		let claim = ClaimDecorator::default().roles_claim();
		let mut api = RecordedLogin::default();

		ClaimDecorator::default().on_execute_post_login(&event, &mut api);

		assert_eq!(api.id_token.get(&claim), Some(&json!([])));
		assert_eq!(api.access_token.get(&claim), Some(&json!([])));
	}
}
