//! Demonstrates the explicit-registration pattern that replaces the
//! original's dynamic scan-based registry population (SPEC_FULL.md §4.11):
//! application code calls `Registry::register` from a plain function
//! instead of relying on import-time side effects.

use r2e_rpc::prelude::*;

mod registrations {
    use r2e_rpc::prelude::*;

    pub fn register_all(registry: &Registry) -> Result<(), ConfigurationError> {
        registry.register(
            "api_user",
            "users",
            "user",
            Some("v1"),
            Some("/users/{username}"),
            &[HttpMethod::Get, HttpMethod::Post],
            Some("/users"),
            &[HttpMethod::Get],
        )?;
        registry.register(
            "api_notification",
            "notifications",
            "notif",
            None,
            Some("/notifications/{id}"),
            &[HttpMethod::Get],
            None,
            &[],
        )?;
        Ok(())
    }
}

#[test]
fn explicit_registration_populates_every_declared_route() {
    let registry = Registry::new();
    registrations::register_all(&registry).unwrap();

    let users = registry.get_route("api_user", "users").unwrap();
    assert!(users.has_item_method(HttpMethod::Get));
    assert!(users.has_item_method(HttpMethod::Post));
    assert!(users.has_collection_method(HttpMethod::Get));

    let notifications = registry.get_route("api_notification", "notifications").unwrap();
    assert!(notifications.has_item_method(HttpMethod::Get));
    assert!(!notifications.has_collection_method(HttpMethod::Get));
}

#[test]
fn re_running_registration_is_idempotent() {
    let registry = Registry::new();
    registrations::register_all(&registry).unwrap();
    registrations::register_all(&registry).unwrap();

    let binding = registry.get_service("api_user").unwrap();
    assert_eq!(binding.service, "user");
    assert_eq!(binding.version.as_deref(), Some("v1"));
}

#[test]
fn conflicting_re_registration_is_an_error() {
    let registry = Registry::new();
    registrations::register_all(&registry).unwrap();

    let err = registry
        .register(
            "api_user",
            "users",
            "user-v2",
            Some("v2"),
            Some("/users/{username}"),
            &[HttpMethod::Get],
            None,
            &[],
        )
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::UnregisteredResource { .. }));
}
