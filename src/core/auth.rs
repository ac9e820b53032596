//! Session checks against the service's auth endpoints.
//!
//! Every failure degrades to "not authenticated" or to a toast; nothing here
//! returns an error to the caller.

use serde_json::{json, Value};
use tracing::warn;

use crate::api::Backend;
use crate::core::notify::Notifications;

pub const LOGOUT_OK_MESSAGE: &str = "Déconnexion réussie";
pub const LOGOUT_FAILED_MESSAGE: &str = "Erreur lors de la déconnexion";
pub const LOGOUT_UNREACHABLE_MESSAGE: &str = "Erreur de connexion";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Veuillez vous connecter pour continuer";

pub async fn is_authenticated(backend: &dyn Backend) -> bool {
    match backend.check_auth().await {
        Ok(status) => status.authenticated,
        Err(err) => {
            warn!(error = %err, "Auth check failed");
            false
        }
    }
}

/// Gate for flows that need a logged-in user; asks the user to log in when
/// the check fails.
pub async fn require_auth(backend: &dyn Backend, notifications: &mut Notifications) -> bool {
    let authenticated = is_authenticated(backend).await;
    if !authenticated {
        notifications.warning(LOGIN_REQUIRED_MESSAGE);
    }
    authenticated
}

/// Log out, reporting the result as a toast. Returns whether the server
/// confirmed it.
pub async fn logout(backend: &dyn Backend, notifications: &mut Notifications) -> bool {
    match backend.logout().await {
        Ok(true) => {
            notifications.success(LOGOUT_OK_MESSAGE);
            true
        }
        Ok(false) => {
            notifications.error(LOGOUT_FAILED_MESSAGE);
            false
        }
        Err(err) => {
            warn!(error = %err, "Logout request failed");
            notifications.error(LOGOUT_UNREACHABLE_MESSAGE);
            false
        }
    }
}

/// The profile payload as the server sent it, or `{"success": false}`.
pub async fn profile(backend: &dyn Backend) -> Value {
    match backend.profile().await {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "Profile request failed");
            json!({ "success": false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, AuthStatus};
    use crate::core::notify::ToastKind;
    use crate::utils::test_utils::ScriptedBackend;

    #[tokio::test]
    async fn auth_errors_read_as_logged_out() {
        let backend = ScriptedBackend::new()
            .auth_with(Ok(AuthStatus {
                authenticated: true,
            }))
            .auth_with(Err(ApiError::Status {
                status: 500,
                body: String::new(),
            }));

        let mut notifications = Notifications::new();

        assert!(require_auth(&backend, &mut notifications).await);
        assert!(notifications.active().is_empty());
        assert!(!require_auth(&backend, &mut notifications).await);
        assert!(notifications.contains(ToastKind::Warning, LOGIN_REQUIRED_MESSAGE));
        // Nothing scripted left: still just `false`.
        assert!(!is_authenticated(&backend).await);
    }

    #[tokio::test]
    async fn logout_reports_each_outcome() {
        let backend = ScriptedBackend::new()
            .logout_with(Ok(true))
            .logout_with(Ok(false))
            .logout_with(Err(ApiError::Malformed("eof".into())));
        let mut notifications = Notifications::new();

        assert!(logout(&backend, &mut notifications).await);
        assert!(notifications.contains(ToastKind::Success, LOGOUT_OK_MESSAGE));
        assert!(!logout(&backend, &mut notifications).await);
        assert!(notifications.contains(ToastKind::Error, LOGOUT_FAILED_MESSAGE));
        assert!(!logout(&backend, &mut notifications).await);
        assert!(notifications.contains(ToastKind::Error, LOGOUT_UNREACHABLE_MESSAGE));
    }

    #[tokio::test]
    async fn profile_failure_yields_unsuccessful_payload() {
        let backend = ScriptedBackend::new();
        assert_eq!(profile(&backend).await, json!({ "success": false }));
    }
}
