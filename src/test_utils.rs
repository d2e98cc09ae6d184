//! Shared helpers for endpoint tests.

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{
    app_state::AppState,
    auth::encode_jwt,
    password::PasswordHash,
    routing::build_router,
    user::{User, create_user},
};

/// The plain-text password used for every test account.
pub(crate) const TEST_PASSWORD: &str = "correcthorsebatterystaple";

/// Create an [AppState] backed by a fresh in-memory database.
pub(crate) fn test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open in-memory database");

    AppState::new(connection, "nafstenoas").expect("Could not create app state")
}

/// Create a test server running the full application router.
pub(crate) fn test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server")
}

/// Insert a user with [TEST_PASSWORD] and return it with a valid bearer token.
///
/// The password is hashed with a low cost to keep tests fast.
pub(crate) fn create_test_user(state: &AppState, email: &str) -> (User, String) {
    let user = {
        let connection = state.db_connection.lock().unwrap();
        let password_hash =
            PasswordHash::new(crate::password::ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
                .expect("Could not hash test password");

        create_user(email.parse().unwrap(), password_hash, &connection)
            .expect("Could not create test user")
    };

    let token = encode_jwt(user.id, state.encoding_key()).expect("Could not encode test token");

    (user, token)
}
