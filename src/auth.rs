//! Bearer-token authentication: the JWT claims extracted by protected
//! routes and the sign-in handler that issues tokens.

use axum::{
    Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use email_address::EmailAddress;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{
    Error,
    app_state::AppState,
    user::{UserID, get_user_by_email},
};

/// How long issued tokens stay valid.
const TOKEN_DURATION: Duration = Duration::minutes(15);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// The ID of the user the token was issued to.
    pub user_id: UserID,
}

impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        let app_state = AppState::from_ref(state);
        let token_data = decode_jwt(bearer.token(), app_state.decoding_key())?;

        Ok(token_data.claims)
    }
}

/// The credentials entered during sign-in.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Email entered during sign-in.
    pub email: EmailAddress,
    /// Password entered during sign-in.
    pub password: String,
}

/// The errors that may occur while authenticating a request.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// The email/password combination did not match a registered user.
    WrongCredentials,
    /// A token could not be created for a signed-in user.
    TokenCreation,
    /// The request carried a missing, malformed, or expired bearer token.
    InvalidToken,
    /// An unexpected error occurred; details are logged on the server.
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AuthError::WrongCredentials => (StatusCode::UNAUTHORIZED, "Credenciais inválidas!"),
            AuthError::TokenCreation => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro ao criar o token!")
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Token inválido!"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Erro interno do servidor!")
            }
        };

        (status_code, Json(json!({ "error": error_message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct SignInResponse {
    token: String,
    message: String,
}

/// Handler for sign-in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AuthError> {
    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| AuthError::InternalError)?;

        get_user_by_email(&credentials.email, &connection).map_err(|error| match error {
            Error::UserNotFound => AuthError::WrongCredentials,
            error => {
                tracing::error!("Error matching user: {error}");
                AuthError::InternalError
            }
        })?
    };

    let password_is_correct = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            AuthError::InternalError
        })?;

    if !password_is_correct {
        return Err(AuthError::WrongCredentials);
    }

    let token = encode_jwt(user.id, state.encoding_key())?;

    Ok(Json(SignInResponse {
        token,
        message: "Login realizado com sucesso!".to_owned(),
    })
    .into_response())
}

pub(crate) fn encode_jwt(
    user_id: UserID,
    encoding_key: &EncodingKey,
) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        exp: (now + TOKEN_DURATION).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
        user_id,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|_| AuthError::TokenCreation)
}

fn decode_jwt(token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, AuthError> {
    decode(token, decoding_key, &Validation::default()).map_err(|_| AuthError::InvalidToken)
}
