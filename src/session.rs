use crate::auth;
use crate::error::{log_error, ApiError};
use crate::model::UserView;
use crate::{Db, Keys};
use actix_web::{web, HttpResponse};
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct LoginParams {
    username: String,
    password: String,
}

/// Returned by login and registration: the user and a fresh bearer token.
#[derive(Serialize)]
pub struct AuthResponse<'a> {
    pub user: UserView<'a>,
    pub token: String,
}

pub fn mint_token(keys: &Keys, id: u64, username: &str) -> Result<String, ApiError> {
    keys.issue(id, username)
        .map_err(|err| log_error(err, "Token error"))
}

pub async fn login(
    params: web::Json<LoginParams>,
    db: Db,
    keys: Keys,
) -> Result<HttpResponse, ApiError> {
    let LoginParams { username, password } = params.into_inner();
    let (id, user) =
        web::block(move || auth::verify_credentials(db.get_ref(), &username, &password)).await??;
    let token = mint_token(&keys, id, &user.username)?;
    info!("{} logged in", user.username);
    Ok(HttpResponse::Ok().json(AuthResponse {
        user: user.view(id),
        token,
    }))
}
