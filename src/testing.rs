use crate::auth::{hash_password, TokenKeys, TOKEN_LIFETIME};
use crate::database::tests::user;
use crate::database::UserDb;

pub fn keys() -> TokenKeys {
    TokenKeys::from_secret(b"test secret", TOKEN_LIFETIME)
}

/// Stores a user directly and returns its id together with a token minted
/// by `keys()`.
pub fn register_user(db: &sled::Db, username: &str, password: &str) -> (u64, String) {
    let mut record = user(username);
    record.password_hash = hash_password(password).unwrap();
    let id = db.add_user(&record).unwrap();
    (id, keys().issue(id, username).unwrap())
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! test_app {
    ($db:expr, $keys:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::new($keys.clone()))
                .app_data(actix_web::web::Data::new(crate::load_templates().unwrap()))
                .configure(crate::configure),
        )
        .await
    };
}

pub(crate) use test_app;
