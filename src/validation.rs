use crate::error::ApiError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const USERNAME_MIN_LEN: usize = 5;
const PASSWORD_UPDATE_LEN: std::ops::RangeInclusive<usize> = 8..=20;
/// bcrypt ignores everything past this many bytes.
const PASSWORD_MAX_BYTES: usize = 72;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern")
});

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    fn password_bytes(&mut self, password: &str) {
        if password.len() > PASSWORD_MAX_BYTES {
            self.fail("password", "Password must be at most 72 bytes.");
        }
    }

    fn username(&mut self, username: &str) {
        if username.chars().count() < USERNAME_MIN_LEN {
            self.fail(
                "username",
                "Username is required and must be at least 5 characters long.",
            );
        }
        if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
            self.fail("username", "Username contains non-alphanumeric characters.");
        }
    }

    fn email(&mut self, email: &str) {
        if !EMAIL.is_match(email) {
            self.fail("email", "A valid email is required.");
        }
    }

    fn birthdate(&mut self, birthdate: &str) -> Option<NaiveDate> {
        let parsed = NaiveDate::parse_from_str(birthdate, "%Y-%m-%d").ok();
        if parsed.is_none() {
            self.fail(
                "birthdate",
                "Birthdate must be a valid date in YYYY-MM-DD format.",
            );
        }
        parsed
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Body of `POST /users`. Fields are optional here so a missing field is
/// reported alongside the others instead of failing deserialization.
#[derive(Deserialize, Debug, Default)]
pub struct Registration {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub birthdate: NaiveDate,
}

impl Registration {
    pub fn validate(self) -> Result<NewUser, ApiError> {
        let mut check = Checker::default();
        let username = self.username.unwrap_or_default();
        let password = self.password.unwrap_or_default();
        let email = self.email.unwrap_or_default();
        check.username(&username);
        if password.is_empty() {
            check.fail("password", "Password is required.");
        } else {
            check.password_bytes(&password);
        }
        check.email(&email);
        let birthdate = check.birthdate(self.birthdate.as_deref().unwrap_or_default());
        match birthdate {
            Some(birthdate) => check.finish(NewUser {
                username,
                password,
                email,
                birthdate,
            }),
            None => Err(ApiError::Validation(check.errors)),
        }
    }
}

/// Body of `PUT /users/{username}`. Absent fields are left untouched.
#[derive(Deserialize, Debug, Default)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub birthdate: Option<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub birthdate: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub fn validate(self) -> Result<ProfileChanges, ApiError> {
        let mut check = Checker::default();
        if let Some(username) = &self.username {
            check.username(username);
        }
        if let Some(password) = &self.password {
            if !PASSWORD_UPDATE_LEN.contains(&password.chars().count()) {
                check.fail("password", "Password must be between 8 and 20 characters.");
            } else {
                check.password_bytes(password);
            }
        }
        if let Some(email) = &self.email {
            check.email(email);
        }
        let birthdate = self.birthdate.as_deref().and_then(|b| check.birthdate(b));
        check.finish(ProfileChanges {
            username: self.username,
            password: self.password,
            email: self.email,
            birthdate,
        })
    }
}
