use crate::model::*;
use sled::transaction::{abort, TransactionError, Transactional};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("record encoding error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("username {0} is already taken")]
    UsernameTaken(String),
    #[error("corrupt index entry for {0}")]
    BadIndex(String),
    #[error("{0} belongs to another account")]
    NotOwner(String),
}

pub type DbResult<T> = Result<T, DbError>;

// Reasons a user transaction gives up. Turned into `DbError` once the
// transaction has been rolled back.
#[derive(Debug)]
enum Abort {
    Taken(String),
    BadIndex(String),
    NotOwner(String),
    Codec(bincode::Error),
}

fn finish<T>(result: Result<T, TransactionError<Abort>>) -> DbResult<T> {
    result.map_err(|err| match err {
        TransactionError::Storage(e) => DbError::Storage(e),
        TransactionError::Abort(Abort::Taken(username)) => DbError::UsernameTaken(username),
        TransactionError::Abort(Abort::BadIndex(key)) => DbError::BadIndex(key),
        TransactionError::Abort(Abort::NotOwner(username)) => DbError::NotOwner(username),
        TransactionError::Abort(Abort::Codec(e)) => DbError::Codec(e),
    })
}

fn serialize_id(id: u64) -> [u8; 8] {
    id.to_le_bytes()
}

fn deserialize_id<V: AsRef<[u8]>>(id: V) -> Option<u64> {
    use std::convert::TryInto;
    id.as_ref().try_into().ok().map(u64::from_le_bytes)
}

pub trait UserDb {
    type Error;
    fn add_user(&self, user: &User) -> Result<u64, Self::Error>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<(u64, User)>, Self::Error>;
    fn list_users(&self) -> Result<Vec<(u64, User)>, Self::Error>;
    /// Applies `change` to the stored user atomically, provided the record
    /// under `username` has id `owner`. A changed username is re-indexed,
    /// failing if the new name belongs to someone else.
    fn update_user<F: Fn(&mut User)>(
        &self,
        username: &str,
        owner: u64,
        change: F,
    ) -> Result<Option<(u64, User)>, Self::Error>;
    /// Removes the user under `username` if its id is `owner`.
    fn remove_user(
        &self,
        username: &str,
        owner: u64,
    ) -> Result<Option<(u64, User)>, Self::Error>;
}

pub trait MovieDb {
    type Error;
    fn add_movie(&self, movie: &Movie) -> Result<u64, Self::Error>;
    fn get_movie(&self, id: u64) -> Result<Option<Movie>, Self::Error>;
    fn list_movies(&self) -> Result<Vec<(u64, Movie)>, Self::Error>;
    /// First movie, in id order, matching `predicate`.
    fn find_movie<P: Fn(&Movie) -> bool>(
        &self,
        predicate: P,
    ) -> Result<Option<(u64, Movie)>, Self::Error>;
}

const USERS: &[u8] = b"users";
const USERS_USERNAME: &[u8] = b"USERS_USERNAME";
const MOVIES: &[u8] = b"movies";

fn decode_all<T: serde::de::DeserializeOwned>(tree: &sled::Tree) -> DbResult<Vec<(u64, T)>> {
    let mut records = Vec::new();
    for entry in tree.iter() {
        let (key, value) = entry?;
        let id = deserialize_id(&key)
            .ok_or_else(|| DbError::BadIndex(String::from_utf8_lossy(&key).into_owned()))?;
        records.push((id, bincode::deserialize(&value)?));
    }
    Ok(records)
}

impl UserDb for sled::Db {
    type Error = DbError;

    fn add_user(&self, user: &User) -> DbResult<u64> {
        let users = self.open_tree(USERS)?;
        let users_username = self.open_tree(USERS_USERNAME)?;
        let id = self.generate_id()?;
        let encoded = bincode::serialize(user)?;
        finish(
            (&users, &users_username).transaction(|(users, users_username)| {
                if users_username
                    .insert(user.username.as_bytes(), &serialize_id(id))?
                    .is_some()
                {
                    return abort(Abort::Taken(user.username.clone()));
                }
                users.insert(&serialize_id(id), encoded.as_slice())?;
                Ok(id)
            }),
        )
    }

    fn get_user_by_username(&self, username: &str) -> DbResult<Option<(u64, User)>> {
        let users_username = self.open_tree(USERS_USERNAME)?;
        let users = self.open_tree(USERS)?;
        if let Some(id) = users_username.get(username)? {
            let bad_index = || DbError::BadIndex(username.to_owned());
            let raw = users.get(&id)?.ok_or_else(bad_index)?;
            let id = deserialize_id(id).ok_or_else(bad_index)?;
            Ok(Some((id, bincode::deserialize(&raw)?)))
        } else {
            Ok(None)
        }
    }

    fn list_users(&self) -> DbResult<Vec<(u64, User)>> {
        decode_all(&self.open_tree(USERS)?)
    }

    fn update_user<F: Fn(&mut User)>(
        &self,
        username: &str,
        owner: u64,
        change: F,
    ) -> DbResult<Option<(u64, User)>> {
        let users = self.open_tree(USERS)?;
        let users_username = self.open_tree(USERS_USERNAME)?;
        finish(
            (&users, &users_username).transaction(|(users, users_username)| {
                let id = match users_username.get(username)?.and_then(deserialize_id) {
                    Some(id) => id,
                    None => return Ok(None),
                };
                if id != owner {
                    return abort(Abort::NotOwner(username.to_owned()));
                }
                let raw = match users.get(&serialize_id(id))? {
                    Some(raw) => raw,
                    None => return abort(Abort::BadIndex(username.to_owned())),
                };
                let mut user: User =
                    bincode::deserialize(&raw).or_else(|e| abort(Abort::Codec(e)))?;
                change(&mut user);
                if user.username != username {
                    if users_username
                        .insert(user.username.as_bytes(), &serialize_id(id))?
                        .is_some()
                    {
                        return abort(Abort::Taken(user.username.clone()));
                    }
                    users_username.remove(username)?;
                }
                let encoded = bincode::serialize(&user).or_else(|e| abort(Abort::Codec(e)))?;
                users.insert(&serialize_id(id), encoded)?;
                Ok(Some((id, user)))
            }),
        )
    }

    fn remove_user(&self, username: &str, owner: u64) -> DbResult<Option<(u64, User)>> {
        let users = self.open_tree(USERS)?;
        let users_username = self.open_tree(USERS_USERNAME)?;
        finish(
            (&users, &users_username).transaction(|(users, users_username)| {
                let id = match users_username.remove(username)?.and_then(deserialize_id) {
                    Some(id) => id,
                    None => return Ok(None),
                };
                if id != owner {
                    return abort(Abort::NotOwner(username.to_owned()));
                }
                let raw = match users.remove(&serialize_id(id))? {
                    Some(raw) => raw,
                    None => return abort(Abort::BadIndex(username.to_owned())),
                };
                let user: User =
                    bincode::deserialize(&raw).or_else(|e| abort(Abort::Codec(e)))?;
                Ok(Some((id, user)))
            }),
        )
    }
}

impl MovieDb for sled::Db {
    type Error = DbError;

    fn add_movie(&self, movie: &Movie) -> DbResult<u64> {
        let movies = self.open_tree(MOVIES)?;
        let id = self.generate_id()?;
        movies.insert(&serialize_id(id), bincode::serialize(movie)?)?;
        Ok(id)
    }

    fn get_movie(&self, id: u64) -> DbResult<Option<Movie>> {
        let movies = self.open_tree(MOVIES)?;
        Ok(movies
            .get(serialize_id(id))?
            .map(|d| bincode::deserialize(&d))
            .transpose()?)
    }

    fn list_movies(&self) -> DbResult<Vec<(u64, Movie)>> {
        decode_all(&self.open_tree(MOVIES)?)
    }

    fn find_movie<P: Fn(&Movie) -> bool>(&self, predicate: P) -> DbResult<Option<(u64, Movie)>> {
        let movies = self.open_tree(MOVIES)?;
        for entry in movies.iter() {
            let (key, value) = entry?;
            let movie: Movie = bincode::deserialize(&value)?;
            if predicate(&movie) {
                let id = deserialize_id(&key)
                    .ok_or_else(|| DbError::BadIndex(movie.title.clone()))?;
                return Ok(Some((id, movie)));
            }
        }
        Ok(None)
    }
}

/// Loads `movies` into an empty catalog. Returns how many were inserted;
/// an already populated catalog is left alone.
pub fn seed_movies(db: &sled::Db, movies: &[Movie]) -> DbResult<usize> {
    if !db.open_tree(MOVIES)?.is_empty() {
        return Ok(0);
    }
    for movie in movies {
        db.add_movie(movie)?;
    }
    Ok(movies.len())
}
