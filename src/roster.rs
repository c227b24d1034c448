use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A co-owner eligible for turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("duplicate user id {0}")]
    DuplicateId(UserId),
    #[error("user at position {0} has an empty id")]
    BlankId(usize),
}

/// Ordered list of co-owners. Order matters: it breaks ties when balancing
/// long weekends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster {
    users: Vec<User>,
}

impl Roster {
    pub fn new(users: Vec<User>) -> Result<Self, RosterError> {
        let mut seen = HashSet::with_capacity(users.len());
        for (idx, user) in users.iter().enumerate() {
            if user.id.as_str().trim().is_empty() {
                return Err(RosterError::BlankId(idx));
            }
            if !seen.insert(&user.id) {
                return Err(RosterError::DuplicateId(user.id.clone()));
            }
        }
        Ok(Self { users })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.users.iter().any(|user| &user.id == id)
    }

    pub fn find(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|user| &user.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }
}

impl<'de> Deserialize<'de> for Roster {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let users = Vec::<User>::deserialize(deserializer)?;
        Roster::new(users).map_err(serde::de::Error::custom)
    }
}
