//! Shared fixtures for engine tests: a user record, its index definitions
//! and a table over a fresh in-memory host.

use crate::{
    config::TableConfig,
    db::{Index, Table},
    host::{MemoryHost, Namespace},
    name::{KV_RAM, Name},
    serialize::Record,
};
use serde::{Deserialize, Serialize};

pub(crate) const CONTRACT: Name = Name::new_const("alice");
pub(crate) const USERS: Name = Name::new_const("users");

///
/// User
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub(crate) struct User {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) age: u32,
}

impl Record for User {}

pub(crate) const BY_ID: Index<User, u64> = kv_index!(User, byid => id);
pub(crate) const BY_NAME: Index<User, String> = kv_index!(User, byname => name);
pub(crate) const BY_AGE: Index<User, (u32, u64)> =
    Index::new(Name::new_const("byage"), |user| (user.age, user.id));

pub(crate) fn user(id: u64, name: &str) -> User {
    User {
        id,
        name: name.to_string(),
        age: 20,
    }
}

pub(crate) const fn users_config() -> TableConfig {
    TableConfig::new(CONTRACT, USERS)
}

pub(crate) const fn users_namespace() -> Namespace {
    Namespace::new(KV_RAM, CONTRACT)
}

/// Users table keyed by id with a unique name index.
pub(crate) fn users_table(host: &MemoryHost) -> Table<User, &MemoryHost> {
    Table::builder(users_config())
        .primary(BY_ID)
        .secondary(BY_NAME)
        .build(host)
        .expect("users table should build")
}

/// Users table with the composite age index as well.
pub(crate) fn users_table_with_age(host: &MemoryHost) -> Table<User, &MemoryHost> {
    Table::builder(users_config())
        .primary(BY_ID)
        .secondary(BY_NAME)
        .secondary(BY_AGE)
        .build(host)
        .expect("users table should build")
}
