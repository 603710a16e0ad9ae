use std::fmt;

use serde::{Deserialize, Serialize};

/// Privilege represents a bitmask of actions allowed on a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Privilege(u32);

impl Privilege {
    pub const FIND: Privilege = Privilege(1 << 0); // 1
    pub const INSERT: Privilege = Privilege(1 << 1); // 2
    pub const UPDATE: Privilege = Privilege(1 << 2); // 4
    pub const REMOVE: Privilege = Privilege(1 << 3); // 8
    pub const COLLECTION_ADMIN: Privilege = Privilege(1 << 4); // 16
    pub const INDEX_ADMIN: Privilege = Privilege(1 << 5); // 32

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if this bitmask contains the required privilege.
    #[must_use]
    pub const fn has(self, required: Privilege) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn union(self, other: Privilege) -> Privilege {
        Privilege(self.0 | other.0)
    }

    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        let mut privileges = Vec::new();
        if self.has(Self::FIND) {
            privileges.push("find");
        }
        if self.has(Self::INSERT) {
            privileges.push("insert");
        }
        if self.has(Self::UPDATE) {
            privileges.push("update");
        }
        if self.has(Self::REMOVE) {
            privileges.push("remove");
        }
        if self.has(Self::COLLECTION_ADMIN) {
            privileges.push("collectionAdmin");
        }
        if self.has(Self::INDEX_ADMIN) {
            privileges.push("indexAdmin");
        }
        privileges
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

/// Built-in roles a principal can hold on a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Read,
    ReadWrite,
    DbAdmin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::ReadWrite => "readWrite",
            Role::DbAdmin => "dbAdmin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "read" => Some(Role::Read),
            "readWrite" => Some(Role::ReadWrite),
            "dbAdmin" => Some(Role::DbAdmin),
            _ => None,
        }
    }

    /// Expands a role into the privileges it grants.
    /// readWrite implies read; dbAdmin covers schema work only.
    #[must_use]
    pub const fn privileges(self) -> Privilege {
        match self {
            Role::Read => Privilege::FIND,
            Role::ReadWrite => Privilege(
                Privilege::FIND.0 | Privilege::INSERT.0 | Privilege::UPDATE.0 | Privilege::REMOVE.0,
            ),
            Role::DbAdmin => {
                Privilege(Privilege::COLLECTION_ADMIN.0 | Privilege::INDEX_ADMIN.0)
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role held on one named database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub db: String,
}

impl RoleGrant {
    pub fn new(role: Role, db: impl Into<String>) -> Self {
        Self {
            role,
            db: db.into(),
        }
    }
}

impl fmt::Display for RoleGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.db)
    }
}

/// Combined privileges of all grants scoped to `db`.
#[must_use]
pub fn effective_privileges(grants: &[RoleGrant], db: &str) -> Privilege {
    grants
        .iter()
        .filter(|grant| grant.db == db)
        .fold(Privilege::default(), |acc, grant| {
            acc.union(grant.role.privileges())
        })
}
