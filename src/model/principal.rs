use std::fmt::{Debug, Display};

use serde::{de::DeserializeOwned, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Integer identity of a principal, unique within its kind.
pub type PrincipalId = u32;

/// The kinds of principal that can authenticate.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Role {
    Admin = 0,
    Voter = 1,
    Candidate = 2,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Voter => "voter",
            Self::Candidate => "candidate",
        }
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// The kind-specific profile of a principal. Each implementation is its own
/// credential domain: its own store partition, its own role claim, and its
/// own route guard.
pub trait PrincipalKind:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    /// The role claim carried by tokens for this kind.
    const ROLE: Role;
    /// The name of the store partition holding this kind.
    const COLLECTION: &'static str;

    /// Whether this principal may currently log in and pass guards.
    fn in_good_standing(&self) -> bool {
        true
    }

    /// Reset fields a principal may not choose for themselves at registration.
    fn on_register(&mut self) {}

    /// Copy fields only an administrator may change from `current` into a
    /// self-submitted replacement.
    fn preserve_managed_fields(&mut self, _current: &Self) {}
}
