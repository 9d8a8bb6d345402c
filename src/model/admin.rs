use serde::{Deserialize, Serialize};

use crate::model::{
    account::{PublicAccount, Registration},
    principal::{PrincipalKind, Role},
};

/// Administrator profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminDetails {
    pub first_name: String,
    pub last_name: String,
    pub document_type: String,
    pub document_number: u64,
}

impl PrincipalKind for AdminDetails {
    const ROLE: Role = Role::Admin;
    const COLLECTION: &'static str = "administrators";
}

impl AdminDetails {
    /// Details given to the administrator created on first launch.
    pub fn bootstrap() -> Self {
        Self {
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            document_type: "N/A".to_string(),
            document_number: 0,
        }
    }
}

pub type PublicAdmin = PublicAccount<AdminDetails>;
pub type AdminRegistration = Registration<AdminDetails>;

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl AdminDetails {
        pub fn example() -> Self {
            Self {
                first_name: "Alice".to_string(),
                last_name: "Moreno".to_string(),
                document_type: "CC".to_string(),
                document_number: 1_020_304_050,
            }
        }
    }

    impl AdminRegistration {
        pub fn example() -> Self {
            Self {
                email: "alice@univote.edu".to_string(),
                password: "coordinator".to_string(),
                details: AdminDetails::example(),
            }
        }

        pub fn example2() -> Self {
            Self {
                email: "bob@univote.edu".to_string(),
                password: "superadmin".to_string(),
                details: AdminDetails {
                    first_name: "Bob".to_string(),
                    last_name: "Rojas".to_string(),
                    document_type: "CE".to_string(),
                    document_number: 99_887_766,
                },
            }
        }
    }
}
