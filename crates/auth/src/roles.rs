use core::str::FromStr;

use serde::{Deserialize, Serialize};

use bazaar_core::DomainError;

/// Role of a marketplace user.
///
/// Exact-match only: there is no hierarchy, an administrator is not
/// implicitly a seller or a customer.
///
/// The default is `Customer`: self-registration always yields a customer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Seller,
    Administrator,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::Seller, Role::Administrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Seller => "seller",
            Role::Administrator => "administrator",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "seller" => Ok(Role::Seller),
            "administrator" => Ok(Role::Administrator),
            _ => Err(DomainError::validation(
                "role",
                "must be one of [customer, seller, administrator]",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        let err = "admin".parse::<Role>().unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "role"));
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&Role::Administrator).unwrap(),
            "\"administrator\""
        );
    }
}
