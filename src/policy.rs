use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::token::{Identity, Role};

/// Public/private flag gating read access to products and topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "privacy", rename_all = "lowercase")]
pub enum Privacy {
    Public,
    Private,
}

impl FromStr for Privacy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Privacy::Public),
            "private" => Ok(Privacy::Private),
            _ => Err(()),
        }
    }
}

/// Product reads: public products are readable by anyone, identity or not.
/// Private products are only readable through an admin identity; the public
/// product route carries no identity at all, so private products are never
/// served there.
pub fn can_read_product(privacy: Privacy, caller: Option<&Identity>) -> bool {
    match privacy {
        Privacy::Public => true,
        Privacy::Private => caller.map_or(false, |c| c.role == Role::Admin),
    }
}

/// Topic reads: public topics for any authenticated caller, private topics
/// for the creator or an admin role. Note the asymmetry with products:
/// topic reads always sit behind the authenticated gate, even for public
/// topics.
pub fn can_read_topic(privacy: Privacy, created_by: Uuid, caller: &Identity) -> bool {
    privacy == Privacy::Public || created_by == caller.sub || caller.role == Role::Admin
}

/// Topic writes (edit/delete): the creator or an admin role. Re-evaluated
/// against the freshly fetched topic on every call; last writer wins.
pub fn can_mutate_topic(created_by: Uuid, caller: &Identity) -> bool {
    created_by == caller.sub || caller.role == Role::Admin
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(sub: Uuid, role: Role) -> Identity {
        Identity {
            sub,
            username: "someone".into(),
            role,
        }
    }

    #[test]
    fn public_products_are_readable_by_everyone() {
        assert!(can_read_product(Privacy::Public, None));
        let id = caller(Uuid::new_v4(), Role::Farmer);
        assert!(can_read_product(Privacy::Public, Some(&id)));
    }

    #[test]
    fn private_products_require_an_admin_identity() {
        assert!(!can_read_product(Privacy::Private, None));
        let farmer = caller(Uuid::new_v4(), Role::Farmer);
        assert!(!can_read_product(Privacy::Private, Some(&farmer)));
        let admin = caller(Uuid::new_v4(), Role::Admin);
        assert!(can_read_product(Privacy::Private, Some(&admin)));
    }

    #[test]
    fn private_topics_open_to_creator_and_admin_only() {
        let creator_id = Uuid::new_v4();
        let creator = caller(creator_id, Role::Farmer);
        let stranger = caller(Uuid::new_v4(), Role::Farmer);
        let admin = caller(Uuid::new_v4(), Role::Admin);

        assert!(can_read_topic(Privacy::Private, creator_id, &creator));
        assert!(can_read_topic(Privacy::Private, creator_id, &admin));
        assert!(!can_read_topic(Privacy::Private, creator_id, &stranger));
        // Public topics read fine for any authenticated caller.
        assert!(can_read_topic(Privacy::Public, creator_id, &stranger));
    }

    #[test]
    fn topic_mutation_limited_to_creator_or_admin() {
        let creator_id = Uuid::new_v4();
        let creator = caller(creator_id, Role::Farmer);
        let stranger = caller(Uuid::new_v4(), Role::Farmer);
        let admin = caller(Uuid::new_v4(), Role::Admin);

        assert!(can_mutate_topic(creator_id, &creator));
        assert!(can_mutate_topic(creator_id, &admin));
        assert!(!can_mutate_topic(creator_id, &stranger));
    }

    #[test]
    fn privacy_parses_exactly_two_values() {
        assert_eq!("public".parse::<Privacy>(), Ok(Privacy::Public));
        assert_eq!("private".parse::<Privacy>(), Ok(Privacy::Private));
        assert!("Public".parse::<Privacy>().is_err());
        assert!("hidden".parse::<Privacy>().is_err());
    }
}
