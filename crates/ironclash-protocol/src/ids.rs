use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// The never-assigned sentinel.
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            #[inline]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(raw: Uuid) -> Self {
                Self(raw)
            }
        }
    };
}

uuid_id!(
    /// Identity of one game instance (the authority or a replica).
    GameId
);
uuid_id!(
    /// Player identity, chosen by the joining client.
    PlayerId
);
uuid_id!(UnitId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_sentinel() {
        assert!(GameId::nil().is_nil());
        assert!(GameId::default().is_nil());
        assert!(!GameId::new().is_nil());
        assert_ne!(PlayerId::new(), PlayerId::new());
    }

    #[test]
    fn serializes_as_bare_uuid() {
        let raw = Uuid::new_v4();
        let json = serde_json::to_string(&UnitId(raw)).unwrap();
        assert_eq!(json, format!("\"{raw}\""));
    }
}
