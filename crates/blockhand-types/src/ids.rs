//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Tasks and combat sessions get strongly-typed IDs so a stale handle held
//! by a suspended task loop can never be confused with the one currently
//! occupying the task slot. All IDs use UUID v7 (time-ordered) so log lines
//! sort naturally.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Identifier of one occupancy of the task slot.
    ///
    /// A fresh ID is minted on every successful start, so two consecutive
    /// `Mining` tasks are distinguishable.
    TaskId
}

define_id! {
    /// Identifier of a combat session (one run of the periodic strike loop).
    CombatSessionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
        assert_ne!(CombatSessionId::new(), CombatSessionId::new());
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let id = TaskId::new();
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, format!("\"{}\"", id.into_inner()));
    }
}
