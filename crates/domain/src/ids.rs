//! Identifier newtypes.
//!
//! The server hands out small integer ids (a participant number unique within
//! a room, and a numeric room id). Newtypes keep them from being mixed up in
//! signatures while staying transparent on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_int_id {
    ($name:ident, $raw:ty) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($raw);

        impl $name {
            pub const fn new(raw: $raw) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> $raw {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$raw> for $name {
            fn from(value: $raw) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $raw {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

// Stable participant number, unique per room for the lifetime of a session.
define_int_id!(PlayerNo, u32);

// Numeric room identifier handed out by the lobby.
define_int_id!(RoomId, u64);
