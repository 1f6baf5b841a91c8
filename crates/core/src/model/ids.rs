use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident($repr:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($repr);

        impl $name {
            #[must_use]
            pub const fn new(raw: $repr) -> Self {
                Self(raw)
            }

            #[must_use]
            pub const fn value(&self) -> $repr {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<$repr>().map(Self).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                    raw: s.to_string(),
                })
            }
        }
    };
}

id_newtype! {
    /// Stable identity of a chat user, as assigned by the transport.
    UserId(i64)
}

id_newtype! {
    /// Conversation a reply should be delivered to.
    ChatId(i64)
}

id_newtype! {
    /// Identity of a catalog task. Stable across restarts.
    TaskId(u32)
}

/// An id string that is not a number of the right range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseIdError {}
