//! Identifier newtypes.
//!
//! Backend identifiers are opaque strings. They are validated only enough to
//! be safe as a single URL path segment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parses an identifier, rejecting values that are not a single path segment.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty or contains whitespace or `/`.
            pub fn parse(value: &str) -> Result<Self, ProtoError> {
                let trimmed = value.trim();
                if trimmed.is_empty()
                    || trimmed
                        .chars()
                        .any(|c| c.is_whitespace() || c == '/' || c == '?' || c == '#')
                {
                    return Err(ProtoError::InvalidId {
                        kind: $kind,
                        value: value.to_string(),
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ProtoError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a glue.
    GlueId,
    "glue"
);

string_id!(
    /// Identifier of a deployment.
    DeploymentId,
    "deployment"
);

string_id!(
    /// Identifier of a forwarded trigger event.
    EventId,
    "event"
);
