use std::fmt;

use uuid::Uuid;

/// Opaque, immutable track identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    pub fn new() -> Self {
        Uuid::new_v4().into()
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TrackId {
    fn from(value: Uuid) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
