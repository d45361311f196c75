/// Declares a `u64` newtype used as a stable arena handle.
///
/// Handles never get recycled: deleting an entity retires its id for good,
/// which is what makes a dangling reference a cheap lookup miss instead of
/// an aliasing hazard.
macro_rules! declare_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const ZERO: Self = Self(0);
            pub const MAX: Self = Self(u64::MAX);

            #[inline]
            pub const fn from_u64(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub const fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

declare_id!(
    /// Identifies a single tracked feature point.
    PointId,
    "point"
);
declare_id!(
    /// Identifies a planar (homography) tracker.
    TrackerId,
    "tracker"
);
declare_id!(
    /// Identifies a text overlay element.
    TextId,
    "text"
);

/// Monotonic id mint.
///
/// Each store owns one so that ids stay unique for the lifetime of a
/// project, including across save/load.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct IdGen {
    next: u64,
}

impl Default for IdGen {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints the next raw id.
    #[inline]
    pub fn mint(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Makes sure future ids are minted strictly after `id`.
    ///
    /// Called when restoring stores from a persisted project.
    pub fn reserve_through(&mut self, id: u64) {
        self.next = self.next.max(id + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_is_monotonic() {
        let mut id_gen = IdGen::new();
        let a = id_gen.mint();
        let b = id_gen.mint();
        assert!(a < b);
    }

    #[test]
    fn reserve_skips_taken_ids() {
        let mut id_gen = IdGen::new();
        id_gen.reserve_through(41);
        assert_eq!(id_gen.mint(), 42);
    }

    #[test]
    fn display_is_prefixed() {
        assert_eq!(PointId::from_u64(7).to_string(), "point#7");
        assert_eq!(TrackerId::from_u64(7).to_string(), "tracker#7");
        assert_eq!(TextId::from_u64(7).to_string(), "text#7");
    }
}
