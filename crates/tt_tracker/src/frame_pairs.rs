//! Serde helper: frame-indexed maps persist as sequences of
//! `(frame, value)` pairs.
//!
//! On-disk pair order carries no meaning; the map is rebuilt by key on
//! load, so hand-edited or merged project files round-trip fine.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use tt_types::FrameNr;

pub fn serialize<V, S>(map: &BTreeMap<FrameNr, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    V: Serialize,
    S: Serializer,
{
    serializer.collect_seq(map.iter())
}

pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<FrameNr, V>, D::Error>
where
    V: Deserialize<'de>,
    D: Deserializer<'de>,
{
    let pairs = Vec::<(FrameNr, V)>::deserialize(deserializer)?;
    Ok(pairs.into_iter().collect())
}
