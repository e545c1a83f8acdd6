//! Serde helpers for Discord snowflakes, which are `u64`s in this crate but
//! strings on the wire. Numeric values are accepted when deserializing.

use serde::de::{Deserializer, Error as DeError};
use serde::ser::Serializer;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Number(u64),
    String(String),
}

impl Raw {
    fn into_u64<E: DeError>(self) -> Result<u64, E> {
        match self {
            Raw::Number(id) => Ok(id),
            Raw::String(id) => id.parse().map_err(E::custom),
        }
    }
}

pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(id)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Raw::deserialize(deserializer)?.into_u64()
}

pub mod option {
    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::Deserialize;
    use super::Raw;

    pub fn serialize<S: Serializer>(id: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match *id {
            Some(ref id) => serializer.collect_str(id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D)
        -> Result<Option<u64>, D::Error> {
        match Option::<Raw>::deserialize(deserializer)? {
            Some(raw) => raw.into_u64().map(Some),
            None => Ok(None),
        }
    }
}
