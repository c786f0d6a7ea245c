//! JSON helpers for `#[serde(with = ...)]`.
//!
//! Integers come in two flavours: minimal hex (`0x0`, `0x5208`) and padded hex,
//! which keeps an even number of digits (`0x00`, `0x0100`). Every decoder accepts
//! hex strings, decimal strings and plain JSON numbers.
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

use ethereum_types::U256;

/// Integer as found in JSON input.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

/// Parses a `0x`-prefixed hex or a decimal string.
pub fn parse_u256(value: &str) -> Result<U256, String> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some("") => Ok(U256::zero()),
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| format!("invalid hex {value}: {e}")),
        None => U256::from_dec_str(value).map_err(|e| format!("invalid number {value}: {e}")),
    }
}

pub fn parse_u64(value: &str) -> Result<u64, String> {
    let parsed = parse_u256(value)?;
    if parsed.bits() > 64 {
        return Err(format!("{value} does not fit in 64 bits"));
    }
    Ok(parsed.as_u64())
}

/// `0x`-prefixed hex with an even number of digits, at least two.
pub fn to_padded_hex(value: U256) -> String {
    let hex = format!("{value:x}");
    if hex.len() % 2 == 1 {
        format!("0x0{hex}")
    } else {
        format!("0x{hex}")
    }
}

fn deserialize_u256<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
    match NumberOrString::deserialize(d)? {
        NumberOrString::Number(n) => Ok(U256::from(n)),
        NumberOrString::String(s) => parse_u256(&s).map_err(D::Error::custom),
    }
}

fn deserialize_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match NumberOrString::deserialize(d)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => parse_u64(&s).map_err(D::Error::custom),
    }
}

pub mod u256 {
    use super::*;

    pub mod hex_str {
        use super::*;

        pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&format!("{value:#x}"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
            deserialize_u256(d)
        }
    }

    pub mod padded_hex_str {
        use super::*;

        pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&to_padded_hex(*value))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<U256, D::Error> {
            deserialize_u256(d)
        }
    }

    pub mod padded_hex_str_opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<U256>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.map(to_padded_hex).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<U256>, D::Error> {
            match Option::<NumberOrString>::deserialize(d)? {
                None => Ok(None),
                Some(NumberOrString::Number(n)) => Ok(Some(U256::from(n))),
                Some(NumberOrString::String(s)) => parse_u256(&s).map(Some).map_err(D::Error::custom),
            }
        }
    }

    pub mod hex_str_opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<U256>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.map(|v| format!("{v:#x}")).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<U256>, D::Error> {
            padded_hex_str_opt::deserialize(d)
        }
    }
}

pub mod u64 {
    use super::*;

    pub mod hex_str {
        use super::*;

        pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&format!("{value:#x}"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
            deserialize_u64(d)
        }
    }

    pub mod hex_str_opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<u64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value.map(|v| format!("{v:#x}")).serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
            match Option::<NumberOrString>::deserialize(d)? {
                None => Ok(None),
                Some(NumberOrString::Number(n)) => Ok(Some(n)),
                Some(NumberOrString::String(s)) => parse_u64(&s).map(Some).map_err(D::Error::custom),
            }
        }
    }

    pub mod padded_hex_str_opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<u64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value
                .map(|v| to_padded_hex(U256::from(v)))
                .serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
            hex_str_opt::deserialize(d)
        }
    }
}

pub mod u8 {
    use super::*;

    pub mod hex_str {
        use super::*;

        pub fn serialize<S: Serializer>(value: &u8, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&format!("{value:#x}"))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
            let value = deserialize_u64(d)?;
            <u8>::try_from(value).map_err(|_| D::Error::custom(format!("{value} does not fit in 8 bits")))
        }
    }
}

pub mod bytes {
    use super::*;
    use ::bytes::Bytes;

    /// Odd-length input is read as if it had one more leading zero nibble.
    pub fn decode_hex(value: &str) -> Result<Bytes, String> {
        let hex = value.strip_prefix("0x").unwrap_or(value);
        let decoded = if hex.len() % 2 == 1 {
            hex::decode(format!("0{hex}"))
        } else {
            hex::decode(hex)
        };
        decoded
            .map(Bytes::from)
            .map_err(|e| format!("invalid hex bytes {value}: {e}"))
    }

    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let value = String::deserialize(d)?;
        decode_hex(&value).map_err(D::Error::custom)
    }

    pub mod opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Bytes>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            value
                .as_ref()
                .map(|v| format!("0x{}", hex::encode(v)))
                .serialize(serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Bytes>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|value| decode_hex(&value).map_err(D::Error::custom))
                .transpose()
        }
    }
}
