use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

/// EIP-4844 / EIP-7691 blob parameters of a fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobParams {
    #[serde(
        rename = "target_blobs_per_block",
        alias = "target",
        with = "crate::serde_utils::u64::hex_str"
    )]
    pub target: u64,
    #[serde(
        rename = "max_blobs_per_block",
        alias = "max",
        with = "crate::serde_utils::u64::hex_str"
    )]
    pub max: u64,
    #[serde(
        rename = "baseFeeUpdateFraction",
        with = "crate::serde_utils::u64::hex_str"
    )]
    pub base_fee_update_fraction: u64,
}

impl BlobParams {
    pub const CANCUN: BlobParams = BlobParams {
        target: 3,
        max: 6,
        base_fee_update_fraction: 3_338_477,
    };

    pub const PRAGUE: BlobParams = BlobParams {
        target: 6,
        max: 9,
        base_fee_update_fraction: 5_007_716,
    };
}

/// Blob parameters of every fork up to some fork, in activation order.
///
/// Forks that kept their parent's parameters still have their own entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobSchedule {
    entries: Vec<(String, BlobParams)>,
}

impl BlobSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, replacing the existing one if `fork` is already present.
    pub fn push(&mut self, fork: impl Into<String>, params: BlobParams) {
        let fork = fork.into();
        match self.entries.iter_mut().find(|(name, _)| *name == fork) {
            Some(entry) => entry.1 = params,
            None => self.entries.push((fork, params)),
        }
    }

    pub fn get(&self, fork: &str) -> Option<&BlobParams> {
        self.entries
            .iter()
            .find_map(|(name, params)| (name == fork).then_some(params))
    }

    /// Parameters of the most recent fork in the schedule.
    pub fn last(&self) -> Option<&BlobParams> {
        self.entries.last().map(|(_, params)| params)
    }

    pub fn forks(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlobParams)> {
        self.entries
            .iter()
            .map(|(name, params)| (name.as_str(), params))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for BlobSchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, params) in &self.entries {
            map.serialize_entry(name, params)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BlobSchedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScheduleVisitor;

        impl<'de> Visitor<'de> for ScheduleVisitor {
            type Value = BlobSchedule;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of fork names to blob parameters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<BlobSchedule, A::Error> {
                let mut schedule = BlobSchedule::new();
                while let Some((name, params)) = access.next_entry::<String, BlobParams>()? {
                    schedule.push(name, params);
                }
                Ok(schedule)
            }
        }

        deserializer.deserialize_map(ScheduleVisitor)
    }
}
