use std::cmp;

/// Sequence of half-bytes used to walk the trie.
///
/// Paths built from keys end with the leaf flag (a `16` nibble), which marks
/// that the whole key has been consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nibbles {
    data: Vec<u8>,
}

pub const LEAF_FLAG: u8 = 16;

impl Nibbles {
    /// Create `Nibbles` from hex-encoded nibbles
    pub fn from_hex(hex: Vec<u8>) -> Self {
        Self { data: hex }
    }

    /// Splits the key into nibbles and appends the leaf flag.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_raw(bytes, true)
    }

    pub fn from_raw(bytes: &[u8], is_leaf: bool) -> Self {
        let mut data: Vec<u8> = bytes
            .iter()
            .flat_map(|byte| [byte >> 4 & 0x0f, byte & 0x0f])
            .collect();
        if is_leaf {
            data.push(LEAF_FLAG);
        }
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Return the nibble at the given index, will panic if the index is out of range
    pub fn at(&self, i: usize) -> usize {
        self.data[i] as usize
    }

    /// Returns the nibbles after the given offset
    pub fn offset(&self, offset: usize) -> Nibbles {
        self.slice(offset, self.len())
    }

    /// Returns the nibbles between the start and end indexes
    pub fn slice(&self, start: usize, end: usize) -> Nibbles {
        Nibbles::from_hex(self.data[start..end].to_vec())
    }

    /// Number of leading nibbles shared with `other`.
    pub fn count_prefix(&self, other: &Nibbles) -> usize {
        self.data
            .iter()
            .zip(other.data.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// If `prefix` is a prefix of self, drops it and returns true.
    pub fn skip_prefix(&mut self, prefix: &Nibbles) -> bool {
        if self.data.starts_with(&prefix.data) {
            self.data.drain(..prefix.len());
            true
        } else {
            false
        }
    }

    /// Compares self to another, comparing prefixes only in case of unequal lengths.
    pub fn compare_prefix(&self, prefix: &Nibbles) -> cmp::Ordering {
        let common = self.len().min(prefix.len());
        self.data[..common].cmp(&prefix.data[..common])
    }

    pub fn is_leaf(&self) -> bool {
        self.data.last() == Some(&LEAF_FLAG)
    }

    /// Hex-prefix encoding: a flag nibble carrying parity and the leaf marker,
    /// followed by the nibbles packed in pairs.
    pub fn encode_compact(&self) -> Vec<u8> {
        let is_leaf = self.is_leaf();
        let mut hex = if is_leaf {
            &self.data[..self.data.len() - 1]
        } else {
            &self.data[..]
        };
        // node type    path length    |    prefix    hexchar
        // --------------------------------------------------
        // extension    even           |    0000      0x0
        // extension    odd            |    0001      0x1
        // leaf         even           |    0010      0x2
        // leaf         odd            |    0011      0x3
        let mut first = if is_leaf { 0x20 } else { 0x00 };
        if hex.len() % 2 == 1 {
            first += 0x10 + hex[0];
            hex = &hex[1..];
        }
        let mut compact = Vec::with_capacity(1 + hex.len() / 2);
        compact.push(first);
        compact.extend(hex.chunks(2).map(|pair| pair[0] << 4 | pair[1]));
        compact
    }

    /// Inverse of [`encode_compact`](Self::encode_compact).
    pub fn decode_compact(compact: &[u8]) -> Self {
        let Some(&flag) = compact.first() else {
            return Self::default();
        };
        let mut data = Vec::with_capacity(compact.len() * 2);
        if flag & 0x10 != 0 {
            data.push(flag & 0x0f);
        }
        data.extend(compact[1..].iter().flat_map(|b| [b >> 4, b & 0x0f]));
        if flag & 0x20 != 0 {
            data.push(LEAF_FLAG);
        }
        Self { data }
    }

    /// Packs the nibbles back into bytes, trimming the leaf flag.
    pub fn to_bytes(&self) -> Vec<u8> {
        let trimmed = if self.is_leaf() {
            &self.data[..self.data.len() - 1]
        } else {
            &self.data[..]
        };
        trimmed
            .chunks(2)
            .map(|chunk| match chunk {
                [hi] => hi << 4,
                [hi, lo, ..] => hi << 4 | lo,
                [] => 0,
            })
            .collect()
    }

    /// Concatenates self and another Nibbles returning a new Nibbles
    pub fn concat(&self, other: &Nibbles) -> Nibbles {
        let mut data = self.data.clone();
        data.extend_from_slice(&other.data);
        Nibbles { data }
    }

    /// Inserts a nibble at the start
    pub fn prepend(&mut self, nibble: u8) {
        self.data.insert(0, nibble);
    }
}

impl AsRef<[u8]> for Nibbles {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
