use thiserror::Error;

/// Failure to read canonical RLP. Variants carrying an `Option<&str>` name the
/// item being decoded when it is known.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RLPDecodeError {
    #[error("Invalid RLP length{}", decoding(.0))]
    InvalidLength(Option<&'static str>),
    #[error("Malformed RLP data{}", decoding(.0))]
    MalformedData(Option<&'static str>),
    #[error("Malformed boolean: expected 0x80 or 0x01, got 0x{0:02x}")]
    MalformedBoolean(u8),
    #[error("Expected RLP string, got list{}", decoding(.0))]
    UnexpectedList(Option<&'static str>),
    #[error("Expected RLP list, got string{}", decoding(.0))]
    UnexpectedString(Option<&'static str>),
    #[error("Integer of {got} bytes does not fit in {max} bytes")]
    IntegerOverflow { max: usize, got: usize },
    #[error("Integer has leading zero bytes")]
    LeadingZeros,
    #[error("{len} bytes left after the RLP item{item}", len = .0, item = decoding(.1))]
    TrailingBytes(usize, Option<&'static str>),
    #[error("{0}")]
    Custom(String),
}

fn decoding(item: &Option<&'static str>) -> String {
    item.map(|name| format!(" decoding {name}"))
        .unwrap_or_default()
}

impl RLPDecodeError {
    pub fn invalid_length() -> Self {
        Self::InvalidLength(None)
    }

    pub fn malformed_data() -> Self {
        Self::MalformedData(None)
    }

    pub fn unexpected_list() -> Self {
        Self::UnexpectedList(None)
    }

    pub fn unexpected_string() -> Self {
        Self::UnexpectedString(None)
    }

    /// Names the item being decoded, leaving variants without an item slot untouched.
    pub fn decoding(self, item: &'static str) -> Self {
        match self {
            Self::InvalidLength(_) => Self::InvalidLength(Some(item)),
            Self::MalformedData(_) => Self::MalformedData(Some(item)),
            Self::UnexpectedList(_) => Self::UnexpectedList(Some(item)),
            Self::UnexpectedString(_) => Self::UnexpectedString(Some(item)),
            Self::TrailingBytes(len, _) => Self::TrailingBytes(len, Some(item)),
            other => other,
        }
    }
}
