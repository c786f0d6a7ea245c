use bytes::BufMut;
use ethereum_types::{Address, H256};
use forkline_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use forkline_trie::Trie;
use serde::{Deserialize, Serialize};

/// EIP-4895 beacon chain withdrawal. `amount` is in Gwei.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub index: u64,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub validator_index: u64,
    pub address: Address,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub amount: u64,
}

impl Withdrawal {
    pub fn new(index: u64, validator_index: u64, address: Address, amount: u64) -> Self {
        Self {
            index,
            validator_index,
            address,
            amount,
        }
    }

    /// Withdrawals root of a block body: withdrawal `i` keyed by `rlp(i)`.
    pub fn list_root(withdrawals: &[Withdrawal]) -> H256 {
        Trie::compute_hash_from_ordered_list(withdrawals.iter().map(RLPEncode::encode_to_vec))
    }
}

impl RLPEncode for Withdrawal {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.index)
            .encode_field(&self.validator_index)
            .encode_field(&self.address)
            .encode_field(&self.amount)
            .finish();
    }
}

impl RLPDecode for Withdrawal {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (index, decoder) = decoder.decode_field("index")?;
        let (validator_index, decoder) = decoder.decode_field("validator_index")?;
        let (address, decoder) = decoder.decode_field("address")?;
        let (amount, decoder) = decoder.decode_field("amount")?;
        Ok((
            Withdrawal {
                index,
                validator_index,
                address,
                amount,
            },
            decoder.finish()?,
        ))
    }
}
