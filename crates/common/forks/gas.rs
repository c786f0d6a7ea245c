use serde::{Deserialize, Serialize};

use crate::types::AccessListItem;

/// Gas parameters of transaction validation that changed across forks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasCosts {
    pub tx_base: u64,
    pub tx_data_zero: u64,
    pub tx_data_non_zero: u64,
    /// Surcharge of contract creating transactions.
    pub tx_create: u64,
    pub initcode_word: u64,
    pub access_list_address: u64,
    pub access_list_storage_key: u64,
    pub authorization: u64,
    /// Cost per calldata token of the EIP-7623 floor. `None` before the floor existed.
    pub calldata_floor_token: Option<u64>,
    /// Tokens a non-zero calldata byte counts as.
    pub non_zero_byte_tokens: u64,
}

impl GasCosts {
    pub const FRONTIER: GasCosts = GasCosts {
        tx_base: 21_000,
        tx_data_zero: 4,
        tx_data_non_zero: 68,
        tx_create: 0,
        initcode_word: 2,
        access_list_address: 0,
        access_list_storage_key: 0,
        authorization: 0,
        calldata_floor_token: None,
        non_zero_byte_tokens: 4,
    };

    pub const HOMESTEAD: GasCosts = GasCosts {
        tx_create: 32_000,
        ..Self::FRONTIER
    };

    // EIP-2028
    pub const ISTANBUL: GasCosts = GasCosts {
        tx_data_non_zero: 16,
        ..Self::HOMESTEAD
    };

    // EIP-2930
    pub const BERLIN: GasCosts = GasCosts {
        access_list_address: 2_400,
        access_list_storage_key: 1_900,
        ..Self::ISTANBUL
    };

    // EIP-7702, EIP-7623
    pub const PRAGUE: GasCosts = GasCosts {
        authorization: 25_000,
        calldata_floor_token: Some(10),
        ..Self::BERLIN
    };

    pub fn calldata_cost(&self, calldata: &[u8]) -> u64 {
        let zeros = count_zero_bytes(calldata);
        let non_zeros = calldata.len() as u64 - zeros;
        zeros * self.tx_data_zero + non_zeros * self.tx_data_non_zero
    }

    pub fn intrinsic_cost(&self, input: &IntrinsicCostInput<'_>) -> u64 {
        let mut cost = self.tx_base + self.calldata_cost(input.calldata);
        if input.contract_creation {
            let words = (input.calldata.len() as u64).div_ceil(32);
            cost += self.tx_create + words * self.initcode_word;
        }
        for item in input.access_list {
            cost += self.access_list_address
                + item.storage_keys.len() as u64 * self.access_list_storage_key;
        }
        cost + input.authorization_count as u64 * self.authorization
    }

    /// EIP-7623 minimum gas used by a transaction with this calldata.
    pub fn data_floor_cost(&self, calldata: &[u8]) -> Option<u64> {
        let floor_token = self.calldata_floor_token?;
        let zeros = count_zero_bytes(calldata);
        let tokens = zeros + (calldata.len() as u64 - zeros) * self.non_zero_byte_tokens;
        Some(self.tx_base + tokens * floor_token)
    }
}

fn count_zero_bytes(data: &[u8]) -> u64 {
    data.iter().filter(|byte| **byte == 0).count() as u64
}

/// Shape of a transaction as far as its intrinsic cost is concerned.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrinsicCostInput<'a> {
    pub calldata: &'a [u8],
    pub contract_creation: bool,
    pub access_list: &'a [AccessListItem],
    pub authorization_count: usize,
}

impl<'a> IntrinsicCostInput<'a> {
    pub fn call(calldata: &'a [u8]) -> Self {
        Self {
            calldata,
            ..Default::default()
        }
    }

    pub fn create(calldata: &'a [u8]) -> Self {
        Self {
            calldata,
            contract_creation: true,
            ..Default::default()
        }
    }
}
