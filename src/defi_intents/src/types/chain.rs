use candid::{CandidType, Deserialize, Nat};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use crate::infrastructure::{IntentError, ValidationError};

/// EVM account or contract address, stored lower-cased
#[derive(CandidType, Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for log lines (`0x1234…abcd`)
    pub fn short(&self) -> String {
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = IntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| IntentError::Validation(ValidationError::InvalidAddress {
                address: s.to_string(),
            }))?;

        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(IntentError::Validation(ValidationError::InvalidAddress {
                address: s.to_string(),
            }));
        }

        Ok(Address(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = IntentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction reference handed back by the ledger client after broadcast
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxRef(pub String);

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract function invoked by a step. ABI encoding is the ledger client's job.
#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub enum CallFunction {
    /// ERC-20 approve for an exact amount
    Approve { spender: Address, amount: Nat },
    Deposit { amount: Nat },
    Stake { amount: Nat },
    ClaimRewards,
    SwapExactTokensForTokens {
        amount_in: Nat,
        amount_out_min: Nat,
        path: Vec<Address>,
        recipient: Address,
        deadline: u64,
    },
}

impl CallFunction {
    /// Solidity signature the ledger client encodes against
    pub fn signature(&self) -> &'static str {
        match self {
            CallFunction::Approve { .. } => "approve(address,uint256)",
            CallFunction::Deposit { .. } => "depositPush(uint256)",
            CallFunction::Stake { .. } => "stake(uint256)",
            CallFunction::ClaimRewards => "claimMinerRewards()",
            CallFunction::SwapExactTokensForTokens { .. } => {
                "swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256,uint256,address[],address,uint256)"
            }
        }
    }
}

#[derive(CandidType, Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub function: CallFunction,
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.function.signature(), self.to.short())
    }
}

#[derive(CandidType, Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// None lets the wallet pick its own gas limit
    pub gas_limit: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalised() {
        let addr: Address = "0xABCDEF0123456789abcdef0123456789ABCDEF01".parse().unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(addr.short(), "0xabcd…ef01");
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!("abcdef0123456789abcdef0123456789abcdef01".parse::<Address>().is_err());
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xZZcdef0123456789abcdef0123456789abcdef01".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_serde_round_trip() {
        let json = "\"0x00000000000000000000000000000000000000aa\"";
        let addr: Address = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&addr).unwrap(), json);
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }
}
