//! Call-data payloads: `function@hex(arg1)@hex(arg2)...`.

use crate::checker::TokenTransfer;
use crate::codec::big_uint_bytes;
use crate::constants::{
    ARGUMENTS_SEPARATOR, ESDTNFT_TRANSFER_FUNCTION_NAME, ESDT_TRANSFER_FUNCTION_NAME,
    MULTI_ESDTNFT_TRANSFER_FUNCTION_NAME,
};
use crate::error::PayloadError;
use crate::typesystem::Address;
use num_bigint::BigUint;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallPayload {
    pub function: String,
    pub arguments: Vec<Vec<u8>>,
}

impl ContractCallPayload {
    pub fn new(function: impl Into<String>, arguments: Vec<Vec<u8>>) -> Self {
        Self {
            function: function.into(),
            arguments,
        }
    }

    /// Parse call data such as `transfer@0a@abba`.
    pub fn parse(data: &str) -> Result<Self, PayloadError> {
        let mut parts = data.split(ARGUMENTS_SEPARATOR);
        let function = parts.next().unwrap_or_default();
        if function.is_empty() {
            return Err(PayloadError::MissingFunction);
        }
        let arguments = parts
            .enumerate()
            .map(|(index, part)| {
                hex::decode(part).map_err(|e| PayloadError::InvalidHex {
                    index,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(function, arguments))
    }

    /// Rendered call data as bytes, ready for a transaction's data field.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// The function name followed by the arguments, as the nested call of a
    /// token transfer carries them.
    fn as_call_arguments(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        std::iter::once(self.function.as_bytes().to_vec()).chain(self.arguments.iter().cloned())
    }
}

impl fmt::Display for ContractCallPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function)?;
        for argument in &self.arguments {
            write!(f, "{}{}", ARGUMENTS_SEPARATOR, hex::encode(argument))?;
        }
        Ok(())
    }
}

impl FromStr for ContractCallPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn minimal_u64(n: u64) -> Vec<u8> {
    big_uint_bytes(&BigUint::from(n))
}

/// `ESDTTransfer@token@amount@function@args...`, sent to the contract.
pub fn esdt_transfer(transfer: &TokenTransfer, call: &ContractCallPayload) -> ContractCallPayload {
    let mut arguments = vec![
        transfer.token_identifier.as_bytes().to_vec(),
        big_uint_bytes(&transfer.amount),
    ];
    arguments.extend(call.as_call_arguments());
    ContractCallPayload::new(ESDT_TRANSFER_FUNCTION_NAME, arguments)
}

/// `ESDTNFTTransfer@token@nonce@amount@receiver@function@args...`, sent to
/// the caller's own account.
pub fn esdt_nft_transfer(
    transfer: &TokenTransfer,
    receiver: &Address,
    call: &ContractCallPayload,
) -> ContractCallPayload {
    let mut arguments = vec![
        transfer.token_identifier.as_bytes().to_vec(),
        minimal_u64(transfer.nonce),
        big_uint_bytes(&transfer.amount),
        receiver.0.to_vec(),
    ];
    arguments.extend(call.as_call_arguments());
    ContractCallPayload::new(ESDTNFT_TRANSFER_FUNCTION_NAME, arguments)
}

/// `MultiESDTNFTTransfer@receiver@count@(token@nonce@amount)*@function@args...`,
/// sent to the caller's own account.
pub fn multi_esdt_nft_transfer(
    transfers: &[TokenTransfer],
    receiver: &Address,
    call: &ContractCallPayload,
) -> ContractCallPayload {
    let mut arguments = vec![receiver.0.to_vec(), minimal_u64(transfers.len() as u64)];
    for transfer in transfers {
        arguments.push(transfer.token_identifier.as_bytes().to_vec());
        arguments.push(minimal_u64(transfer.nonce));
        arguments.push(big_uint_bytes(&transfer.amount));
    }
    arguments.extend(call.as_call_arguments());
    ContractCallPayload::new(MULTI_ESDTNFT_TRANSFER_FUNCTION_NAME, arguments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lowercase_hex() {
        let payload = ContractCallPayload::new("transfer", vec![vec![0xAB, 0xBA], vec![], vec![10]]);
        assert_eq!(payload.to_string(), "transfer@abba@@0a");
    }

    #[test]
    fn test_parse() {
        let payload = ContractCallPayload::parse("start@6c75636b79@0A").unwrap();
        assert_eq!(payload.function, "start");
        assert_eq!(payload.arguments, vec![b"lucky".to_vec(), vec![10]]);

        assert_eq!(
            ContractCallPayload::parse("@00").unwrap_err(),
            PayloadError::MissingFunction
        );
        assert!(matches!(
            "f@zz".parse::<ContractCallPayload>(),
            Err(PayloadError::InvalidHex { index: 0, .. })
        ));
    }

    #[test]
    fn test_esdt_transfer_wrapping() {
        let call = ContractCallPayload::new("buy_ticket", vec![vec![1]]);
        let transfer = TokenTransfer::fungible("LUCKY-a1b2c3", 1000u32);
        assert_eq!(
            esdt_transfer(&transfer, &call).to_string(),
            format!(
                "ESDTTransfer@{}@03e8@{}@01",
                hex::encode("LUCKY-a1b2c3"),
                hex::encode("buy_ticket")
            )
        );
    }

    #[test]
    fn test_nft_transfer_wrapping() {
        let receiver = Address([1u8; 32]);
        let call = ContractCallPayload::new("stake", vec![]);
        let transfer = TokenTransfer::non_fungible("NFT-123456", 5, 1u32);
        assert_eq!(
            esdt_nft_transfer(&transfer, &receiver, &call).to_string(),
            format!(
                "ESDTNFTTransfer@{}@05@01@{}@{}",
                hex::encode("NFT-123456"),
                receiver.to_hex(),
                hex::encode("stake")
            )
        );
    }

    #[test]
    fn test_multi_transfer_wrapping() {
        let receiver = Address([2u8; 32]);
        let call = ContractCallPayload::new("deposit", vec![]);
        let transfers = vec![
            TokenTransfer::fungible("AAA-111111", 16u32),
            TokenTransfer::non_fungible("BBB-222222", 1, 1u32),
        ];
        let payload = multi_esdt_nft_transfer(&transfers, &receiver, &call);
        assert_eq!(payload.function, "MultiESDTNFTTransfer");
        assert_eq!(
            payload.to_string(),
            format!(
                "MultiESDTNFTTransfer@{}@02@{}@@10@{}@01@01@{}",
                receiver.to_hex(),
                hex::encode("AAA-111111"),
                hex::encode("BBB-222222"),
                hex::encode("deposit")
            )
        );
    }
}
