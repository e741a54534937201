//! A prepared contract call: endpoint, arguments and what it transfers.

use crate::abi::{ContractAbi, EndpointDefinition};
use crate::checker::{InteractionChecker, TokenTransfer, TransferredValue};
use crate::codec::encode_arguments;
use crate::constants::{ESDT_TRANSFER_GAS_LIMIT, TRANSACTION_MIN_GAS_PRICE};
use crate::error::InteractionError;
use crate::payload::{
    esdt_nft_transfer, esdt_transfer, multi_esdt_nft_transfer, ContractCallPayload,
};
use crate::typesystem::{Address, TypedValue};
use num_bigint::BigUint;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    function: String,
    arguments: Vec<TypedValue>,
    value: BigUint,
    token_transfers: Vec<TokenTransfer>,
    gas_limit: u64,
    gas_price: u64,
    contract_address: Option<Address>,
}

impl Interaction {
    pub fn new(function: impl Into<String>, arguments: Vec<TypedValue>) -> Self {
        Self {
            function: function.into(),
            arguments,
            value: BigUint::default(),
            token_transfers: Vec::new(),
            gas_limit: 0,
            gas_price: TRANSACTION_MIN_GAS_PRICE,
            contract_address: None,
        }
    }

    /// EGLD amount, in the smallest denomination.
    pub fn with_value(mut self, value: impl Into<BigUint>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_token_transfer(mut self, transfer: TokenTransfer) -> Self {
        self.token_transfers.push(transfer);
        self
    }

    pub fn with_token_transfers(mut self, transfers: Vec<TokenTransfer>) -> Self {
        self.token_transfers.extend(transfers);
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_gas_price(mut self, gas_price: u64) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Required for non-fungible and multi-token transfers, whose call data
    /// names the contract explicitly.
    pub fn with_contract_address(mut self, address: Address) -> Self {
        self.contract_address = Some(address);
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn arguments(&self) -> &[TypedValue] {
        &self.arguments
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn token_transfers(&self) -> &[TokenTransfer] {
        &self.token_transfers
    }

    pub fn gas_price(&self) -> u64 {
        self.gas_price
    }

    /// Gas limit including the surcharge for each token transfer.
    pub fn gas_limit(&self) -> u64 {
        let surcharge = ESDT_TRANSFER_GAS_LIMIT.saturating_mul(self.token_transfers.len() as u64);
        self.gas_limit.saturating_add(surcharge)
    }

    pub fn transferred_value(&self) -> TransferredValue {
        TransferredValue {
            egld: self.value.clone(),
            tokens: self.token_transfers.clone(),
        }
    }

    /// Resolve the endpoint and run the interaction checker.
    pub fn check<'a>(
        &self,
        abi: &ContractAbi<'a>,
    ) -> Result<&'a EndpointDefinition, InteractionError> {
        let endpoint = abi.get_endpoint(&self.function)?;
        InteractionChecker::new().check(endpoint, &self.arguments, &self.transferred_value())?;
        Ok(endpoint)
    }

    /// Check, encode the arguments and render the call data, wrapped in a
    /// token transfer when the call carries tokens.
    pub fn build_payload(
        &self,
        abi: &ContractAbi<'_>,
    ) -> Result<ContractCallPayload, InteractionError> {
        self.check(abi)?;
        let arguments = encode_arguments(&self.arguments)?;
        let call = ContractCallPayload::new(self.function.clone(), arguments);

        let payload = match self.token_transfers.as_slice() {
            [] => call,
            [single] if single.is_fungible() => esdt_transfer(single, &call),
            [single] => esdt_nft_transfer(single, self.receiver()?, &call),
            many => multi_esdt_nft_transfer(many, self.receiver()?, &call),
        };
        debug!(
            "Built call data: function={}, arguments={}, transfers={}",
            self.function,
            self.arguments.len(),
            self.token_transfers.len()
        );
        Ok(payload)
    }

    fn receiver(&self) -> Result<&Address, InteractionError> {
        self.contract_address
            .as_ref()
            .ok_or(InteractionError::MissingReceiver(self.token_transfers.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::AbiRegistry;

    const ABI: &str = r#"{
        "name": "Shop",
        "endpoints": [
            {"name": "buy", "payableInTokens": ["*"], "inputs": [{"name": "item", "type": "u32"}], "outputs": []}
        ]
    }"#;

    #[test]
    fn test_plain_call() {
        let registry = AbiRegistry::from_json(ABI).unwrap();
        let payload = Interaction::new("buy", vec![TypedValue::U32(3)])
            .build_payload(&registry.all())
            .unwrap();
        assert_eq!(payload.to_string(), "buy@00000003");
    }

    #[test]
    fn test_nft_transfer_needs_receiver() {
        let registry = AbiRegistry::from_json(ABI).unwrap();
        let interaction = Interaction::new("buy", vec![TypedValue::U32(3)])
            .with_token_transfer(TokenTransfer::non_fungible("NFT-abcdef", 2, 1u32));
        assert_eq!(
            interaction.build_payload(&registry.all()).unwrap_err(),
            InteractionError::MissingReceiver(1)
        );

        let payload = interaction
            .with_contract_address(Address([3u8; 32]))
            .build_payload(&registry.all())
            .unwrap();
        assert_eq!(payload.function, "ESDTNFTTransfer");
    }

    #[test]
    fn test_gas_surcharge() {
        let interaction = Interaction::new("buy", vec![])
            .with_gas_limit(1_000_000)
            .with_token_transfers(vec![
                TokenTransfer::fungible("AAA-111111", 1u32),
                TokenTransfer::fungible("BBB-222222", 1u32),
            ]);
        assert_eq!(interaction.gas_limit(), 2_000_000);
        assert_eq!(interaction.gas_price(), TRANSACTION_MIN_GAS_PRICE);
    }
}
