//! Network constants used when rendering call data.

/// Separator between the function name and each argument in call data.
pub const ARGUMENTS_SEPARATOR: char = '@';

pub const ESDT_TRANSFER_FUNCTION_NAME: &str = "ESDTTransfer";
pub const ESDTNFT_TRANSFER_FUNCTION_NAME: &str = "ESDTNFTTransfer";
pub const MULTI_ESDTNFT_TRANSFER_FUNCTION_NAME: &str = "MultiESDTNFTTransfer";

/// Extra gas charged for each token transfer carried by a call.
pub const ESDT_TRANSFER_GAS_LIMIT: u64 = 500_000;

pub const TRANSACTION_MIN_GAS_PRICE: u64 = 1_000_000_000;
