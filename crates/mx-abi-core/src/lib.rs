//! MultiversX contract ABI toolkit.
//!
//! Loads contract interfaces, builds typed call arguments, checks a proposed
//! call against its endpoint and encodes it into call data.

pub mod abi;
pub mod checker;
pub mod codec;
pub mod constants;
pub mod error;
pub mod interaction;
pub mod payload;
pub mod typesystem;

pub use abi::{AbiRegistry, ContractAbi, EndpointDefinition, Mutability};
pub use checker::{InteractionChecker, TokenTransfer, TransferredValue};
pub use codec::EncodingMode;
pub use error::{AbiError, CodecError, InteractionError, PayloadError, TransferredAsset, ValueError};
pub use interaction::Interaction;
pub use payload::ContractCallPayload;
pub use typesystem::{Address, GenericKind, PrimitiveType, TypeDescriptor, TypedValue};
