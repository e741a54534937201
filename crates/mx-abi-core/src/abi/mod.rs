//! Contract interfaces: document parsing, endpoint signatures and the
//! registry.

pub mod endpoint;
pub mod raw;
pub mod registry;

pub use endpoint::{EndpointDefinition, Mutability, ParameterDefinition, ANY_TOKEN, EGLD_TOKEN};
pub use registry::{AbiRegistry, ContractAbi, ContractInterface, CONSTRUCTOR_NAME};
