//! Chain collaborators for the reconciliation engine: polling adapters for
//! Ethereum and Cosmos nodes and the Ethereum pending-transaction subscriber.

pub mod cosmos;
pub mod eth;

pub use cosmos::CosmosAdapter;
pub use eth::{subscriber::EthSubscriber, EthAdapter};

use jsonrpsee::core::ClientError;
use xray_core::AdapterError;

pub(crate) fn rpc_error(err: ClientError) -> AdapterError {
    match err {
        ClientError::Call(obj) => AdapterError::Rpc {
            code: i64::from(obj.code()),
            message: obj.message().to_owned(),
        },
        ClientError::ParseError(e) => AdapterError::Decode(e.to_string()),
        other => AdapterError::Transport(other.to_string()),
    }
}
