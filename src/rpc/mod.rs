//! MQTT topic-tree RPC: a hierarchical node tree with method dispatch and
//! notification publish ([`node`], [`root`]), and a bridge node that
//! authenticates and remaps foreign downstream clients onto it ([`bridge`]).

pub mod bridge;
pub mod node;
pub mod root;

pub use bridge::{BridgeAuthFn, BridgeEvent, BridgeNode};
pub use node::{CatchAllFn, DispatchOutcome, MethodFn, NodeId, ReturnParams, RpcTree};
pub use root::RpcRoot;
