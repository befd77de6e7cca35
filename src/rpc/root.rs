//! The root of an RPC tree: an [`RpcTree`] bound to an [`MqttClient`] and a
//! topic prefix. Owns the arena; every other node in the tree is reached
//! through it by [`NodeId`].

use heapless::String;

use crate::config::{MAX_RPC_PREFIX_LEN, MAX_RPC_TOPIC_LEN};
use crate::error::RpcError;
use crate::io::ByteStream;
use crate::mqtt::messages::publish::PublishFields;
use crate::mqtt::{ClientEvent, MqttClient};

use super::node::{CatchAllFn, MethodFn, NodeId, ReturnParams, RpcTree};

/// Builds `<prefix>/<name>`, normalizing exactly one `/` between them
/// regardless of whether `prefix` already ends in one — the root-side
/// computation is authoritative when it and a node's own path math would
/// otherwise disagree.
fn join_prefix(prefix: &str, name: &str) -> Option<String<MAX_RPC_TOPIC_LEN>> {
    let mut out = String::new();
    out.push_str(prefix.trim_end_matches('/')).ok()?;
    out.push('/').ok()?;
    out.push_str(name).ok()?;
    Some(out)
}

pub struct RpcRoot<S: ByteStream> {
    tree: RpcTree,
    client: MqttClient<S>,
    prefix: String<MAX_RPC_PREFIX_LEN>,
    root_id: NodeId,
}

impl<S: ByteStream> RpcRoot<S> {
    pub fn new(stream: S, prefix: &str, root_name: &str) -> Result<Self, RpcError> {
        let mut tree = RpcTree::new();
        let root_id = tree.add_root(root_name)?;
        let prefix = String::try_from(prefix).map_err(|_| RpcError::Internal)?;
        Ok(Self {
            tree,
            client: MqttClient::new(stream),
            prefix,
            root_id,
        })
    }

    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    pub fn tree_mut(&mut self) -> &mut RpcTree {
        &mut self.tree
    }

    pub fn client_mut(&mut self) -> &mut MqttClient<S> {
        &mut self.client
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId, RpcError> {
        self.tree.add_child(parent, name)
    }

    pub fn register_method(
        &mut self,
        node: NodeId,
        name: &str,
        callback: MethodFn,
    ) -> Result<(), RpcError> {
        self.tree.register_method(node, name, callback)
    }

    pub fn set_catch_all(&mut self, node: NodeId, catch_all: CatchAllFn) -> Result<(), RpcError> {
        self.tree.set_catch_all(node, catch_all)
    }

    /// Topic filter the root subscribes to: `<prefix>/<root-name>/#`.
    fn subscription_filter(&self) -> Option<String<MAX_RPC_TOPIC_LEN>> {
        let mut filter = join_prefix(&self.prefix, self.tree.name_of(self.root_id)?)?;
        filter.push_str("/#").ok()?;
        Some(filter)
    }

    pub fn subscribe_root(&mut self) -> Result<u16, RpcError> {
        let filter = self.subscription_filter().ok_or(RpcError::Internal)?;
        use crate::mqtt::messages::subscribe::TopicFilter;
        self.client
            .subscribe(&[TopicFilter {
                filter: &filter,
                requested_qos: 0,
            }])
            .map_err(|_| RpcError::Internal)
    }

    /// Drive the underlying MQTT client and dispatch any delivered
    /// request publish. Returns the raw client event for callers that
    /// also care about connection state.
    pub fn poll(&mut self, now_ms: u64) -> Option<ClientEvent> {
        let event = self.client.poll(now_ms)?;
        if event == ClientEvent::PublishReceived {
            self.handle_internal_publish();
        }
        Some(event)
    }

    fn handle_internal_publish(&mut self) {
        use crate::mqtt::messages::publish::decode_publish;

        let Ok(view) = decode_publish(self.client.inbound()) else {
            return;
        };
        let topic = view.topic;
        let payload = view.payload;

        if payload.len() < 2 {
            return;
        }
        let (request_id_bytes, params) = payload.split_at(2);
        let request_id = u16::from_be_bytes([request_id_bytes[0], request_id_bytes[1]]);

        let Some(root_prefix) = join_prefix(&self.prefix, self.tree.name_of(self.root_id).unwrap_or("")) else {
            return;
        };
        let Some(remaining) = topic.strip_prefix(root_prefix.as_str()) else {
            return;
        };
        let remaining = remaining.trim_start_matches('/');

        let mut out = ReturnParams::new();
        let status = match self.tree.dispatch(self.root_id, remaining, params, &mut out) {
            Ok(_) => 0u8,
            Err(err) => err.status_code(),
        };
        self.publish_response(topic, request_id, status, &out);
    }

    fn publish_response(&mut self, original_topic: &str, request_id: u16, status: u8, payload: &[u8]) {
        let mut topic: String<MAX_RPC_TOPIC_LEN> = String::new();
        if topic.push_str("/rpcResp/").is_err() {
            return;
        }
        if topic.push_str(original_topic).is_err() {
            return;
        }
        if topic.push('/').is_err() {
            return;
        }
        let mut id_buf = itoa_u16(request_id);
        if topic.push_str(id_buf.as_str()).is_err() {
            return;
        }
        if topic.push('/').is_err() {
            return;
        }
        id_buf = itoa_u16(status as u16);
        if topic.push_str(id_buf.as_str()).is_err() {
            return;
        }

        let _ = self.client.publish(&PublishFields {
            topic: &topic,
            packet_id: None,
            payload,
            qos: 0,
            dup: false,
            retain: false,
        });
    }

    /// `publish_notification(name, qos, bytes)`: topic `<node-path>/^^<name>`.
    pub fn publish_notification(
        &mut self,
        node: NodeId,
        name: &str,
        qos: u8,
        bytes: &[u8],
    ) -> Result<(), RpcError> {
        let mut topic: String<MAX_RPC_TOPIC_LEN> = String::new();
        topic
            .push_str(self.prefix.trim_end_matches('/'))
            .map_err(|_| RpcError::Internal)?;
        for ancestor in self.tree.ancestry(node).iter() {
            topic.push('/').map_err(|_| RpcError::Internal)?;
            let name = self.tree.name_of(*ancestor).ok_or(RpcError::NodeDoesNotExist)?;
            topic.push_str(name).map_err(|_| RpcError::Internal)?;
        }
        topic.push_str("/^^").map_err(|_| RpcError::Internal)?;
        topic.push_str(name).map_err(|_| RpcError::Internal)?;

        self.client
            .publish(&PublishFields {
                topic: &topic,
                packet_id: None,
                payload: bytes,
                qos,
                dup: false,
                retain: false,
            })
            .map_err(|_| RpcError::Internal)
    }
}

/// Minimal decimal formatter for topic assembly; avoids pulling in a
/// formatting crate for two small integers per response.
fn itoa_u16(mut value: u16) -> String<5> {
    let mut digits: heapless::Vec<u8, 5> = heapless::Vec::new();
    if value == 0 {
        digits.push(b'0').ok();
    }
    while value > 0 {
        digits.push(b'0' + (value % 10) as u8).ok();
        value /= 10;
    }
    digits.reverse();
    let mut out = String::new();
    for &b in &digits {
        out.push(b as char).ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::fifo::OnFullPolicy;
    use crate::containers::Fifo;
    use crate::io::ReadStatus;

    struct NullStream {
        rx: Fifo<u8, 16>,
        tx: heapless::Vec<u8, 256>,
    }

    impl NullStream {
        fn new() -> Self {
            Self {
                rx: Fifo::new(OnFullPolicy::DropNewest),
                tx: heapless::Vec::new(),
            }
        }
    }

    impl ByteStream for NullStream {
        fn read_byte(&mut self) -> ReadStatus {
            match self.rx.dequeue() {
                Some(b) => ReadStatus::GotData(b),
                None => ReadStatus::NoData,
            }
        }

        fn write_byte(&mut self, byte: u8) -> bool {
            self.tx.push(byte).is_ok()
        }
    }

    #[test]
    fn subscription_filter_has_one_slash_regardless_of_trailing_slash() {
        let root = RpcRoot::new(NullStream::new(), "home/", "dev").unwrap();
        assert_eq!(root.subscription_filter().unwrap().as_str(), "home/dev/#");

        let root2 = RpcRoot::new(NullStream::new(), "home", "dev").unwrap();
        assert_eq!(root2.subscription_filter().unwrap().as_str(), "home/dev/#");
    }

    #[test]
    fn itoa_formats_small_integers() {
        assert_eq!(itoa_u16(0).as_str(), "0");
        assert_eq!(itoa_u16(42).as_str(), "42");
        assert_eq!(itoa_u16(65535).as_str(), "65535");
    }
}
