//! Compile-time capacity constants.
//!
//! Every fixed-capacity container in this crate is sized from a constant
//! defined here rather than a literal at the call site, so the whole
//! memory budget can be read and tuned in one place.

// --- Run-loop ---

/// Maximum number of independent cooperative run-loop threads.
pub const MAX_RUNLOOP_THREADS: usize = 4;
/// Maximum number of periodic entries registered on one thread.
pub const MAX_PERIODICS_PER_THREAD: usize = 8;
/// Maximum number of one-shot entries queued on one thread between ticks.
pub const MAX_ONESHOTS_PER_THREAD: usize = 8;

// --- State machine ---

/// Maximum number of states in one `Fsm`.
pub const MAX_STATES: usize = 16;

// --- Protocol parsers ---

/// Bytes processed per parser tick before yielding, bounding per-tick latency.
pub const PARSER_BYTES_PER_TICK: usize = 16;
/// Silence duration, with a frame open, after which a parser times out.
pub const PARSER_RECEPTION_TIMEOUT_MS: u32 = 5_000;
/// Maximum payload a CLE-proto frame may carry (u16 length field minus footer).
pub const CLE_PROTO_MAX_PAYLOAD_BYTES: usize = 65_532;
/// Maximum line length the CRLF framing will buffer before giving up.
pub const CRLF_MAX_LINE_BYTES: usize = 128;
/// Maximum payload a BGAPI frame may carry (11-bit length field).
pub const BGAPI_MAX_PAYLOAD_BYTES: usize = 2_047;

// --- MQTT ---

/// Maximum MQTT client id length in bytes (protocol allows 1-23).
pub const MQTT_MAX_CLIENT_ID_LEN: usize = 23;
/// Maximum size of one MQTT message's backing buffer.
pub const MQTT_MAX_MESSAGE_BYTES: usize = 512;
/// Maximum topic name length.
pub const MQTT_MAX_TOPIC_LEN: usize = 64;
/// Number of pre-allocated messages in the message factory pool.
pub const MQTT_MESSAGE_POOL_SIZE: usize = 4;
/// Maximum bytes in an encoded remaining-length field.
pub const MQTT_REMAINING_LENGTH_MAX_BYTES: usize = 4;
/// Maximum number of topic filters in one SUBSCRIBE/SUBACK pair.
pub const MQTT_MAX_SUBSCRIPTIONS_PER_PACKET: usize = 8;

// --- RPC tree ---

/// Maximum child nodes under one RPC node.
pub const MAX_RPC_SUBNODES: usize = 4;
/// Maximum methods registered on one RPC node.
pub const MAX_RPC_METHODS: usize = 8;
/// Maximum length of one RPC node name.
pub const MAX_RPC_NAME_LEN: usize = 16;
/// Maximum length of one RPC method name.
pub const MAX_RPC_METHOD_LEN: usize = 24;
/// Maximum length of a root node's topic prefix.
pub const MAX_RPC_PREFIX_LEN: usize = 16;
/// Maximum size of an RPC method's return-parameter buffer.
pub const MAX_RPC_RETURN_PARAMS_BYTES: usize = 64;
/// Maximum total nodes in one RPC tree's arena.
pub const MAX_RPC_NODES: usize = 32;
/// Maximum depth of the RPC tree, used to bound path-building walks.
pub const MAX_RPC_TREE_DEPTH: usize = 6;
/// Maximum length of a fully-assembled RPC topic (prefix + path + method).
pub const MAX_RPC_TOPIC_LEN: usize = 128;

// --- Bridge ---

/// Maximum number of remote clients one bridge node tracks.
pub const MAX_BRIDGE_REMOTE_NODES: usize = 4;
/// Maximum length of a bridged client id.
pub const BRIDGE_CLIENT_ID_MAX_LEN: usize = 17;
/// Maximum length of the local name a bridged client is mapped to.
pub const BRIDGE_MAPPED_NAME_MAX_LEN: usize = 9;

// --- BTLE ---

/// Maximum concurrent BTLE connections held by one central.
pub const MAX_BTLE_CONNECTIONS: usize = 4;
/// Maximum number of AD structures one advertisement packet is iterated over.
pub const MAX_BTLE_ADV_FIELDS: usize = 16;
/// Maximum raw advertisement/scan-response payload length.
pub const MAX_BTLE_ADV_PAYLOAD_BYTES: usize = 31;
/// Maximum cached service/characteristic handles per connection.
pub const MAX_BTLE_CACHED_HANDLES_PER_CONNECTION: usize = 4;
/// Maximum bytes a pending characteristic write can carry while a
/// service/characteristic resolve is in flight ahead of it.
pub const MAX_BTLE_GATT_WRITE_BYTES: usize = 20;
