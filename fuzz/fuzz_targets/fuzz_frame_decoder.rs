//! Fuzz target: `MqttFramingParser::feed_byte`
//!
//! Drives arbitrary byte sequences into the streaming MQTT frame decoder,
//! byte at a time, and asserts it never panics and never reports a frame
//! longer than its backing buffer.
//!
//! cargo fuzz run fuzz_frame_decoder

#![no_main]

use embedcore::protocol::mqtt_framing::MqttFramingParser;
use embedcore::protocol::ParserEvent;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut parser = MqttFramingParser::new();

    for &byte in data {
        if let Some(ParserEvent::FrameReady) = parser.feed_byte(byte, 0) {
            assert!(
                parser.frame().len() <= 512,
                "frame exceeds MQTT_MAX_MESSAGE_BYTES"
            );
            assert!(!parser.frame().is_empty(), "a ready frame must not be empty");
        }
        parser.reset_error();
    }
});
