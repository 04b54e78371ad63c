//! Fuzz target: `PacketDecoder::feed`
//!
//! Drives arbitrary byte sequences into the streaming packet decoder and
//! asserts that it never panics, that every message it yields fits the
//! envelope, and that a yielded message re-encodes to a valid packet.
//!
//! cargo fuzz run fuzz_packet_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use potlink::chain::codec::{encode_packet, PacketDecoder, MAX_WIRE_ADDRESS, PACKET_SIZE};

fuzz_target!(|data: &[u8]| {
    let mut decoder = PacketDecoder::new();
    let mut delivered = 0usize;

    decoder.feed(data, |msg| {
        assert!(msg.address <= MAX_WIRE_ADDRESS, "address exceeds header field");
        assert!(msg.payload.len() < PACKET_SIZE, "payload exceeds packet");
        assert!(encode_packet(&msg).is_ok(), "decoded message must re-encode");
        delivered += 1;
    });

    assert_eq!(
        delivered + decoder.rejected() as usize,
        data.len() / PACKET_SIZE,
        "every complete packet is delivered or rejected"
    );

    // After a reset the decoder must accept bytes cleanly again.
    decoder.reset();
    decoder.feed(data, |_| {});
});
