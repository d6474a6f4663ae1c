// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Wire codec for IEEE 802.1X EAPOL frames: the 4-byte EAPOL header shared by
//! every frame type and the legacy (RC4 / dynamic WEP) EAPOL-Key body.
//!
//! WPA/RSN EAPOL-Key frames (descriptor type 2 or 254) are recognized only
//! well enough to be routed elsewhere; this crate does not parse their body.

use bitfield::bitfield;
use bytes::{BufMut, Bytes};
use nom::{be_u16, be_u8, do_parse, named_args, take};
use std::convert::AsMut;

/// Length, in bytes, of the fixed EAPOL header.
pub const HEADER_LEN: usize = 4;

/// Length, in bytes, of the legacy EAPOL-Key body up to (but not including)
/// the trailing key data: type(1) + key_length(2) + replay_counter(8) +
/// key_iv(16) + key_index(1) + key_signature(16).
pub const KEY_BODY_FIXED_LEN: usize = 1 + 2 + 8 + 16 + 1 + 16;

pub const REPLAY_COUNTER_LEN: usize = 8;
pub const KEY_IV_LEN: usize = 16;
pub const KEY_SIGNATURE_LEN: usize = 16;

// IEEE Std 802.1X-2010, 11.3.2, Table 11-3
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    EapPacket,
    Start,
    Logoff,
    Key,
    EncapsulatedAsfAlert,
    Unknown(u8),
}

impl PacketType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => PacketType::EapPacket,
            1 => PacketType::Start,
            2 => PacketType::Logoff,
            3 => PacketType::Key,
            4 => PacketType::EncapsulatedAsfAlert,
            other => PacketType::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            PacketType::EapPacket => 0,
            PacketType::Start => 1,
            PacketType::Logoff => 2,
            PacketType::Key => 3,
            PacketType::EncapsulatedAsfAlert => 4,
            PacketType::Unknown(v) => *v,
        }
    }
}

// IEEE Std 802.1X-2010, 11.9, Table 11-5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDescriptorType {
    /// Legacy dynamic WEP keying, the only subtype this crate decodes.
    Rc4,
    /// IEEE 802.11 / RSN descriptor; carried by the 4-Way Handshake.
    Ieee8021x2010,
    /// Pre-RSN WPA1 descriptor.
    Wpa,
    Unknown(u8),
}

impl KeyDescriptorType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => KeyDescriptorType::Rc4,
            2 => KeyDescriptorType::Ieee8021x2010,
            254 => KeyDescriptorType::Wpa,
            other => KeyDescriptorType::Unknown(other),
        }
    }
}

/// The 4-byte header shared by all EAPOL frame types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub packet_type: PacketType,
    /// Length of the body following this header, in bytes. Does not include
    /// the header itself.
    pub body_len: u16,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Option<Header> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        Some(Header {
            version: bytes[0],
            packet_type: PacketType::from_u8(bytes[1]),
            body_len: ((bytes[2] as u16) << 8) | (bytes[3] as u16),
        })
    }

    pub fn as_bytes(&self, buf: &mut Vec<u8>) {
        buf.put_u8(self.version);
        buf.put_u8(self.packet_type.as_u8());
        buf.put_u16_be(self.body_len);
    }
}

// IEEE Std 802.1X-2010, 11.9, Figure 11-13 (key_index octet)
bitfield! {
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct KeyIndex(u8);
    impl Debug;
    pub is_unicast, set_unicast: 7;
    pub slot, set_slot: 6, 0;
}

impl KeyIndex {
    pub fn new(is_unicast: bool, slot: u8) -> Self {
        let mut k = KeyIndex(0);
        k.set_unicast(is_unicast);
        k.set_slot(slot);
        k
    }
}

/// The legacy (RC4 / dynamic WEP) EAPOL-Key body. IEEE Std 802.1X-2010,
/// 11.9, Figure 11-12 with descriptor type 1.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFrame {
    pub descriptor_type: u8,
    pub key_length: u16,
    pub replay_counter: [u8; REPLAY_COUNTER_LEN],
    pub key_iv: [u8; KEY_IV_LEN],
    pub key_index: KeyIndex,
    pub key_signature: [u8; KEY_SIGNATURE_LEN],
    pub key_data: Bytes,
}

impl KeyFrame {
    /// Number of bytes this body occupies on the wire, including trailing
    /// key data but excluding the 4-byte EAPOL header.
    pub fn body_len(&self) -> usize {
        KEY_BODY_FIXED_LEN + self.key_data.len()
    }

    /// Serializes this frame's body. If `zero_signature` is set, the
    /// key_signature field is written as all zeroes, matching the contract
    /// HMAC verification is computed against.
    pub fn as_bytes(&self, zero_signature: bool, buf: &mut Vec<u8>) {
        buf.reserve(self.body_len());
        buf.put_u8(self.descriptor_type);
        buf.put_u16_be(self.key_length);
        buf.put_slice(&self.replay_counter[..]);
        buf.put_slice(&self.key_iv[..]);
        buf.put_u8(self.key_index.0);
        if zero_signature {
            buf.put_slice(&[0u8; KEY_SIGNATURE_LEN][..]);
        } else {
            buf.put_slice(&self.key_signature[..]);
        }
        buf.put_slice(&self.key_data[..]);
    }
}

fn to_array<A>(slice: &[u8]) -> A
where
    A: Sized + Default + AsMut<[u8]>,
{
    let mut array = Default::default();
    <A as AsMut<[u8]>>::as_mut(&mut array).clone_from_slice(slice);
    array
}

named_args!(pub key_frame_from_bytes(key_data_len: u16) <KeyFrame>,
    do_parse!(
        descriptor_type: be_u8 >>
        key_length: be_u16 >>
        replay_counter: take!(REPLAY_COUNTER_LEN) >>
        key_iv: take!(KEY_IV_LEN) >>
        key_index: be_u8 >>
        key_signature: take!(KEY_SIGNATURE_LEN) >>
        key_data: take!(key_data_len) >>
        (KeyFrame {
            descriptor_type,
            key_length,
            replay_counter: to_array(replay_counter),
            key_iv: to_array(key_iv),
            key_index: KeyIndex(key_index),
            key_signature: to_array(key_signature),
            key_data: Bytes::from(key_data),
        })
    )
);

/// Parses a full EAPOL-Key frame (header + legacy key body) from `bytes`,
/// which must be exactly `header.body_len` bytes of body past the header.
pub fn parse_key_frame(header: &Header, body: &[u8]) -> Option<KeyFrame> {
    if body.len() < KEY_BODY_FIXED_LEN {
        return None;
    }
    let key_data_len = body.len() - KEY_BODY_FIXED_LEN;
    if header.body_len as usize != body.len() {
        return None;
    }
    match key_frame_from_bytes(body, key_data_len as u16) {
        Ok((_, frame)) => Some(frame),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let hdr = Header { version: 1, packet_type: PacketType::Key, body_len: 95 };
        let mut buf = vec![];
        hdr.as_bytes(&mut buf);
        assert_eq!(&buf[..], &[0x01, 0x03, 0x00, 0x5f]);
        let parsed = Header::parse(&buf[..]).unwrap();
        assert_eq!(parsed, hdr);
    }

    #[test]
    fn header_too_short() {
        assert!(Header::parse(&[0x01, 0x03, 0x00]).is_none());
    }

    #[test]
    fn unknown_packet_type_round_trips() {
        let hdr = Header { version: 1, packet_type: PacketType::from_u8(9), body_len: 0 };
        assert_eq!(hdr.packet_type.as_u8(), 9);
    }

    fn sample_body(key_data: &[u8]) -> Vec<u8> {
        let mut buf = vec![];
        buf.push(1u8); // descriptor_type = RC4
        buf.extend_from_slice(&[0x00, 0x05]); // key_length = 5
        buf.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]); // replay_counter = 1
        buf.extend_from_slice(&[0xAAu8; KEY_IV_LEN]); // key_iv
        buf.push(0x81); // key_index: unicast, slot 1
        buf.extend_from_slice(&[0u8; KEY_SIGNATURE_LEN]); // key_signature
        buf.extend_from_slice(key_data);
        buf
    }

    #[test]
    fn key_frame_round_trip() {
        let key_data = [1u8, 2, 3, 4, 5];
        let body = sample_body(&key_data);
        let hdr = Header {
            version: 1,
            packet_type: PacketType::Key,
            body_len: body.len() as u16,
        };
        let frame = parse_key_frame(&hdr, &body[..]).expect("frame should parse");
        assert_eq!(frame.key_length, 5);
        assert_eq!(frame.replay_counter, [0, 0, 0, 0, 0, 0, 0, 1]);
        assert!(frame.key_index.is_unicast());
        assert_eq!(frame.key_index.slot(), 1);
        assert_eq!(&frame.key_data[..], &key_data[..]);

        let mut out = vec![];
        frame.as_bytes(false, &mut out);
        assert_eq!(&out[..], &body[..]);
    }

    #[test]
    fn key_frame_zeroed_signature() {
        let body = sample_body(&[]);
        let hdr = Header { version: 1, packet_type: PacketType::Key, body_len: body.len() as u16 };
        let mut frame = parse_key_frame(&hdr, &body[..]).unwrap();
        frame.key_signature = [0xFFu8; KEY_SIGNATURE_LEN];
        let mut out = vec![];
        frame.as_bytes(true, &mut out);
        assert_eq!(&out[KEY_BODY_FIXED_LEN - KEY_SIGNATURE_LEN..KEY_BODY_FIXED_LEN],
                   &[0u8; KEY_SIGNATURE_LEN][..]);
    }

    #[test]
    fn too_short_body_rejected() {
        let hdr = Header { version: 1, packet_type: PacketType::Key, body_len: 10 };
        assert!(parse_key_frame(&hdr, &[0u8; 10]).is_none());
    }

    #[test]
    fn key_index_bitfield() {
        let k = KeyIndex::new(true, 0x02);
        assert!(k.is_unicast());
        assert_eq!(k.slot(), 2);
        let k = KeyIndex::new(false, 0x7f);
        assert!(!k.is_unicast());
        assert_eq!(k.slot(), 0x7f);
    }
}
