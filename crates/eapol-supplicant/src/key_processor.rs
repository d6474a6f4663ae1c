// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Replay validation, HMAC-MD5 verification, and RC4 unwrapping of legacy
//! dynamic-WEP EAPOL-Key frames. Grounded on `eapol_sm_processKey` in the
//! reference supplicant.

use crate::config::Config;
use crate::flags::Flags;
use crate::host::{EapEngine, Host};
use crypto::hmac::Hmac;
use crypto::mac::Mac;
use crypto::md5::Md5;
use crypto::rc4::Rc4;
use crypto::symmetriccipher::SynchronousStreamCipher;
use eapol::{KeyFrame, HEADER_LEN, KEY_BODY_FIXED_LEN, KEY_SIGNATURE_LEN};
use log::{debug, warn};

const MAX_KEY_LEN: usize = 32;

/// Owns the replay-counter high-water mark across received key frames.
#[derive(Debug, Default)]
pub struct KeyProcessor {
    /// `None` iff no key has yet been accepted (`replay_counter_valid` in
    /// the distilled data model collapsed into this `Option`).
    pub(crate) last_replay_counter: Option<[u8; 8]>,
}

impl KeyProcessor {
    pub fn new() -> Self {
        KeyProcessor { last_replay_counter: None }
    }

    pub fn last_replay_counter(&self) -> Option<[u8; 8]> {
        self.last_replay_counter
    }

    /// Forgets the stored replay counter high-water mark. Called when the
    /// backend FSM enters SUCCESS and the EAP method advertises a fresh
    /// pairwise key, since a new key resets the replay counter's namespace.
    pub fn invalidate_replay_counter(&mut self) {
        self.last_replay_counter = None;
    }

    /// Processes one received EAPOL-Key frame. `header_and_body` is the raw
    /// bytes of the frame (4-byte header followed by the key body,
    /// including trailing key data) as originally received, used to
    /// recompute the HMAC over a zeroed-signature copy. `frame` is the
    /// already-parsed view of the same bytes.
    pub fn process<H: Host, E: EapEngine>(
        &mut self,
        header_and_body: &[u8],
        frame: &KeyFrame,
        config: &Config,
        flags: &mut Flags,
        host: &mut H,
        eap: &mut E,
    ) {
        if !config.accept_802_1x_keys {
            debug!("dropping EAPOL-Key frame: accept_802_1x_keys disabled");
            return;
        }

        let material = match eap.key_material() {
            Some(m) => m,
            None => {
                warn!("dropping EAPOL-Key frame: no keying material available from EAP engine");
                return;
            }
        };
        let (encr_key, sign_key): (&[u8], &[u8]) = match material.key_len {
            32 => (&material.encr_key[..32], &material.sign_key[..32]),
            16 => (&material.encr_key[..16], &material.encr_key[..16]),
            other => {
                warn!("dropping EAPOL-Key frame: unexpected keying material length {}", other);
                return;
            }
        };

        if let Some(last) = self.last_replay_counter {
            if frame.replay_counter <= last {
                debug!("dropping EAPOL-Key frame: replay counter did not increase");
                return;
            }
        }

        if !verify_signature(header_and_body, frame, sign_key) {
            debug!("dropping EAPOL-Key frame: HMAC-MD5 signature mismatch");
            return;
        }

        let announced_len = frame.key_length as usize;
        let received_len = frame.key_data.len();
        if announced_len > MAX_KEY_LEN || received_len > MAX_KEY_LEN {
            warn!("dropping EAPOL-Key frame: key length {} exceeds {} bytes", announced_len, MAX_KEY_LEN);
            return;
        }

        let installed_key: Vec<u8> = if received_len == announced_len {
            let mut rc4_key = Vec::with_capacity(eapol::KEY_IV_LEN + encr_key.len());
            rc4_key.extend_from_slice(&frame.key_iv[..]);
            rc4_key.extend_from_slice(encr_key);
            let mut decrypted = vec![0u8; received_len];
            Rc4::new(&rc4_key[..]).process(&frame.key_data[..], &mut decrypted[..]);
            decrypted
        } else if received_len == 0 {
            encr_key[..announced_len].to_vec()
        } else {
            warn!(
                "dropping EAPOL-Key frame: key data length {} matches neither announced length {} nor zero",
                received_len, announced_len
            );
            return;
        };

        self.last_replay_counter = Some(frame.replay_counter);

        let is_unicast = frame.key_index.is_unicast();
        let slot = frame.key_index.slot();
        if !host.set_wep_key(is_unicast, slot, &installed_key[..]) {
            warn!("driver rejected set_wep_key for slot {}", slot);
            return;
        }
        if is_unicast {
            flags.unicast_key_received = true;
        } else {
            flags.broadcast_key_received = true;
        }

        if config
            .required_keys
            .is_satisfied_by(flags.unicast_key_received, flags.broadcast_key_received)
        {
            flags.port_valid = true;
            host.eapol_done();
        }
    }
}

fn verify_signature(header_and_body: &[u8], frame: &KeyFrame, sign_key: &[u8]) -> bool {
    let sig_offset = HEADER_LEN + KEY_BODY_FIXED_LEN - KEY_SIGNATURE_LEN;
    if header_and_body.len() < sig_offset + KEY_SIGNATURE_LEN {
        return false;
    }
    let mut zeroed = header_and_body.to_vec();
    for b in &mut zeroed[sig_offset..sig_offset + KEY_SIGNATURE_LEN] {
        *b = 0;
    }
    let mut hmac = Hmac::new(Md5::new(), sign_key);
    hmac.input(&zeroed[..]);
    hmac.result().code() == &frame.key_signature[..]
}
