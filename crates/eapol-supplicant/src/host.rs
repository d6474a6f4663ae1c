// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Capability traits injected at construction. Mirrors the `Device`/
//! `Timer`/`Scheduler` capability-trait pattern used by this codebase's WLAN
//! MLME client state machine: the EAP engine and the link-layer/driver host
//! are borrowed capabilities, not an aliasing back-pointer into a heap node,
//! so neither side owns the other.

use eapol::PacketType;

/// Transport send, driver key-install, and completion-callback capabilities
/// supplied by the embedder.
pub trait Host {
    /// Transmit one EAPOL frame of the given type with the given payload.
    fn eapol_send(&mut self, packet_type: PacketType, payload: &[u8]);

    /// Install a dynamic WEP key. Returns true on success.
    fn set_wep_key(&mut self, is_unicast: bool, slot: u8, key: &[u8]) -> bool;

    /// Called once the port fully authorizes: all required keys installed,
    /// or plaintext acceptance under `required_keys.is_none()`.
    fn eapol_done(&mut self);

    /// Called once per terminal PAE outcome.
    fn on_result(&mut self, success: bool);
}

/// The 64 bytes of keying material an EAP method can hand back, split into
/// the encryption and signing halves used by the key processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMaterial {
    pub encr_key: [u8; 32],
    pub sign_key: [u8; 32],
    /// Number of meaningful leading bytes in `encr_key` and `sign_key`: 32
    /// for the standard 64-byte split, or 16 for the LEAP path (where
    /// `sign_key` is a copy of `encr_key`).
    pub key_len: usize,
}

/// The EAP method engine this crate drives but does not contain. Treated as
/// an opaque step-able object exposing success/fail/response-ready signals.
pub trait EapEngine {
    /// Advance the EAP engine. Returns true if it produced an observable
    /// change (so the step orchestrator should mark `changed`).
    fn step(&mut self) -> bool;

    /// Polled by the embedder, not by this crate: the reference design has
    /// a separate EAP method state machine decide success/fail and then
    /// call `notify_eap_success`/`notify_eap_fail` on the supplicant. These
    /// two getters exist for that embedder to read before doing so.
    fn is_success(&self) -> bool;
    fn is_fail(&self) -> bool;

    /// True once a response packet is ready to be sent.
    fn has_response(&self) -> bool;

    /// Takes the pending response packet, if any.
    fn take_response(&mut self) -> Option<Vec<u8>>;

    /// Feeds an inbound EAP request payload (the body of an EAP-Packet
    /// EAPOL frame) to the engine.
    fn set_request(&mut self, data: &[u8]);

    /// True if the EAP method just completed and a fresh pairwise key
    /// became available (used to invalidate a stale replay counter on
    /// backend SUCCESS entry).
    fn has_new_key(&self) -> bool;

    /// Requests the currently available keying material, or `None` if none
    /// is available yet.
    fn key_material(&mut self) -> Option<KeyMaterial>;

    /// Forwards an opaque smart-card context to the EAP engine; the
    /// supplicant core never interprets it.
    fn set_scard_ctx(&mut self, ctx: Option<Vec<u8>>);
}
