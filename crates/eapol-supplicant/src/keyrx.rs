// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Key Receive state machine. Grounded on the `KEY_RX_*` `SM_STATE` blocks
//! in the reference supplicant's `eapol_sm.c`.

use crate::config::Config;
use crate::flags::Flags;
use crate::host::{EapEngine, Host};
use crate::key_processor::KeyProcessor;
use eapol::KeyFrame;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRxState {
    NoKeyReceive,
    KeyReceive,
}

impl KeyRxState {
    pub fn name(&self) -> &'static str {
        match self {
            KeyRxState::NoKeyReceive => "NO_KEY_RECEIVE",
            KeyRxState::KeyReceive => "KEY_RECEIVE",
        }
    }
}

pub struct KeyRx {
    pub state: KeyRxState,
    /// The most recently received RC4 EAPOL-Key frame, kept around until the
    /// next frame arrives so `KeyReceive`'s entry can hand it to the key
    /// processor; cleared immediately after processing.
    pending: Option<(Vec<u8>, KeyFrame)>,
}

impl KeyRx {
    pub fn new() -> Self {
        KeyRx { state: KeyRxState::NoKeyReceive, pending: None }
    }

    /// Stores a freshly received RC4 key frame for the next step to
    /// process. Overwrites whatever was previously pending, mirroring
    /// `last_rx_key`'s single-slot ownership.
    pub fn set_pending(&mut self, header_and_body: Vec<u8>, frame: KeyFrame) {
        self.pending = Some((header_and_body, frame));
    }

    pub fn step<H: Host, E: EapEngine>(
        &mut self,
        flags: &mut Flags,
        config: &Config,
        key_processor: &mut KeyProcessor,
        host: &mut H,
        eap: &mut E,
    ) -> bool {
        let target = if flags.initialize || !flags.port_enabled {
            KeyRxState::NoKeyReceive
        } else if flags.rx_key {
            KeyRxState::KeyReceive
        } else {
            return false;
        };

        if target == self.state && target != KeyRxState::KeyReceive {
            return false;
        }

        debug!("key receive: {} -> {}", self.state.name(), target.name());
        self.state = target;
        flags.changed = true;

        if target == KeyRxState::KeyReceive {
            flags.rx_key = false;
            if let Some((raw, frame)) = self.pending.take() {
                key_processor.process(&raw[..], &frame, config, flags, host, eap);
            }
        }

        true
    }
}
