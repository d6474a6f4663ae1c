// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

/// The shared event flags read and mutated by all three FSMs within a single
/// step. Bundled into one record rather than threaded as ~25 individual
/// booleans; the FSMs run sequentially within a step, so no locking applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    pub initialize: bool,
    pub port_enabled: bool,
    pub port_valid: bool,
    pub user_logoff: bool,
    pub logoff_sent: bool,
    pub eapol_eap: bool,
    pub eap_success: bool,
    pub eap_fail: bool,
    pub eap_restart: bool,
    pub supp_start: bool,
    pub supp_success: bool,
    pub supp_fail: bool,
    pub supp_timeout: bool,
    pub supp_abort: bool,
    pub key_run: bool,
    pub key_done: bool,
    pub rx_key: bool,
    pub eap_req: bool,
    pub eap_resp: bool,
    pub eap_no_resp: bool,
    pub initial_req: bool,
    pub alt_accept: bool,
    pub alt_reject: bool,
    pub unicast_key_received: bool,
    pub broadcast_key_received: bool,
    pub cached_pmk: bool,
    pub changed: bool,
}

impl Flags {
    pub fn new() -> Self {
        Flags::default()
    }
}
