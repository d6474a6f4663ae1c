// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::port::{PortControl, PortStatus};

/// Raw tallies accumulated across the lifetime of the supplicant instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub start_frames_tx: u64,
    pub logoff_frames_tx: u64,
    pub resp_frames_tx: u64,
    pub invalid_eapol_frames_rx: u64,
    pub eap_length_error_frames_rx: u64,
}

impl Counters {
    pub fn new() -> Self {
        Counters::default()
    }

    /// Total EAPOL frames transmitted; invariant 6 of the testable
    /// properties requires this equal the sum of its components.
    pub fn total_frames_tx(&self) -> u64 {
        self.start_frames_tx + self.logoff_frames_tx + self.resp_frames_tx
    }
}

/// Returned by `get_mib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mib {
    pub supp_pae_state: &'static str,
    pub supp_backend_state: &'static str,
    pub counters: Counters,
}

/// Returned by `get_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub port_status: PortStatus,
    pub port_control: PortControl,
    pub supp_pae_state: &'static str,
}
