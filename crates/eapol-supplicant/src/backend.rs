// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Supplicant Backend state machine. Grounded on the `SUPP_BE_*` `SM_STATE`
//! blocks in the reference supplicant's `eapol_sm.c`.

use crate::config::Config;
use crate::counters::Counters;
use crate::flags::Flags;
use crate::host::{EapEngine, Host};
use crate::key_processor::KeyProcessor;
use crate::timers::Timers;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Unknown,
    Request,
    Response,
    Success,
    Fail,
    Timeout,
    Idle,
    Initialize,
    Receive,
}

impl BackendState {
    pub fn name(&self) -> &'static str {
        match self {
            BackendState::Unknown => "UNKNOWN",
            BackendState::Request => "REQUEST",
            BackendState::Response => "RESPONSE",
            BackendState::Success => "SUCCESS",
            BackendState::Fail => "FAIL",
            BackendState::Timeout => "TIMEOUT",
            BackendState::Idle => "IDLE",
            BackendState::Initialize => "INITIALIZE",
            BackendState::Receive => "RECEIVE",
        }
    }
}

pub struct Backend {
    pub state: BackendState,
}

impl Backend {
    pub fn new() -> Self {
        Backend { state: BackendState::Unknown }
    }

    pub fn step<H: Host, E: EapEngine>(
        &mut self,
        flags: &mut Flags,
        timers: &mut Timers,
        config: &Config,
        host: &mut H,
        eap: &mut E,
        counters: &mut Counters,
        key_processor: &mut KeyProcessor,
    ) -> bool {
        // Mirrors the same-state guard in `Pae::step`: `initialize`/
        // `supp_abort` held across an entire step call must not re-enter
        // INITIALIZE forever once it's already there.
        let target = if flags.initialize || flags.supp_abort {
            if self.state == BackendState::Initialize {
                None
            } else {
                Some(BackendState::Initialize)
            }
        } else {
            self.local_transition(flags, timers)
        };

        match target {
            Some(next) => {
                self.enter(next, flags, timers, config, host, eap, counters, key_processor);
                true
            }
            None => false,
        }
    }

    fn local_transition(&self, flags: &Flags, timers: &Timers) -> Option<BackendState> {
        match self.state {
            BackendState::Request => {
                if flags.eap_resp {
                    Some(BackendState::Response)
                } else if flags.eap_no_resp {
                    Some(BackendState::Receive)
                } else {
                    None
                }
            }
            BackendState::Response => Some(BackendState::Receive),
            BackendState::Success | BackendState::Fail | BackendState::Timeout => Some(BackendState::Idle),
            BackendState::Idle => {
                if flags.eap_fail && flags.supp_start {
                    Some(BackendState::Fail)
                } else if flags.eapol_eap && flags.supp_start {
                    Some(BackendState::Request)
                } else if flags.eap_success && flags.supp_start {
                    Some(BackendState::Success)
                } else {
                    None
                }
            }
            BackendState::Initialize => Some(BackendState::Idle),
            BackendState::Receive => {
                if flags.eapol_eap {
                    Some(BackendState::Request)
                } else if flags.eap_fail {
                    Some(BackendState::Fail)
                } else if timers.auth_while == 0 {
                    Some(BackendState::Timeout)
                } else if flags.eap_success {
                    Some(BackendState::Success)
                } else {
                    None
                }
            }
            BackendState::Unknown => Some(BackendState::Initialize),
        }
    }

    fn enter<H: Host, E: EapEngine>(
        &mut self,
        next: BackendState,
        flags: &mut Flags,
        timers: &mut Timers,
        config: &Config,
        host: &mut H,
        eap: &mut E,
        counters: &mut Counters,
        key_processor: &mut KeyProcessor,
    ) {
        debug!("supplicant backend: {} -> {}", self.state.name(), next.name());
        self.state = next;
        flags.changed = true;

        match next {
            BackendState::Request => {
                timers.auth_while = 0;
                flags.eap_req = true;
                if eap.has_response() {
                    flags.eap_resp = true;
                } else {
                    flags.eap_no_resp = true;
                }
            }
            BackendState::Response => {
                if let Some(packet) = eap.take_response() {
                    host.eapol_send(eapol::PacketType::EapPacket, &packet[..]);
                    counters.resp_frames_tx += 1;
                }
                flags.eap_resp = false;
            }
            BackendState::Success => {
                flags.key_run = true;
                flags.supp_success = true;
                if eap.has_new_key() {
                    key_processor.invalidate_replay_counter();
                }
            }
            BackendState::Fail => {
                flags.supp_fail = true;
            }
            BackendState::Timeout => {
                flags.supp_timeout = true;
            }
            BackendState::Idle => {
                flags.supp_start = false;
                flags.initial_req = true;
            }
            BackendState::Initialize => {
                eap.set_request(&[]);
                flags.supp_abort = false;
            }
            BackendState::Receive => {
                timers.auth_while = config.auth_period;
                flags.eapol_eap = false;
                flags.eap_no_resp = false;
                flags.initial_req = false;
            }
            BackendState::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullHost;
    impl Host for NullHost {
        fn eapol_send(&mut self, _packet_type: eapol::PacketType, _payload: &[u8]) {}
        fn set_wep_key(&mut self, _is_unicast: bool, _slot: u8, _key: &[u8]) -> bool {
            true
        }
        fn eapol_done(&mut self) {}
        fn on_result(&mut self, _success: bool) {}
    }

    struct NullEap {
        has_response: bool,
    }
    impl EapEngine for NullEap {
        fn step(&mut self) -> bool {
            false
        }
        fn is_success(&self) -> bool {
            false
        }
        fn is_fail(&self) -> bool {
            false
        }
        fn has_response(&self) -> bool {
            self.has_response
        }
        fn take_response(&mut self) -> Option<Vec<u8>> {
            if self.has_response {
                Some(vec![0xAB])
            } else {
                None
            }
        }
        fn set_request(&mut self, _data: &[u8]) {}
        fn has_new_key(&self) -> bool {
            false
        }
        fn key_material(&mut self) -> Option<crate::host::KeyMaterial> {
            None
        }
        fn set_scard_ctx(&mut self, _ctx: Option<Vec<u8>>) {}
    }

    #[test]
    fn initialize_resets_to_idle() {
        let mut backend = Backend::new();
        let mut flags = Flags::new();
        let mut timers = Timers::new();
        let config = Config::default();
        let mut host = NullHost;
        let mut eap = NullEap { has_response: false };
        let mut counters = Counters::new();
        let mut key_processor = KeyProcessor::new();

        flags.initialize = true;
        backend.step(&mut flags, &mut timers, &config, &mut host, &mut eap, &mut counters, &mut key_processor);
        assert_eq!(backend.state, BackendState::Initialize);

        flags.initialize = false;
        backend.step(&mut flags, &mut timers, &config, &mut host, &mut eap, &mut counters, &mut key_processor);
        assert_eq!(backend.state, BackendState::Idle);
    }

    #[test]
    fn idle_to_request_on_eapol_eap() {
        let mut backend = Backend::new();
        backend.state = BackendState::Idle;
        let mut flags = Flags::new();
        flags.eapol_eap = true;
        flags.supp_start = true;
        let mut timers = Timers::new();
        let config = Config::default();
        let mut host = NullHost;
        let mut eap = NullEap { has_response: true };
        let mut counters = Counters::new();
        let mut key_processor = KeyProcessor::new();

        backend.step(&mut flags, &mut timers, &config, &mut host, &mut eap, &mut counters, &mut key_processor);
        assert_eq!(backend.state, BackendState::Request);
        assert!(flags.eap_resp);
    }

    #[test]
    fn receive_times_out() {
        let mut backend = Backend::new();
        backend.state = BackendState::Receive;
        let mut flags = Flags::new();
        let mut timers = Timers::new();
        timers.auth_while = 0;
        let config = Config::default();
        let mut host = NullHost;
        let mut eap = NullEap { has_response: false };
        let mut counters = Counters::new();
        let mut key_processor = KeyProcessor::new();

        backend.step(&mut flags, &mut timers, &config, &mut host, &mut eap, &mut counters, &mut key_processor);
        assert_eq!(backend.state, BackendState::Timeout);
        assert!(flags.supp_timeout);
    }

    #[test]
    fn success_with_new_key_invalidates_replay_counter() {
        let mut backend = Backend::new();
        backend.state = BackendState::Receive;
        let mut flags = Flags::new();
        flags.eap_success = true;
        let mut timers = Timers::new();
        let config = Config::default();
        let mut host = NullHost;

        struct NewKeyEap;
        impl EapEngine for NewKeyEap {
            fn step(&mut self) -> bool {
                false
            }
            fn is_success(&self) -> bool {
                true
            }
            fn is_fail(&self) -> bool {
                false
            }
            fn has_response(&self) -> bool {
                false
            }
            fn take_response(&mut self) -> Option<Vec<u8>> {
                None
            }
            fn set_request(&mut self, _data: &[u8]) {}
            fn has_new_key(&self) -> bool {
                true
            }
            fn key_material(&mut self) -> Option<crate::host::KeyMaterial> {
                None
            }
            fn set_scard_ctx(&mut self, _ctx: Option<Vec<u8>>) {}
        }
        let mut eap = NewKeyEap;
        let mut counters = Counters::new();
        let mut key_processor = KeyProcessor::new();
        key_processor.last_replay_counter = Some([1; 8]);

        backend.step(&mut flags, &mut timers, &config, &mut host, &mut eap, &mut counters, &mut key_processor);
        assert_eq!(backend.state, BackendState::Success);
        assert_eq!(key_processor.last_replay_counter(), None);
    }
}
