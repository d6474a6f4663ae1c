// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Supplicant PAE state machine. Grounded on the `SUPP_PAE_*` `SM_STATE`
//! blocks in the reference supplicant's `eapol_sm.c`.

use crate::config::Config;
use crate::counters::Counters;
use crate::flags::Flags;
use crate::host::Host;
use crate::port::{CbStatus, PortControl, PortStatus};
use crate::timers::Timers;
use eapol::PacketType;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaeState {
    Unknown,
    Logoff,
    Disconnected,
    Connecting,
    Authenticating,
    Held,
    Authenticated,
    Restart,
    ForceAuth,
    ForceUnauth,
}

impl PaeState {
    pub fn name(&self) -> &'static str {
        match self {
            PaeState::Unknown => "UNKNOWN",
            PaeState::Logoff => "LOGOFF",
            PaeState::Disconnected => "DISCONNECTED",
            PaeState::Connecting => "CONNECTING",
            PaeState::Authenticating => "AUTHENTICATING",
            PaeState::Held => "HELD",
            PaeState::Authenticated => "AUTHENTICATED",
            PaeState::Restart => "RESTART",
            PaeState::ForceAuth => "S_FORCE_AUTH",
            PaeState::ForceUnauth => "S_FORCE_UNAUTH",
        }
    }
}

/// PAE-local bookkeeping that doesn't belong in the shared `Flags` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaeContext {
    pub start_count: u32,
    pub port_mode: Option<PortControl>,
}

pub struct Pae {
    pub state: PaeState,
    pub port_status: PortStatus,
    pub ctx: PaeContext,
}

impl Pae {
    pub fn new() -> Self {
        Pae { state: PaeState::Unknown, port_status: PortStatus::Unauthorized, ctx: PaeContext::default() }
    }

    /// Runs one step: global override first, then (if no override fired)
    /// the state-local transition table. A local transition always runs
    /// the target state's entry side effects, even when it re-enters the
    /// current state (e.g. CONNECTING's self-loop resending EAPOL-Start) —
    /// that re-entry is itself the observable transition. A global override
    /// only enters once: holding `initialize` (etc.) across an entire step
    /// call must settle at its target rather than re-enter it forever.
    /// Returns true if entry ran at all.
    pub fn step<H: Host>(
        &mut self,
        flags: &mut Flags,
        timers: &mut Timers,
        config: &Config,
        port_control: PortControl,
        host: &mut H,
        cb_status: &mut CbStatus,
        counters: &mut Counters,
    ) -> bool {
        // AUTHENTICATING's plaintext-acceptance special rule is a standing
        // check consulted every time this state's transition table runs,
        // not just on entry: eapSuccess can arrive via a notifier call while
        // the PAE is already sitting in AUTHENTICATING.
        let global = self.global_override(flags, port_control);

        let mut ran = false;
        if global.is_none()
            && self.state == PaeState::Authenticating
            && flags.eap_success
            && !flags.port_valid
            && config.accept_802_1x_keys
            && config.required_keys.is_none()
        {
            flags.port_valid = true;
            flags.changed = true;
            host.eapol_done();
            ran = true;
        }

        // A global override that already holds (e.g. `initialize` staying
        // true across an entire step call) must not re-run entry forever:
        // only local transitions — specifically CONNECTING's deliberate
        // resend-on-timeout self-loop — re-enter their own current state.
        let target = match global {
            Some(next) if next == self.state => None,
            Some(next) => Some(next),
            None => self.local_transition(flags, timers, config),
        };

        match target {
            Some(next) => {
                self.enter(next, flags, timers, config, host, cb_status, counters);
                true
            }
            None => ran,
        }
    }

    fn global_override(&self, flags: &Flags, port_control: PortControl) -> Option<PaeState> {
        let not_active = flags.initialize || !flags.port_enabled;
        if flags.user_logoff && !flags.logoff_sent && !not_active {
            return Some(PaeState::Logoff);
        }
        if (port_control == PortControl::Auto && self.ctx.port_mode != Some(PortControl::Auto)) || not_active {
            return Some(PaeState::Disconnected);
        }
        if port_control == PortControl::ForceAuthorized && self.ctx.port_mode != Some(PortControl::ForceAuthorized) && !not_active {
            return Some(PaeState::ForceAuth);
        }
        if port_control == PortControl::ForceUnauthorized && self.ctx.port_mode != Some(PortControl::ForceUnauthorized) && !not_active {
            return Some(PaeState::ForceUnauth);
        }
        None
    }

    fn local_transition(&self, flags: &Flags, timers: &Timers, config: &Config) -> Option<PaeState> {
        match self.state {
            PaeState::Logoff => {
                if !flags.user_logoff {
                    Some(PaeState::Disconnected)
                } else {
                    None
                }
            }
            PaeState::Disconnected => Some(PaeState::Connecting),
            PaeState::Connecting => {
                if timers.start_when == 0 && self.ctx.start_count < config.max_start {
                    Some(PaeState::Connecting)
                } else if timers.start_when == 0 && self.ctx.start_count >= config.max_start && flags.port_valid {
                    Some(PaeState::Authenticated)
                } else if flags.eap_success || flags.eap_fail {
                    Some(PaeState::Authenticating)
                } else if flags.eapol_eap {
                    Some(PaeState::Restart)
                } else if timers.start_when == 0 && self.ctx.start_count >= config.max_start && !flags.port_valid {
                    Some(PaeState::Held)
                } else {
                    None
                }
            }
            PaeState::Authenticating => {
                if flags.eap_success && flags.port_valid {
                    Some(PaeState::Authenticated)
                } else if flags.eap_fail || (flags.key_done && !flags.port_valid) {
                    Some(PaeState::Held)
                } else if flags.supp_timeout {
                    Some(PaeState::Connecting)
                } else {
                    None
                }
            }
            PaeState::Held => {
                if timers.held_while == 0 {
                    Some(PaeState::Connecting)
                } else if flags.eapol_eap {
                    Some(PaeState::Restart)
                } else {
                    None
                }
            }
            PaeState::Authenticated => {
                if flags.eapol_eap && flags.port_valid {
                    Some(PaeState::Restart)
                } else if !flags.port_valid {
                    Some(PaeState::Disconnected)
                } else {
                    None
                }
            }
            PaeState::Restart => {
                if !flags.eap_restart {
                    Some(PaeState::Authenticating)
                } else {
                    None
                }
            }
            PaeState::ForceAuth | PaeState::ForceUnauth => None,
            PaeState::Unknown => Some(PaeState::Disconnected),
        }
    }

    fn enter<H: Host>(
        &mut self,
        next: PaeState,
        flags: &mut Flags,
        timers: &mut Timers,
        config: &Config,
        host: &mut H,
        cb_status: &mut CbStatus,
        counters: &mut Counters,
    ) {
        debug!("supplicant PAE: {} -> {}", self.state.name(), next.name());
        self.state = next;
        flags.changed = true;

        match next {
            PaeState::Logoff => {
                host.eapol_send(PacketType::Logoff, &[]);
                counters.logoff_frames_tx += 1;
                flags.logoff_sent = true;
                self.port_status = PortStatus::Unauthorized;
            }
            PaeState::Disconnected => {
                self.ctx.port_mode = Some(PortControl::Auto);
                self.ctx.start_count = 0;
                flags.logoff_sent = false;
                self.port_status = PortStatus::Unauthorized;
                flags.supp_abort = true;
                flags.unicast_key_received = false;
                flags.broadcast_key_received = false;
            }
            PaeState::Connecting => {
                timers.start_when = config.start_period;
                self.ctx.start_count += 1;
                flags.eapol_eap = false;
                host.eapol_send(PacketType::Start, &[]);
                counters.start_frames_tx += 1;
            }
            PaeState::Authenticating => {
                self.ctx.start_count = 0;
                flags.supp_success = false;
                flags.supp_fail = false;
                flags.supp_timeout = false;
                flags.key_run = false;
                flags.key_done = false;
                flags.supp_start = true;
            }
            PaeState::Held => {
                timers.held_while = config.held_period;
                self.port_status = PortStatus::Unauthorized;
                *cb_status = CbStatus::Failure;
            }
            PaeState::Authenticated => {
                self.port_status = PortStatus::Authorized;
                *cb_status = CbStatus::Success;
            }
            PaeState::Restart => {
                flags.eap_restart = true;
            }
            PaeState::ForceAuth => {
                self.port_status = PortStatus::Authorized;
                self.ctx.port_mode = Some(PortControl::ForceAuthorized);
            }
            PaeState::ForceUnauth => {
                self.port_status = PortStatus::Unauthorized;
                self.ctx.port_mode = Some(PortControl::ForceUnauthorized);
                host.eapol_send(PacketType::Logoff, &[]);
                counters.logoff_frames_tx += 1;
            }
            PaeState::Unknown => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullHost;
    impl Host for NullHost {
        fn eapol_send(&mut self, _packet_type: PacketType, _payload: &[u8]) {}
        fn set_wep_key(&mut self, _is_unicast: bool, _slot: u8, _key: &[u8]) -> bool {
            true
        }
        fn eapol_done(&mut self) {}
        fn on_result(&mut self, _success: bool) {}
    }

    fn step_once(pae: &mut Pae, flags: &mut Flags, timers: &mut Timers, config: &Config, pc: PortControl) -> bool {
        let mut host = NullHost;
        let mut cb = CbStatus::InProgress;
        let mut counters = Counters::new();
        pae.step(flags, timers, config, pc, &mut host, &mut cb, &mut counters)
    }

    #[test]
    fn initialize_drives_to_disconnected_then_connecting() {
        let mut pae = Pae::new();
        let mut flags = Flags::new();
        let mut timers = Timers::new();
        let config = Config::default();

        flags.initialize = true;
        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::Auto);
        assert_eq!(pae.state, PaeState::Disconnected);

        flags.initialize = false;
        flags.port_enabled = true;
        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::Auto);
        assert_eq!(pae.state, PaeState::Connecting);
        assert_eq!(pae.ctx.start_count, 1);
    }

    #[test]
    fn force_authorized_override_wins() {
        let mut pae = Pae::new();
        let mut flags = Flags::new();
        flags.port_enabled = true;
        let mut timers = Timers::new();
        let config = Config::default();

        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::ForceAuthorized);
        assert_eq!(pae.state, PaeState::ForceAuth);
        assert_eq!(pae.port_status, PortStatus::Authorized);
    }

    #[test]
    fn held_returns_to_connecting_on_timeout() {
        let mut pae = Pae::new();
        pae.state = PaeState::Held;
        let mut flags = Flags::new();
        flags.port_enabled = true;
        let mut timers = Timers::new();
        timers.held_while = 0;
        let config = Config::default();

        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::Auto);
        assert_eq!(pae.state, PaeState::Connecting);
    }

    #[test]
    fn logoff_then_unlogoff_reconnects() {
        let mut pae = Pae::new();
        pae.state = PaeState::Authenticated;
        pae.ctx.port_mode = Some(PortControl::Auto);
        let mut flags = Flags::new();
        flags.port_enabled = true;
        flags.port_valid = true;
        let mut timers = Timers::new();
        let config = Config::default();

        flags.user_logoff = true;
        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::Auto);
        assert_eq!(pae.state, PaeState::Logoff);
        assert!(flags.logoff_sent);

        flags.user_logoff = false;
        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::Auto);
        assert_eq!(pae.state, PaeState::Disconnected);
    }

    /// eapSuccess arriving in a later step, after the PAE already sat down
    /// in AUTHENTICATING, must still trigger plaintext acceptance.
    #[test]
    fn plaintext_acceptance_fires_while_already_authenticating() {
        let mut pae = Pae::new();
        pae.state = PaeState::Authenticating;
        pae.ctx.port_mode = Some(PortControl::Auto);
        let mut flags = Flags::new();
        flags.port_enabled = true;
        let mut timers = Timers::new();
        let config = Config { accept_802_1x_keys: true, required_keys: crate::config::RequiredKeys::none(), ..Config::default() };

        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::Auto);
        assert_eq!(pae.state, PaeState::Authenticating, "no eapSuccess yet, no transition");

        flags.eap_success = true;
        step_once(&mut pae, &mut flags, &mut timers, &config, PortControl::Auto);
        assert_eq!(pae.state, PaeState::Authenticated);
        assert!(flags.port_valid);
    }
}
