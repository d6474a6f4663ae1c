// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Supplicant-side port access entity for IEEE 802.1X EAPOL authentication.
//!
//! Three cooperating state machines — Supplicant PAE, Supplicant Backend,
//! and Key Receive — decide when the controlled port transitions between
//! Unauthorized and Authorized, driving an externally supplied EAP engine
//! and, for the legacy dynamic-WEP keying path, unwrapping and installing
//! keys carried in EAPOL-Key frames.
//!
//! The WPA/RSN 4-way handshake is out of scope: EAPOL-Key frames of that
//! descriptor type are recognized only well enough to be ignored here.

mod backend;
mod config;
mod counters;
mod error;
mod flags;
mod host;
mod key_processor;
mod keyrx;
mod pae;
mod port;
mod supplicant;
mod timers;

pub use crate::config::{Config, RequiredKeys};
pub use crate::counters::{Counters, Mib, Status};
pub use crate::error::Error;
pub use crate::host::{EapEngine, Host, KeyMaterial};
pub use crate::port::{CbStatus, PortControl, PortStatus};
pub use crate::supplicant::Supplicant;
