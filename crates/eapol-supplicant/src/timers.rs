// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

/// The four countdown timers, decremented once per second by the host's
/// 1-Hz tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub auth_while: u32,
    pub held_while: u32,
    pub start_when: u32,
    pub idle_while: u32,
}

impl Timers {
    pub fn new() -> Self {
        Timers::default()
    }

    /// Decrements all four timers by one second, floored at zero.
    pub fn tick(&mut self) {
        self.auth_while = self.auth_while.saturating_sub(1);
        self.held_while = self.held_while.saturating_sub(1);
        self.start_when = self.start_when.saturating_sub(1);
        self.idle_while = self.idle_while.saturating_sub(1);
    }
}
