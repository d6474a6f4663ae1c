// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortStatus {
    Authorized,
    Unauthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortControl {
    Auto,
    ForceAuthorized,
    ForceUnauthorized,
}

/// Transient signal the step orchestrator collapses into a single external
/// completion callback per PAE transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbStatus {
    InProgress,
    Success,
    Failure,
}
