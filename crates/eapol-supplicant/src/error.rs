// Copyright 2018 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use failure::Fail;

/// Errors surfaced from the public construction/configuration surface.
/// Protocol-expected conditions (malformed frames, rejected keys) are not
/// represented here; they are counted and logged, never returned, matching
/// this crate's "step is infallible" contract.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "required_keys requests a key but accept_802_1x_keys is disabled")]
    RequiredKeysWithoutAcceptance,
}
