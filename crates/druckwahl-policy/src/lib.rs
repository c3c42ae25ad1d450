// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwahl Policy — driver-type classification and preference ordering.
//
// A policy is an ordered list of driver-type definitions plus an ordered
// list of printer rules, loaded once from a TOML document (or the embedded
// default) and immutable thereafter.  Classification buckets candidate
// drivers into named types; the preference order decides which buckets a
// given printer should see first, which to push to the back, and which to
// suppress entirely.

pub mod drivertype;
pub mod engine;
pub mod load;
pub mod preference;
pub mod printertype;

pub use drivertype::{DeviceIdRule, DriverType, DriverTypes};
pub use engine::DriverSelector;
pub use preference::{Policy, UNCLASSIFIED};
pub use printertype::PrinterTypeRule;
