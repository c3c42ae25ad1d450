// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer rules: which driver types a given printer should prefer, avoid
// or never see.

use regex::Regex;

use druckwahl_core::{DeviceId, Result};

use crate::drivertype::{DeviceIdRule, compile_glob, compile_match};

/// One printer rule: identity constraints plus driver-type glob lists.
///
/// A rule with no constraints matches every printer, which is how the
/// policy expresses its catch-all defaults (declared last).
#[derive(Debug, Clone, Default)]
pub struct PrinterTypeRule {
    make_and_model: Option<Regex>,
    device_id_rules: Vec<DeviceIdRule>,
    prefer: Vec<Regex>,
    avoid: Vec<Regex>,
    blacklist: Vec<Regex>,
}

impl PrinterTypeRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the make-and-model pattern.  Only one is permitted.
    pub fn set_make_and_model(&mut self, pattern: &str) -> Result<()> {
        self.make_and_model = Some(compile_match(pattern)?);
        Ok(())
    }

    pub fn add_device_id_rule(&mut self, rule: DeviceIdRule) {
        if !rule.is_empty() {
            self.device_id_rules.push(rule);
        }
    }

    pub fn add_prefer(&mut self, glob: &str) -> Result<()> {
        self.prefer.push(compile_glob(glob.trim())?);
        Ok(())
    }

    pub fn add_avoid(&mut self, glob: &str) -> Result<()> {
        self.avoid.push(compile_glob(glob.trim())?);
        Ok(())
    }

    pub fn add_blacklist(&mut self, glob: &str) -> Result<()> {
        self.blacklist.push(compile_glob(glob.trim())?);
        Ok(())
    }

    pub fn prefer_globs(&self) -> &[Regex] {
        &self.prefer
    }

    pub fn avoid_globs(&self) -> &[Regex] {
        &self.avoid
    }

    pub fn blacklist_globs(&self) -> &[Regex] {
        &self.blacklist
    }

    /// Whether this rule applies to the given printer: trivially if it
    /// declares no constraints, otherwise if the make-and-model pattern
    /// matches, or any of its Device-ID rules does.
    pub fn matches(&self, make_and_model: &str, device_id: Option<&DeviceId>) -> bool {
        if self.make_and_model.is_none() && self.device_id_rules.is_empty() {
            return true;
        }
        if let Some(regex) = &self.make_and_model {
            if regex.is_match(make_and_model) {
                return true;
            }
        }
        if let Some(id) = device_id {
            if self.device_id_rules.iter().any(|rule| rule.matches(id)) {
                return true;
            }
        }
        false
    }
}
