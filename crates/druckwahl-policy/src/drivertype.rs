// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driver-type classification rules.
//
// A driver type is a named predicate over (driver id, attribute record,
// fit level).  The type list is ordered and classification is first match
// wins, so narrower types must be declared before broader ones.

use std::collections::BTreeSet;

use regex::Regex;

use druckwahl_core::{DeviceId, DriverRecord, DruckwahlError, FitLevel, Result};

/// Compile a policy pattern: anchored at the start, case-insensitive.
pub(crate) fn compile_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i)^(?:{pattern})")).map_err(|e| DruckwahlError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Compile a driver-type-name glob (`*`, `?`) to an anchored regex.
pub(crate) fn compile_glob(pattern: &str) -> Result<Regex> {
    let mut translated = String::with_capacity(pattern.len() + 8);
    translated.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => translated.push_str(".*"),
            '?' => translated.push('.'),
            other => translated.push_str(&regex::escape(&other.to_string())),
        }
    }
    translated.push('$');
    Regex::new(&translated).map_err(|e| DruckwahlError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// One conjunctive Device-ID match rule: every listed field must be
/// present and match.  The multi-valued CMD field matches if any of its
/// tokens does.
#[derive(Debug, Clone)]
pub struct DeviceIdRule {
    fields: Vec<(String, Regex)>,
}

impl DeviceIdRule {
    pub fn new() -> Self {
        DeviceIdRule { fields: Vec::new() }
    }

    pub fn add_field(&mut self, field: &str, pattern: &str) -> Result<()> {
        self.fields
            .push((field.trim().to_uppercase(), compile_match(pattern)?));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn matches(&self, id: &DeviceId) -> bool {
        self.fields.iter().all(|(field, regex)| {
            if field == "CMD" {
                id.cmd.iter().any(|cmd| regex.is_match(cmd))
            } else {
                id.field(field).is_some_and(|value| regex.is_match(value))
            }
        })
    }
}

impl Default for DeviceIdRule {
    fn default() -> Self {
        Self::new()
    }
}

/// A named driver-type classification rule.
#[derive(Debug, Clone)]
pub struct DriverType {
    name: String,
    ppd_name: Option<Regex>,
    attributes: Vec<(String, Regex)>,
    device_id_rules: Vec<DeviceIdRule>,
    /// Accepted fit levels; `None` accepts every level.
    fit: Option<BTreeSet<FitLevel>>,
}

impl DriverType {
    pub fn new(name: impl Into<String>) -> Self {
        DriverType {
            name: name.into(),
            ppd_name: None,
            attributes: Vec::new(),
            device_id_rules: Vec::new(),
            fit: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_ppd_name(&mut self, pattern: &str) -> Result<()> {
        self.ppd_name = Some(compile_match(pattern)?);
        Ok(())
    }

    pub fn add_attribute(&mut self, name: &str, pattern: &str) -> Result<()> {
        self.attributes
            .push((name.to_string(), compile_match(pattern)?));
        Ok(())
    }

    pub fn add_device_id_rule(&mut self, rule: DeviceIdRule) {
        if !rule.is_empty() {
            self.device_id_rules.push(rule);
        }
    }

    /// Restrict the type to a space-separated list of fit level names.
    /// Accepting `exact` implicitly accepts `exact-cmd` as well.
    pub fn set_fit(&mut self, levels: &str) -> Result<()> {
        let mut accepted = BTreeSet::new();
        for word in levels.split_whitespace() {
            let level: FitLevel = word.parse()?;
            accepted.insert(level);
            if level == FitLevel::Exact {
                accepted.insert(FitLevel::ExactCmd);
            }
        }
        self.fit = Some(accepted);
        Ok(())
    }

    /// Whether this type matches a candidate driver at the given fit.
    pub fn matches(&self, driver_id: &str, record: &DriverRecord, fit: FitLevel) -> bool {
        if let Some(accepted) = &self.fit {
            if !accepted.contains(&fit) {
                return false;
            }
        }

        if let Some(regex) = &self.ppd_name {
            if !regex.is_match(driver_id) {
                return false;
            }
        }

        for (name, regex) in &self.attributes {
            let Some(value) = record.get(name) else {
                return false;
            };
            if !value.values().iter().any(|v| regex.is_match(v)) {
                return false;
            }
        }

        if !self.device_id_rules.is_empty() {
            let Some(raw) = record.device_id() else {
                return false;
            };
            let parsed = DeviceId::parse(raw);
            if !self.device_id_rules.iter().any(|rule| rule.matches(&parsed)) {
                return false;
            }
        }

        true
    }
}

/// The ordered driver-type list.
#[derive(Debug, Clone, Default)]
pub struct DriverTypes {
    types: Vec<DriverType>,
}

impl DriverTypes {
    pub fn new(types: Vec<DriverType>) -> Self {
        DriverTypes { types }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// First matching type name for a candidate, in declaration order.
    pub fn classify(&self, driver_id: &str, record: &DriverRecord, fit: FitLevel) -> Option<&str> {
        self.types
            .iter()
            .find(|t| t.matches(driver_id, record, fit))
            .map(DriverType::name)
    }

    /// Type names matching a glob pattern, in declaration order.
    pub fn filter_names(&self, glob: &Regex) -> Vec<&str> {
        self.types
            .iter()
            .map(DriverType::name)
            .filter(|name| glob.is_match(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(make_and_model: &str) -> DriverRecord {
        let mut rec = DriverRecord::new();
        rec.set("ppd-make-and-model", make_and_model);
        rec
    }

    #[test]
    fn ppd_name_pattern_is_anchored_and_case_insensitive() {
        let mut t = DriverType::new("hp-drv");
        t.set_ppd_name("drv:///hp/").unwrap();
        assert!(t.matches("DRV:///HP/hp3390.ppd", &record("HP LaserJet 3390"), FitLevel::Close));
        assert!(!t.matches("lsb/usr/drv:///hp/x.ppd", &record("x"), FitLevel::Close));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let mut t = DriverType::new("broken");
        assert!(t.set_ppd_name("(unclosed").is_err());
    }

    #[test]
    fn attribute_rule_requires_the_attribute() {
        let mut t = DriverType::new("gutenprint");
        t.add_attribute("ppd-make-and-model", r".*\bgutenprint\b").unwrap();
        assert!(t.matches(
            "gp.ppd",
            &record("Epson Stylus Photo R300 - Gutenprint v5.2"),
            FitLevel::Close
        ));
        assert!(!t.matches("gp.ppd", &DriverRecord::new(), FitLevel::Close));
    }

    #[test]
    fn attribute_rule_matches_any_value_of_a_list() {
        let mut t = DriverType::new("multi");
        t.add_attribute("ppd-product", "iP3000").unwrap();
        let mut rec = record("Canon PIXMA iP3000");
        rec.set(
            "ppd-product",
            vec!["(PIXMA iP4000)".to_string(), "iP3000".to_string()],
        );
        assert!(t.matches("c.ppd", &rec, FitLevel::Close));
    }

    #[test]
    fn fit_exact_implies_exact_cmd() {
        let mut t = DriverType::new("exact-only");
        t.set_fit("exact").unwrap();
        assert!(t.matches("x.ppd", &record("x"), FitLevel::Exact));
        assert!(t.matches("x.ppd", &record("x"), FitLevel::ExactCmd));
        assert!(!t.matches("x.ppd", &record("x"), FitLevel::Close));
    }

    #[test]
    fn unknown_fit_name_is_an_error() {
        let mut t = DriverType::new("bad");
        assert!(t.set_fit("exactish").is_err());
    }

    #[test]
    fn device_id_rule_is_conjunctive_with_any_cmd_token() {
        let mut rule = DeviceIdRule::new();
        rule.add_field("mfg", "Hewlett-Packard$").unwrap();
        rule.add_field("cmd", "POSTSCRIPT$").unwrap();
        let id = DeviceId::parse("MFG:Hewlett-Packard;MDL:LaserJet;CMD:PCL,POSTSCRIPT;");
        assert!(rule.matches(&id));
        let pcl_only = DeviceId::parse("MFG:Hewlett-Packard;MDL:LaserJet;CMD:PCL;");
        assert!(!rule.matches(&pcl_only));
    }

    #[test]
    fn any_of_several_device_id_rules_suffices() {
        let mut t = DriverType::new("ps-capable");
        let mut ps = DeviceIdRule::new();
        ps.add_field("CMD", "POSTSCRIPT$").unwrap();
        let mut pdf = DeviceIdRule::new();
        pdf.add_field("CMD", "PDF$").unwrap();
        t.add_device_id_rule(ps);
        t.add_device_id_rule(pdf);

        let mut rec = record("Foo");
        rec.set("ppd-device-id", "MFG:Foo;MDL:Bar;CMD:PDF;");
        assert!(t.matches("f.ppd", &rec, FitLevel::Close));

        // No Device ID at all cannot satisfy a deviceid constraint.
        assert!(!t.matches("f.ppd", &record("Foo"), FitLevel::Close));
    }

    #[test]
    fn classification_is_first_match_wins() {
        let mut narrow = DriverType::new("hp-drv");
        narrow.set_ppd_name("drv:///hp/").unwrap();
        let broad = DriverType::new("anything");
        let types = DriverTypes::new(vec![narrow, broad]);
        assert_eq!(
            types.classify("drv:///hp/x.ppd", &record("x"), FitLevel::Close),
            Some("hp-drv")
        );
        assert_eq!(
            types.classify("other.ppd", &record("x"), FitLevel::Close),
            Some("anything")
        );
    }

    #[test]
    fn glob_filter_preserves_declaration_order() {
        let types = DriverTypes::new(vec![
            DriverType::new("generic-postscript"),
            DriverType::new("generic-pcl"),
            DriverType::new("manufacturer-ppd"),
        ]);
        let glob = compile_glob("generic-*").unwrap();
        assert_eq!(
            types.filter_names(&glob),
            vec!["generic-postscript", "generic-pcl"]
        );
        let exact = compile_glob("manufacturer-ppd").unwrap();
        assert_eq!(types.filter_names(&exact), vec!["manufacturer-ppd"]);
    }
}
