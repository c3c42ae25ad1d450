// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Policy document loading.
//
// The on-disk format is TOML: an ordered `[[drivertype]]` array and an
// ordered `[[printer]]` array.  Deserialization is a plain serde pass
// into document structs; pattern compilation happens in a second step so
// that a bad regex is reported with its offending pattern.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use druckwahl_core::{DruckwahlError, Result};

use crate::drivertype::{DeviceIdRule, DriverType, DriverTypes};
use crate::preference::Policy;
use crate::printertype::PrinterTypeRule;

const BUILTIN_POLICY: &str = include_str!("data/preferred-drivers.toml");

#[derive(Debug, Deserialize)]
struct PolicyDoc {
    #[serde(default, rename = "drivertype")]
    drivertypes: Vec<DriverTypeDoc>,
    #[serde(default, rename = "printer")]
    printers: Vec<PrinterDoc>,
}

#[derive(Debug, Deserialize)]
struct DriverTypeDoc {
    name: String,
    #[serde(default)]
    ppd_name: Option<String>,
    #[serde(default, rename = "attribute")]
    attributes: Vec<AttributeDoc>,
    #[serde(default, rename = "deviceid")]
    deviceid: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    fit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttributeDoc {
    name: String,
    #[serde(rename = "match")]
    pattern: String,
}

#[derive(Debug, Deserialize)]
struct PrinterDoc {
    #[serde(default, rename = "make-and-model")]
    make_and_model: Option<String>,
    #[serde(default, rename = "deviceid")]
    deviceid: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    drivers: Vec<String>,
    #[serde(default)]
    avoid: Vec<String>,
    #[serde(default)]
    blacklist: Vec<String>,
}

fn device_id_rule(fields: &BTreeMap<String, String>) -> Result<DeviceIdRule> {
    let mut rule = DeviceIdRule::new();
    for (field, pattern) in fields {
        rule.add_field(field, pattern)?;
    }
    Ok(rule)
}

impl Policy {
    /// Parse a policy from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let doc: PolicyDoc =
            toml::from_str(text).map_err(|e| DruckwahlError::PolicyParse(e.to_string()))?;

        let mut types = Vec::with_capacity(doc.drivertypes.len());
        for dt in doc.drivertypes {
            let mut t = DriverType::new(dt.name);
            if let Some(pattern) = &dt.ppd_name {
                t.set_ppd_name(pattern)?;
            }
            for attr in &dt.attributes {
                t.add_attribute(&attr.name, &attr.pattern)?;
            }
            for fields in &dt.deviceid {
                t.add_device_id_rule(device_id_rule(fields)?);
            }
            if let Some(fit) = &dt.fit {
                t.set_fit(fit)?;
            }
            types.push(t);
        }

        let mut printers = Vec::with_capacity(doc.printers.len());
        for p in doc.printers {
            let mut rule = PrinterTypeRule::new();
            if let Some(pattern) = &p.make_and_model {
                rule.set_make_and_model(pattern)?;
            }
            for fields in &p.deviceid {
                rule.add_device_id_rule(device_id_rule(fields)?);
            }
            for glob in &p.drivers {
                rule.add_prefer(glob)?;
            }
            for glob in &p.avoid {
                rule.add_avoid(glob)?;
            }
            for glob in &p.blacklist {
                rule.add_blacklist(glob)?;
            }
            printers.push(rule);
        }

        info!(
            drivertypes = types.len(),
            printers = printers.len(),
            "loaded preference policy"
        );
        Ok(Policy::new(DriverTypes::new(types), printers))
    }

    /// Load a policy document from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The embedded default policy.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_POLICY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use druckwahl_core::{DriverRecord, FitLevel};

    const SAMPLE: &str = r#"
[[drivertype]]
name = "hp-drv"
ppd_name = 'drv:///hp/'
fit = "exact"

[[drivertype]]
name = "ps-capable"

[[drivertype.deviceid]]
CMD = 'postscript'

[[drivertype]]
name = "everything"

[[printer]]
make-and-model = 'HP\b'
drivers = ["hp-drv", "everything"]

[[printer]]
drivers = ["*"]
avoid = ["everything"]
"#;

    #[test]
    fn sample_policy_classifies_and_orders() {
        let policy = Policy::from_toml_str(SAMPLE).unwrap();
        let rec = DriverRecord::new();
        assert_eq!(
            policy.types().classify("drv:///hp/x.ppd", &rec, FitLevel::Exact),
            Some("hp-drv")
        );
        // Fit gate: the same driver at Close skips to the catch-all type.
        assert_eq!(
            policy.types().classify("drv:///hp/x.ppd", &rec, FitLevel::Close),
            Some("everything")
        );

        let ordered = policy.ordered_types("HP LaserJet 4", None);
        assert_eq!(ordered, vec!["hp-drv", "ps-capable", "everything"]);
        // Non-HP printers only match the catch-all rule, which avoids
        // "everything" (moving it last is a no-op here).
        let ordered = policy.ordered_types("Canon iP3000", None);
        assert_eq!(ordered, vec!["hp-drv", "ps-capable", "everything"]);
    }

    #[test]
    fn deviceid_rules_round_trip_through_toml() {
        let policy = Policy::from_toml_str(SAMPLE).unwrap();
        let mut rec = DriverRecord::new();
        rec.set("ppd-device-id", "MFG:Foo;MDL:Bar;CMD:PCL,POSTSCRIPT;");
        assert_eq!(
            policy.types().classify("foo.ppd", &rec, FitLevel::Close),
            Some("ps-capable")
        );
        rec.set("ppd-device-id", "MFG:Foo;MDL:Bar;CMD:PCL;");
        assert_eq!(
            policy.types().classify("foo.ppd", &rec, FitLevel::Close),
            Some("everything")
        );
    }

    #[test]
    fn malformed_toml_is_a_policy_parse_error() {
        let err = Policy::from_toml_str("[[drivertype]\nname = ").unwrap_err();
        assert!(matches!(err, DruckwahlError::PolicyParse(_)));
    }

    #[test]
    fn bad_pattern_reports_the_pattern() {
        let doc = "[[drivertype]]\nname = \"x\"\nppd_name = '(oops'\n";
        let err = Policy::from_toml_str(doc).unwrap_err();
        match err {
            DruckwahlError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(oops"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn loads_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let policy = Policy::load(file.path()).unwrap();
        assert!(!policy.is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Policy::load(Path::new("/nonexistent/policy.toml")).unwrap_err();
        assert!(matches!(err, DruckwahlError::Io(_)));
    }

    #[test]
    fn builtin_policy_parses() {
        let policy = Policy::builtin().unwrap();
        assert!(!policy.is_empty());
        // The catch-all printer rule must order at least the fallback type
        // for a printer nothing else matches.
        let ordered = policy.ordered_types("Obscure Imagewriter", None);
        assert!(ordered.iter().any(|t| t == "fallback"));
    }
}
