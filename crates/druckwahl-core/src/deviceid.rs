// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// IEEE 1284 Device ID parsing and serialization.
//
// A Device ID is a semicolon-separated list of `KEY:VALUE` pairs reported
// by the printer itself, e.g.
// `MFG:Hewlett-Packard;MDL:LaserJet 3390;CMD:PJL,PCL,POSTSCRIPT;`.
// Parsing fails open: segments without a colon are skipped, missing fields
// default to empty, and a garbage input yields an empty (but valid) id.

use std::collections::BTreeMap;
use std::fmt;

/// A parsed IEEE 1284 Device ID.
///
/// The mandatory derived fields are always present: `mfg`, `mdl` and `des`
/// default to the empty string, `cmd` to an empty list.  All fields,
/// including unknown ones, are preserved verbatim in the field map and can
/// be read back with [`DeviceId::field`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceId {
    /// Manufacturer (`MFG`, aliased from `MANUFACTURER`).
    pub mfg: String,
    /// Model (`MDL`, aliased from `MODEL`).
    pub mdl: String,
    /// Description (`DES`).
    pub des: String,
    /// Supported command sets (`CMD`, aliased from `COMMAND SET`),
    /// comma-separated on the wire. Always a list after parsing.
    pub cmd: Vec<String>,
    fields: BTreeMap<String, String>,
}

/// Long-form field names some legacy printers report, and the short forms
/// they alias to.  The alias only applies when the short form is absent.
const FIELD_ALIASES: [(&str, &str); 3] = [
    ("MANUFACTURER", "MFG"),
    ("MODEL", "MDL"),
    ("COMMAND SET", "CMD"),
];

impl DeviceId {
    /// Parse a raw Device ID string.  Never fails.
    pub fn parse(raw: &str) -> Self {
        let mut fields = BTreeMap::new();
        for piece in raw.split(';') {
            let Some((name, value)) = piece.split_once(':') else {
                continue;
            };
            // Field names are case-insensitive on input.
            fields.insert(name.trim().to_uppercase(), value.trim().to_string());
        }

        for (long, short) in FIELD_ALIASES {
            if let Some(value) = fields.get(long).cloned() {
                fields.entry(short.to_string()).or_insert(value);
            }
        }

        let get = |name: &str| fields.get(name).cloned().unwrap_or_default();
        let cmd = fields
            .get("CMD")
            .map(|v| {
                v.split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        DeviceId {
            mfg: get("MFG"),
            mdl: get("MDL"),
            des: get("DES"),
            cmd,
            fields,
        }
    }

    /// Build a Device ID from already-separated identification data.
    pub fn from_parts(mfg: &str, mdl: &str, des: &str, cmd: &[String]) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("MFG".to_string(), mfg.to_string());
        fields.insert("MDL".to_string(), mdl.to_string());
        fields.insert("DES".to_string(), des.to_string());
        if !cmd.is_empty() {
            fields.insert("CMD".to_string(), cmd.join(","));
        }
        DeviceId {
            mfg: mfg.to_string(),
            mdl: mdl.to_string(),
            des: des.to_string(),
            cmd: cmd.to_vec(),
            fields,
        }
    }

    /// Look up any field by (case-insensitive) name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_uppercase()).map(String::as_str)
    }

    /// True if parsing produced no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for DeviceId {
    /// Serialize back to the semicolon-separated wire format.  The
    /// mandatory fields come first; remaining fields follow in stable
    /// (alphabetical) order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MFG:{};MDL:{};", self.mfg, self.mdl)?;
        if !self.des.is_empty() {
            write!(f, "DES:{};", self.des)?;
        }
        if !self.cmd.is_empty() {
            write!(f, "CMD:{};", self.cmd.join(","))?;
        }
        for (name, value) in &self.fields {
            match name.as_str() {
                "MFG" | "MDL" | "DES" | "CMD" | "MANUFACTURER" | "MODEL" | "COMMAND SET" => {}
                _ => write!(f, "{name}:{value};")?,
            }
        }
        Ok(())
    }
}
