// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data model for the driver catalog and the match confidence grading.

use std::collections::BTreeMap;
use std::fmt;
use std::slice;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DruckwahlError, Result};

/// A catalog attribute value.
///
/// The print server reports some attributes as single strings and some as
/// lists, inconsistently between server versions.  Callers that only care
/// about "the" value use [`AttrValue::first`]; matching code that must
/// consider every value uses [`AttrValue::values`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Scalar(String),
    List(Vec<String>),
}

impl AttrValue {
    /// The first (or only) value.
    pub fn first(&self) -> Option<&str> {
        match self {
            AttrValue::Scalar(s) => Some(s.as_str()),
            AttrValue::List(v) => v.first().map(String::as_str),
        }
    }

    /// All values as a slice.
    pub fn values(&self) -> &[String] {
        match self {
            AttrValue::Scalar(s) => slice::from_ref(s),
            AttrValue::List(v) => v.as_slice(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Scalar(s.to_string())
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(v: Vec<String>) -> Self {
        AttrValue::List(v)
    }
}

/// One entry of the driver catalog: a flat attribute map as supplied by the
/// print server.  The record itself is opaque apart from the handful of
/// attributes the resolution engine reads, exposed as accessors below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverRecord {
    attrs: BTreeMap<String, AttrValue>,
}

impl DriverRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// First value of an attribute, if present.
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).and_then(AttrValue::first)
    }

    /// The `ppd-make-and-model` display string (empty if absent).
    pub fn make_and_model(&self) -> &str {
        self.get_first("ppd-make-and-model").unwrap_or("")
    }

    pub fn set_make_and_model(&mut self, value: &str) {
        self.set("ppd-make-and-model", value);
    }

    /// The raw `ppd-device-id` string, if present and non-empty.
    pub fn device_id(&self) -> Option<&str> {
        self.get_first("ppd-device-id").filter(|s| !s.is_empty())
    }

    /// The `ppd-natural-language` attribute, if present.
    pub fn natural_language(&self) -> Option<&str> {
        self.get_first("ppd-natural-language")
    }

    /// The `ppd-type` attribute (used only to infer a PostScript command
    /// set when the record carries no Device ID).
    pub fn ppd_type(&self) -> Option<&str> {
        self.get_first("ppd-type")
    }

    /// Alternate model names from the `ppd-product` attribute.  PPD
    /// `Product` values come parenthesised (`"(PIXMA iP3000)"`); the
    /// parentheses are stripped here.
    pub fn products(&self) -> Vec<&str> {
        self.get("ppd-product")
            .map(|v| {
                v.values()
                    .iter()
                    .map(|p| {
                        p.trim()
                            .trim_start_matches('(')
                            .trim_end_matches(')')
                            .trim()
                    })
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The raw driver catalog: driver id → attribute record.
///
/// A read-only snapshot supplied by the print server connection layer.
/// Rebuilding after a catalog change is construct-and-swap, never in-place
/// mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverCatalog {
    records: BTreeMap<String, DriverRecord>,
}

impl DriverCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog snapshot from a JSON object of id → record.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn insert(&mut self, id: impl Into<String>, record: DriverRecord) {
        self.records.insert(id.into(), record);
    }

    pub fn get(&self, id: &str) -> Option<&DriverRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut DriverRecord> {
        self.records.get_mut(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DriverRecord)> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    pub fn remove(&mut self, id: &str) -> Option<DriverRecord> {
        self.records.remove(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Confidence grading for a candidate driver against a query device.
///
/// Ordered: `ExactCmd` is strictly better than `Exact`, down to `None`
/// which is only ever used for the fallback driver of last resort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FitLevel {
    None,
    Generic,
    Close,
    Exact,
    ExactCmd,
}

impl FitLevel {
    /// Coarser grading reported to callers.
    pub fn status(self) -> MatchStatus {
        match self {
            FitLevel::ExactCmd | FitLevel::Exact => MatchStatus::Success,
            FitLevel::Close => MatchStatus::ModelMismatch,
            FitLevel::Generic => MatchStatus::GenericDriver,
            FitLevel::None => MatchStatus::NoDriver,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FitLevel::ExactCmd => "exact-cmd",
            FitLevel::Exact => "exact",
            FitLevel::Close => "close",
            FitLevel::Generic => "generic",
            FitLevel::None => "none",
        }
    }
}

impl fmt::Display for FitLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitLevel {
    type Err = DruckwahlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "exact-cmd" => Ok(FitLevel::ExactCmd),
            "exact" => Ok(FitLevel::Exact),
            "close" => Ok(FitLevel::Close),
            "generic" => Ok(FitLevel::Generic),
            "none" => Ok(FitLevel::None),
            other => Err(DruckwahlError::UnknownFitLevel(other.to_string())),
        }
    }
}

/// Coarse match status for the single-best-match API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Success,
    ModelMismatch,
    GenericDriver,
    NoDriver,
}
