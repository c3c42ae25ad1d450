// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The preference-order engine: computes the driver-type order for one
// printer and ranks a resolved candidate set accordingly.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use druckwahl_core::{DeviceId, DriverCatalog, DriverRecord, FitLevel};

use crate::drivertype::DriverTypes;
use crate::printertype::PrinterTypeRule;

/// Synthetic bucket for candidates no driver type claims.  Never a valid
/// driver-type name in a policy; always ranked last.
pub const UNCLASSIFIED: &str = "none";

/// An immutable preference policy: the ordered driver-type list plus the
/// ordered printer rules.
///
/// The default (empty) policy classifies everything as unclassified and
/// ranks candidates in their original order, so a host that fails to load
/// its policy document still resolves drivers.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    types: DriverTypes,
    printers: Vec<PrinterTypeRule>,
}

impl Policy {
    pub fn new(types: DriverTypes, printers: Vec<PrinterTypeRule>) -> Self {
        Policy { types, printers }
    }

    pub fn types(&self) -> &DriverTypes {
        &self.types
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.printers.is_empty()
    }

    /// Accumulate the driver-type preference order for one printer.
    ///
    /// Every matching printer rule contributes: its prefer globs expand
    /// against the driver-type list (declaration order, duplicates
    /// skipped), its avoid globs demote types to the end of the list
    /// (keeping their relative order), and its blacklist globs remove
    /// types outright.  Blacklist wins over avoid wins over prefer.
    pub fn ordered_types(&self, make_and_model: &str, device_id: Option<&DeviceId>) -> Vec<String> {
        let mut ordered: Vec<String> = Vec::new();
        let mut avoid: BTreeSet<String> = BTreeSet::new();
        let mut blacklist: BTreeSet<String> = BTreeSet::new();

        for rule in &self.printers {
            if !rule.matches(make_and_model, device_id) {
                continue;
            }
            for glob in rule.prefer_globs() {
                for name in self.types.filter_names(glob) {
                    if !ordered.iter().any(|n| n == name) {
                        ordered.push(name.to_string());
                    }
                }
            }
            for glob in rule.avoid_globs() {
                for name in self.types.filter_names(glob) {
                    avoid.insert(name.to_string());
                }
            }
            for glob in rule.blacklist_globs() {
                for name in self.types.filter_names(glob) {
                    blacklist.insert(name.to_string());
                }
            }
        }

        if !avoid.is_empty() {
            let (kept, avoided): (Vec<String>, Vec<String>) =
                ordered.into_iter().partition(|name| !avoid.contains(name));
            ordered = kept;
            ordered.extend(avoided);
        }
        ordered.retain(|name| !blacklist.contains(name));

        debug!(
            printer = %make_and_model,
            types = ordered.len(),
            "computed driver-type preference order"
        );
        ordered
    }

    /// Rank a resolved candidate set by driver-type preference.
    ///
    /// Candidates are bucketed by classification; buckets are emitted in
    /// `ordered_types` order, each keeping its original internal order.
    /// Unclassified candidates always come last; candidates classified to
    /// a type absent from `ordered_types` are dropped (that is how a
    /// blacklist takes effect on the final list).
    pub fn rank(
        &self,
        candidates: &BTreeMap<String, FitLevel>,
        ordered_types: &[String],
        catalog: &DriverCatalog,
    ) -> Vec<String> {
        let empty = DriverRecord::new();
        let mut buckets: BTreeMap<&str, Vec<&String>> = BTreeMap::new();
        for (id, fit) in candidates {
            let record = catalog.get(id).unwrap_or(&empty);
            let bucket = self
                .types
                .classify(id, record, *fit)
                .unwrap_or(UNCLASSIFIED);
            buckets.entry(bucket).or_default().push(id);
        }

        let mut ranked: Vec<String> = Vec::new();
        for name in ordered_types {
            if name == UNCLASSIFIED {
                continue;
            }
            if let Some(ids) = buckets.remove(name.as_str()) {
                ranked.extend(ids.into_iter().cloned());
            }
        }
        if let Some(ids) = buckets.remove(UNCLASSIFIED) {
            ranked.extend(ids.into_iter().cloned());
        }
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivertype::DriverType;

    fn policy_with_types(names: &[&str], printers: Vec<PrinterTypeRule>) -> Policy {
        let types = names.iter().map(|n| DriverType::new(*n)).collect();
        Policy::new(DriverTypes::new(types), printers)
    }

    fn wildcard_rule(prefer: &[&str], avoid: &[&str], blacklist: &[&str]) -> PrinterTypeRule {
        let mut rule = PrinterTypeRule::new();
        for g in prefer {
            rule.add_prefer(g).unwrap();
        }
        for g in avoid {
            rule.add_avoid(g).unwrap();
        }
        for g in blacklist {
            rule.add_blacklist(g).unwrap();
        }
        rule
    }

    #[test]
    fn prefer_globs_expand_in_declaration_order() {
        let policy = policy_with_types(
            &["manufacturer-ppd", "generic-postscript", "generic-pcl"],
            vec![wildcard_rule(&["manufacturer-*", "generic-*"], &[], &[])],
        );
        assert_eq!(
            policy.ordered_types("HP LaserJet", None),
            vec!["manufacturer-ppd", "generic-postscript", "generic-pcl"]
        );
    }

    #[test]
    fn avoided_types_move_to_the_end_in_order() {
        let policy = policy_with_types(
            &["a", "b-one", "b-two", "c"],
            vec![wildcard_rule(&["*"], &["b-*"], &[])],
        );
        assert_eq!(
            policy.ordered_types("x", None),
            vec!["a", "c", "b-one", "b-two"]
        );
    }

    #[test]
    fn blacklist_wins_over_avoid_and_prefer() {
        let policy = policy_with_types(
            &["a", "b", "c"],
            vec![wildcard_rule(&["*"], &["b"], &["b"])],
        );
        assert_eq!(policy.ordered_types("x", None), vec!["a", "c"]);
    }

    #[test]
    fn later_rules_accumulate_without_duplicates() {
        let mut specific = PrinterTypeRule::new();
        specific.set_make_and_model("HP").unwrap();
        specific.add_prefer("b").unwrap();
        let catchall = wildcard_rule(&["a", "b"], &[], &[]);
        let policy = policy_with_types(&["a", "b"], vec![specific, catchall]);
        // The HP-specific rule runs first, so "b" leads for HP printers.
        assert_eq!(policy.ordered_types("HP LaserJet", None), vec!["b", "a"]);
        assert_eq!(policy.ordered_types("Canon iP3000", None), vec!["a", "b"]);
    }

    #[test]
    fn rank_groups_by_type_and_keeps_bucket_order() {
        let mut hp = DriverType::new("hp-drv");
        hp.set_ppd_name("drv:///hp/").unwrap();
        let mut foomatic = DriverType::new("foomatic");
        foomatic.set_ppd_name("foomatic:").unwrap();
        let policy = Policy::new(DriverTypes::new(vec![hp, foomatic]), Vec::new());

        let mut candidates = BTreeMap::new();
        candidates.insert("foomatic:hp-lj.ppd".to_string(), FitLevel::Close);
        candidates.insert("drv:///hp/a.ppd".to_string(), FitLevel::Exact);
        candidates.insert("drv:///hp/b.ppd".to_string(), FitLevel::Exact);
        candidates.insert("other.ppd".to_string(), FitLevel::Generic);

        let order = vec!["hp-drv".to_string(), "foomatic".to_string()];
        let ranked = policy.rank(&candidates, &order, &DriverCatalog::new());
        assert_eq!(
            ranked,
            vec![
                "drv:///hp/a.ppd",
                "drv:///hp/b.ppd",
                "foomatic:hp-lj.ppd",
                "other.ppd"
            ]
        );
    }

    #[test]
    fn candidates_of_unrequested_types_are_dropped() {
        let mut hp = DriverType::new("hp-drv");
        hp.set_ppd_name("drv:///hp/").unwrap();
        let policy = Policy::new(DriverTypes::new(vec![hp]), Vec::new());

        let mut candidates = BTreeMap::new();
        candidates.insert("drv:///hp/a.ppd".to_string(), FitLevel::Exact);
        candidates.insert("plain.ppd".to_string(), FitLevel::Close);

        // "hp-drv" exists but is not requested, e.g. blacklisted.
        let ranked = policy.rank(&candidates, &[], &DriverCatalog::new());
        assert_eq!(ranked, vec!["plain.ppd"]);
    }

    #[test]
    fn empty_policy_preserves_candidate_order() {
        let policy = Policy::default();
        let mut candidates = BTreeMap::new();
        candidates.insert("b.ppd".to_string(), FitLevel::Close);
        candidates.insert("a.ppd".to_string(), FitLevel::Exact);
        let ranked = policy.rank(&candidates, &[], &DriverCatalog::new());
        assert_eq!(ranked, vec!["a.ppd", "b.ppd"]);
    }
}
