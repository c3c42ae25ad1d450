// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The layered candidate resolver.
//
// Six stages, strictly in order, each only adding to the candidate map:
// exact Device-ID lookup, exact make/model lookup, fuzzy neighbour match,
// generic command-set fallback, the command-set consistency filter (the
// only stage allowed to remove candidates), and a fallback of last resort.
// A non-empty catalog therefore always yields a non-empty result.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use druckwahl_core::{DeviceId, FitLevel, MatchStatus};

use crate::index::CatalogIndex;
use crate::makemodel::{normalize, split_make_and_model};
use crate::modelsort::model_cmp;

/// Identification data for the printer being matched.
///
/// `description` and `uri` take no part in matching; they are carried for
/// diagnostic logging only.
#[derive(Debug, Clone, Default)]
pub struct DeviceQuery {
    /// MFG (or MANUFACTURER) field.
    pub mfg: String,
    /// MDL (or MODEL) field.
    pub mdl: String,
    /// DES field, optional.
    pub description: String,
    /// CMD field: supported command sets / page description languages.
    pub command_sets: Vec<String>,
    /// Free-text make-and-model hint, if the caller has one.
    pub make_and_model: Option<String>,
    /// Device URI, for logging only.
    pub uri: Option<String>,
}

impl DeviceQuery {
    pub fn new(mfg: impl Into<String>, mdl: impl Into<String>) -> Self {
        DeviceQuery {
            mfg: mfg.into(),
            mdl: mdl.into(),
            ..Default::default()
        }
    }

    /// Build a query from a parsed IEEE 1284 Device ID.
    pub fn from_device_id(id: &DeviceId) -> Self {
        DeviceQuery {
            mfg: id.mfg.clone(),
            mdl: id.mdl.clone(),
            description: id.des.clone(),
            command_sets: id.cmd.clone(),
            ..Default::default()
        }
    }

    /// The query's identification data as a Device ID (used when matching
    /// policy rules against the printer).
    pub fn to_device_id(&self) -> DeviceId {
        DeviceId::from_parts(&self.mfg, &self.mdl, &self.description, &self.command_sets)
    }

    /// The make-and-model string used for policy matching: the explicit
    /// hint if present, otherwise "MFG MDL".
    pub fn make_and_model_text(&self) -> String {
        match &self.make_and_model {
            Some(hint) => hint.clone(),
            None => format!("{} {}", self.mfg, self.mdl).trim().to_string(),
        }
    }
}

/// Manufacturer spellings remapped when the direct form is not a known
/// make.  Keys and values are normalized comparison keys.
const MFG_REMAP: [(&str, &str); 3] = [
    ("hewlett packard", "hp"),
    ("lexmark international", "lexmark"),
    ("kyocera", "kyocera mita"),
];

/// Fallback driver ids of last resort, in priority order, matched against
/// the end of the catalog id with or without a compression suffix.
const LAST_RESORT_PPDS: [&str; 2] = ["textonly.ppd", "postscript.ppd"];

/// Resolve candidate drivers for a device, graded by fit level.
///
/// Never returns an empty map for a (necessarily non-empty) index.
pub fn resolve(index: &CatalogIndex, query: &DeviceQuery) -> BTreeMap<String, FitLevel> {
    let mut fit: BTreeMap<String, FitLevel> = BTreeMap::new();
    let mut id_matched = false;

    // Stage 1: exact Device-ID lookup.
    if !query.mfg.is_empty() && !query.mdl.is_empty() {
        let mut hits: Vec<String> = Vec::new();
        if let Some(ids) = index.id_lookup(&query.mfg, &query.mdl) {
            hits.extend(ids.iter().cloned());
        }
        // HP-branded drivers index under the short form.
        if query.mfg.eq_ignore_ascii_case("hewlett-packard") {
            if let Some(ids) = index.id_lookup("hp", &query.mdl) {
                hits.extend(ids.iter().cloned());
            }
        }
        if !hits.is_empty() {
            debug!(mfg = %query.mfg, mdl = %query.mdl, hits = hits.len(), "exact Device-ID match");
            id_matched = true;
            for id in hits {
                fit.insert(id, FitLevel::Exact);
            }
        }
    }

    // Stage 2: exact make/model lookup.
    let (mut mfg, mut mdl) = (query.mfg.clone(), query.mdl.clone());
    if mfg.is_empty() {
        (mfg, mdl) = split_make_and_model(&mdl);
    }
    let make_key = resolve_make_key(index, &mfg);

    if let Some(make_key) = &make_key {
        // Devices sometimes repeat the manufacturer inside the model field.
        for prefix in [mfg.as_str(), "Hewlett-Packard", "HP"] {
            if let Some(rest) = strip_make_prefix(&mdl, prefix).map(str::to_string) {
                mdl = rest;
            }
        }
        let mut hits = index.drivers_for(make_key, &normalize(&mdl)).cloned();
        if hits.is_none() {
            // Re-run the split to apply its model clean-up heuristics.
            let (_, cleaned) = split_make_and_model(&format!("{mfg} {mdl}"));
            hits = index.drivers_for(make_key, &normalize(&cleaned)).cloned();
        }
        if let Some(hits) = hits {
            debug!(make = %make_key, mdl = %mdl, hits = hits.len(), "exact make/model match");
            for id in hits {
                fit.entry(id).or_insert(FitLevel::Exact);
            }
        }
    }

    // Stage 3: fuzzy neighbour match within the resolved make.
    if fit.is_empty() {
        if let Some(make_key) = &make_key {
            if let Some((ids, level)) = best_match(index, make_key, &mdl) {
                debug!(make = %make_key, mdl = %mdl, fit = %level, "fuzzy model match");
                for id in ids {
                    fit.insert(id, level);
                }
            }
        }
    }

    // Stage 4: generic driver chosen from the command-set list.
    if fit.is_empty() && !query.command_sets.is_empty() {
        if let Some(ids) = generic_for_command_sets(index, &query.command_sets) {
            debug!(hits = ids.len(), "generic command-set fallback");
            for id in ids {
                fit.insert(id, FitLevel::Generic);
            }
        }
    }

    // Stage 5: command-set consistency filter.  Only runs when the device
    // was identified by ID — that is the only time we trust the query's
    // CMD list enough to veto candidates with it.
    if id_matched && !query.command_sets.is_empty() {
        let wanted: BTreeSet<String> = query
            .command_sets
            .iter()
            .map(|c| c.trim().to_uppercase())
            .collect();
        let mut dropped = Vec::new();
        for (id, level) in fit.iter_mut() {
            let Some(record) = index.record(id) else {
                continue;
            };
            let mut cmds: Vec<String> = record
                .device_id()
                .map(|raw| DeviceId::parse(raw).cmd)
                .unwrap_or_default();
            // ppd-type is unreliable for driver-generated PPDs (generator
            // references contain a scheme separator).
            if cmds.is_empty() && !id.contains(':') && record.ppd_type() == Some("ps") {
                cmds.push("POSTSCRIPT".to_string());
            }
            if cmds.is_empty() {
                continue;
            }
            if cmds.iter().any(|c| wanted.contains(&c.trim().to_uppercase())) {
                if *level == FitLevel::Exact {
                    *level = FitLevel::ExactCmd;
                }
            } else {
                dropped.push(id.clone());
            }
        }
        if !dropped.is_empty() {
            debug!(dropped = dropped.len(), "dropped command-set-inconsistent candidates");
            for id in &dropped {
                fit.remove(id);
            }
        }
    }

    // Stage 6: fallback of last resort — the caller must never see an
    // empty result for a non-empty catalog.
    if fit.is_empty() {
        let chosen = LAST_RESORT_PPDS
            .iter()
            .find_map(|name| {
                let gz = format!("{name}.gz");
                index
                    .catalog()
                    .ids()
                    .find(|id| id.ends_with(name) || id.ends_with(&gz))
            })
            .or_else(|| index.catalog().ids().next());
        if let Some(id) = chosen {
            debug!(driver = %id, "fallback of last resort");
            fit.insert(id.clone(), FitLevel::None);
        }
    }

    if !id_matched {
        debug!(
            uri = query.uri.as_deref().unwrap_or(""),
            mfg = %query.mfg,
            mdl = %query.mdl,
            "no Device-ID match; resolved via fallback stages"
        );
    }

    fit
}

/// The status reported for a resolved candidate set: the status of its
/// best fit.
pub fn overall_status(fit: &BTreeMap<String, FitLevel>) -> MatchStatus {
    fit.values()
        .copied()
        .max()
        .map_or(MatchStatus::NoDriver, FitLevel::status)
}

/// Resolve a reported manufacturer to a known make key, directly or via
/// the remap table.
fn resolve_make_key(index: &CatalogIndex, mfg: &str) -> Option<String> {
    let key = normalize(mfg);
    if key.is_empty() {
        return None;
    }
    if index.has_make(&key) {
        return Some(key);
    }
    MFG_REMAP
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| (*to).to_string())
        .filter(|to| index.has_make(to))
}

/// Strip `"<make> "` from the start of a model string, case-insensitively.
fn strip_make_prefix<'a>(model: &'a str, make: &str) -> Option<&'a str> {
    if make.is_empty() {
        return None;
    }
    let head = model.get(..make.len())?;
    if !head.eq_ignore_ascii_case(make) {
        return None;
    }
    model.get(make.len()..)?.strip_prefix(' ').map(str::trim_start)
}

fn common_prefix_chars(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// The fuzzy model matcher.
///
/// Inserts the query into the make's model list (sorted by the canonical
/// model ordering) and examines only the immediate predecessor and
/// successor; the neighbour with the longer common prefix wins if that
/// prefix covers more than half of the query.  This deliberately mirrors
/// the long-standing behaviour the preference ordering downstream is tuned
/// against, even though a better match can exist further away in the sort
/// order.
fn best_match(
    index: &CatalogIndex,
    make_key: &str,
    model: &str,
) -> Option<(Vec<String>, FitLevel)> {
    let models = index.models(make_key)?;

    let mut query = model.trim().to_string();
    if query.to_lowercase().ends_with(" series") {
        query.truncate(query.len() - " series".len());
    }
    let query_key = normalize(&query);
    if query_key.is_empty() {
        return None;
    }
    let query_len = query_key.chars().count();

    let mut sorted: Vec<&str> = models.keys().map(String::as_str).collect();
    sorted.sort_by(|a, b| model_cmp(a, b));
    let pos = sorted.partition_point(|name| model_cmp(name, &query_key) == Ordering::Less);

    let mut best: Option<(&str, usize)> = None;
    let neighbours = [
        pos.checked_sub(1).map(|p| sorted[p]),
        sorted.get(pos).copied(),
    ];
    for candidate in neighbours.into_iter().flatten() {
        let prefix_len = common_prefix_chars(candidate, &query_key);
        if best.is_none_or(|(_, b)| prefix_len > b) {
            best = Some((candidate, prefix_len));
        }
    }
    if let Some((candidate, prefix_len)) = best {
        if prefix_len > query_len / 2 {
            let ids = models[candidate].iter().cloned().collect();
            let level = if prefix_len == query_len {
                FitLevel::Exact
            } else {
                FitLevel::Close
            };
            return Some((ids, level));
        }
    }

    // Second pass: take the most significant word — the last token with a
    // digit, or the first token — and relax its numeric precision one
    // trailing digit at a time.
    let words: Vec<&str> = query_key.split(' ').collect();
    let token = words
        .iter()
        .rev()
        .find(|w| w.chars().any(|c| c.is_ascii_digit()))
        .copied()
        .unwrap_or(words[0]);
    let chars: Vec<char> = token.chars().collect();
    let start = chars.iter().position(|c| c.is_ascii_digit())?;
    let end = chars.iter().rposition(|c| c.is_ascii_digit())?;
    let run: String = chars[start..=end].iter().collect();
    let number: u64 = run.parse().ok()?;
    let digit_count = (end - start + 1) as u32;
    let prefix: String = chars[..start].iter().collect();
    let suffix: String = chars[end + 1..].iter().collect();

    for ignore in 0..digit_count {
        let div = 10u64.checked_pow(ignore)?;
        let relaxed = (number / div) * div;
        let candidate_word = format!("{prefix}{relaxed}{suffix}");
        for name in &sorted {
            if name.split(' ').any(|w| w == candidate_word) {
                let ids = models[*name].iter().cloned().collect();
                return Some((ids, FitLevel::Close));
            }
        }
        if digit_count < 2 {
            break;
        }
    }
    None
}

/// Map a device's command-set list to one generic driver family, most
/// capable first.  Only an exact fuzzy hit in the Generic make counts.
fn generic_for_command_sets(index: &CatalogIndex, command_sets: &[String]) -> Option<Vec<String>> {
    let cmds: Vec<String> = command_sets
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();
    let has = |t: &str| cmds.iter().any(|c| c == t);
    let get = |candidates: &[&str]| -> Option<Vec<String>> {
        for model in candidates {
            if let Some((ids, FitLevel::Exact)) = best_match(index, "generic", model) {
                return Some(ids);
            }
        }
        None
    };

    if has("postscript") || has("postscript2") || has("postscript level 2 emulation") {
        get(&["PostScript"])
    } else if has("pclxl") || has("pcl-xl") || has("pcl6") || has("pcl 6 emulation") {
        get(&["PCL 6/PCL XL", "PCL Laser"])
    } else if has("pcl5e") {
        get(&["PCL 5e", "PCL Laser"])
    } else if has("pcl5c") {
        get(&["PCL 5c", "PCL Laser"])
    } else if has("pcl5") || has("pcl 5 emulation") {
        get(&["PCL 5", "PCL Laser"])
    } else if has("pcl") {
        get(&["PCL 3", "PCL Laser"])
    } else if has("escpl2") || has("esc/p2") || has("escp2e") {
        get(&["ESC/P Dot Matrix"])
    } else {
        None
    }
}
