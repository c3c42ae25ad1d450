// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The dual driver-catalog index.
//
// Built once per catalog snapshot and immutable afterwards: callers that
// share an index across consumers hold it behind an `Arc` and rebuild by
// construct-and-swap when the catalog changes.  Two lookup structures are
// maintained: normalized make → normalized model → driver ids, and
// lower-cased Device-ID manufacturer → model → driver ids.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use druckwahl_core::{DeviceId, DriverCatalog, DruckwahlError, Result};

use crate::makemodel::{normalize, split_make_and_model};
use crate::modelsort::model_cmp;

/// Driver id CUPS uses for the raw (no-filtering) pseudo queue.
pub const RAW_QUEUE_ID: &str = "raw";

type ModelMap = BTreeMap<String, BTreeSet<String>>;

/// Immutable dual index over a driver catalog snapshot.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    catalog: DriverCatalog,
    /// normalized make → normalized model → driver ids.
    makes: BTreeMap<String, ModelMap>,
    /// normalized make → canonical-cased make, first seen wins.
    make_display: BTreeMap<String, String>,
    /// normalized make → normalized model → canonical-cased model.
    model_display: BTreeMap<String, BTreeMap<String, String>>,
    /// lower-cased Device-ID MFG → lower-cased MDL → driver ids.
    ids: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl CatalogIndex {
    /// Build the index for one catalog snapshot, filtered for `language`.
    ///
    /// Records in a foreign natural language are dropped; `"en"` records
    /// always pass because some manufacturers ship English-only PPDs.  An
    /// empty catalog (before or after filtering) is the one build-time
    /// failure, since resolution could then never offer a fallback.
    pub fn build(catalog: &DriverCatalog, language: &str) -> Result<Self> {
        let language = match language {
            "" | "C" | "POSIX" => "en_US",
            other => other,
        };
        let short_language = language.split('_').next().unwrap_or(language);

        let mut filtered = DriverCatalog::new();
        for (id, record) in catalog.iter() {
            if let Some(natural) = record.natural_language() {
                if natural != "en" && natural != language && natural != short_language {
                    debug!(driver = %id, language = %natural, "dropping foreign-language record");
                    continue;
                }
            }
            filtered.insert(id.clone(), record.clone());
        }

        // The raw queue's catalog entry reads "Raw Queue", which would
        // otherwise index as manufacturer "Raw".  File it under Generic.
        if let Some(raw) = filtered.get_mut(RAW_QUEUE_ID) {
            let mm = raw.make_and_model().to_string();
            if !mm.starts_with("Generic ") {
                raw.set_make_and_model(&format!("Generic {mm}"));
            }
        }

        if filtered.is_empty() {
            return Err(DruckwahlError::EmptyCatalog);
        }

        let mut index = CatalogIndex {
            catalog: filtered,
            ..Default::default()
        };
        index.build_makes();
        index.build_ids();

        info!(
            drivers = index.catalog.len(),
            makes = index.makes.len(),
            id_makes = index.ids.len(),
            "built driver catalog index"
        );
        Ok(index)
    }

    fn build_makes(&mut self) {
        // (canonical make key, canonical model key, alias make key, alias
        // model key) — resolved after the whole catalog is inserted.
        let mut aliases: BTreeSet<(String, String, String, String)> = BTreeSet::new();
        let mut makes: BTreeMap<String, ModelMap> = BTreeMap::new();
        let mut make_display: BTreeMap<String, String> = BTreeMap::new();
        let mut model_display: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

        for (id, record) in self.catalog.iter() {
            let (own_make, own_model) = split_make_and_model(record.make_and_model());
            let own_key = (normalize(&own_make), normalize(&own_model));

            let mut pairs = vec![(own_make.clone(), own_model.clone())];

            // Product strings recover model names the display string hides,
            // but a single alternate name is unreliable noise.
            let products = record.products();
            if products.len() >= 2 {
                for product in products {
                    let full = if product
                        .to_lowercase()
                        .starts_with(&own_make.to_lowercase())
                    {
                        product.to_string()
                    } else {
                        format!("{own_make} {product}")
                    };
                    let (make, model) = split_make_and_model(&full);
                    let key = (normalize(&make), normalize(&model));
                    if key != own_key {
                        aliases.insert((
                            own_key.0.clone(),
                            own_key.1.clone(),
                            key.0.clone(),
                            key.1.clone(),
                        ));
                    }
                    pairs.push((make, model));
                }
            }

            for (make, model) in pairs {
                let make_key = normalize(&make);
                let model_key = normalize(&model);
                make_display.entry(make_key.clone()).or_insert(make);
                model_display
                    .entry(make_key.clone())
                    .or_default()
                    .entry(model_key.clone())
                    .or_insert(model);
                makes
                    .entry(make_key)
                    .or_default()
                    .entry(model_key)
                    .or_default()
                    .insert(id.clone());
            }
        }

        // Aliases always carry at least everything their canonical
        // counterpart does.
        for (own_make, own_model, alias_make, alias_model) in aliases {
            let canonical: Option<BTreeSet<String>> = makes
                .get(&own_make)
                .and_then(|models| models.get(&own_model))
                .cloned();
            if let Some(drivers) = canonical {
                makes
                    .entry(alias_make)
                    .or_default()
                    .entry(alias_model)
                    .or_default()
                    .extend(drivers);
            }
        }

        self.makes = makes;
        self.make_display = make_display;
        self.model_display = model_display;
    }

    fn build_ids(&mut self) {
        let mut ids: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
        for (id, record) in self.catalog.iter() {
            let Some(raw) = record.device_id() else {
                continue;
            };
            // Some Kyocera PPDs use a colon where the field separator
            // belongs ("...:Model...").
            let raw = raw.replacen(":Model", ";Model", 1);
            let parsed = DeviceId::parse(&raw);
            if parsed.mfg.is_empty() || parsed.mdl.is_empty() {
                debug!(driver = %id, "skipping Device ID with missing MFG or MDL");
                continue;
            }
            ids.entry(parsed.mfg.to_lowercase())
                .or_default()
                .entry(parsed.mdl.to_lowercase())
                .or_default()
                .push(id.clone());
        }
        self.ids = ids;
    }

    /// The locale-filtered catalog snapshot backing this index.
    pub fn catalog(&self) -> &DriverCatalog {
        &self.catalog
    }

    /// Attribute record for a driver id.
    pub fn record(&self, id: &str) -> Option<&druckwahl_core::DriverRecord> {
        self.catalog.get(id)
    }

    pub fn has_make(&self, make_key: &str) -> bool {
        self.makes.contains_key(make_key)
    }

    /// All models (normalized keys) registered under a normalized make.
    pub fn models(&self, make_key: &str) -> Option<&ModelMap> {
        self.makes.get(make_key)
    }

    /// Driver ids for an exact normalized (make, model) pair.
    pub fn drivers_for(&self, make_key: &str, model_key: &str) -> Option<&BTreeSet<String>> {
        self.makes.get(make_key).and_then(|m| m.get(model_key))
    }

    /// Driver ids indexed under a Device-ID (MFG, MDL) pair.
    pub fn id_lookup(&self, mfg: &str, mdl: &str) -> Option<&[String]> {
        self.ids
            .get(&mfg.to_lowercase())
            .and_then(|m| m.get(&mdl.to_lowercase()))
            .map(Vec::as_slice)
    }

    /// Canonical-cased make names for display, sorted, "Generic" first.
    pub fn make_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.make_display.values().map(String::as_str).collect();
        names.sort_unstable();
        if let Some(pos) = names.iter().position(|n| *n == "Generic") {
            names.remove(pos);
            names.insert(0, "Generic");
        }
        names
    }

    /// Canonical-cased model names for one make, in model order.
    pub fn model_names(&self, make: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .model_display
            .get(&normalize(make))
            .map(|models| models.values().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_by(|a, b| model_cmp(a, b));
        names
    }
}
