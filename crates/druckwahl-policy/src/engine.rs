// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The driver-selection facade: catalog index + policy, wired together.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use druckwahl_core::{FitLevel, MatchStatus};
use druckwahl_match::{CatalogIndex, DeviceQuery, overall_status, resolve};

use crate::preference::Policy;

/// Resolves and ranks drivers for printers against one catalog snapshot.
///
/// Holds the index behind an `Arc` so several selectors (or threads) can
/// share one snapshot; a catalog refresh means building a new index and a
/// new selector.
#[derive(Debug, Clone)]
pub struct DriverSelector {
    index: Arc<CatalogIndex>,
    policy: Policy,
}

impl DriverSelector {
    pub fn new(index: Arc<CatalogIndex>, policy: Policy) -> Self {
        DriverSelector { index, policy }
    }

    /// Build a selector from a policy file.  A rejected policy document is
    /// a configuration problem, not a resolution problem: the selector
    /// falls back to the empty policy and keeps resolving.
    pub fn from_policy_file(index: Arc<CatalogIndex>, path: &Path) -> Self {
        let policy = match Policy::load(path) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "policy document rejected; using empty policy");
                Policy::default()
            }
        };
        DriverSelector::new(index, policy)
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Candidate drivers graded by fit level.
    pub fn resolve(&self, query: &DeviceQuery) -> BTreeMap<String, FitLevel> {
        resolve(&self.index, query)
    }

    /// The full API: match status plus the ranked driver list.
    pub fn ordered_drivers(&self, query: &DeviceQuery) -> (MatchStatus, Vec<String>) {
        let fit = self.resolve(query);
        let status = overall_status(&fit);

        let device_id = query.to_device_id();
        let ordered_types = self
            .policy
            .ordered_types(&query.make_and_model_text(), Some(&device_id));
        let mut ranked = self.policy.rank(&fit, &ordered_types, self.index.catalog());

        // If the policy filtered every candidate away, fall back to plain
        // fit order so the caller still gets the resolver's answer.
        if ranked.is_empty() {
            let mut by_fit: Vec<(&String, FitLevel)> =
                fit.iter().map(|(id, level)| (id, *level)).collect();
            by_fit.sort_by_key(|(id, level)| (Reverse(*level), (*id).clone()));
            ranked = by_fit.into_iter().map(|(id, _)| id.clone()).collect();
        }

        (status, ranked)
    }

    /// Rank as [`ordered_drivers`](Self::ordered_drivers), then move any
    /// candidates provided by a just-downloaded driver package to the
    /// front as a block, keeping relative order within the block and the
    /// remainder.  `downloaded_files` are file paths; comparison is by
    /// basename against the catalog id's basename.
    pub fn ordered_drivers_with_downloads(
        &self,
        query: &DeviceQuery,
        downloaded_files: &[String],
    ) -> (MatchStatus, Vec<String>) {
        let (status, mut ranked) = self.ordered_drivers(query);
        promote_downloaded(&mut ranked, downloaded_files);
        (status, ranked)
    }

    /// The single-best-match API.
    pub fn best(&self, query: &DeviceQuery) -> (MatchStatus, Option<String>) {
        let (status, ranked) = self.ordered_drivers(query);
        (status, ranked.into_iter().next())
    }
}

/// Move drivers whose basename appears in `downloaded_files` to the front
/// of the ranked list, as a block.
pub fn promote_downloaded(ranked: &mut Vec<String>, downloaded_files: &[String]) {
    if downloaded_files.is_empty() {
        return;
    }
    let names: BTreeSet<&str> = downloaded_files.iter().map(|f| basename(f)).collect();
    let (mut promoted, remainder): (Vec<String>, Vec<String>) = std::mem::take(ranked)
        .into_iter()
        .partition(|id| names.contains(basename(id)));
    promoted.extend(remainder);
    *ranked = promoted;
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
