// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Druckwahl Match — make/model canonicalization, the dual catalog index,
// and the layered candidate resolver.  This crate turns a raw driver
// catalog plus loose printer identification data into a map of candidate
// driver ids graded by fit level; preference ordering lives in
// `druckwahl-policy`.

pub mod index;
pub mod makemodel;
pub mod modelsort;
pub mod resolver;

pub use index::CatalogIndex;
pub use makemodel::{normalize, split_make_and_model};
pub use modelsort::model_cmp;
pub use resolver::{DeviceQuery, overall_status, resolve};
