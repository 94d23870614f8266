// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Keeps chart configs, bindings and proposed edits consistent.
//!
//! Everything here is a pure function over values: callers pass the current
//! config and binding in and get the next authoritative pair back.

pub mod defaults;
pub mod enforcer;
pub mod error;
pub mod normalizer;
pub mod palette;
pub mod reconciler;

pub use defaults::{default_config, DEFAULT_COLORS};
pub use enforcer::enforce_proposal;
pub use error::{ReconcileError, ReconcileResult};
pub use normalizer::{
    normalize_axis, normalize_binding, normalize_dual_binding, normalize_label_binding, right_axis,
};
pub use palette::{assign_colors, PALETTE};
pub use reconciler::{reconcile_bar, reconcile_dual, reconcile_labels, reconcile_pie, union_domain};
