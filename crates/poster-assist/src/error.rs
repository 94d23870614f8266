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

use poster_contracts::LLMError;
use poster_reconcile::ReconcileError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistError {
    #[error("LLM call failed: {0}")]
    Llm(#[from] LLMError),
    #[error(transparent)]
    Proposal(#[from] ReconcileError),
}

pub type AssistResult<T> = std::result::Result<T, AssistError>;

impl AssistError {
    /// True when the model answered but its answer could not be used.
    pub const fn is_bad_proposal(&self) -> bool {
        matches!(self, Self::Proposal(_))
    }
}
