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

use crate::render::RenderError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use poster_assist::AssistError;
use poster_contracts::LLMError;
use poster_engine::QueryError;
use poster_reconcile::ReconcileError;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
    pub request_id: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
            request_id: Uuid::new_v4().to_string(),
            status,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn assistant_disabled() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "ASSISTANT_DISABLED",
            "No LLM API key is configured",
        )
    }

    #[must_use]
    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = %self.code, request_id = %self.request_id, "{}", self.message);
        } else {
            warn!(code = %self.code, request_id = %self.request_id, "{}", self.message);
        }
        let status = self.status;
        let body = Json(self);
        (status, body).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        let (status, code) = match &e {
            QueryError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            QueryError::SourceUnavailable { .. } => (StatusCode::NOT_FOUND, "SOURCE_UNAVAILABLE"),
            QueryError::MalformedLine { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED_SOURCE"),
            QueryError::ListingUnsupported { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "LISTING_UNSUPPORTED")
            }
        };
        Self::new(status, code, e.to_string())
    }
}

impl From<ReconcileError> for ApiError {
    fn from(e: ReconcileError) -> Self {
        let (status, code) = match &e {
            ReconcileError::MalformedProposal(_) => (StatusCode::BAD_REQUEST, "MALFORMED_PROPOSAL"),
            ReconcileError::KindMismatch { .. } => (StatusCode::BAD_REQUEST, "KIND_MISMATCH"),
            ReconcileError::EmptyRightSeries => {
                (StatusCode::INTERNAL_SERVER_ERROR, "EMPTY_RIGHT_SERIES")
            }
        };
        Self::new(status, code, e.to_string())
    }
}

impl From<AssistError> for ApiError {
    fn from(e: AssistError) -> Self {
        match e {
            AssistError::Proposal(inner) => inner.into(),
            AssistError::Llm(LLMError::Configuration(msg)) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "LLM_CONFIGURATION", msg)
            }
            AssistError::Llm(inner) => {
                Self::new(StatusCode::BAD_GATEWAY, "LLM_ERROR", inner.to_string())
            }
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(e: RenderError) -> Self {
        let upstream_status = match &e {
            RenderError::Upstream { status, .. } => Some(*status),
            _ => None,
        };
        let err = Self::new(StatusCode::BAD_GATEWAY, "RENDER_FAILED", e.to_string());
        match upstream_status {
            Some(status) => err.with_details(serde_json::json!({ "upstream_status": status })),
            None => err,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_BODY", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_QUERY", rejection.body_text())
    }
}
