// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Deployment environment classification.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::RESTRICTED_ENVIRONMENT_LABEL;

/// The only configuration value that classifies a deployment as open.
pub const OPEN_ENVIRONMENT_MARKER: &str = "production";

/// Access class of the running deployment.
///
/// Computed once at startup and carried in the application state; it never
/// changes for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentClass {
    /// Staging-like: only admins get past the gate
    Restricted,
    /// Production-like: routes use their normal audience
    Open,
}

impl EnvironmentClass {
    /// Classify a raw deployment value.
    ///
    /// Anything other than the open marker, including a missing or empty
    /// value, is restricted.
    pub fn classify(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case(OPEN_ENVIRONMENT_MARKER) => {
                EnvironmentClass::Open
            }
            _ => EnvironmentClass::Restricted,
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, EnvironmentClass::Restricted)
    }

    /// Human-facing deployment label.
    pub fn label(&self) -> &'static str {
        match self {
            EnvironmentClass::Restricted => RESTRICTED_ENVIRONMENT_LABEL,
            EnvironmentClass::Open => OPEN_ENVIRONMENT_MARKER,
        }
    }
}

impl Default for EnvironmentClass {
    fn default() -> Self {
        EnvironmentClass::Restricted
    }
}
