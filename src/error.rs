// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types shared by every kernel operation

use thiserror::Error;

/// Errors raised by mesh construction and geometric operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Out-of-range indices, non-manifold or open input where a closed
    /// manifold is required, uncontained holes, self-intersecting polygons.
    #[error("invalid topology: {details}")]
    InvalidTopology { details: String },

    /// Zero-area triangles, collapsed polygons, unmatched slice segments.
    #[error("degenerate geometry: {details}")]
    DegenerateGeometry { details: String },

    /// Non-finite or out-of-range values, or a result the arithmetic
    /// could not certify.
    #[error("numeric overflow or instability: {details}")]
    NumericOverflowOrInstability { details: String },

    /// A caller supplied parameter is out of its valid range.
    #[error("invalid parameter `{name}`: {details}")]
    InvalidParameter { name: &'static str, details: String },
}

impl KernelError {
    pub fn invalid_topology(details: impl Into<String>) -> Self {
        Self::InvalidTopology {
            details: details.into(),
        }
    }

    pub fn degenerate(details: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            details: details.into(),
        }
    }

    pub fn numeric(details: impl Into<String>) -> Self {
        Self::NumericOverflowOrInstability {
            details: details.into(),
        }
    }

    pub fn invalid_parameter(name: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            details: details.into(),
        }
    }
}

/// Result alias used across the kernel.
pub type Result<T> = std::result::Result<T, KernelError>;
