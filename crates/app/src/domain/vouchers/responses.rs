//! Catalog Responses
//!
//! The `{success, message}` envelope the admin screen reads after every
//! catalog mutation.

use std::{error::Error, iter};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> CatalogResponse<T> {
    pub fn ok(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    /// A failed mutation, reported with the full error chain in one message.
    pub fn failure(error: &(dyn Error + 'static)) -> Self {
        Self {
            success: false,
            message: error_chain(error),
            data: None,
        }
    }
}

/// Render an error with its sources, outermost first.
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    iter::successors(Some(error), |error: &&(dyn Error + 'static)| (*error).source())
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}
