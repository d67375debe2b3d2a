// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Entity discovery.
//!
//! Discovery fails soft: a host that cannot answer the marker query yields
//! zero entities for the pass. In an incremental build the next pass simply
//! asks again.

use tracing::{debug, error};

use crate::{
    error::HostError,
    host::EntityHost,
    marker::Marker,
    model::EntityDeclaration,
    utils::pattern::PackageFilter
};

/// Entities found for one pass.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Entities passing the package filter, in host order.
    pub entities: Vec<EntityDeclaration>,

    /// Number of entities outside the package filter.
    pub filtered_out: usize,

    /// Query failure, if any.
    pub error: Option<HostError>
}

/// Query the host for every entity-marked declaration.
pub fn find_entities<H: EntityHost + ?Sized>(host: &H, filter: &PackageFilter) -> Discovery {
    let declarations = match host.declarations_with_marker(Marker::Entity) {
        Ok(declarations) => declarations,
        Err(err) => {
            error!(error = %err, "failed to query entity declarations");
            return Discovery {
                error: Some(err),
                ..Discovery::default()
            };
        }
    };

    let total = declarations.len();
    let entities: Vec<EntityDeclaration> = declarations
        .into_iter()
        .filter(|entity| {
            let included = filter.matches(entity.package());
            if !included {
                debug!(entity = %entity.name, "entity outside package filters");
            }
            included
        })
        .collect();

    Discovery {
        filtered_out: total - entities.len(),
        entities,
        error: None
    }
}
