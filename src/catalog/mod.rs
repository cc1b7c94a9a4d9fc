//! Process-wide mapping from type OIDs to type descriptors.
//!
//! The registry is filled from the engine's own catalog the first time a caller needs type
//! metadata. Population is single-flight: concurrent first users wait on one loader, and once
//! the map is published it is read without locking.

mod display;
mod types;

pub use types::{TypeDescriptor, TypeKind};

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, OnceLock};

use tracing::{debug, info};

use crate::error::SpiBridgeError;
use crate::spi::{Datum, SpiBackend, gateway};
use crate::types::{Oid, RowValues};

/// Catalog query returning, per type: namespace, OID, name, type-kind tag, not-null flag and
/// element OID (arrays only).
///
/// Rows are ordered so that most element types precede their arrays; forward references that
/// remain are skipped during loading.
pub const LOAD_TYPES_QUERY: &str = "SELECT ns.nspname, t.oid, t.typname, t.typtype, t.typnotnull, \
CASE WHEN t.typtype = 'a' THEN t.typelem END AS elemtypoid \
FROM pg_catalog.pg_type AS t \
JOIN pg_catalog.pg_namespace AS ns ON ns.oid = t.typnamespace \
ORDER BY CASE WHEN t.typtype IN ('b', 'e', 'p') THEN 0 WHEN t.typtype = 'r' THEN 1 \
WHEN t.typtype = 'm' THEN 2 WHEN t.typtype = 'c' THEN 3 WHEN t.typtype = 'd' THEN 4 \
WHEN t.typtype = 'a' THEN 5 ELSE 6 END, t.oid";

const CATALOG_COLUMNS: usize = 6;

type TypeMap = HashMap<Oid, Arc<TypeDescriptor>>;

static GLOBAL_REGISTRY: LazyLock<Arc<TypeRegistry>> =
    LazyLock::new(|| Arc::new(TypeRegistry::new()));

/// One row of the catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRow {
    pub namespace: String,
    pub oid: Oid,
    pub name: String,
    pub type_kind: char,
    pub element_oid: Option<Oid>,
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    by_oid: OnceLock<TypeMap>,
    load_lock: Mutex<()>,
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every connection that does not bring its own.
    #[must_use]
    pub fn global() -> Arc<TypeRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.by_oid.get().is_some()
    }

    /// Number of registered types; zero before loading.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_oid.get().map_or(0, HashMap::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up an OID without triggering a load.
    #[must_use]
    pub fn lookup(&self, oid: Oid) -> Option<Arc<TypeDescriptor>> {
        self.by_oid.get().and_then(|map| map.get(&oid).cloned())
    }

    /// Populate the registry from the engine's catalog unless that already happened.
    ///
    /// # Errors
    /// Returns execution errors from the catalog query and `UnsupportedConfiguration` for an
    /// unknown type-kind tag. A failed load leaves the registry empty so the next call retries.
    pub fn ensure_loaded<B: SpiBackend + ?Sized>(&self, backend: &mut B) -> Result<(), SpiBridgeError> {
        if self.by_oid.get().is_some() {
            return Ok(());
        }

        let _guard = match self.load_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if self.by_oid.get().is_some() {
            return Ok(());
        }

        let rows = fetch_catalog_rows(backend)?;
        let map = build_type_map(rows)?;
        info!(types = map.len(), "type registry loaded");
        let _ = self.by_oid.set(map);
        Ok(())
    }

    /// Resolve an OID, loading the registry on first use.
    ///
    /// # Errors
    /// Returns loading errors, or `TypeNotFound` when the loaded catalog has no such OID.
    pub fn resolve<B: SpiBackend + ?Sized>(
        &self,
        oid: Oid,
        backend: &mut B,
    ) -> Result<Arc<TypeDescriptor>, SpiBridgeError> {
        if let Some(found) = self.lookup(oid) {
            return Ok(found);
        }
        self.ensure_loaded(backend)?;
        self.lookup(oid).ok_or(SpiBridgeError::TypeNotFound(oid))
    }
}

/// Build the OID map from catalog rows, in row order.
///
/// # Errors
/// Returns `UnsupportedConfiguration` for a type-kind tag outside the known set.
pub fn build_type_map(rows: impl IntoIterator<Item = CatalogRow>) -> Result<TypeMap, SpiBridgeError> {
    let mut map = TypeMap::new();
    for row in rows {
        match row.type_kind {
            // pseudo-types (record, void) are registered as base types
            'b' | 'p' => {
                let descriptor = TypeDescriptor::base(row.namespace, row.name, row.oid);
                map.insert(row.oid, Arc::new(descriptor));
            }
            'a' => {
                let element = row.element_oid.and_then(|elem| map.get(&elem).cloned());
                let Some(element) = element else {
                    info!(
                        array = %row.name,
                        element_oid = ?row.element_oid,
                        "array type refers to unknown element type, skipping"
                    );
                    continue;
                };
                let descriptor = TypeDescriptor::array(row.namespace, row.name, row.oid, element);
                map.insert(row.oid, Arc::new(descriptor));
            }
            // range, multirange, enum, composite, domain
            'r' | 'm' | 'e' | 'c' | 'd' => {}
            other => {
                return Err(SpiBridgeError::UnsupportedConfiguration(format!(
                    "unknown type kind '{other}' for type '{}' in pg_type",
                    row.name
                )));
            }
        }
    }
    Ok(map)
}

fn fetch_catalog_rows<B: SpiBackend + ?Sized>(backend: &mut B) -> Result<Vec<CatalogRow>, SpiBridgeError> {
    let outcome = gateway::execute(backend, LOAD_TYPES_QUERY, true, 0)?;
    let Some(table) = outcome.tuple_table else {
        return Err(SpiBridgeError::State(
            "type catalog query produced no tuple table".to_string(),
        ));
    };

    let ncols = backend.column_count(table);
    if ncols < CATALOG_COLUMNS {
        return Err(SpiBridgeError::State(format!(
            "type catalog query returned {ncols} columns, expected {CATALOG_COLUMNS}"
        )));
    }
    let props = backend.column_properties(table);
    debug!(rows = outcome.processed_rows, "total types detected in database");

    let mut datums = vec![Datum::NULL; ncols];
    let mut nulls = vec![false; ncols];
    let mut rows = Vec::with_capacity(usize::try_from(outcome.processed_rows).unwrap_or(0));

    for index in 0..outcome.processed_rows {
        backend.fetch_row(index, table, &mut datums, &mut nulls)?;
        let mut values = Vec::with_capacity(CATALOG_COLUMNS);
        for col in 0..CATALOG_COLUMNS {
            if nulls[col] {
                values.push(RowValues::Null);
            } else {
                values.push(backend.decode_datum(datums[col], props.type_oids[col])?);
            }
        }
        rows.push(catalog_row(&values)?);
    }
    Ok(rows)
}

fn catalog_row(values: &[RowValues]) -> Result<CatalogRow, SpiBridgeError> {
    let type_kind = text_at(values, 3)?.chars().next().ok_or_else(|| {
        SpiBridgeError::State("type catalog row has an empty typtype".to_string())
    })?;
    Ok(CatalogRow {
        namespace: text_at(values, 0)?,
        oid: oid_at(values, 1)?.ok_or_else(|| {
            SpiBridgeError::State("type catalog row has a null oid".to_string())
        })?,
        name: text_at(values, 2)?,
        type_kind,
        element_oid: oid_at(values, 5)?,
    })
}

fn text_at(values: &[RowValues], idx: usize) -> Result<String, SpiBridgeError> {
    match &values[idx] {
        RowValues::Text(text) => Ok(text.clone()),
        other => Err(SpiBridgeError::State(format!(
            "type catalog column {idx} should be text, got {}",
            other.kind()
        ))),
    }
}

fn oid_at(values: &[RowValues], idx: usize) -> Result<Option<Oid>, SpiBridgeError> {
    match &values[idx] {
        RowValues::Null => Ok(None),
        RowValues::Int(value) => Oid::try_from(*value).map(Some).map_err(|e| {
            SpiBridgeError::State(format!("type catalog column {idx} is not an OID: {e}"))
        }),
        RowValues::Text(text) => text.parse::<Oid>().map(Some).map_err(|e| {
            SpiBridgeError::State(format!("type catalog column {idx} is not an OID: {e}"))
        }),
        other => Err(SpiBridgeError::State(format!(
            "type catalog column {idx} should be an OID, got {}",
            other.kind()
        ))),
    }
}
