use std::sync::Arc;

use crate::types::Oid;

use super::display;

/// Kind of a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Base type, also used for pseudo-types such as `record` and `void`.
    Base,
    /// Array whose element type was registered before the array row was seen.
    Array(Arc<TypeDescriptor>),
}

/// One entry of the type registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub namespace: String,
    pub name: String,
    pub oid: Oid,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    #[must_use]
    pub fn base(namespace: impl Into<String>, name: impl Into<String>, oid: Oid) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            oid,
            kind: TypeKind::Base,
        }
    }

    #[must_use]
    pub fn array(
        namespace: impl Into<String>,
        name: impl Into<String>,
        oid: Oid,
        element: Arc<TypeDescriptor>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            oid,
            kind: TypeKind::Array(element),
        }
    }

    #[must_use]
    pub fn element(&self) -> Option<&TypeDescriptor> {
        match &self.kind {
            TypeKind::Array(element) => Some(element),
            TypeKind::Base => None,
        }
    }

    /// `schema.name` for every namespace.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// SQL-facing name without type modifiers, e.g. `integer` or `double precision[]`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.display_name_with_facets(-1)
    }

    /// SQL-facing name with the type modifier applied, e.g. `numeric(10,2)`.
    ///
    /// `type_modifier == -1` means the column carries no modifier.
    #[must_use]
    pub fn display_name_with_facets(&self, type_modifier: i32) -> String {
        match &self.kind {
            TypeKind::Array(element) => {
                format!("{}[]", element.display_name_with_facets(type_modifier))
            }
            TypeKind::Base => {
                let partial = display::partial_name_with_facets(&self.name, type_modifier);
                if self.namespace == "pg_catalog" {
                    partial
                } else {
                    format!("{}.{partial}", self.namespace)
                }
            }
        }
    }
}
