use crate::error::SpiBridgeError;
use crate::spi::{Datum, NOT_NULL_MARKER, NULL_MARKER, SpiBackend};
use crate::types::{DbType, Oid, RowValues};

/// A value bound to a command.
///
/// A parameter without a name is positional and binds to `$n` by its index; a named
/// parameter binds to `@name` / `:name` placeholders in the command text.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Option<String>,
    pub db_type: Option<DbType>,
    pub value: RowValues,
}

impl Parameter {
    #[must_use]
    pub fn positional(value: RowValues) -> Self {
        Self {
            name: None,
            db_type: None,
            value,
        }
    }

    /// A named parameter. A leading `@` or `:` in `name` is ignored.
    #[must_use]
    pub fn named(name: impl Into<String>, value: RowValues) -> Self {
        let name: String = name.into();
        let trimmed = name.trim_start_matches(['@', ':']).to_string();
        Self {
            name: Some(trimmed),
            db_type: None,
            value,
        }
    }

    #[must_use]
    pub fn with_db_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    #[must_use]
    pub fn is_positional(&self) -> bool {
        self.name.as_deref().is_none_or(str::is_empty)
    }

    /// Declared type when present, otherwise inferred from the value.
    #[must_use]
    pub fn type_oid(&self) -> Oid {
        self.db_type
            .map_or_else(|| self.value.inferred_oid(), DbType::oid)
    }
}

/// How the parameters of a batch bind to placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingStyle {
    Positional,
    Named,
}

/// Determine the binding style shared by every parameter list of a batch.
///
/// Returns `None` when no list carries parameters.
///
/// # Errors
/// Returns `SpiBridgeError::ParameterBinding` when positional and named parameters are mixed.
pub fn batch_binding_style<'a>(
    lists: impl IntoIterator<Item = &'a [Parameter]>,
) -> Result<Option<BindingStyle>, SpiBridgeError> {
    let mut style = None;
    for param in lists.into_iter().flatten() {
        let this = if param.is_positional() {
            BindingStyle::Positional
        } else {
            BindingStyle::Named
        };
        match style {
            None => style = Some(this),
            Some(seen) if seen != this => {
                return Err(SpiBridgeError::ParameterBinding(
                    "Mixing named and positional parameters isn't supported".to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(style)
}

/// Order named parameters by the `$n` positions a statement was rewritten to.
///
/// # Errors
/// Returns `SpiBridgeError::ParameterBinding` when a placeholder has no matching parameter.
pub fn bind_named(names: &[String], params: &[Parameter]) -> Result<Vec<Parameter>, SpiBridgeError> {
    names
        .iter()
        .map(|name| {
            let exact = params.iter().find(|p| p.name.as_deref() == Some(name.as_str()));
            let found = exact.or_else(|| {
                params.iter().find(|p| {
                    p.name
                        .as_deref()
                        .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
                })
            });
            found.cloned().ok_or_else(|| {
                SpiBridgeError::ParameterBinding(format!(
                    "No parameter named '{name}' was supplied"
                ))
            })
        })
        .collect()
}

/// Native argument vectors for one plan execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedArgs {
    pub type_oids: Vec<Oid>,
    pub datums: Vec<Datum>,
    pub nulls: Vec<u8>,
}

/// Resolve each parameter's type and encode its value through the backend codecs.
///
/// # Errors
/// Returns codec failures from the backend.
pub fn serialize<B: SpiBackend + ?Sized>(
    backend: &mut B,
    params: &[Parameter],
) -> Result<SerializedArgs, SpiBridgeError> {
    let mut args = SerializedArgs {
        type_oids: Vec::with_capacity(params.len()),
        datums: Vec::with_capacity(params.len()),
        nulls: Vec::with_capacity(params.len()),
    };

    for param in params {
        let type_oid = param.type_oid();
        args.type_oids.push(type_oid);
        if param.value.is_null() {
            args.datums.push(Datum::NULL);
            args.nulls.push(NULL_MARKER);
        } else {
            args.datums.push(backend.encode_datum(type_oid, &param.value)?);
            args.nulls.push(NOT_NULL_MARKER);
        }
    }
    Ok(args)
}
