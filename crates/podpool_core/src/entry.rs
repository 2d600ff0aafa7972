//! Import, export and filter entries and their registration-time parsing.
//!
//! Parsing turns a pod's [`Descriptor`](crate::descriptor::Descriptor) into a
//! [`PodRecord`]. All checks that depend only on the pod type run here, so a
//! pod that registers successfully can only fail later on cross-pod wiring.

use core::any::type_name;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::{
    Descriptor, Extracted, FILTER_SIGNATURE, FieldAccess, FilterHook, RawEntry, Role, TypeInfo,
    Visibility,
};
use crate::error::{EntryFault, Error, InvalidPodReason};
use crate::pod::{Pod, PodCell, PodId, PodRecord};

/// Address of an entry: pod index in the pool and entry index within that
/// pod's list of the same role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct EntryRef {
    pub(crate) pod: usize,
    pub(crate) entry: usize,
}

impl EntryRef {
    pub(crate) const fn new(pod: usize, entry: usize) -> Self {
        Self { pod, entry }
    }
}

/// What an entry points at once its identifier is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Match the export registered for the entry's value type.
    ByType,
    /// Match the export registered under this identifier.
    Id(String),
}

impl Target {
    fn from_id(id: String) -> Self {
        if id.is_empty() { Self::ByType } else { Self::Id(id) }
    }
}

/// Fields shared by every entry kind.
#[derive(Debug)]
pub(crate) struct EntryHeader {
    pub(crate) path: String,
    /// Identifier as declared; may be a reference link.
    pub(crate) declared_id: String,
    /// Set by link resolution.
    pub(crate) target: Option<Target>,
    pub(crate) value_type: TypeInfo,
    /// Accessor index in the pod cell.
    pub(crate) field: usize,
}

impl EntryHeader {
    fn new(path: String, declared_id: String, value_type: TypeInfo, field: usize) -> Self {
        Self {
            path,
            declared_id,
            target: None,
            value_type,
            field,
        }
    }

    /// Returns true if the declared identifier is a reference link.
    pub(crate) fn is_ref_link(&self, prefix: char) -> bool {
        self.declared_id.starts_with(prefix)
    }

    /// Records the identifier the entry resolves to.
    pub(crate) fn resolve_to(&mut self, id: String) {
        self.target = Some(Target::from_id(id));
    }

    pub(crate) fn target(&self) -> &Target {
        self.target
            .as_ref()
            .expect("entry target read before link resolution (this is a bug)")
    }
}

#[derive(Debug)]
pub(crate) struct ImportEntry {
    pub(crate) header: EntryHeader,
    pub(crate) export: Option<EntryRef>,
}

#[derive(Debug)]
pub(crate) struct ExportEntry {
    pub(crate) header: EntryHeader,
    /// Attached filters, sorted by descending priority once bound.
    pub(crate) filters: Vec<EntryRef>,
}

#[derive(Debug)]
pub(crate) struct FilterEntry {
    pub(crate) header: EntryHeader,
    pub(crate) priority: i64,
    /// Hook index in the pod cell.
    pub(crate) hook: usize,
}

/// The entries of one pod, in declaration order per role.
#[derive(Debug, Default)]
pub(crate) struct PodEntries {
    pub(crate) imports: Vec<ImportEntry>,
    pub(crate) exports: Vec<ExportEntry>,
    pub(crate) filters: Vec<FilterEntry>,
}

impl PodEntries {
    pub(crate) fn len(&self) -> usize {
        self.imports.len() + self.exports.len() + self.filters.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// The validated entries of a pod type with the accessors and hooks they
/// refer to by index.
pub(crate) struct Parsed<P> {
    pub(crate) entries: PodEntries,
    pub(crate) fields: Vec<Arc<dyn FieldAccess<P>>>,
    pub(crate) hooks: Vec<Arc<dyn FilterHook<P>>>,
}

/// Validates every declaration of `descriptor`.
pub(crate) fn parse<P: 'static>(descriptor: Descriptor<P>) -> Result<Parsed<P>, Error> {
    let pod_type = type_name::<P>();
    let Extracted {
        record,
        entries: raw_entries,
        groups,
    } = descriptor.extract();

    if !record {
        return Err(Error::InvalidPod {
            pod_type,
            reason: InvalidPodReason::WrongShape,
        });
    }

    let mut entries = PodEntries::default();
    let mut fields = Vec::with_capacity(raw_entries.len());
    let mut hooks: Vec<Arc<dyn FilterHook<P>>> = Vec::new();

    for raw in raw_entries {
        let RawEntry {
            role,
            path,
            visibility,
            args,
            field_type,
            value_type,
            indirect,
            access,
            group,
        } = raw;

        let fail = |fault| match role {
            Role::Import => Error::import(&path, fault),
            Role::Export => Error::export(&path, fault),
            Role::Filter => Error::filter(&path, fault),
        };

        if visibility != Visibility::Public {
            return Err(fail(EntryFault::FieldNotPublic));
        }

        let mut args = args.into_iter();
        let declared_id = args.next().unwrap_or_default();

        if role == Role::Filter {
            if !indirect {
                return Err(fail(EntryFault::NonIndirectFieldType {
                    field_type: field_type.name,
                }));
            }

            let method_name = args
                .next()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| fail(EntryFault::MissingMethodName))?;

            let method = groups
                .get(group)
                .and_then(|table| table.get(method_name.as_str()))
                .ok_or_else(|| {
                    fail(EntryFault::MethodUndefined {
                        method: method_name.clone(),
                    })
                })?;

            let hook = method.hook().ok_or_else(|| {
                fail(EntryFault::SignatureMismatch {
                    method: method_name.clone(),
                    expected: FILTER_SIGNATURE,
                    found: method.signature(),
                })
            })?;

            let priority = args
                .next()
                .ok_or_else(|| fail(EntryFault::MissingPriority))?;
            let priority = priority.parse::<i64>().map_err(|source| {
                fail(EntryFault::PriorityParse {
                    priority: priority.clone(),
                    source,
                })
            })?;

            hooks.push(Arc::clone(hook));
            fields.push(access);
            entries.filters.push(FilterEntry {
                header: EntryHeader::new(path, declared_id, value_type, fields.len() - 1),
                priority,
                hook: hooks.len() - 1,
            });
            continue;
        }

        fields.push(access);
        let header = EntryHeader::new(path, declared_id, value_type, fields.len() - 1);

        if role == Role::Import {
            entries.imports.push(ImportEntry {
                header,
                export: None,
            });
        } else {
            entries.exports.push(ExportEntry {
                header,
                filters: Vec::new(),
            });
        }
    }

    if entries.is_empty() {
        return Err(Error::InvalidPod {
            pod_type,
            reason: InvalidPodReason::NoEntries,
        });
    }

    Ok(Parsed {
        entries,
        fields,
        hooks,
    })
}

/// Parses `pod`'s entries and wraps it for the pool at `index`.
pub(crate) fn build<P: Pod>(index: usize, pod: P) -> Result<PodRecord, Error> {
    let Parsed {
        entries,
        fields,
        hooks,
    } = parse(P::entries())?;

    let id = PodId::new(index, type_name::<P>());
    debug!(
        pod = %id,
        imports = entries.imports.len(),
        exports = entries.exports.len(),
        filters = entries.filters.len(),
        "parsed pod entries"
    );

    Ok(PodRecord {
        id,
        cell: Box::new(PodCell { pod, fields, hooks }),
        entries,
        prev: None,
        next: None,
    })
}
