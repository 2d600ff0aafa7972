//! Error types for registration, resolution and setup.
//!
//! Every failure the pool can report is an [`Error`]. Callers that only care
//! about the category match on [`Error::kind`]; the [`Display`](core::fmt::Display)
//! output carries the full diagnostic, including entry paths and the wrapped
//! hook error where there is one.

use core::num::ParseIntError;

use thiserror::Error;

use crate::context::HookError;
use crate::pod::PodId;

/// Category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The pod has the wrong shape or declares no entries.
    InvalidPod,
    /// An import entry is malformed or cannot be resolved.
    BadImportEntry,
    /// An export entry is malformed or collides with another export.
    BadExportEntry,
    /// A filter entry is malformed or cannot be resolved.
    BadFilterEntry,
    /// The pods depend on each other in a cycle.
    CircularDependency,
    /// A pod's setup hook returned an error.
    SetupFailed,
    /// A filter hook returned an error.
    FilterFailed,
}

/// Errors returned by [`PodPool`](crate::pool::PodPool).
#[derive(Debug, Error)]
pub enum Error {
    /// The pod cannot be registered at all.
    #[error("invalid pod `{pod_type}`: {reason}")]
    InvalidPod {
        /// Type name of the rejected pod.
        pod_type: &'static str,
        /// Why it was rejected.
        reason: InvalidPodReason,
    },

    /// An import entry failed to parse or resolve.
    #[error("bad import entry `{path}`: {fault}")]
    BadImportEntry {
        /// Diagnostic path of the entry.
        path: String,
        /// What is wrong with it.
        fault: EntryFault,
    },

    /// An export entry failed to parse or register.
    #[error("bad export entry `{path}`: {fault}")]
    BadExportEntry {
        /// Diagnostic path of the entry.
        path: String,
        /// What is wrong with it.
        fault: EntryFault,
    },

    /// A filter entry failed to parse or resolve.
    #[error("bad filter entry `{path}`: {fault}")]
    BadFilterEntry {
        /// Diagnostic path of the entry.
        path: String,
        /// What is wrong with it.
        fault: EntryFault,
    },

    /// Ordering found a cycle.
    ///
    /// The trace lists one frame per pod on the traversal stack, each frame
    /// showing the entry that led into the pod and the entry being followed
    /// out of it.
    #[error("pod circular dependency: {trace}")]
    CircularDependency {
        /// Rendered traversal stack at the point the cycle closed.
        trace: String,
    },

    /// A pod's setup hook failed.
    #[error("pod `{pod}` setup failed: {source}")]
    SetupFailed {
        /// The pod whose hook failed.
        pod: PodId,
        /// The error returned by the hook.
        #[source]
        source: HookError,
    },

    /// A filter hook failed while its export's owner was being set up.
    #[error("filter `{filter}` failed while setting up pod `{pod}`: {source}")]
    FilterFailed {
        /// The pod owning the filtered export.
        pod: PodId,
        /// Diagnostic path of the failing filter entry.
        filter: String,
        /// The error returned by the hook.
        #[source]
        source: HookError,
    },
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPod { .. } => ErrorKind::InvalidPod,
            Self::BadImportEntry { .. } => ErrorKind::BadImportEntry,
            Self::BadExportEntry { .. } => ErrorKind::BadExportEntry,
            Self::BadFilterEntry { .. } => ErrorKind::BadFilterEntry,
            Self::CircularDependency { .. } => ErrorKind::CircularDependency,
            Self::SetupFailed { .. } => ErrorKind::SetupFailed,
            Self::FilterFailed { .. } => ErrorKind::FilterFailed,
        }
    }

    /// Returns true if this error is of the given category.
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Returns the entry fault for `Bad*Entry` errors.
    #[must_use]
    pub fn fault(&self) -> Option<&EntryFault> {
        match self {
            Self::BadImportEntry { fault, .. }
            | Self::BadExportEntry { fault, .. }
            | Self::BadFilterEntry { fault, .. } => Some(fault),
            _ => None,
        }
    }

    /// Returns the hook error wrapped by `SetupFailed` and `FilterFailed`.
    #[must_use]
    pub fn hook_error(&self) -> Option<&(dyn core::error::Error + Send + Sync + 'static)> {
        match self {
            Self::SetupFailed { source, .. } | Self::FilterFailed { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }

    pub(crate) fn import(path: &str, fault: EntryFault) -> Self {
        Self::BadImportEntry {
            path: path.to_owned(),
            fault,
        }
    }

    pub(crate) fn export(path: &str, fault: EntryFault) -> Self {
        Self::BadExportEntry {
            path: path.to_owned(),
            fault,
        }
    }

    pub(crate) fn filter(path: &str, fault: EntryFault) -> Self {
        Self::BadFilterEntry {
            path: path.to_owned(),
            fault,
        }
    }
}

/// Why a pod was rejected at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidPodReason {
    /// The pod's descriptor does not describe a record of fields.
    #[error("descriptor is not a record")]
    WrongShape,
    /// The pod declares no import, export or filter entry.
    #[error("no import/export/filter entry")]
    NoEntries,
}

/// What is wrong with a single entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryFault {
    /// The field is declared private.
    #[error("field not public")]
    FieldNotPublic,

    /// A filter was declared on a field that does not point at an export.
    #[error("non-indirect field type `{field_type}`")]
    NonIndirectFieldType {
        /// Type name of the field.
        field_type: &'static str,
    },

    /// The filter tag has no method argument.
    #[error("missing argument `method`")]
    MissingMethodName,

    /// The filter names a method that is not in the method table.
    #[error("method `{method}` undefined")]
    MethodUndefined {
        /// The method name from the tag.
        method: String,
    },

    /// The filter names a method with the wrong signature.
    #[error("method `{method}` has signature `{found}`, expected `{expected}`")]
    SignatureMismatch {
        /// The method name from the tag.
        method: String,
        /// The signature filter hooks must have.
        expected: &'static str,
        /// The signature the method was registered with.
        found: &'static str,
    },

    /// The filter tag has no priority argument.
    #[error("missing argument `priority`")]
    MissingPriority,

    /// The filter's priority is not an integer.
    #[error("priority `{priority}` parse failed: {source}")]
    PriorityParse {
        /// The priority argument as written.
        priority: String,
        /// The parse error.
        #[source]
        source: ParseIntError,
    },

    /// The owning pod could not resolve the entry's reference link.
    #[error("unresolvable ref link `{ref_link}`")]
    UnresolvableRefLink {
        /// The link as declared.
        ref_link: String,
    },

    /// No export is registered for the entry's value type.
    #[error("export entry not found by field type `{field_type}`")]
    NotFoundByFieldType {
        /// The value type looked up.
        field_type: &'static str,
    },

    /// No export is registered under the entry's identifier.
    #[error("export entry not found by ref id `{ref_id}`")]
    NotFoundByRefId {
        /// The identifier looked up.
        ref_id: String,
    },

    /// Another export without identifier already has this value type.
    #[error("duplicate field type `{field_type}`, conflicting export entry `{conflicting}`")]
    DuplicateFieldType {
        /// Path of the export registered first.
        conflicting: String,
        /// The shared value type.
        field_type: &'static str,
    },

    /// Another export already uses this identifier.
    #[error("duplicate ref id `{ref_id}`, conflicting export entry `{conflicting}`")]
    DuplicateRefId {
        /// Path of the export registered first.
        conflicting: String,
        /// The shared identifier.
        ref_id: String,
    },

    /// The export found by identifier has a different value type.
    #[error(
        "field type mismatch: `{field_type}` does not match `{expected}` of export entry `{export}`"
    )]
    FieldTypeMismatch {
        /// The entry's value type.
        field_type: &'static str,
        /// The export's value type.
        expected: &'static str,
        /// Path of the export.
        export: String,
    },
}
