//! Registration-time validation of pod entries.
//!
//! Every check here depends only on the pod type, so a failing `register`
//! leaves the pool untouched.

mod common;

use core::any::type_name;

use common::{Journal, init_tracing};
use podpool_core::prelude::*;

fn rejected<P: Pod>(pod: P) -> Error {
    init_tracing();

    let mut pool = PodPool::new();
    let err = match pool.register(pod) {
        Ok(id) => panic!("registered {id} unexpectedly"),
        Err(err) => err,
    };
    assert!(pool.is_empty(), "a rejected pod must not be kept");
    err
}

fn path_of<P>(field: &str) -> String {
    format!("{}.{field}", type_name::<P>())
}

// ─────────────────────────────────────────────────────────────────────────
// Pod shape
// ─────────────────────────────────────────────────────────────────────────

#[derive(Default, Entries)]
struct Inert {
    _journal: Journal,
}

impl Pod for Inert {}

#[test]
fn pod_without_entries_is_invalid() {
    let err = rejected(Inert::default());
    assert_eq!(err.kind(), ErrorKind::InvalidPod);
    assert!(matches!(
        err,
        Error::InvalidPod {
            pod_type,
            reason: InvalidPodReason::NoEntries,
        } if pod_type == type_name::<Inert>()
    ));
    assert_eq!(
        err.to_string(),
        format!(
            "invalid pod `{}`: no import/export/filter entry",
            type_name::<Inert>()
        )
    );
}

struct Scalar;

impl Entries for Scalar {
    fn entries() -> Descriptor<Self> {
        Descriptor::<Self>::opaque()
    }
}

impl Pod for Scalar {}

#[test]
fn non_record_pod_is_invalid() {
    let err = rejected(Scalar);
    assert!(matches!(
        err,
        Error::InvalidPod {
            reason: InvalidPodReason::WrongShape,
            ..
        }
    ));
}

#[derive(Default, Entries)]
struct OnlyOpaque {
    #[pod(embed)]
    pub inner: Opaque,
}

#[derive(Default)]
struct Opaque;

impl Entries for Opaque {
    fn entries() -> Descriptor<Self> {
        Descriptor::<Self>::opaque()
    }
}

impl Pod for OnlyOpaque {}

#[test]
fn embedding_an_opaque_type_adds_nothing() {
    let err = rejected(OnlyOpaque::default());
    assert!(matches!(
        err,
        Error::InvalidPod {
            reason: InvalidPodReason::NoEntries,
            ..
        }
    ));
}

// ─────────────────────────────────────────────────────────────────────────
// Field checks
// ─────────────────────────────────────────────────────────────────────────

#[derive(Default, Entries)]
struct Hidden {
    #[pod(import = "secret")]
    secret: Import<String>,
}

impl Pod for Hidden {}

#[test]
fn private_field_is_rejected() {
    let err = rejected(Hidden::default());
    assert_eq!(err.kind(), ErrorKind::BadImportEntry);
    assert_eq!(err.fault(), Some(&EntryFault::FieldNotPublic));
    assert_eq!(
        err.to_string(),
        format!("bad import entry `{}`: field not public", path_of::<Hidden>("secret"))
    );
}

#[derive(Default, Entries)]
struct DirectFilter {
    #[pod(filter = "greeting,touch,0")]
    pub greeting: Export<String>,
}

impl DirectFilter {
    fn touch(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
        Ok(())
    }
}

impl Pod for DirectFilter {}

#[test]
fn filter_must_point_at_an_export() {
    let err = rejected(DirectFilter::default());
    assert_eq!(err.kind(), ErrorKind::BadFilterEntry);
    assert_eq!(
        err.fault(),
        Some(&EntryFault::NonIndirectFieldType {
            field_type: type_name::<Export<String>>(),
        })
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Filter tag arguments
// ─────────────────────────────────────────────────────────────────────────

#[derive(Default, Entries)]
struct NoMethod {
    #[pod(filter = "greeting")]
    pub greeting: Filter<String>,
}

impl Pod for NoMethod {}

#[derive(Default, Entries)]
struct BlankMethod {
    #[pod(filter = "greeting, ,5")]
    pub greeting: Filter<String>,
}

impl Pod for BlankMethod {}

#[test]
fn missing_method_name_is_rejected() {
    for err in [rejected(NoMethod::default()), rejected(BlankMethod::default())] {
        assert_eq!(err.kind(), ErrorKind::BadFilterEntry);
        assert_eq!(err.fault(), Some(&EntryFault::MissingMethodName));
    }
}

struct Unlisted {
    greeting: Filter<String>,
}

impl Entries for Unlisted {
    fn entries() -> Descriptor<Self> {
        let mut descriptor = Descriptor::<Self>::record();
        descriptor.filter("greeting", "greeting,polish,0", |pod| &mut pod.greeting);
        descriptor
    }
}

impl Pod for Unlisted {}

#[test]
fn unknown_method_is_rejected() {
    let err = rejected(Unlisted {
        greeting: Filter::new(),
    });
    assert_eq!(
        err.fault(),
        Some(&EntryFault::MethodUndefined {
            method: "polish".to_owned(),
        })
    );
}

#[derive(Default, Entries)]
struct NoContext {
    #[pod(filter = "greeting,polish,0")]
    pub greeting: Filter<String>,
}

impl NoContext {
    fn polish(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

impl Pod for NoContext {}

#[derive(Default, Entries)]
struct Infallible {
    #[pod(filter = "greeting,polish,0")]
    pub greeting: Filter<String>,
}

impl Infallible {
    fn polish(&mut self, _ctx: &SetupContext) {}
}

impl Pod for Infallible {}

#[test]
fn method_with_wrong_signature_is_rejected() {
    let err = rejected(NoContext::default());
    assert_eq!(
        err.fault(),
        Some(&EntryFault::SignatureMismatch {
            method: "polish".to_owned(),
            expected: podpool_core::descriptor::FILTER_SIGNATURE,
            found: "fn(&mut Self) -> Result<(), HookError>",
        })
    );

    let err = rejected(Infallible::default());
    assert!(matches!(
        err.fault(),
        Some(EntryFault::SignatureMismatch { found, .. })
            if *found == "fn(&mut Self, &SetupContext)"
    ));
}

#[derive(Default, Entries)]
struct NoPriority {
    #[pod(filter = "greeting,polish")]
    pub greeting: Filter<String>,
}

impl NoPriority {
    fn polish(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
        Ok(())
    }
}

impl Pod for NoPriority {}

#[derive(Default, Entries)]
struct WordPriority {
    #[pod(filter = "greeting,polish,first")]
    pub greeting: Filter<String>,
}

impl WordPriority {
    fn polish(&mut self, _ctx: &SetupContext) -> Result<(), HookError> {
        Ok(())
    }
}

impl Pod for WordPriority {}

#[test]
fn priority_must_be_present_and_numeric() {
    let err = rejected(NoPriority::default());
    assert_eq!(err.fault(), Some(&EntryFault::MissingPriority));

    let err = rejected(WordPriority::default());
    assert!(matches!(
        err.fault(),
        Some(EntryFault::PriorityParse { priority, .. }) if priority == "first"
    ));
    assert!(core::error::Error::source(err.fault().unwrap()).is_some());
    assert!(
        err.to_string()
            .starts_with(&format!("bad filter entry `{}`", path_of::<WordPriority>("greeting")))
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Ordering of checks
// ─────────────────────────────────────────────────────────────────────────

#[derive(Default, Entries)]
struct FirstFaultWins {
    #[pod(export = "fine")]
    pub fine: Export<u8>,
    #[pod(filter = "fine,,x")]
    hidden: Filter<u8>,
    #[pod(filter = "fine")]
    pub later: Filter<u8>,
}

impl Pod for FirstFaultWins {}

#[test]
fn first_faulty_entry_is_reported() {
    let err = rejected(FirstFaultWins::default());
    assert!(matches!(
        &err,
        Error::BadFilterEntry {
            path,
            fault: EntryFault::FieldNotPublic,
        } if *path == path_of::<FirstFaultWins>("hidden")
    ));
}

#[test]
fn rejection_keeps_earlier_registrations() {
    init_tracing();

    let mut pool = PodPool::new();
    let first = pool.register(NoContextFree::default()).unwrap();
    assert!(pool.register(NoPriority::default()).is_err());

    let second = pool.register(NoContextFree::default()).unwrap();
    assert_eq!(pool.len(), 2);
    assert_eq!(first.index(), 0);
    assert_eq!(second.index(), 1);
    assert_eq!(second.to_string(), format!("{}#1", type_name::<NoContextFree>()));
}

#[derive(Default, Entries)]
struct NoContextFree {
    #[pod(export)]
    pub value: Export<u16>,
}

impl Pod for NoContextFree {}
