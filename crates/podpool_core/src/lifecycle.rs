//! Setup and teardown over a resolved pod sequence.
//!
//! Setup walks the sequence forward. For each pod it fills the imports, runs
//! the pod's setup hook and then runs every filter attached to the pod's
//! exports, in priority order. If any step fails, the pods set up so far are
//! torn down in reverse and the error is returned.
//!
//! Teardown walks the sequence backward and never fails.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug_span, trace, warn};

use crate::context::SetupContext;
use crate::entry::EntryRef;
use crate::error::Error;
use crate::pod::PodRecord;
use crate::slot::SharedCell;

/// Sets up every pod from `head` on, following `next` links.
///
/// On failure, every pod that completed setup is torn down before the error
/// is returned.
pub(crate) fn set_up(
    pods: &mut [PodRecord],
    head: Option<usize>,
    ctx: &SetupContext,
) -> Result<(), Error> {
    let _span = debug_span!("set_up", pods = pods.len()).entered();

    let mut cursor = head;
    while let Some(index) = cursor {
        if let Err(err) = set_up_pod(pods, index, ctx) {
            warn!(pod = %pods[index].id, error = %err, "pod setup failed, rolling back");
            tear_down_from(pods, pods[index].prev);
            return Err(err);
        }
        cursor = pods[index].next;
    }

    Ok(())
}

/// Tears down every pod from `tail` back, following `prev` links.
pub(crate) fn tear_down(pods: &mut [PodRecord], tail: Option<usize>) {
    let _span = debug_span!("tear_down", pods = pods.len()).entered();
    tear_down_from(pods, tail);
}

fn tear_down_from(pods: &mut [PodRecord], tail: Option<usize>) {
    let mut cursor = tail;
    while let Some(index) = cursor {
        tear_down_pod(&mut pods[index]);
        cursor = pods[index].prev;
    }
}

fn set_up_pod(pods: &mut [PodRecord], index: usize, ctx: &SetupContext) -> Result<(), Error> {
    trace!(pod = %pods[index].id, "setting up pod");

    for entry in 0..pods[index].entries.imports.len() {
        let import = &pods[index].entries.imports[entry];
        let field = import.header.field;
        let at = import
            .export
            .expect("import set up before binding (this is a bug)");

        let cell = export_cell(pods, at);
        pods[index].cell.slot(field).bind(&cell);
    }

    let record = &mut pods[index];
    record
        .cell
        .set_up(ctx)
        .map_err(|source| Error::SetupFailed {
            pod: record.id,
            source,
        })?;

    if let Err(err) = run_filters(pods, index, ctx) {
        // the pod's own hook already ran, so it is not part of the rollback
        tear_down_pod(&mut pods[index]);
        return Err(err);
    }

    Ok(())
}

fn run_filters(pods: &mut [PodRecord], index: usize, ctx: &SetupContext) -> Result<(), Error> {
    for entry in 0..pods[index].entries.exports.len() {
        let attached = pods[index].entries.exports[entry].filters.clone();
        if attached.is_empty() {
            continue;
        }

        let cell = export_cell(pods, EntryRef::new(index, entry));
        for at in &attached {
            let field = pods[at.pod].entries.filters[at.entry].header.field;
            pods[at.pod].cell.slot(field).bind(&cell);
        }

        for at in &attached {
            let hook = pods[at.pod].entries.filters[at.entry].hook;
            trace!(
                filter = %pods[at.pod].entries.filters[at.entry].header.path,
                export = %pods[index].entries.exports[entry].header.path,
                "running filter"
            );

            if let Err(source) = pods[at.pod].cell.run_filter(hook, ctx) {
                return Err(Error::FilterFailed {
                    pod: pods[index].id,
                    filter: pods[at.pod].entries.filters[at.entry].header.path.clone(),
                    source,
                });
            }
        }
    }

    Ok(())
}

fn export_cell(pods: &mut [PodRecord], at: EntryRef) -> SharedCell {
    let field = pods[at.pod].entries.exports[at.entry].header.field;
    pods[at.pod]
        .cell
        .slot(field)
        .shared_cell()
        .expect("export entry without a shared cell (this is a bug)")
}

/// Runs the pod's teardown hook, then clears all of its slots.
fn tear_down_pod(record: &mut PodRecord) {
    trace!(pod = %record.id, "tearing down pod");

    let cell = &mut record.cell;
    if panic::catch_unwind(AssertUnwindSafe(|| cell.tear_down())).is_err() {
        warn!(pod = %record.id, "pod teardown hook panicked, clearing its slots anyway");
    }

    for field in 0..record.cell.field_count() {
        record.cell.slot(field).clear();
    }
}
