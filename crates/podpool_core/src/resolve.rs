//! Cross-pod resolution: link resolution, binding and ordering.
//!
//! Resolution runs in three phases over all registered pods, in registration
//! order:
//!
//! 1. Reference links are resolved through their owning pod and every export
//!    is registered by identifier or by value type.
//! 2. Imports and filters are bound to their export; filter lists are sorted
//!    by descending priority, ties kept in discovery order.
//! 3. A depth-first walk over the dependency relation produces the setup
//!    sequence and detects cycles.
//!
//! Every phase overwrites what the previous run left behind, so resolving
//! the same pods twice yields the same result.

use core::any::TypeId;
use core::cmp::Reverse;
use core::mem;

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use tracing::{debug, debug_span};

use crate::descriptor::TypeInfo;
use crate::entry::{EntryHeader, EntryRef, Target};
use crate::error::{EntryFault, Error};
use crate::pod::{ErasedPod, PodRecord};

/// Ends of the resolved setup sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Sequence {
    pub(crate) head: Option<usize>,
    pub(crate) tail: Option<usize>,
}

/// Resolves all pods and links them into a setup sequence.
///
/// Links are cleared first, so on failure no pod is linked.
pub(crate) fn resolve(pods: &mut [PodRecord], ref_link_prefix: char) -> Result<Sequence, Error> {
    let _span = debug_span!("resolve", pods = pods.len()).entered();

    unlink(pods);

    let index = resolve_links(pods, ref_link_prefix)?;
    debug!(
        by_id = index.by_id.len(),
        by_type = index.by_type.len(),
        "registered exports"
    );

    bind(pods, &index)?;
    debug!("bound imports and filters");

    let sequence = order(pods)?;
    debug!(?sequence, "ordered pods");

    Ok(link(pods, &sequence))
}

// ─────────────────────────────────────────────────────────────────────────────
// Phase 1: links and export registration
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ExportSite {
    at: EntryRef,
    path: String,
    value_type: TypeInfo,
}

/// Registered exports; each one lives in exactly one table.
#[derive(Debug, Default)]
struct ExportIndex {
    by_id: HashMap<String, ExportSite>,
    by_type: HashMap<TypeId, ExportSite>,
}

impl ExportIndex {
    fn register(&mut self, at: EntryRef, header: &EntryHeader) -> Result<(), EntryFault> {
        let site = ExportSite {
            at,
            path: header.path.clone(),
            value_type: header.value_type,
        };

        match header.target() {
            Target::ByType => match self.by_type.entry(header.value_type.id) {
                Entry::Occupied(existing) => Err(EntryFault::DuplicateFieldType {
                    conflicting: existing.get().path.clone(),
                    field_type: header.value_type.name,
                }),
                Entry::Vacant(slot) => {
                    slot.insert(site);
                    Ok(())
                }
            },
            Target::Id(id) => match self.by_id.entry(id.clone()) {
                Entry::Occupied(existing) => Err(EntryFault::DuplicateRefId {
                    conflicting: existing.get().path.clone(),
                    ref_id: id.clone(),
                }),
                Entry::Vacant(slot) => {
                    slot.insert(site);
                    Ok(())
                }
            },
        }
    }

    fn lookup(&self, target: &Target, value_type: TypeInfo) -> Result<&ExportSite, EntryFault> {
        match target {
            Target::ByType => {
                self.by_type
                    .get(&value_type.id)
                    .ok_or(EntryFault::NotFoundByFieldType {
                        field_type: value_type.name,
                    })
            }
            Target::Id(id) => {
                let site = self
                    .by_id
                    .get(id)
                    .ok_or_else(|| EntryFault::NotFoundByRefId { ref_id: id.clone() })?;

                if site.value_type != value_type {
                    return Err(EntryFault::FieldTypeMismatch {
                        field_type: value_type.name,
                        expected: site.value_type.name,
                        export: site.path.clone(),
                    });
                }
                Ok(site)
            }
        }
    }
}

fn resolve_link(
    pod: &dyn ErasedPod,
    header: &mut EntryHeader,
    prefix: char,
) -> Result<(), EntryFault> {
    let id = if header.is_ref_link(prefix) {
        pod.resolve_ref_link(&header.declared_id)
            .ok_or_else(|| EntryFault::UnresolvableRefLink {
                ref_link: header.declared_id.clone(),
            })?
    } else {
        header.declared_id.clone()
    };

    header.resolve_to(id);
    Ok(())
}

fn resolve_links(pods: &mut [PodRecord], prefix: char) -> Result<ExportIndex, Error> {
    let mut index = ExportIndex::default();

    for (pod, record) in pods.iter_mut().enumerate() {
        let cell = &*record.cell;
        let entries = &mut record.entries;

        for import in &mut entries.imports {
            resolve_link(cell, &mut import.header, prefix)
                .map_err(|fault| Error::import(&import.header.path, fault))?;
        }

        for (entry, export) in entries.exports.iter_mut().enumerate() {
            resolve_link(cell, &mut export.header, prefix)
                .and_then(|()| index.register(EntryRef::new(pod, entry), &export.header))
                .map_err(|fault| Error::export(&export.header.path, fault))?;
        }

        for filter in &mut entries.filters {
            resolve_link(cell, &mut filter.header, prefix)
                .map_err(|fault| Error::filter(&filter.header.path, fault))?;
        }
    }

    Ok(index)
}

// ─────────────────────────────────────────────────────────────────────────────
// Phase 2: binding
// ─────────────────────────────────────────────────────────────────────────────

fn bind(pods: &mut [PodRecord], index: &ExportIndex) -> Result<(), Error> {
    for pod in 0..pods.len() {
        for import in &mut pods[pod].entries.imports {
            let site = index
                .lookup(import.header.target(), import.header.value_type)
                .map_err(|fault| Error::import(&import.header.path, fault))?;
            import.export = Some(site.at);
        }

        for entry in 0..pods[pod].entries.filters.len() {
            let filter = &pods[pod].entries.filters[entry];
            let site = index
                .lookup(filter.header.target(), filter.header.value_type)
                .map_err(|fault| Error::filter(&filter.header.path, fault))?;

            let at = EntryRef::new(pod, entry);
            let attached = &mut pods[site.at.pod].entries.exports[site.at.entry].filters;
            if !attached.contains(&at) {
                attached.push(at);
            }
        }
    }

    for pod in 0..pods.len() {
        for entry in 0..pods[pod].entries.exports.len() {
            let mut attached = mem::take(&mut pods[pod].entries.exports[entry].filters);
            attached.sort_by_key(|at| {
                (
                    Reverse(pods[at.pod].entries.filters[at.entry].priority),
                    *at,
                )
            });
            pods[pod].entries.exports[entry].filters = attached;
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Phase 3: ordering
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Visit {
    #[default]
    Unvisited,
    OnStack,
    Finished,
}

/// One pod on the traversal stack.
#[derive(Debug, Clone, Copy)]
struct Frame<'a> {
    /// Entry of the previous pod that led here; empty for roots.
    trigger: &'a str,
    /// Entry of this pod currently being followed.
    active: &'a str,
}

impl Frame<'_> {
    fn render(&self, out: &mut String) {
        out.push_str(self.trigger);
        if !self.trigger.is_empty() && !self.active.is_empty() {
            out.push_str(" ... ");
        }
        out.push_str(self.active);
    }
}

struct Ordering<'a> {
    pods: &'a [PodRecord],
    states: Vec<Visit>,
    stack: Vec<Frame<'a>>,
    sequence: Vec<usize>,
}

impl<'a> Ordering<'a> {
    fn visit(&mut self, pod: usize, trigger: &'a str) -> Result<(), Error> {
        match self.states[pod] {
            Visit::Finished => return Ok(()),
            Visit::OnStack => {
                self.stack.push(Frame { trigger, active: "" });
                return Err(Error::CircularDependency {
                    trace: self.trace(),
                });
            }
            Visit::Unvisited => {}
        }

        self.states[pod] = Visit::OnStack;
        self.stack.push(Frame { trigger, active: "" });

        let pods = self.pods;
        let entries = &pods[pod].entries;

        for import in &entries.imports {
            self.set_active(&import.header.path);
            let at = import
                .export
                .expect("import ordered before binding (this is a bug)");
            let export = &pods[at.pod].entries.exports[at.entry];
            self.visit(at.pod, &export.header.path)?;
        }

        for export in &entries.exports {
            self.set_active(&export.header.path);
            for at in &export.filters {
                // a pod filtering its own export does not depend on itself
                if at.pod == pod {
                    continue;
                }
                let filter = &pods[at.pod].entries.filters[at.entry];
                self.visit(at.pod, &filter.header.path)?;
            }
        }

        self.stack.pop();
        self.states[pod] = Visit::Finished;
        self.sequence.push(pod);
        Ok(())
    }

    fn set_active(&mut self, path: &'a str) {
        if let Some(frame) = self.stack.last_mut() {
            frame.active = path;
        }
    }

    fn trace(&self) -> String {
        let mut trace = String::new();
        for (i, frame) in self.stack.iter().enumerate() {
            if i > 0 {
                trace.push_str(" -> ");
            }
            frame.render(&mut trace);
        }
        trace
    }
}

fn order(pods: &[PodRecord]) -> Result<Vec<usize>, Error> {
    let mut ordering = Ordering {
        pods,
        states: vec![Visit::Unvisited; pods.len()],
        stack: Vec::new(),
        sequence: Vec::with_capacity(pods.len()),
    };

    for pod in 0..pods.len() {
        ordering.visit(pod, "")?;
    }

    Ok(ordering.sequence)
}

fn unlink(pods: &mut [PodRecord]) {
    for record in pods {
        record.prev = None;
        record.next = None;
    }
}

fn link(pods: &mut [PodRecord], sequence: &[usize]) -> Sequence {
    for pair in sequence.windows(2) {
        pods[pair[0]].next = Some(pair[1]);
        pods[pair[1]].prev = Some(pair[0]);
    }

    Sequence {
        head: sequence.first().copied(),
        tail: sequence.last().copied(),
    }
}
