//! Stacked, rollback-capable trace line accounting.
//!
//! Every executed transaction adds trace rows to several independent proof
//! modules. While a transaction is being tried for inclusion, its rows live
//! in a speculative generation that is either kept or dropped.
//!
//! # Containers
//!
//! | Container       | Duplicates        | Typical use                        |
//! |-----------------|-------------------|------------------------------------|
//! | [`StackedSet`]  | counted once      | conflation-wide deduplicated ops   |
//! | [`StackedList`] | counted each time | nested per-transaction trials      |
//! | [`CountOnly`]   | n/a (counts only) | modules that only need row totals  |
//!
//! All three implement [`StackedContainer`]. Mis-paired `enter`/`pop` calls
//! panic instead of silently corrupting the row budget.
//!
//! # Modules
//!
//! [`TracedModule`] is the single capability the budgeting core depends on:
//! report a cumulative line count under a name. [`ModuleRegistry`] aggregates
//! modules into [`LineCounts`](tracelimit_types::LineCounts), and
//! [`LineCountTracer`] is the seam to the external tracer.

mod container;
mod count_only;
mod module;
mod operation;
mod stacked_list;
mod stacked_set;
mod tracer;

pub use container::StackedContainer;
pub use count_only::CountOnly;
pub use module::{CountModule, ListModule, ModuleRegistry, RegistryError, SetModule, TracedModule};
pub use operation::{Counted, LineCountable, ModuleOperation};
pub use stacked_list::StackedList;
pub use stacked_set::StackedSet;
pub use tracer::{LineCountTracer, TracerError};
