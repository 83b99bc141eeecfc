//! Controller module for the etcd-operator.
//!
//! Contains the reconciliation loop and its supporting pieces:
//! - `reconciler`: the main reconcile function and error policy
//! - `ensure`: idempotent ensure steps for owned resources
//! - `conditions`: status condition tracking
//! - `context`: shared state passed to the reconciler
//! - `store`: API access seam for owned objects
//! - `error`: error types with retry classification

pub mod conditions;
pub mod context;
pub mod ensure;
pub mod error;
pub mod reconciler;
pub mod store;
