//! cuppa-core: the live view synchronization & projection engine.
//!
//! A [`LiveView`](live::LiveView) keeps a local, in-memory mirror of one
//! remote, permission-scoped collection correct and low-latency while the
//! bound source changes across view switches, the store pushes batches at
//! unpredictable times, and the user issues optimistic mutations that must
//! reconcile with server-confirmed state. Two derived projections — the
//! sorted/filtered table and the map markers — read the same mirror and
//! never become a second source of truth.
//!
//! # Conventions
//!
//! - **Errors**: engine operations return [`error::EngineError`]; module
//!   input types carry their own `thiserror` validation errors.
//! - **Logging**: `tracing` macros with structured fields.
//! - **Concurrency**: single-threaded; collaborators are held as
//!   `Rc<dyn _>` and all mirror writes flow through one exclusive path.

pub mod error;
pub mod live;
pub mod markers;
pub mod model;
pub mod mutate;
pub mod permissions;
pub mod places;
pub mod project;
pub mod scope;
pub mod session;
pub mod store;
pub mod sync;

pub use error::{EngineError, ErrorCode};
pub use live::LiveView;
pub use markers::{MapSurface, MarkerReconciler};
pub use model::{Category, Coordinates, Item, ItemDraft, ItemPatch, PriceLevel, Rating};
pub use mutate::{MutationCoordinator, QuickEdit};
pub use permissions::{Capabilities, PermissionGate};
pub use places::{PlaceCandidate, PlaceSearch};
pub use project::{CategoryFilter, ProjectionSpec, Projector, SearchQuery, SortDirection, SortField, SortSpec};
pub use scope::{CollectionPath, ViewScope};
pub use session::{IdentityProvider, Session};
pub use store::{ChangeBatch, MemoryStore, RemoteStore, StoreError, StoreSubscription};
pub use sync::{SubscriptionHandle, SyncEngine, SyncStatus};
