//! Actor side: the capability trait, the internal namespace and the runtime
//! that routes requests to one instance.

pub mod context;
pub mod lifecycle;
pub mod runtime;
pub mod state;
pub(crate) mod tagged;
pub mod traits;

pub use context::{ActorContext, RequestInfo};
pub use lifecycle::StateLifecycle;
pub use runtime::{DestroyOptions, DurableRuntime};
pub use traits::{Args, DurableObject, Reply};
