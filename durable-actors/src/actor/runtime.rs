//! Per-instance request router, lifecycle manager and persistence engine.
//!
//! # Request lifecycle
//!
//! ```text
//! record request → capture defaults (first request) → load (once)
//!   → route → fetch fallback → auto-persist → response
//! ```
//!
//! [`DurableRuntime::handle`] never fails: routing errors go through the
//! configured error handler, anything else becomes a 400.

use std::rc::Rc;

use http::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::actor::context::{RequestInfo, epoch_millis, from_epoch_millis};
use crate::actor::state;
use crate::actor::{ActorContext, Args, DurableObject, Reply, StateLifecycle};
use crate::config::DurableConfig;
use crate::error::ActorError;
use crate::namespace::{DurableId, Env};
use crate::protocol::{self, Action, builtin};
use crate::storage::DurableStorage;

/// Argument of the built-in `destroy` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DestroyOptions {
    /// Also restore the construction-time fields in memory.
    #[serde(default = "default_reset")]
    pub reset: bool,
}

fn default_reset() -> bool {
    true
}

impl Default for DestroyOptions {
    fn default() -> Self {
        Self { reset: true }
    }
}

/// One live actor instance: the user object plus its internal namespace.
pub struct DurableRuntime<A: DurableObject> {
    object: A,
    ctx: ActorContext,
}

impl<A: DurableObject> DurableRuntime<A> {
    /// Wrap a freshly constructed object.
    ///
    /// The object's current fields are the construction-time defaults used by
    /// `reset`.
    pub fn new(
        id: DurableId,
        object: A,
        storage: Rc<dyn DurableStorage>,
        env: Env,
        config: DurableConfig,
    ) -> Self {
        Self {
            object,
            ctx: ActorContext::new(id, storage, env, config),
        }
    }

    /// The user object.
    pub fn object(&self) -> &A {
        &self.object
    }

    /// The internal namespace.
    pub fn context(&self) -> &ActorContext {
        &self.ctx
    }

    /// Handle one inbound request.
    pub async fn handle(&mut self, request: Request<String>) -> Response<String> {
        match self.process(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(id = %self.ctx.id(), error = %err, "request failed");
                protocol::error_response(StatusCode::BAD_REQUEST, &err.to_string())
            }
        }
    }

    async fn process(&mut self, request: &Request<String>) -> Result<Response<String>, ActorError> {
        self.ctx.set_request(RequestInfo::from_request(request));
        self.capture_defaults()?;

        if !self.ctx.initialized() {
            if let Err(err) = self.load().await {
                // A store that no longer decodes can still be wiped.
                if !protocol::is_call(request, builtin::DESTROY) {
                    return Err(err);
                }
                tracing::warn!(id = %self.ctx.id(), error = %err, "load failed, destroying anyway");
            }
        } else if self.ctx.lifecycle() == StateLifecycle::Destroyed {
            self.ctx.transition(StateLifecycle::Loaded);
        }

        let mut response = match self.route(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(id = %self.ctx.id(), error = %err, "action failed");
                Some((self.ctx.config().on_error())(&err))
            }
        };

        if response.is_none() {
            response = self.object.fetch(&mut self.ctx, request).await?;
        }

        if self.ctx.config().auto_persist() && self.ctx.lifecycle().is_loaded() {
            self.persist().await?;
        }

        match response {
            Some(response) => Ok(response),
            None => {
                tracing::warn!(
                    id = %self.ctx.id(),
                    method = %request.method(),
                    uri = %request.uri(),
                    "unhandled request"
                );
                let err = ActorError::UnhandledRequest;
                Ok(protocol::error_response(err.status(), &err.to_string()))
            }
        }
    }

    fn capture_defaults(&mut self) -> Result<(), ActorError> {
        if self.ctx.default_state().is_none() {
            let snapshot =
                state::capture_snapshot(self.object.state(), self.ctx.config().codec().as_ref())?;
            self.ctx.set_default_state(snapshot);
        }
        Ok(())
    }

    /// Overlay the persisted fields onto the state and run `on_load`.
    pub async fn load(&mut self) -> Result<(), ActorError> {
        let fields = self.ctx.load_fields().await?;
        tracing::debug!(id = %self.ctx.id(), fields = fields.len(), "loaded persisted fields");

        state::apply_fields(self.object.state_mut(), fields)?;
        self.object.on_load(&mut self.ctx).await?;

        self.ctx.set_initialized(true);
        self.ctx.transition(StateLifecycle::Loaded);
        Ok(())
    }

    /// Dispatch `GET /do/{action}/{target}`. `Ok(None)` when the request
    /// does not match the route.
    async fn route(
        &mut self,
        request: &Request<String>,
    ) -> Result<Option<Response<String>>, ActorError> {
        let Some((action, target)) = protocol::match_route(request) else {
            return Ok(None);
        };
        let action =
            Action::parse(action).ok_or_else(|| ActorError::UnknownAction(action.to_string()))?;
        let content = match protocol::read_content(request)? {
            Some(text) => Some(
                serde_json::from_str::<Value>(text)
                    .map_err(|e| ActorError::InvalidContent(e.to_string()))?,
            ),
            None => None,
        };

        tracing::debug!(id = %self.ctx.id(), %action, member = target, "routing action");

        match action {
            Action::Call => {
                if let Some(reply) = self.call(target, Args::from_content(content)).await? {
                    return Ok(Some(reply.into_response()));
                }
            }
            Action::Set => {
                let value = content.unwrap_or(Value::Null);
                state::write_field(self.object.state_mut(), target, value)?;
            }
            Action::GetProp => {
                let value = state::read_field(self.object.state(), target)?;
                return Ok(Some(protocol::json_response(&value)));
            }
        }

        if self.ctx.config().auto_return() {
            return Ok(Some(protocol::json_response(&self.to_json()?)));
        }
        Ok(Some(protocol::no_content()))
    }

    /// Run a method by name: built-in lifecycle methods first, then the
    /// object's own.
    pub async fn call(&mut self, method: &str, args: Args) -> Result<Option<Reply>, ActorError> {
        match method {
            builtin::PERSIST => {
                self.persist().await?;
                Ok(None)
            }
            builtin::RESET => {
                self.reset()?;
                Ok(None)
            }
            builtin::DESTROY => {
                let options = args.get::<Option<DestroyOptions>>(0)?.unwrap_or_default();
                Ok(self.destroy(options).await?.map(Reply::Value))
            }
            builtin::GET_ALARM => {
                let at = self.ctx.get_alarm().await?.map(epoch_millis);
                Ok(Some(Reply::json(&at)?))
            }
            builtin::SET_ALARM => {
                let at = from_epoch_millis(args.get::<u64>(0)?);
                self.ctx.set_alarm(at).await?;
                Ok(None)
            }
            builtin::DELETE_ALARM => {
                self.ctx.delete_alarm().await?;
                Ok(None)
            }
            builtin::TO_JSON => Ok(Some(Reply::Value(self.to_json()?))),
            _ => self.object.invoke(&mut self.ctx, method, args).await,
        }
    }

    /// Write every persistable field to the store.
    pub async fn persist(&mut self) -> Result<(), ActorError> {
        self.ctx.persist(self.object.state()).await
    }

    /// Restore the construction-time fields in memory. The store is untouched.
    pub fn reset(&mut self) -> Result<(), ActorError> {
        let Some(snapshot) = self.ctx.default_state() else {
            return Ok(());
        };
        state::restore_snapshot(
            self.object.state_mut(),
            self.ctx.config().codec().as_ref(),
            snapshot,
        )?;
        tracing::debug!(id = %self.ctx.id(), "state reset to defaults");
        Ok(())
    }

    /// Wipe the store and run `on_destroy`.
    pub async fn destroy(&mut self, options: DestroyOptions) -> Result<Option<Value>, ActorError> {
        self.ctx.storage().delete_all().await?;
        if options.reset {
            self.reset()?;
        }
        self.ctx.transition(StateLifecycle::Destroyed);
        tracing::info!(id = %self.ctx.id(), reset = options.reset, "instance destroyed");

        self.object.on_destroy(&mut self.ctx).await
    }

    /// The auto-return representation: `to_json` or every persistable field.
    pub fn to_json(&self) -> Result<Value, ActorError> {
        match self.object.to_json() {
            Some(value) => Ok(value),
            None => Ok(Value::Object(state::persistable_fields(self.object.state())?)),
        }
    }

    /// Scheduled wake-up entry point. Failures are logged, never returned.
    pub async fn alarm(&mut self) {
        if let Err(err) = self.run_alarm().await {
            tracing::error!(id = %self.ctx.id(), error = %err, "alarm failed");
        }
    }

    async fn run_alarm(&mut self) -> Result<(), ActorError> {
        self.capture_defaults()?;

        let txn = self.ctx.storage().transaction().await?;
        let original = self.ctx.replace_storage(Rc::clone(&txn));

        let result = self.run_alarm_in(txn.as_ref()).await;

        self.ctx.replace_storage(original);
        if result.is_err() {
            // Drop uncommitted changes: defaults now, the store on next load.
            if let Err(err) = self.reset() {
                tracing::warn!(id = %self.ctx.id(), error = %err, "failed to restore defaults");
            }
            self.ctx.set_initialized(false);
        }
        result
    }

    async fn run_alarm_in(&mut self, txn: &dyn DurableStorage) -> Result<(), ActorError> {
        self.ctx.set_initialized(false);
        self.load().await?;

        tracing::info!(id = %self.ctx.id(), "running alarm");
        self.object.on_alarm(&mut self.ctx).await?;

        if self.ctx.config().auto_persist() {
            self.persist().await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

impl<A: DurableObject> std::fmt::Debug for DurableRuntime<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableRuntime")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
