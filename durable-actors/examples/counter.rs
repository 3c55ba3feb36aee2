//! Counter demo: two clients share a durable counter through a local
//! namespace.
//!
//! Run with `RUST_LOG=debug` to see load, route and persist decisions.

use std::rc::Rc;

use async_trait::async_trait;
use durable_actors::{
    ActorContext, ActorError, Args, DurableConfig, DurableObject, Env, LocalNamespace, Reply,
    RpcError,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CounterState {
    count: u64,
    history: Vec<u64>,
}

#[derive(Debug, Default)]
struct Counter {
    state: CounterState,
}

#[async_trait(?Send)]
impl DurableObject for Counter {
    type State = CounterState;

    fn state(&self) -> &CounterState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CounterState {
        &mut self.state
    }

    async fn invoke(
        &mut self,
        ctx: &mut ActorContext,
        method: &str,
        args: Args,
    ) -> Result<Option<Reply>, ActorError> {
        match method {
            "increment" => {
                let by = args.get::<Option<u64>>(0)?.unwrap_or(1);
                self.state.count += by;
                self.state.history.push(by);
                tracing::info!(id = %ctx.id(), caller = ?ctx.name(), count = self.state.count, "incremented");
                Ok(None)
            }
            "total" => Ok(Some(Reply::json(&self.state.count)?)),
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), RpcError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = DurableConfig::builder()
        .auto_persist(true)
        .auto_return(true)
        .build();
    let counters = LocalNamespace::new(|_| Counter::default(), config);
    let env = Env::new().with_namespace("COUNTER", Rc::new(counters.clone()));
    let proxy = env.proxy("COUNTER")?;

    let alice = proxy.get("visits");
    let bob = proxy.get("visits");

    let state: Value = alice.call("increment", vec![]).await?;
    println!("alice incremented: {state}");
    let state: Value = bob.call("increment", vec![json!(5)]).await?;
    println!("bob incremented:   {state}");

    // Drop the in-memory instance; the next call reloads from the store.
    counters.evict(alice.id());
    let total: u64 = alice.call("total", vec![]).await?;
    println!("total after reload: {total}");

    match alice.call::<Value>("decrement", vec![]).await {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("decrement failed: {err}"),
    }

    Ok(())
}
