//! Actor fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use durable_actors::{
    ActorContext, ActorError, Args, DurableConfig, DurableObject, DurableProxy, Env,
    LocalNamespace, Reply,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Namespace for `A` plus a proxy over it, bound as `binding`.
pub fn host<A, F>(binding: &str, factory: F, config: DurableConfig) -> (LocalNamespace<A>, DurableProxy)
where
    A: DurableObject,
    F: Fn(&durable_actors::DurableId) -> A + 'static,
{
    let namespace = LocalNamespace::new(factory, config);
    let env = Env::new().with_namespace(binding, Rc::new(namespace.clone()));
    let proxy = env.proxy(binding).expect("namespace binding");
    (namespace, proxy)
}

// Counter

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: u64,
}

#[derive(Debug, Default)]
pub struct Counter {
    pub state: CounterState,
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
        _ctx: &mut ActorContext,
        method: &str,
        args: Args,
    ) -> Result<Option<Reply>, ActorError> {
        match method {
            "increment" => {
                self.state.count += 1;
                Ok(None)
            }
            "add" => {
                self.state.count += args.get::<u64>(0)?;
                Ok(Some(Reply::json(&self.state.count)?))
            }
            "claim" => Err(ActorError::status_error(StatusCode::CONFLICT, "already claimed")),
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

// Items

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemsState {
    pub items: Vec<u32>,
    pub tags: BTreeSet<String>,
    pub last_seen: Option<SystemTime>,
    pub owner: Owner,
    #[serde(rename = "$scratch")]
    pub scratch: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub level: u8,
}

#[derive(Debug)]
pub struct Items {
    pub state: ItemsState,
}

impl Items {
    pub fn new() -> Self {
        Self {
            state: ItemsState {
                items: Vec::new(),
                tags: BTreeSet::new(),
                last_seen: None,
                owner: Owner {
                    name: "nobody".into(),
                    level: 0,
                },
                scratch: 0,
            },
        }
    }
}

#[async_trait(?Send)]
impl DurableObject for Items {
    type State = ItemsState;

    fn state(&self) -> &ItemsState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ItemsState {
        &mut self.state
    }

    async fn invoke(
        &mut self,
        _ctx: &mut ActorContext,
        method: &str,
        args: Args,
    ) -> Result<Option<Reply>, ActorError> {
        match method {
            "tag" => {
                self.state.tags.insert(args.get(0)?);
                self.state.scratch += 1;
                Ok(None)
            }
            "touch" => {
                let ms: u64 = args.get(0)?;
                self.state.last_seen = Some(UNIX_EPOCH + Duration::from_millis(ms));
                Ok(None)
            }
            "promote" => {
                self.state.owner.name = args.get(0)?;
                self.state.owner.level += 1;
                Ok(Some(Reply::json(&self.state.owner)?))
            }
            "scratch" => Ok(Some(Reply::json(&self.state.scratch)?)),
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }

    async fn on_destroy(&mut self, _ctx: &mut ActorContext) -> Result<Option<Value>, ActorError> {
        Ok(Some(serde_json::json!({ "gone": true })))
    }
}

// Ticker

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerState {
    pub ticks: u32,
    pub explode: bool,
}

#[derive(Debug, Default)]
pub struct Ticker {
    pub state: TickerState,
}

#[async_trait(?Send)]
impl DurableObject for Ticker {
    type State = TickerState;

    fn state(&self) -> &TickerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut TickerState {
        &mut self.state
    }

    async fn on_alarm(&mut self, _ctx: &mut ActorContext) -> Result<(), ActorError> {
        self.state.ticks += 1;
        if self.state.explode {
            return Err(ActorError::Handler("ticker exploded".into()));
        }
        Ok(())
    }
}

// Relay: calls counters through its environment.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayState {
    pub forwarded: u32,
}

#[derive(Debug, Default)]
pub struct Relay {
    pub state: RelayState,
}

#[async_trait(?Send)]
impl DurableObject for Relay {
    type State = RelayState;

    fn state(&self) -> &RelayState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RelayState {
        &mut self.state
    }

    async fn invoke(
        &mut self,
        ctx: &mut ActorContext,
        method: &str,
        args: Args,
    ) -> Result<Option<Reply>, ActorError> {
        match method {
            "forward" => {
                let name: String = args.get(0)?;
                let counters = ctx
                    .env()
                    .proxy("COUNTER")
                    .map_err(|e| ActorError::Handler(e.to_string()))?;
                let total: u64 = counters
                    .get(name.as_str())
                    .call("add", vec![serde_json::json!(1)])
                    .await
                    .map_err(|e| ActorError::Handler(e.to_string()))?;
                self.state.forwarded += 1;
                Ok(Some(Reply::json(&total)?))
            }
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}

// Ratio: float fields that may become non-finite.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioState {
    pub ratio: f64,
    pub label: String,
}

#[derive(Debug, Default)]
pub struct Ratio {
    pub state: RatioState,
}

#[async_trait(?Send)]
impl DurableObject for Ratio {
    type State = RatioState;

    fn state(&self) -> &RatioState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RatioState {
        &mut self.state
    }

    async fn invoke(
        &mut self,
        _ctx: &mut ActorContext,
        method: &str,
        args: Args,
    ) -> Result<Option<Reply>, ActorError> {
        match method {
            "divide" => {
                let (num, den): (f64, f64) = (args.get(0)?, args.get(1)?);
                self.state.ratio = num / den;
                Ok(None)
            }
            "is_nan" => Ok(Some(Reply::json(&self.state.ratio.is_nan())?)),
            other => Err(ActorError::MethodNotFound(other.to_string())),
        }
    }
}
