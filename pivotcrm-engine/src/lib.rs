//! # PivotCRM Automation Engine
//!
//! Event-driven rule execution: given a domain event, load the tenant's
//! active rules for that trigger, evaluate conditions, and run matching
//! rules' actions through pluggable executors.
//!
//! ## Module Organization
//!
//! - `engine`: condition evaluation and ordered action execution
//! - `dispatcher`: in-process event queue feeding the engine
//! - `executors`: side-effect layer, one executor per action kind
//! - `store`: rule and audit storage behind traits

pub mod dispatcher;
pub mod engine;
pub mod executors;
pub mod store;

pub use dispatcher::{spawn_dispatcher, DispatcherHandle, EventDispatcher};
pub use engine::{AutomationEngine, EngineReport};
pub use store::{ExecutionSink, MemoryStore, PgStore, RuleSource, StoreError};
