//! Access-controlled gateway over the external knowledge tree.

mod gateway;
mod rules;
mod storage;

pub use gateway::{KnowledgeGateway, ReadOutcome, WriteMode};
pub use rules::{AccessMode, AccessRule, AccessRules};
pub use storage::{LocalStorage, Storage, StorageFuture};
