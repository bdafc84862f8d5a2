use crate::channels::Outbound;
use crate::clock::Clock;
use crate::coordinator::InteractionCoordinator;
use crate::history::HistoryBuffer;
use crate::knowledge::KnowledgeGateway;
use crate::persona::Persona;
use crate::session::SessionStore;
use std::sync::Arc;

/// Process-wide handles both control paths work against.
#[derive(Clone)]
pub struct Shared {
    pub clock: Arc<dyn Clock>,
    pub coordinator: Arc<InteractionCoordinator>,
    pub session: Arc<SessionStore>,
    pub history: Arc<HistoryBuffer>,
    pub gateway: Arc<KnowledgeGateway>,
    pub persona: Arc<Persona>,
    pub outbound: Arc<Outbound>,
}
