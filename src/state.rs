use crate::engine::Engine;
use crate::events::AuditEmitter;

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub emitter: AuditEmitter,
}
