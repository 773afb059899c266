use ironclash_protocol::{Command, PhaseName};

use super::{Phase, Transition};
use crate::game::ServerContext;

/// Placeholder slot in the extended cycle; no physical attack commands exist yet.
#[derive(Debug, Default)]
pub struct PhysicalAttackPhase;

impl Phase for PhysicalAttackPhase {
    fn name(&self) -> PhaseName {
        PhaseName::PhysicalAttack
    }

    fn enter(&mut self, _ctx: &mut ServerContext) -> Transition {
        Transition::Next
    }

    fn handle_command(&mut self, _ctx: &mut ServerContext, _command: &Command) -> Transition {
        Transition::Stay
    }
}
