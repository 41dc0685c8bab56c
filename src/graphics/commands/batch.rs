use smallvec::SmallVec;

use crate::graphics::types::ResourceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    CopyBuffer {
        dst: ResourceId,
        dst_offset: usize,
        src_offset: usize,
        size: usize,
    },
}

/// One recorded unit of work. Batches are recorded CPU-side, handed to a
/// queue whole, and stamped with a single fence value at submission.
#[derive(Clone, Debug, Default)]
pub struct CommandBatch {
    commands: SmallVec<[Command; 8]>,
}

impl CommandBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}
