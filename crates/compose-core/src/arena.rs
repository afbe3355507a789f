use crate::block::Block;

/// Generational handle to a block. Survives reorders and stays invalid after
/// its block is removed, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    block: Option<Block>,
}

#[derive(Debug, Default)]
pub(crate) struct BlockArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl BlockArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, block: Block) -> BlockId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.block = Some(block);
            BlockId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                block: Some(block),
            });
            BlockId {
                index,
                generation: 0,
            }
        }
    }

    pub(crate) fn remove(&mut self, id: BlockId) -> Option<Block> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation || slot.block.is_none() {
            return None;
        }
        let block = slot.block.take();
        self.free.push(id.index);
        block
    }

    pub(crate) fn get(&self, id: BlockId) -> Option<&Block> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.block.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.block.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_handles_miss_after_slot_reuse() {
        let mut arena = BlockArena::new();
        let first = arena.insert(Block::empty_text());
        assert!(arena.remove(first).is_some());

        let second = arena.insert(Block::empty_text());
        assert_eq!(first.index, second.index);
        assert!(arena.get(first).is_none());
        assert!(arena.get(second).is_some());
    }

    #[test]
    fn double_remove_is_rejected() {
        let mut arena = BlockArena::new();
        let id = arena.insert(Block::empty_text());
        assert!(arena.remove(id).is_some());
        assert!(arena.remove(id).is_none());
    }
}
