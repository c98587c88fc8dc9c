//! DMC sample memory assembled from APU RAM data blocks.

/// Lowest CPU address DMC samples can be read from.
pub const SAMPLE_BASE: u16 = 0x8000;
/// Size of the $8000-$FFFF window.
pub const SAMPLE_WINDOW: usize = 0x8000;

/// One APU RAM write block (`0x67` data block of type `0xC2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RamBlock {
    /// Start address in CPU space.
    pub address: u16,
    pub data: Vec<u8>,
}

/// The sample table the DMC reads from.
///
/// Blocks are kept in log order so the image can be re-encoded and
/// transcribed losslessly; later blocks overwrite earlier ones when the
/// flat image is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SampleMemory {
    blocks: Vec<RamBlock>,
}

impl SampleMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: RamBlock) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[RamBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Flatten the blocks into a 32 KiB image of $8000-$FFFF.
    ///
    /// Bytes addressed below $8000 are dropped; bytes running past $FFFF
    /// wrap to $8000 like the DMC address counter does.
    pub fn image(&self) -> Vec<u8> {
        let mut image = vec![0u8; SAMPLE_WINDOW];
        for block in &self.blocks {
            for (i, byte) in block.data.iter().enumerate() {
                let addr = block.address as usize + i;
                if addr < SAMPLE_BASE as usize {
                    continue;
                }
                image[(addr - SAMPLE_BASE as usize) % SAMPLE_WINDOW] = *byte;
            }
        }
        image
    }
}
