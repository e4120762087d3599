//! Brotli decode session.
//!
//! [`BrotliDecoder`] is a push decoder: compressed bytes go in through
//! [`feed`](BrotliDecoder::feed), decoded bytes come out of
//! [`decode`](BrotliDecoder::decode) into whatever buffer the caller has.
//! Decoding is an explicit state machine, so a call can stop at any point
//! where it runs out of input or output and pick up there on the next call.
//!
//! A decoding unit (a header, a command, a literal, a distance) is either
//! applied completely or not at all. Units that start close to the end of
//! the buffered input take a checkpoint first and roll back to it when
//! they read past the genuine bytes.

use crate::bitreader::BitReader;
use crate::compound::{CompoundCopy, CompoundDictionary};
use crate::config::DecoderConfig;
use crate::context::literal_context;
use crate::dictionary::Dictionary;
use crate::error::{BrotliError, Result, StreamError, UsageError};
use crate::metablock::{
    BlockState, COMMAND, DISTANCE, DISTANCE_CONTEXT_BITS, LITERAL, LITERAL_CONTEXT_BITS,
    MetaBlockCodes, decode_window_bits, read_meta_block_header,
};
use crate::prefix::{
    DISTANCE_SHORT_CODE_INDEX_OFFSET, DISTANCE_SHORT_CODE_VALUE_OFFSET, DistanceTable,
    MAX_ALLOWED_DISTANCE, NUM_DISTANCE_SHORT_CODES, command_lookup,
};
use crate::ringbuffer::RingBuffer;
use crate::transform::Transforms;
use oxiarc_core::{DecompressStatus, Decompressor};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Unconsumed input [`Decompressor::decompress`] buffers ahead of the
/// decoder.
pub const MAX_BUFFERED_INPUT: usize = 64 * 1024;

/// Cap of the running total of announced meta-block lengths.
const MAX_EXPECTED_TOTAL_SIZE: usize = 1 << 30;

/// Window bytes a backward reference may not use.
const WINDOW_GAP: usize = 16;

/// Distance ring at the start of a stream; the last entry is the newest.
const INITIAL_DISTANCE_RING: [i32; 4] = [16, 15, 11, 4];

/// Position in the decoding state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunningState {
    /// Waiting for the stream header.
    Initialized,
    /// Waiting for a meta-block header.
    BlockStart,
    /// Reading the prefix codes of a compressed meta-block.
    CompressedBlockStart,
    /// Reading the next insert-and-copy command.
    MainLoop,
    /// Reading the literals of the current command.
    InsertLoop,
    /// Reading the distance of the current command.
    ReadDistance,
    /// Copying from the window.
    CopyLoop,
    /// Writing a static dictionary word.
    UseDictionary,
    /// Copying from attached dictionary chunks.
    CopyFromCompoundDictionary,
    /// Skipping metadata bytes.
    ReadMetadata,
    /// Copying raw bytes of an uncompressed meta-block.
    CopyUncompressed,
    /// About to hand ring buffer bytes to the caller.
    InitWrite,
    /// Handing ring buffer bytes to the caller.
    Write,
    /// Past the last meta-block.
    Finished,
    /// Released by [`BrotliDecoder::close`].
    Closed,
}

/// Outcome of one state machine step.
enum Step {
    Continue,
    NeedsInput,
    NeedsOutput,
    Done,
}

/// Observable state of a decode session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing fed or decoded yet; options may still change.
    Fresh,
    /// Input was fed but not decoded yet.
    Running,
    /// The last `decode` call stopped for lack of input.
    NeedsInput,
    /// The last `decode` call filled the output buffer.
    NeedsOutput,
    /// The stream was decoded completely.
    Finished,
    /// A stream error was detected; see [`BrotliDecoder::error`].
    Failed,
    /// The session was closed.
    Closed,
}

/// Tree and context selection derived from the current block types.
#[derive(Debug, Clone, Copy, Default)]
struct Selectors {
    context_map_slice: usize,
    trivial_literal: bool,
    literal_tree: usize,
    lookup_offset: usize,
    command_tree: usize,
    distance_context_slice: usize,
}

/// State a decoding unit may change before it knows it has enough input.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    mark: usize,
    blocks: [BlockState; 3],
    selectors: Selectors,
}

/// Streaming Brotli decoder.
///
/// # Example
///
/// ```
/// use oxiarc_brotli::BrotliDecoder;
/// use oxiarc_core::DecompressStatus;
///
/// // An empty stream: 16-bit window, last meta-block, empty.
/// let mut decoder = BrotliDecoder::new();
/// decoder.feed(&[0x06]).unwrap();
/// decoder.finish_input().unwrap();
/// let mut out = [0u8; 16];
/// let (written, status) = decoder.decode(&mut out).unwrap();
/// assert_eq!((written, status), (0, DecompressStatus::Done));
/// ```
#[derive(Debug)]
pub struct BrotliDecoder {
    config: DecoderConfig,
    dictionary: Arc<Dictionary>,
    transforms: &'static Transforms,
    compound: CompoundDictionary,
    br: BitReader,
    ring: RingBuffer,

    state: RunningState,
    next_state: RunningState,
    started: bool,
    stream_checked: bool,
    last_status: Option<DecompressStatus>,
    error: Option<BrotliError>,
    total_out: u64,

    large_window: bool,
    max_backward_distance: usize,
    max_distance: usize,
    expected_total_size: usize,
    input_end: bool,
    meta_block_length: i64,

    codes: MetaBlockCodes,
    distance_table: DistanceTable,
    blocks: [BlockState; 3],
    selectors: Selectors,

    insert_length: usize,
    copy_length: usize,
    distance_context: i32,
    distance: i64,
    j: usize,
    distance_ring: [i32; 4],
    distance_ring_index: usize,
    compound_copy: CompoundCopy,
}

impl BrotliDecoder {
    /// Create a decoder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with the given configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self::with_dictionary(Dictionary::rfc(), config)
    }

    /// Create a decoder that resolves dictionary references against
    /// `dictionary` instead of the RFC dictionary.
    pub fn with_dictionary(dictionary: Arc<Dictionary>, config: DecoderConfig) -> Self {
        Self {
            config,
            dictionary,
            transforms: Transforms::rfc(),
            compound: CompoundDictionary::new(),
            br: BitReader::new(),
            ring: RingBuffer::new(),
            state: RunningState::Initialized,
            next_state: RunningState::BlockStart,
            started: false,
            stream_checked: false,
            last_status: None,
            error: None,
            total_out: 0,
            large_window: false,
            max_backward_distance: 0,
            max_distance: 0,
            expected_total_size: 0,
            input_end: false,
            meta_block_length: 0,
            codes: MetaBlockCodes::default(),
            distance_table: DistanceTable::default(),
            blocks: [BlockState::default(); 3],
            selectors: Selectors::default(),
            insert_length: 0,
            copy_length: 0,
            distance_context: 0,
            distance: 0,
            j: 0,
            distance_ring: INITIAL_DISTANCE_RING,
            distance_ring_index: 3,
            compound_copy: CompoundCopy::default(),
        }
    }

    /// Use a custom transform catalog for dictionary words.
    pub fn with_transforms(mut self, transforms: &'static Transforms) -> Self {
        self.transforms = transforms;
        self
    }

    /// Start over with a fresh session, keeping configuration, dictionary
    /// and transforms. Attached chunks are dropped.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open()?;
        let transforms = self.transforms;
        *self = Self::with_dictionary(self.dictionary.clone(), self.config).with_transforms(transforms);
        Ok(())
    }

    /// Accept large-window streams.
    pub fn enable_large_window(&mut self) -> Result<()> {
        self.ensure_fresh()?;
        self.config.large_window = true;
        Ok(())
    }

    /// Hand out decoded bytes as soon as the output buffer can take them.
    pub fn enable_eager_output(&mut self) -> Result<()> {
        self.ensure_fresh()?;
        self.config.eager_output = true;
        Ok(())
    }

    /// Attach a compound dictionary chunk.
    ///
    /// Chunks are addressed in attachment order, right past the window.
    pub fn attach_dictionary_chunk(&mut self, chunk: impl Into<Arc<[u8]>>) -> Result<()> {
        self.ensure_fresh()?;
        self.compound.attach(chunk.into())
    }

    /// Current configuration.
    pub fn config(&self) -> DecoderConfig {
        self.config
    }

    /// Buffer compressed bytes.
    pub fn feed(&mut self, input: &[u8]) -> Result<()> {
        self.ensure_open()?;
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if input.is_empty() {
            return Ok(());
        }
        if self.is_finished() {
            return Err(self.fail(StreamError::UnusedBytesAfterEnd.into()));
        }
        self.started = true;
        self.br.feed(input);
        Ok(())
    }

    /// Declare that every compressed byte was fed.
    ///
    /// From now on, running out of input is a truncated stream.
    pub fn finish_input(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.br.finish();
        Ok(())
    }

    /// Decode into `output`.
    ///
    /// Returns the number of bytes written and whether the decoder needs
    /// more input, more output space, or is done. The first stream error
    /// ends the session and is returned again by every later call.
    pub fn decode(&mut self, output: &mut [u8]) -> Result<(usize, DecompressStatus)> {
        self.ensure_open()?;
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        self.started = true;
        let mut written = 0;
        match self.run(output, &mut written) {
            Ok(status) => {
                self.last_status = Some(status);
                Ok((written, status))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Session state.
    pub fn status(&self) -> SessionStatus {
        if self.state == RunningState::Closed {
            return SessionStatus::Closed;
        }
        if self.error.is_some() {
            return SessionStatus::Failed;
        }
        match self.last_status {
            _ if self.is_finished() => SessionStatus::Finished,
            Some(DecompressStatus::NeedsOutput) => SessionStatus::NeedsOutput,
            Some(DecompressStatus::NeedsInput) => SessionStatus::NeedsInput,
            _ if self.started => SessionStatus::Running,
            _ => SessionStatus::Fresh,
        }
    }

    /// The stream was decoded completely.
    pub fn is_finished(&self) -> bool {
        self.state == RunningState::Finished && self.stream_checked
    }

    /// The error that ended the session, if any.
    pub fn error(&self) -> Option<&BrotliError> {
        self.error.as_ref()
    }

    /// Release all buffers. Every later call fails with
    /// [`UsageError::AlreadyClosed`]; closing again is a no-op.
    pub fn close(&mut self) {
        if self.state == RunningState::Closed {
            return;
        }
        self.br = BitReader::new();
        self.ring.clear();
        self.codes = MetaBlockCodes::default();
        self.distance_table = DistanceTable::default();
        self.compound = CompoundDictionary::new();
        self.state = RunningState::Closed;
        debug!(
            total_in = self.total_in(),
            total_out = self.total_out,
            "brotli session closed"
        );
    }

    /// Compressed bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.br.total_in()
    }

    /// Decoded bytes handed to the caller.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Fail the session with an input error raised outside the decoder.
    pub(crate) fn fail_input(&mut self, err: StreamError) -> BrotliError {
        self.fail(err.into())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == RunningState::Closed {
            return Err(UsageError::AlreadyClosed.into());
        }
        Ok(())
    }

    fn ensure_fresh(&self) -> Result<()> {
        self.ensure_open()?;
        if self.started {
            return Err(UsageError::StateNotFresh.into());
        }
        Ok(())
    }

    fn fail(&mut self, err: BrotliError) -> BrotliError {
        let fatal = match &err {
            BrotliError::Stream(_) => true,
            BrotliError::Usage(usage) => matches!(usage, UsageError::Unreachable(_)),
        };
        if fatal && self.error.is_none() {
            warn!(
                error = %err,
                total_in = self.total_in(),
                total_out = self.total_out,
                "brotli decoding failed"
            );
            self.error = Some(err.clone());
        }
        err
    }

    // ------------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------------

    fn run(&mut self, output: &mut [u8], written: &mut usize) -> Result<DecompressStatus> {
        loop {
            let fence = self
                .ring
                .fence(self.config.eager_output, output.len() - *written);
            let step = match self.state {
                RunningState::Initialized => self.read_stream_header()?,
                RunningState::BlockStart => self.read_block_header()?,
                RunningState::CompressedBlockStart => self.read_block_codes()?,
                RunningState::MainLoop => self.read_command()?,
                RunningState::InsertLoop => self.insert_literals(fence)?,
                RunningState::ReadDistance => self.read_distance()?,
                RunningState::CopyLoop => self.copy_from_window(fence),
                RunningState::UseDictionary => self.copy_dictionary_word(fence)?,
                RunningState::CopyFromCompoundDictionary => self.copy_from_compound(fence),
                RunningState::ReadMetadata => self.skip_metadata()?,
                RunningState::CopyUncompressed => self.copy_uncompressed()?,
                RunningState::InitWrite => {
                    self.ring.mark_ready();
                    self.state = RunningState::Write;
                    Step::Continue
                }
                RunningState::Write => self.write_output(output, written),
                RunningState::Finished => self.finish_stream()?,
                RunningState::Closed => return Err(UsageError::AlreadyClosed.into()),
            };
            match step {
                Step::Continue => {}
                Step::NeedsOutput => return Ok(DecompressStatus::NeedsOutput),
                Step::Done => return Ok(DecompressStatus::Done),
                Step::NeedsInput => {
                    self.ring.mark_ready();
                    self.drain(output, written);
                    if self.ring.pending() > 0 {
                        return Ok(DecompressStatus::NeedsOutput);
                    }
                    return Ok(DecompressStatus::NeedsInput);
                }
            }
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            mark: self.br.mark(),
            blocks: self.blocks,
            selectors: self.selectors,
        }
    }

    /// Checkpoint for a command, literal or distance unit; only needed near
    /// the end of the buffered input.
    #[inline]
    fn unit_checkpoint(&self) -> Option<Checkpoint> {
        if self.br.has_margin() {
            None
        } else {
            Some(self.checkpoint())
        }
    }

    /// Called after a unit has read all its bits. Returns `Ok(true)` when
    /// the unit ran past the buffered input and was rolled back.
    #[inline]
    fn ran_dry(&mut self, checkpoint: Option<Checkpoint>) -> Result<bool> {
        if !self.br.overrun() {
            return Ok(false);
        }
        if self.br.is_end_of_input() {
            return Err(StreamError::TruncatedInput.into());
        }
        let Some(checkpoint) = checkpoint else {
            return Err(UsageError::Unreachable("decoding unit overran its input margin").into());
        };
        self.br.rewind(checkpoint.mark);
        self.blocks = checkpoint.blocks;
        self.selectors = checkpoint.selectors;
        Ok(true)
    }

    fn starved(&self) -> Result<Step> {
        if self.br.is_end_of_input() {
            Err(StreamError::TruncatedInput.into())
        } else {
            Ok(Step::NeedsInput)
        }
    }

    fn read_stream_header(&mut self) -> Result<Step> {
        let checkpoint = self.checkpoint();
        let result = decode_window_bits(&mut self.br, self.config.large_window);
        if self.ran_dry(Some(checkpoint))? {
            return Ok(Step::NeedsInput);
        }
        let (window_bits, large_window) = result?;
        let window_size = 1usize << window_bits;
        self.large_window = large_window;
        self.ring.set_max_size(window_size);
        self.max_backward_distance = window_size - WINDOW_GAP;
        debug!(window_bits, large_window, "brotli stream header");
        self.state = RunningState::BlockStart;
        Ok(Step::Continue)
    }

    fn read_block_header(&mut self) -> Result<Step> {
        if self.meta_block_length < 0 {
            return Err(StreamError::InvalidMetablockLength.into());
        }
        if self.input_end {
            self.next_state = RunningState::Finished;
            self.state = RunningState::InitWrite;
            return Ok(Step::Continue);
        }

        let checkpoint = self.checkpoint();
        let result = read_meta_block_header(&mut self.br);
        if self.ran_dry(Some(checkpoint))? {
            return Ok(Step::NeedsInput);
        }
        let header = result?;
        debug!(
            length = header.length,
            is_last = header.is_last,
            uncompressed = header.is_uncompressed,
            metadata = header.is_metadata,
            "meta-block header"
        );

        self.input_end = header.is_last;
        self.meta_block_length = header.length as i64;
        if header.is_metadata {
            self.state = RunningState::ReadMetadata;
            return Ok(Step::Continue);
        }
        if header.length == 0 {
            return Ok(Step::Continue);
        }
        self.state = if header.is_uncompressed {
            RunningState::CopyUncompressed
        } else {
            RunningState::CompressedBlockStart
        };
        self.expected_total_size =
            (self.expected_total_size + header.length).min(MAX_EXPECTED_TOTAL_SIZE);
        self.ring.grow(self.expected_total_size, header.is_last);
        Ok(Step::Continue)
    }

    fn read_block_codes(&mut self) -> Result<Step> {
        let checkpoint = self.checkpoint();
        let result = MetaBlockCodes::read(&mut self.br, self.large_window);
        if self.ran_dry(Some(checkpoint))? {
            return Ok(Step::NeedsInput);
        }
        let codes = result?;
        trace!(
            literal_types = codes.blocks[LITERAL].num_types,
            command_types = codes.blocks[COMMAND].num_types,
            distance_types = codes.blocks[DISTANCE].num_types,
            literal_trees = codes.literals.len(),
            distance_trees = codes.distances.len(),
            npostfix = codes.npostfix,
            ndirect = codes.ndirect,
            "compressed meta-block"
        );

        self.distance_table
            .rebuild(codes.npostfix, codes.ndirect, codes.distance_alphabet_limit);
        self.blocks = codes.blocks;
        self.codes = codes;
        self.selectors = Selectors::default();
        self.select_literal_block(0);
        self.state = RunningState::MainLoop;
        Ok(Step::Continue)
    }

    fn read_command(&mut self) -> Result<Step> {
        if self.meta_block_length <= 0 {
            self.state = RunningState::BlockStart;
            return Ok(Step::Continue);
        }

        let checkpoint = self.unit_checkpoint();
        if self.blocks[COMMAND].length == 0 {
            self.selectors.command_tree =
                self.blocks[COMMAND].switch(&self.codes.block_codes[COMMAND], &mut self.br);
        }
        self.blocks[COMMAND].length = self.blocks[COMMAND].length.saturating_sub(1);
        let symbol = self
            .codes
            .commands
            .read_symbol(self.selectors.command_tree, &mut self.br);
        let command = command_lookup()[symbol as usize];
        let insert_length = command.insert_offset as usize
            + self.br.read_bits(u32::from(command.insert_extra_bits)) as usize;
        let copy_length = command.copy_offset as usize
            + self.br.read_bits(u32::from(command.copy_extra_bits)) as usize;
        if self.ran_dry(checkpoint)? {
            return Ok(Step::NeedsInput);
        }

        if insert_length as i64 > self.meta_block_length {
            return Err(StreamError::InvalidMetablockLength.into());
        }
        self.insert_length = insert_length;
        self.copy_length = copy_length;
        self.distance_context = i32::from(command.distance_context);
        self.j = 0;
        self.state = RunningState::InsertLoop;
        Ok(Step::Continue)
    }

    fn switch_literal_block(&mut self) {
        let block_type =
            self.blocks[LITERAL].switch(&self.codes.block_codes[LITERAL], &mut self.br);
        self.select_literal_block(block_type);
    }

    fn select_literal_block(&mut self, block_type: usize) {
        let slice = block_type << LITERAL_CONTEXT_BITS;
        self.selectors.context_map_slice = slice;
        self.selectors.trivial_literal = self.codes.is_trivial_literal_context(block_type);
        self.selectors.literal_tree = usize::from(self.codes.context_map[slice]);
        self.selectors.lookup_offset = self.codes.context_modes[block_type].lookup_offset();
    }

    fn insert_literals(&mut self, fence: usize) -> Result<Step> {
        while self.j < self.insert_length {
            let checkpoint = self.unit_checkpoint();
            if self.blocks[LITERAL].length == 0 {
                self.switch_literal_block();
            }
            self.blocks[LITERAL].length = self.blocks[LITERAL].length.saturating_sub(1);
            let tree = if self.selectors.trivial_literal {
                self.selectors.literal_tree
            } else {
                let (prev1, prev2) = self.ring.last_two();
                let context = literal_context(self.selectors.lookup_offset, prev1, prev2);
                usize::from(self.codes.context_map[self.selectors.context_map_slice + context])
            };
            let literal = self.codes.literals.read_symbol(tree, &mut self.br) as u8;
            if self.ran_dry(checkpoint)? {
                return Ok(Step::NeedsInput);
            }

            self.ring.push(literal);
            self.j += 1;
            if self.ring.pos() >= fence {
                self.next_state = RunningState::InsertLoop;
                self.state = RunningState::InitWrite;
                return Ok(Step::Continue);
            }
        }

        self.meta_block_length -= self.insert_length as i64;
        self.state = if self.meta_block_length <= 0 {
            RunningState::MainLoop
        } else {
            RunningState::ReadDistance
        };
        Ok(Step::Continue)
    }

    fn read_distance(&mut self) -> Result<Step> {
        let (distance, explicit) = if self.distance_context < 0 {
            (i64::from(self.distance_ring[self.distance_ring_index]), false)
        } else {
            let checkpoint = self.unit_checkpoint();
            if self.blocks[DISTANCE].length == 0 {
                let block_type =
                    self.blocks[DISTANCE].switch(&self.codes.block_codes[DISTANCE], &mut self.br);
                self.selectors.distance_context_slice = block_type << DISTANCE_CONTEXT_BITS;
            }
            self.blocks[DISTANCE].length = self.blocks[DISTANCE].length.saturating_sub(1);
            let slot = self.selectors.distance_context_slice + self.distance_context as usize;
            let tree = usize::from(self.codes.distance_context_map[slot]);
            let symbol = self.codes.distances.read_symbol(tree, &mut self.br) as usize;
            let distance = if symbol < NUM_DISTANCE_SHORT_CODES {
                let index = (self.distance_ring_index + DISTANCE_SHORT_CODE_INDEX_OFFSET[symbol]) & 3;
                i64::from(self.distance_ring[index])
                    + i64::from(DISTANCE_SHORT_CODE_VALUE_OFFSET[symbol])
            } else {
                let extra = self
                    .br
                    .read_bits(u32::from(self.distance_table.extra_bits[symbol]));
                i64::from(self.distance_table.offset[symbol])
                    + (i64::from(extra) << self.codes.npostfix)
            };
            if self.ran_dry(checkpoint)? {
                return Ok(Step::NeedsInput);
            }
            if symbol < NUM_DISTANCE_SHORT_CODES && distance <= 0 {
                return Err(StreamError::NegativeDistance.into());
            }
            (distance, symbol > 0)
        };

        self.distance = distance;
        let pos = self.ring.pos();
        self.max_distance =
            if self.max_distance != self.max_backward_distance && pos < self.max_backward_distance {
                pos
            } else {
                self.max_backward_distance
            };
        if distance > self.max_distance as i64 {
            self.state = RunningState::UseDictionary;
            return Ok(Step::Continue);
        }
        if explicit {
            self.push_distance(distance);
        }
        if self.copy_length as i64 > self.meta_block_length {
            return Err(StreamError::InvalidBackwardReference.into());
        }
        self.j = 0;
        self.state = RunningState::CopyLoop;
        Ok(Step::Continue)
    }

    fn push_distance(&mut self, distance: i64) {
        self.distance_ring_index = (self.distance_ring_index + 1) & 3;
        self.distance_ring[self.distance_ring_index] = distance as i32;
    }

    fn copy_from_window(&mut self, fence: usize) -> Step {
        let distance = self.distance as usize;
        while self.j < self.copy_length {
            let room = fence.saturating_sub(self.ring.pos());
            let n = (self.copy_length - self.j).min(room);
            self.ring.copy_match(distance, n);
            self.j += n;
            self.meta_block_length -= n as i64;
            if self.ring.pos() >= fence {
                self.next_state = RunningState::CopyLoop;
                self.state = RunningState::InitWrite;
                return Step::Continue;
            }
        }
        self.state = RunningState::MainLoop;
        Step::Continue
    }

    fn copy_dictionary_word(&mut self, fence: usize) -> Result<Step> {
        if self.distance > i64::from(MAX_ALLOWED_DISTANCE) {
            return Err(StreamError::InvalidBackwardReference.into());
        }
        let address =
            self.distance - self.max_distance as i64 - 1 - self.compound.total_size() as i64;
        if address < 0 {
            let offset = (-address - 1) as usize;
            self.compound_copy = self.compound.start_copy(offset, self.copy_length)?;
            self.push_distance(self.distance);
            self.meta_block_length -= self.copy_length as i64;
            self.state = RunningState::CopyFromCompoundDictionary;
            return Ok(Step::Continue);
        }

        let word_length = self.copy_length;
        let size_bits = self.dictionary.size_bits(word_length);
        if size_bits == 0 {
            return Err(StreamError::InvalidBackwardReference.into());
        }
        let address = address as usize;
        let word_index = address & ((1 << size_bits) - 1);
        let transform_index = address >> size_bits;
        if transform_index >= self.transforms.len() {
            return Err(StreamError::InvalidBackwardReference.into());
        }
        let word = self
            .dictionary
            .word(word_length, word_index)
            .ok_or(StreamError::InvalidBackwardReference)?;
        let written = self
            .transforms
            .transform_word(self.ring.tail_mut(), word, transform_index)?;
        self.ring.advance(written);
        self.meta_block_length -= written as i64;
        if self.ring.pos() >= fence {
            self.next_state = RunningState::MainLoop;
            self.state = RunningState::InitWrite;
        } else {
            self.state = RunningState::MainLoop;
        }
        Ok(Step::Continue)
    }

    fn copy_from_compound(&mut self, fence: usize) -> Step {
        let room = fence.saturating_sub(self.ring.pos());
        let n = self
            .compound
            .copy_into(&mut self.compound_copy, self.ring.window_mut(room));
        self.ring.advance(n);
        if self.ring.pos() >= fence {
            self.next_state = RunningState::CopyFromCompoundDictionary;
            self.state = RunningState::InitWrite;
        } else {
            debug_assert!(self.compound_copy.is_done());
            self.state = RunningState::MainLoop;
        }
        Step::Continue
    }

    fn skip_metadata(&mut self) -> Result<Step> {
        let mut scratch = [0u8; 256];
        while self.meta_block_length > 0 {
            let want = (self.meta_block_length as usize).min(scratch.len());
            let n = self.br.copy_raw_bytes(&mut scratch[..want])?;
            if n == 0 {
                return self.starved();
            }
            self.meta_block_length -= n as i64;
        }
        self.state = RunningState::BlockStart;
        Ok(Step::Continue)
    }

    fn copy_uncompressed(&mut self) -> Result<Step> {
        while self.meta_block_length > 0 {
            let chunk = (self.ring.size() - self.ring.pos()).min(self.meta_block_length as usize);
            let n = self.br.copy_raw_bytes(self.ring.window_mut(chunk))?;
            self.ring.advance(n);
            self.meta_block_length -= n as i64;
            if self.ring.pos() == self.ring.size() {
                self.next_state = RunningState::CopyUncompressed;
                self.state = RunningState::InitWrite;
                return Ok(Step::Continue);
            }
            if n < chunk {
                return self.starved();
            }
        }
        self.state = RunningState::BlockStart;
        Ok(Step::Continue)
    }

    fn drain(&mut self, output: &mut [u8], written: &mut usize) {
        let n = self.ring.write_out(&mut output[*written..]);
        *written += n;
        self.total_out += n as u64;
    }

    fn write_output(&mut self, output: &mut [u8], written: &mut usize) -> Step {
        self.drain(output, written);
        if self.ring.pending() > 0 {
            return Step::NeedsOutput;
        }
        if self.ring.pos() >= self.max_backward_distance {
            self.max_distance = self.max_backward_distance;
        }
        self.ring.wrap();
        self.state = self.next_state;
        if self.config.eager_output && *written == output.len() {
            // The eager fence would not let the next unit make progress.
            return Step::NeedsOutput;
        }
        Step::Continue
    }

    fn finish_stream(&mut self) -> Result<Step> {
        if !self.stream_checked {
            if self.meta_block_length < 0 {
                return Err(StreamError::InvalidMetablockLength.into());
            }
            self.br.jump_to_byte_boundary()?;
            self.br.check_health(true)?;
            self.stream_checked = true;
            debug!(
                total_in = self.total_in(),
                total_out = self.total_out,
                "brotli stream finished"
            );
        }
        Ok(Step::Done)
    }
}

impl Default for BrotliDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decompressor for BrotliDecoder {
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        end_of_input: bool,
    ) -> oxiarc_core::Result<(usize, usize, DecompressStatus)> {
        if self.is_finished() && input.is_empty() {
            return Ok((0, 0, DecompressStatus::Done));
        }
        let mut take = input
            .len()
            .min(MAX_BUFFERED_INPUT.saturating_sub(self.br.unused_bytes()));
        if take == 0 && self.last_status == Some(DecompressStatus::NeedsInput) {
            // A single unit larger than the buffering limit.
            take = input.len().min(MAX_BUFFERED_INPUT);
        }
        self.feed(&input[..take])
            .map_err(|err| err.into_core(self.total_in()))?;
        if end_of_input && take == input.len() {
            self.finish_input()
                .map_err(|err| err.into_core(self.total_in()))?;
        }
        let (written, status) = self
            .decode(output)
            .map_err(|err| err.into_core(self.total_in()))?;
        Ok((take, written, status))
    }

    fn reset(&mut self) {
        // A closed session stays closed.
        if let Err(err) = BrotliDecoder::reset(self) {
            debug!(%err, "reset skipped");
        }
    }

    fn is_finished(&self) -> bool {
        BrotliDecoder::is_finished(self)
    }
}

/// Feed all of `data` and collect the decoded stream.
pub(crate) fn decode_all(decoder: &mut BrotliDecoder, data: &[u8]) -> Result<Vec<u8>> {
    decoder.feed(data)?;
    decoder.finish_input()?;
    let mut output = Vec::new();
    let mut buffer = vec![0u8; 64 * 1024];
    loop {
        let (written, status) = decoder.decode(&mut buffer)?;
        output.extend_from_slice(&buffer[..written]);
        match status {
            DecompressStatus::Done => return Ok(output),
            DecompressStatus::NeedsOutput => {}
            DecompressStatus::NeedsInput => {
                return Err(UsageError::Unreachable("decoder starved after finish_input").into());
            }
        }
    }
}
