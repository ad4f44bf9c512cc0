//! Encoding scanlines on several workers.
//!
//! Every worker appends the rows it encodes to its own buffer and remembers
//! where each row landed. Rows are handed out one at a time from a shared
//! counter, so a worker that hits a cheap stretch of the image simply claims
//! more rows. Once all workers are done the rows are written in image order,
//! which makes the output identical to encoding the rows one after another.
//!
//! The only state the workers share are three atomics: the next row to
//! claim, a failure flag, and the longest encoded row seen so far.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::debug;

use super::encoder::crunch;
use super::CHANNELS;
use crate::error::{EncodeError, HdrError, HdrResult};

/// Location of one encoded row inside a worker buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Index of the worker, and of its buffer.
    pub worker: usize,
    /// First byte of the row.
    pub start: usize,
    /// One past the last byte of the row.
    pub end: usize,
}

impl Segment {
    /// Encoded length of the row in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the row encoded to nothing.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The encoded rows of an image, spread over per-worker buffers.
#[derive(Debug)]
pub struct EncodedRows {
    buffers: Vec<Vec<u8>>,
    segments: Vec<Segment>,
    max_segment_len: usize,
}

impl EncodedRows {
    /// One segment per row, in row order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of workers that took part.
    pub fn workers(&self) -> usize {
        self.buffers.len()
    }

    /// Length of the longest encoded row.
    pub fn max_segment_len(&self) -> usize {
        self.max_segment_len
    }

    /// The encoded bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let segment = self.segments.get(y)?;
        Some(&self.buffers[segment.worker][segment.start..segment.end])
    }

    /// Writes all rows in row order.
    pub fn write_to<W: Write>(&self, w: &mut W) -> HdrResult<()> {
        for row in (0..self.segments.len()).filter_map(|y| self.row(y)) {
            w.write_all(row).map_err(EncodeError::StreamWriteFailure)?;
        }
        Ok(())
    }
}

/// Encodes every row of `buf`, which holds scanlines of `width` pixels.
///
/// With `threads` set to `None` the rows are spread over the global rayon
/// pool, otherwise over a pool of that many threads. Without the `rayon`
/// feature a single worker runs on the calling thread.
///
/// The first error of any worker stops all workers from claiming further
/// rows and is returned once every worker has finished.
pub fn encode_rows(buf: &[u8], width: usize, threads: Option<usize>) -> HdrResult<EncodedRows> {
    let stride = width * CHANNELS;
    let height = if stride == 0 { 0 } else { buf.len() / stride };
    let shared = Shared {
        buf,
        stride,
        height,
        next_row: AtomicUsize::new(0),
        failed: AtomicBool::new(false),
        max_segment_len: AtomicUsize::new(0),
    };

    let outputs = run_workers(&shared, threads)?;

    let mut table: Vec<Option<Segment>> = vec![None; height];
    let mut buffers = Vec::with_capacity(outputs.len());
    let mut first_error = None;
    for output in outputs {
        for (row, segment) in output.rows {
            debug_assert!(table[row].is_none(), "row {row} encoded twice");
            table[row] = Some(segment);
        }
        if first_error.is_none() {
            first_error = output.error;
        }
        buffers.push(output.buffer);
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    let segments = table
        .into_iter()
        .enumerate()
        .map(|(row, segment)| segment.ok_or(EncodeError::MissingRow(row)))
        .collect::<Result<Vec<_>, _>>()?;
    let rows = EncodedRows {
        buffers,
        segments,
        max_segment_len: shared.max_segment_len.into_inner(),
    };
    debug!(
        "HDR encoded {height} scanlines on {} workers, longest {} bytes",
        rows.workers(),
        rows.max_segment_len()
    );
    Ok(rows)
}

struct Shared<'a> {
    buf: &'a [u8],
    stride: usize,
    height: usize,
    next_row: AtomicUsize,
    failed: AtomicBool,
    max_segment_len: AtomicUsize,
}

struct WorkerOutput {
    buffer: Vec<u8>,
    rows: Vec<(usize, Segment)>,
    error: Option<HdrError>,
}

impl Shared<'_> {
    fn claim_row(&self) -> Option<usize> {
        if self.failed.load(Ordering::Acquire) {
            return None;
        }
        let row = self.next_row.fetch_add(1, Ordering::Relaxed);
        (row < self.height).then_some(row)
    }

    fn record_segment_len(&self, len: usize) {
        let mut current = self.max_segment_len.load(Ordering::Relaxed);
        while current < len {
            match self.max_segment_len.compare_exchange_weak(
                current,
                len,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    fn run_worker(&self, worker: usize) -> WorkerOutput {
        let mut output = WorkerOutput {
            buffer: Vec::new(),
            rows: Vec::new(),
            error: None,
        };
        while let Some(row) = self.claim_row() {
            let start = output.buffer.len();
            let scanline = &self.buf[row * self.stride..][..self.stride];
            if let Err(err) = crunch(scanline, &mut output.buffer) {
                self.failed.store(true, Ordering::Release);
                output.buffer.truncate(start);
                output.error = Some(err);
                break;
            }
            let end = output.buffer.len();
            self.record_segment_len(end - start);
            output.rows.push((row, Segment { worker, start, end }));
        }
        output
    }
}

// Blocks until every worker has returned. Outputs are in worker order.
#[cfg(feature = "rayon")]
fn run_workers(shared: &Shared<'_>, threads: Option<usize>) -> HdrResult<Vec<WorkerOutput>> {
    match threads {
        None => Ok(rayon::broadcast(|ctx| shared.run_worker(ctx.index()))),
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads.max(1))
                .build()
                .map_err(|err| EncodeError::WorkerPool(err.to_string()))?;
            Ok(pool.broadcast(|ctx| shared.run_worker(ctx.index())))
        }
    }
}

#[cfg(not(feature = "rayon"))]
fn run_workers(shared: &Shared<'_>, threads: Option<usize>) -> HdrResult<Vec<WorkerOutput>> {
    if threads.map_or(false, |threads| threads > 1) {
        debug!("HDR encoder built without rayon, using one worker");
    }
    Ok(vec![shared.run_worker(0)])
}
