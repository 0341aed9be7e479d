//! Execution-context capability used by the accelerated backend.
//!
//! An [`ExecutionContext`] owns device-side buffers of single-precision
//! complex samples and runs [`Kernel`]s against them. [`ExecutionContext::run`]
//! blocks until the kernel has finished, so a caller can read results back
//! immediately afterwards. All operations on one context go through `&mut self`
//! and are therefore serialized on a single logical queue.
//!
//! [`ThreadPoolContext`] (feature `parallel`) is the provided implementation:
//! buffers live in host memory and kernels are spread over a dedicated
//! [`rayon`](https://crates.io/crates/rayon) thread pool.

use core::fmt;

use crate::num::Complex32;

/// Handle to a buffer owned by an [`ExecutionContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(usize);

impl BufferId {
    /// Handle for slot `index`, minted by [`ExecutionContext::alloc`]
    /// implementations.
    pub fn new(index: usize) -> Self {
        BufferId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The execution substrate could not be brought up.
    Unavailable(String),
    /// The handle does not name a live buffer.
    InvalidBuffer(BufferId),
    /// A kernel was asked to read and write the same buffer.
    AliasedBuffers(BufferId),
    /// A transfer or kernel did not match the buffer size.
    SizeMismatch { expected: usize, got: usize },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Unavailable(reason) => {
                write!(f, "execution context unavailable: {reason}")
            }
            DeviceError::InvalidBuffer(id) => write!(f, "buffer {} is not allocated", id.0),
            DeviceError::AliasedBuffers(id) => {
                write!(f, "buffer {} used as both kernel input and output", id.0)
            }
            DeviceError::SizeMismatch { expected, got } => {
                write!(f, "expected {expected} elements, got {got}")
            }
        }
    }
}

impl std::error::Error for DeviceError {}

/// Work that can be dispatched on an [`ExecutionContext`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// One radix-2 Stockham pass applied independently to every `len`-sample
    /// line of `src`, written to `dst`. `twiddles` holds the `len/2` forward
    /// twiddle factors.
    Stockham {
        src: BufferId,
        dst: BufferId,
        twiddles: BufferId,
        len: usize,
        n1: usize,
        n2: usize,
    },
    /// Negate the imaginary part of every element in place.
    Conjugate { buf: BufferId },
    /// Multiply every element by a real factor in place.
    Scale { buf: BufferId, factor: f32 },
    /// Transpose a `rows`×`cols` grid from `src` into `dst`.
    Transpose {
        src: BufferId,
        dst: BufferId,
        rows: usize,
        cols: usize,
    },
}

/// Buffer allocation plus a blocking "run kernel" primitive.
pub trait ExecutionContext {
    /// Human-readable description of the substrate.
    fn label(&self) -> String;
    fn alloc(&mut self, len: usize) -> Result<BufferId, DeviceError>;
    fn release(&mut self, id: BufferId) -> Result<(), DeviceError>;
    fn upload(&mut self, id: BufferId, data: &[Complex32]) -> Result<(), DeviceError>;
    fn download(&self, id: BufferId, out: &mut [Complex32]) -> Result<(), DeviceError>;
    /// Run `kernel` to completion.
    fn run(&mut self, kernel: &Kernel) -> Result<(), DeviceError>;
}

impl<C: ExecutionContext + ?Sized> ExecutionContext for Box<C> {
    fn label(&self) -> String {
        (**self).label()
    }
    fn alloc(&mut self, len: usize) -> Result<BufferId, DeviceError> {
        (**self).alloc(len)
    }
    fn release(&mut self, id: BufferId) -> Result<(), DeviceError> {
        (**self).release(id)
    }
    fn upload(&mut self, id: BufferId, data: &[Complex32]) -> Result<(), DeviceError> {
        (**self).upload(id, data)
    }
    fn download(&self, id: BufferId, out: &mut [Complex32]) -> Result<(), DeviceError> {
        (**self).download(id, out)
    }
    fn run(&mut self, kernel: &Kernel) -> Result<(), DeviceError> {
        (**self).run(kernel)
    }
}

/// Slab of host-resident device buffers shared by context implementations.
#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
#[derive(Default)]
pub(crate) struct BufferSlab {
    slots: Vec<Option<Vec<Complex32>>>,
}

#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
impl BufferSlab {
    pub(crate) fn alloc(&mut self, len: usize) -> BufferId {
        let buffer = Some(vec![Complex32::zero(); len]);
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = buffer;
                BufferId(slot)
            }
            None => {
                self.slots.push(buffer);
                BufferId(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn release(&mut self, id: BufferId) -> Result<(), DeviceError> {
        match self.slots.get_mut(id.0) {
            Some(slot @ Some(_)) => {
                *slot = None;
                Ok(())
            }
            _ => Err(DeviceError::InvalidBuffer(id)),
        }
    }

    pub(crate) fn get(&self, id: BufferId) -> Result<&[Complex32], DeviceError> {
        self.slots
            .get(id.0)
            .and_then(Option::as_deref)
            .ok_or(DeviceError::InvalidBuffer(id))
    }

    pub(crate) fn get_mut(&mut self, id: BufferId) -> Result<&mut [Complex32], DeviceError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_deref_mut)
            .ok_or(DeviceError::InvalidBuffer(id))
    }

    /// Detach a buffer so it can be written while others are read.
    pub(crate) fn take(&mut self, id: BufferId) -> Result<Vec<Complex32>, DeviceError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(DeviceError::InvalidBuffer(id))
    }

    pub(crate) fn restore(&mut self, id: BufferId, buffer: Vec<Complex32>) {
        self.slots[id.0] = Some(buffer);
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg_attr(not(feature = "parallel"), allow(dead_code))]
fn expect_len(expected: usize, got: usize) -> Result<(), DeviceError> {
    if expected == got {
        Ok(())
    } else {
        Err(DeviceError::SizeMismatch { expected, got })
    }
}

#[cfg(feature = "parallel")]
pub use self::pool::ThreadPoolContext;

#[cfg(feature = "parallel")]
mod pool {
    use super::*;
    use crate::fft::butterfly;
    use rayon::prelude::*;

    /// Default number of butterflies handed to one task when a single group is
    /// large enough to be split.
    const DEFAULT_BLOCK_SIZE: usize = 256;

    /// Execution context backed by a dedicated rayon thread pool.
    pub struct ThreadPoolContext {
        pool: rayon::ThreadPool,
        threads: usize,
        block_size: usize,
        slab: BufferSlab,
    }

    impl ThreadPoolContext {
        /// Build a pool with `threads` workers (`0` uses the number of CPUs).
        pub fn new(threads: usize) -> Result<Self, DeviceError> {
            let threads = if threads == 0 {
                num_cpus::get().max(1)
            } else {
                threads
            };
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("fftprobe-worker-{i}"))
                .build()
                .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
            log::info!("execution context up: {threads} worker threads");
            Ok(Self {
                pool,
                threads,
                block_size: DEFAULT_BLOCK_SIZE,
                slab: BufferSlab::default(),
            })
        }

        /// Override the per-task butterfly count (`0` keeps the default).
        pub fn with_block_size(mut self, block_size: usize) -> Self {
            if block_size != 0 {
                self.block_size = block_size;
            }
            self
        }

        pub fn threads(&self) -> usize {
            self.threads
        }

        /// Number of buffers currently allocated.
        pub fn live_buffers(&self) -> usize {
            self.slab.live()
        }

        fn stockham(
            &mut self,
            src: BufferId,
            dst: BufferId,
            twiddles: BufferId,
            (len, n1, n2): (usize, usize, usize),
        ) -> Result<(), DeviceError> {
            if src == dst {
                return Err(DeviceError::AliasedBuffers(src));
            }
            let mut out = self.slab.take(dst)?;
            let result = (|| -> Result<(), DeviceError> {
                let input = self.slab.get(src)?;
                let tw = self.slab.get(twiddles)?;
                expect_len(input.len(), out.len())?;
                expect_len(len / 2, tw.len())?;
                if len == 0 || n1 * n2 * 2 != len || input.len() % len != 0 {
                    return Err(DeviceError::SizeMismatch {
                        expected: len,
                        got: n1 * n2 * 2,
                    });
                }
                let block = self.block_size;
                self.pool.install(|| {
                    out.par_chunks_mut(len)
                        .zip(input.par_chunks(len))
                        .for_each(|(dst, src)| {
                            let (lo, hi) = dst.split_at_mut(n1 * n2);
                            lo.par_chunks_mut(n2)
                                .zip(hi.par_chunks_mut(n2))
                                .zip(src.par_chunks(2 * n2))
                                .enumerate()
                                .for_each(|(k, ((lo, hi), src))| {
                                    let (a, b) = src.split_at(n2);
                                    let w = tw[k * n2];
                                    if n2 > block {
                                        a.par_chunks(block)
                                            .zip(b.par_chunks(block))
                                            .zip(lo.par_chunks_mut(block))
                                            .zip(hi.par_chunks_mut(block))
                                            .for_each(|(((a, b), lo), hi)| {
                                                butterfly(a, b, lo, hi, w)
                                            });
                                    } else {
                                        butterfly(a, b, lo, hi, w);
                                    }
                                });
                        });
                });
                Ok(())
            })();
            self.slab.restore(dst, out);
            result
        }

        fn transpose(
            &mut self,
            src: BufferId,
            dst: BufferId,
            rows: usize,
            cols: usize,
        ) -> Result<(), DeviceError> {
            if src == dst {
                return Err(DeviceError::AliasedBuffers(src));
            }
            let mut out = self.slab.take(dst)?;
            let result = (|| -> Result<(), DeviceError> {
                let input = self.slab.get(src)?;
                expect_len(rows * cols, input.len())?;
                expect_len(rows * cols, out.len())?;
                if rows == 0 {
                    return Ok(());
                }
                self.pool.install(|| {
                    out.par_chunks_mut(rows).enumerate().for_each(|(c, line)| {
                        for (r, slot) in line.iter_mut().enumerate() {
                            *slot = input[r * cols + c];
                        }
                    });
                });
                Ok(())
            })();
            self.slab.restore(dst, out);
            result
        }
    }

    impl ExecutionContext for ThreadPoolContext {
        fn label(&self) -> String {
            format!("rayon thread pool ({} threads)", self.threads())
        }

        fn alloc(&mut self, len: usize) -> Result<BufferId, DeviceError> {
            Ok(self.slab.alloc(len))
        }

        fn release(&mut self, id: BufferId) -> Result<(), DeviceError> {
            self.slab.release(id)
        }

        fn upload(&mut self, id: BufferId, data: &[Complex32]) -> Result<(), DeviceError> {
            let buf = self.slab.get_mut(id)?;
            expect_len(buf.len(), data.len())?;
            buf.copy_from_slice(data);
            Ok(())
        }

        fn download(&self, id: BufferId, out: &mut [Complex32]) -> Result<(), DeviceError> {
            let buf = self.slab.get(id)?;
            expect_len(buf.len(), out.len())?;
            out.copy_from_slice(buf);
            Ok(())
        }

        fn run(&mut self, kernel: &Kernel) -> Result<(), DeviceError> {
            match *kernel {
                Kernel::Stockham {
                    src,
                    dst,
                    twiddles,
                    len,
                    n1,
                    n2,
                } => self.stockham(src, dst, twiddles, (len, n1, n2)),
                Kernel::Conjugate { buf } => {
                    let buf = self.slab.get_mut(buf)?;
                    self.pool
                        .install(|| buf.par_iter_mut().for_each(|c| c.im = -c.im));
                    Ok(())
                }
                Kernel::Scale { buf, factor } => {
                    let buf = self.slab.get_mut(buf)?;
                    self.pool
                        .install(|| buf.par_iter_mut().for_each(|c| *c *= factor));
                    Ok(())
                }
                Kernel::Transpose {
                    src,
                    dst,
                    rows,
                    cols,
                } => self.transpose(src, dst, rows, cols),
            }
        }
    }

    impl Drop for ThreadPoolContext {
        fn drop(&mut self) {
            let leaked = self.slab.live();
            if leaked != 0 {
                log::warn!("execution context dropped with {leaked} live buffers");
            }
            log::info!("execution context released");
        }
    }
}

#[cfg(all(test, feature = "parallel"))]
mod tests {
    use super::*;
    use crate::fft::{stockham_pass, twiddle_table};

    fn ramp(n: usize) -> Vec<Complex32> {
        (0..n)
            .map(|i| Complex32::new(i as f32, -(i as f32) * 0.5))
            .collect()
    }

    #[test]
    fn stockham_kernel_matches_sequential_pass() {
        let len = 64;
        let mut ctx = ThreadPoolContext::new(2).unwrap().with_block_size(4);
        let data = ramp(len * 3);
        let tw = twiddle_table::<f32>(len);
        let src = ctx.alloc(data.len()).unwrap();
        let dst = ctx.alloc(data.len()).unwrap();
        let twiddles = ctx.alloc(tw.len()).unwrap();
        ctx.upload(src, &data).unwrap();
        ctx.upload(twiddles, &tw).unwrap();
        ctx.run(&Kernel::Stockham {
            src,
            dst,
            twiddles,
            len,
            n1: 1,
            n2: len / 2,
        })
        .unwrap();
        let mut got = vec![Complex32::zero(); data.len()];
        ctx.download(dst, &mut got).unwrap();

        let mut expected = vec![Complex32::zero(); data.len()];
        for (s, d) in data.chunks(len).zip(expected.chunks_mut(len)) {
            stockham_pass(s, d, &tw, 1, len / 2);
        }
        assert_eq!(got, expected);
        for id in [src, dst, twiddles] {
            ctx.release(id).unwrap();
        }
        assert_eq!(ctx.live_buffers(), 0);
    }

    #[test]
    fn worker_count_defaults_to_cpus() {
        let ctx = ThreadPoolContext::new(3).unwrap();
        assert_eq!(ctx.threads(), 3);
        assert_eq!(ctx.label(), "rayon thread pool (3 threads)");
        assert!(ThreadPoolContext::new(0).unwrap().threads() >= 1);
    }

    #[test]
    fn transpose_and_elementwise_kernels() {
        let mut ctx = ThreadPoolContext::new(1).unwrap();
        let a = ctx.alloc(6).unwrap();
        let b = ctx.alloc(6).unwrap();
        ctx.upload(a, &ramp(6)).unwrap();
        ctx.run(&Kernel::Transpose {
            src: a,
            dst: b,
            rows: 2,
            cols: 3,
        })
        .unwrap();
        ctx.run(&Kernel::Conjugate { buf: b }).unwrap();
        ctx.run(&Kernel::Scale { buf: b, factor: 2.0 }).unwrap();
        let mut out = vec![Complex32::zero(); 6];
        ctx.download(b, &mut out).unwrap();
        // column-major order of the 2x3 ramp: 0,3,1,4,2,5
        let re: Vec<f32> = out.iter().map(|c| c.re).collect();
        assert_eq!(re, vec![0.0, 6.0, 2.0, 8.0, 4.0, 10.0]);
        assert_eq!(out[1].im, 3.0);
    }

    #[test]
    fn misuse_is_reported() {
        let mut ctx = ThreadPoolContext::new(1).unwrap();
        let a = ctx.alloc(4).unwrap();
        assert_eq!(
            ctx.upload(a, &ramp(3)),
            Err(DeviceError::SizeMismatch {
                expected: 4,
                got: 3
            })
        );
        assert_eq!(
            ctx.run(&Kernel::Transpose {
                src: a,
                dst: a,
                rows: 2,
                cols: 2
            }),
            Err(DeviceError::AliasedBuffers(a))
        );
        ctx.release(a).unwrap();
        assert_eq!(ctx.release(a), Err(DeviceError::InvalidBuffer(a)));
        // slot reuse after release
        let b = ctx.alloc(2).unwrap();
        assert_eq!(b, a);
    }
}
