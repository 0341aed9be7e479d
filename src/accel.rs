//! Accelerated backend: the Stockham FFT run as kernels on an
//! [`ExecutionContext`].
//!
//! Samples are narrowed to single precision on upload, so agreement with the
//! double-precision backends is only to `f32` accuracy. Only power-of-two
//! sides are supported.
//!
//! The backend owns its context. Device buffers are released in [`Drop`]
//! before the context itself is dropped.

use crate::backend::{check_buffers, BackendError, BackendKind, Normalization, Shape, TransformBackend};
use crate::device::{BufferId, DeviceError, ExecutionContext, Kernel};
use crate::fft::{twiddle_table, FftError};
use crate::num::{Complex32, Complex64};

pub struct AcceleratedBackend {
    shape: Shape,
    front: BufferId,
    back: BufferId,
    twiddles: BufferId,
    staging: Vec<Complex32>,
    // Declared last: dropped after `Drop::drop` has released the buffers.
    context: Box<dyn ExecutionContext>,
}

impl AcceleratedBackend {
    /// Allocate device buffers for `shape` on `context` and upload the
    /// twiddle table.
    pub fn new(mut context: Box<dyn ExecutionContext>, shape: Shape) -> Result<Self, BackendError> {
        let side = shape.side();
        if side == 0 {
            return Err(FftError::EmptyInput.into());
        }
        if !side.is_power_of_two() {
            return Err(FftError::NonPowerOfTwo(side).into());
        }
        let len = shape.len();
        let front = context.alloc(len)?;
        let back = context.alloc(len)?;
        let twiddles = context.alloc(side / 2)?;
        context.upload(twiddles, &twiddle_table::<f32>(side))?;
        log::info!("accelerated backend acquired device buffers on {}", context.label());
        Ok(Self {
            shape,
            front,
            back,
            twiddles,
            staging: vec![Complex32::zero(); len],
            context,
        })
    }

    /// Description of the execution context this backend runs on.
    pub fn context_label(&self) -> String {
        self.context.label()
    }

    /// All radix-2 passes over every `len`-sample line of `src`. Returns the
    /// buffer holding the result.
    fn passes(&mut self, mut src: BufferId, mut dst: BufferId, len: usize) -> Result<BufferId, DeviceError> {
        let mut n1 = 1;
        let mut n2 = len;
        while n1 < len {
            n2 >>= 1;
            self.context.run(&Kernel::Stockham {
                src,
                dst,
                twiddles: self.twiddles,
                len,
                n1,
                n2,
            })?;
            core::mem::swap(&mut src, &mut dst);
            n1 <<= 1;
        }
        Ok(src)
    }

    /// Unscaled forward transform of the front buffer. Returns the buffer
    /// holding the spectrum.
    fn transform(&mut self) -> Result<BufferId, DeviceError> {
        let (front, back) = (self.front, self.back);
        match self.shape {
            Shape::Line(n) => self.passes(front, back, n),
            Shape::Grid(n) => {
                let rows = self.passes(front, back, n)?;
                let spare = if rows == front { back } else { front };
                self.context.run(&Kernel::Transpose {
                    src: rows,
                    dst: spare,
                    rows: n,
                    cols: n,
                })?;
                let cols = self.passes(spare, rows, n)?;
                let spare = if cols == front { back } else { front };
                self.context.run(&Kernel::Transpose {
                    src: cols,
                    dst: spare,
                    rows: n,
                    cols: n,
                })?;
                Ok(spare)
            }
        }
    }

    fn upload(&mut self, input: &[Complex64]) -> Result<(), DeviceError> {
        for (dst, src) in self.staging.iter_mut().zip(input) {
            *dst = src.narrow();
        }
        self.context.upload(self.front, &self.staging)
    }

    fn download(&mut self, id: BufferId, output: &mut [Complex64]) -> Result<(), DeviceError> {
        self.context.download(id, &mut self.staging)?;
        for (dst, &src) in output.iter_mut().zip(&self.staging) {
            *dst = src.into();
        }
        Ok(())
    }

    fn release(&mut self) {
        for id in [self.twiddles, self.back, self.front] {
            if let Err(e) = self.context.release(id) {
                log::warn!("failed to release device buffer: {e}");
            }
        }
        log::info!("accelerated backend released its device buffers");
    }
}

impl TransformBackend for AcceleratedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn shape(&self) -> Shape {
        self.shape
    }

    fn normalization(&self) -> Normalization {
        Normalization::Forward
    }

    fn describe(&self) -> String {
        format!("accelerated on {}", self.context_label())
    }

    fn forward(&mut self, input: &[Complex64], output: &mut [Complex64]) -> Result<(), BackendError> {
        check_buffers(self.shape, input, output)?;
        self.upload(input)?;
        let spectrum = self.transform()?;
        self.context.run(&Kernel::Scale {
            buf: spectrum,
            factor: 1.0 / self.shape.len() as f32,
        })?;
        self.download(spectrum, output)?;
        Ok(())
    }

    fn inverse(&mut self, input: &[Complex64], output: &mut [Complex64]) -> Result<(), BackendError> {
        check_buffers(self.shape, input, output)?;
        self.upload(input)?;
        // conj(F(conj(X))) is the unscaled inverse
        self.context.run(&Kernel::Conjugate { buf: self.front })?;
        let signal = self.transform()?;
        self.context.run(&Kernel::Conjugate { buf: signal })?;
        self.download(signal, output)?;
        Ok(())
    }
}

impl Drop for AcceleratedBackend {
    fn drop(&mut self) {
        self.release();
    }
}
