//! Cooperative cancellation.
//!
//! A [`CancelToken`] is a shared flag. Child tokens observe their parent, so
//! cancelling a folder's root token stops every per-record unit derived from
//! it, while a single unit can be abandoned (timeout) without touching its
//! siblings.
//!
//! Decoding can't be interrupted from outside, so sources are read through a
//! [`CancelableReader`] that fails the next `read`/`seek` once its token is
//! cancelled. The decoder then unwinds with an I/O error.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled when either it or `self` is cancelled.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }
}

/// Reader wrapper that aborts once its token is cancelled.
pub struct CancelableReader<R> {
    inner: R,
    token: CancelToken,
}

impl<R> CancelableReader<R> {
    pub fn new(inner: R, token: CancelToken) -> Self {
        Self { inner, token }
    }

    fn check(&self) -> io::Result<()> {
        if self.token.is_cancelled() {
            return Err(io::Error::other("read cancelled"));
        }
        Ok(())
    }
}

impl<R: Read> Read for CancelableReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.check()?;
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for CancelableReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.check()?;
        self.inner.seek(pos)
    }
}
