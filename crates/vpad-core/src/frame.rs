//! Cancellable per-frame tasks.
//!
//! Controls never hold a recursive animation-frame callback. They request
//! a one-shot `FrameHandle` from a `FrameScheduler`, keep it in a
//! `FrameTask`, and re-request from inside the frame when they want to keep
//! running. Cancelling the task revokes the handle, so a late firing is
//! recognized as stale and ignored.

/// Opaque id of one frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Anything that can run a callback on the next rendering frame.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// One-shot frame requests tagged with an owner key.
///
/// `take_due` hands back everything requested so far, in request order;
/// anything requested while those are processed runs on the next frame.
#[derive(Debug)]
pub struct FrameQueue<K = ()> {
    next_id: u64,
    pending: Vec<(FrameHandle, K)>,
}

impl<K> Default for FrameQueue<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<K: Copy> FrameQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, owner: K) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push((handle, owner));
        handle
    }

    pub fn cancel(&mut self, handle: FrameHandle) {
        self.pending.retain(|(h, _)| *h != handle);
    }

    /// Remove every pending request belonging to `owner`.
    pub fn cancel_owner(&mut self, owner: K)
    where
        K: PartialEq,
    {
        self.pending.retain(|(_, o)| *o != owner);
    }

    pub fn take_due(&mut self) -> Vec<(FrameHandle, K)> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// A scheduler view that tags every request with `owner`.
    pub fn scoped(&mut self, owner: K) -> ScopedFrames<'_, K> {
        ScopedFrames { queue: self, owner }
    }
}

impl FrameScheduler for FrameQueue<()> {
    fn request_frame(&mut self) -> FrameHandle {
        self.request(())
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancel(handle);
    }
}

/// Borrowed `FrameQueue` bound to one owner.
pub struct ScopedFrames<'a, K> {
    queue: &'a mut FrameQueue<K>,
    owner: K,
}

impl<K: Copy> FrameScheduler for ScopedFrames<'_, K> {
    fn request_frame(&mut self) -> FrameHandle {
        self.queue.request(self.owner)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queue.cancel(handle);
    }
}

/// At most one outstanding frame request.
#[derive(Debug, Default)]
pub struct FrameTask {
    handle: Option<FrameHandle>,
}

impl FrameTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.handle.is_some()
    }

    /// Request a frame unless one is already outstanding.
    pub fn ensure(&mut self, frames: &mut dyn FrameScheduler) {
        if self.handle.is_none() {
            self.handle = Some(frames.request_frame());
        }
    }

    pub fn cancel(&mut self, frames: &mut dyn FrameScheduler) {
        if let Some(handle) = self.handle.take() {
            frames.cancel_frame(handle);
        }
    }

    /// Consume the outstanding request if `handle` is it.
    /// Returns `false` for stale or foreign handles.
    pub fn accept(&mut self, handle: FrameHandle) -> bool {
        if self.handle == Some(handle) {
            self.handle = None;
            true
        } else {
            false
        }
    }
}
