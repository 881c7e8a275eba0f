use std::collections::BTreeMap;

use super::registers::RegisterFile;
use super::value::Value;

/// Register values recorded by local-recording instructions while execution
/// sat at one call depth, keyed by register index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    locals: BTreeMap<usize, Value>,
}

impl Frame {
    pub fn get(&self, reg: usize) -> Option<Value> {
        self.locals.get(&reg).copied()
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Value)> + '_ {
        self.locals.iter().map(|(reg, val)| (*reg, *val))
    }
}

/// One frame per call depth reached so far. Frames are created the first time
/// a depth is entered and are never popped; a later call at the same depth
/// reuses the frame and overwrites its entries.
#[derive(Debug, Clone)]
pub struct FrameStack {
    frames: Vec<Frame>,
    fp: usize,
}

impl Default for FrameStack {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            fp: 0,
        }
    }

    /// Current call depth.
    pub fn depth(&self) -> usize {
        self.fp
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.fp]
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Records `val` for `reg` in the frame at the current depth. `reg` must
    /// already have passed [`RegisterFile::check`].
    pub(crate) fn snapshot(&mut self, reg: usize, val: Value) {
        self.frames[self.fp].locals.insert(reg, val);
    }

    pub fn enter(&mut self) {
        self.fp += 1;

        if self.fp == self.frames.len() {
            self.frames.push(Frame::default());
        }
    }

    /// Steps back one depth and writes every entry of the frame now current
    /// into `regs`. Registers with no entry keep whatever the callee left.
    ///
    /// Returns `false` at depth 0, where there is nothing to return to.
    pub fn leave(&mut self, regs: &mut RegisterFile) -> bool {
        if self.fp == 0 {
            return false;
        }

        self.fp -= 1;

        for (reg, val) in self.frames[self.fp].iter() {
            regs.restore(reg, val);
        }

        true
    }
}
