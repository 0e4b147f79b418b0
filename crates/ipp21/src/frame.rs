//! # Frame System
//!
//! Three frame roles share one addressing scheme: Global (always live),
//! Temporary (exists iff a `CREATEFRAME` hasn't yet been consumed by a
//! `PUSHFRAME` or cleared by `POPFRAME`), and Local (the top of a LIFO
//! stack pushed/popped by `PUSHFRAME`/`POPFRAME`). [`Frames`] is the single
//! owner of all three and is the only thing that ever addresses a
//! [`VarRef`].

use std::collections::HashMap;

use crate::error::{ErrorKind, IppError};
use crate::instruction::{FrameTag, VarRef};
use crate::value::Value;

/// A single frame: a name → value mapping. No cycles, no shared ownership —
/// plain `HashMap<String, Value>` is enough.
pub type Frame = HashMap<String, Value>;

/// Owns the global frame, the optional temporary frame, and the local frame
/// stack, and implements the addressing operations from the frame system.
#[derive(Debug, Default)]
pub struct Frames {
    global: Frame,
    temporary: Option<Frame>,
    locals: Vec<Frame>,
}

impl Frames {
    pub fn new() -> Self {
        Frames {
            global: Frame::new(),
            temporary: None,
            locals: Vec::new(),
        }
    }

    /// `CREATEFRAME`: drop any prior TF contents, create a fresh empty TF.
    pub fn create_tf(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// `PUSHFRAME`: requires a live TF; moves it onto the local stack.
    pub fn push_frame(&mut self) -> Result<(), IppError> {
        let tf = self
            .temporary
            .take()
            .ok_or_else(|| ErrorKind::UndefFrame.with_msg("PUSHFRAME: no temporary frame exists"))?;
        self.locals.push(tf);
        Ok(())
    }

    /// `POPFRAME`: requires a non-empty local stack; the popped local
    /// becomes the new TF.
    pub fn pop_frame(&mut self) -> Result<(), IppError> {
        let top = self
            .locals
            .pop()
            .ok_or_else(|| ErrorKind::UndefFrame.with_msg("POPFRAME: local frame stack is empty"))?;
        self.temporary = Some(top);
        Ok(())
    }

    fn frame_mut(&mut self, tag: FrameTag) -> Result<&mut Frame, IppError> {
        match tag {
            FrameTag::Global => Ok(&mut self.global),
            FrameTag::Temporary => self
                .temporary
                .as_mut()
                .ok_or_else(|| ErrorKind::UndefFrame.with_msg("temporary frame does not exist")),
            FrameTag::Local => self
                .locals
                .last_mut()
                .ok_or_else(|| ErrorKind::UndefFrame.with_msg("local frame stack is empty")),
        }
    }

    fn frame_ref(&self, tag: FrameTag) -> Result<&Frame, IppError> {
        match tag {
            FrameTag::Global => Ok(&self.global),
            FrameTag::Temporary => self
                .temporary
                .as_ref()
                .ok_or_else(|| ErrorKind::UndefFrame.with_msg("temporary frame does not exist")),
            FrameTag::Local => self
                .locals
                .last()
                .ok_or_else(|| ErrorKind::UndefFrame.with_msg("local frame stack is empty")),
        }
    }

    /// `DEFVAR`: inserts `id.name` as `Uninit` in its frame. Fails
    /// `UndefFrame` if the frame isn't live, `UndefRedef` if already present.
    pub fn def_var(&mut self, id: &VarRef) -> Result<(), IppError> {
        let frame = self.frame_mut(id.frame)?;
        if frame.contains_key(&id.name) {
            return Err(ErrorKind::UndefRedef.with_msg(format!("variable {} already defined", id.name)));
        }
        frame.insert(id.name.clone(), Value::Uninit);
        Ok(())
    }

    /// Read a value without requiring initialization — `TYPE` uses this to
    /// report `""` for `Uninit` slots.
    pub fn get_slot(&self, id: &VarRef) -> Result<&Value, IppError> {
        let frame = self.frame_ref(id.frame)?;
        frame
            .get(&id.name)
            .ok_or_else(|| ErrorKind::UndefVar.with_msg(format!("variable {} is not defined", id.name)))
    }

    /// Read a value, requiring it to have been initialized.
    pub fn read_value(&self, id: &VarRef) -> Result<&Value, IppError> {
        let v = self.get_slot(id)?;
        if matches!(v, Value::Uninit) {
            return Err(ErrorKind::MissingVal.with_msg(format!("variable {} has no value", id.name)));
        }
        Ok(v)
    }

    /// Overwrite a slot's value. The slot must already be defined.
    pub fn write_value(&mut self, id: &VarRef, value: Value) -> Result<(), IppError> {
        let frame = self.frame_mut(id.frame)?;
        let slot = frame
            .get_mut(&id.name)
            .ok_or_else(|| ErrorKind::UndefVar.with_msg(format!("variable {} is not defined", id.name)))?;
        *slot = value;
        Ok(())
    }

    /// Count of simultaneously initialized variables across GF + current
    /// LF + TF, for the `vars` statistic.
    pub fn initialized_count(&self) -> usize {
        let count_frame = |f: &Frame| f.values().filter(|v| !matches!(v, Value::Uninit)).count();
        let mut total = count_frame(&self.global);
        if let Some(tf) = &self.temporary {
            total += count_frame(tf);
        }
        if let Some(lf) = self.locals.last() {
            total += count_frame(lf);
        }
        total
    }
}
