use crate::error::JvmError;
use crate::keys::MethodId;
use crate::vm::{ObjectRef, Value};

/// Activation record of one interpreted method: its pc, `max_locals` local
/// slots, and an operand stack bounded by `max_stack`.
pub struct JavaFrame {
    method_id: MethodId,
    pc: usize,
    locals: Vec<Value>,
    operands: Vec<Value>,
    max_stack: usize,
}

impl JavaFrame {
    /// `args` are the marshalled arguments, receiver first, with a `Null`
    /// placeholder already following every category-2 value.
    pub fn new(method_id: MethodId, max_stack: u16, max_locals: u16, mut args: Vec<Value>) -> Self {
        if args.len() < max_locals as usize {
            args.resize(max_locals as usize, Value::Null);
        }
        Self {
            method_id,
            pc: 0,
            locals: args,
            operands: Vec::with_capacity(max_stack as usize),
            max_stack: max_stack as usize,
        }
    }

    pub fn method_id(&self) -> MethodId {
        self.method_id
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn pc_mut(&mut self) -> &mut usize {
        &mut self.pc
    }

    pub fn increment_pc(&mut self, by: u16) {
        self.pc += by as usize;
    }

    pub fn get_local(&self, index: usize) -> Result<&Value, JvmError> {
        self.locals.get(index).ok_or(JvmError::LocalIndexOutOfBounds {
            index,
            max_locals: self.locals.len(),
        })
    }

    /// Writes the slot; a category-2 value also claims the next slot with a
    /// `Null` placeholder.
    pub fn set_local(&mut self, index: usize, value: Value) -> Result<(), JvmError> {
        let wide = value.is_wide();
        let last_needed = if wide { index + 1 } else { index };
        if last_needed >= self.locals.len() {
            return Err(JvmError::LocalIndexOutOfBounds {
                index: last_needed,
                max_locals: self.locals.len(),
            });
        }
        self.locals[index] = value;
        if wide {
            self.locals[index + 1] = Value::Null;
        }
        Ok(())
    }

    pub fn push_operand(&mut self, value: Value) -> Result<(), JvmError> {
        if self.operands.len() >= self.max_stack {
            return Err(JvmError::OperandStackOverflow {
                max_stack: self.max_stack,
            });
        }
        self.operands.push(value);
        Ok(())
    }

    pub fn pop_operand(&mut self) -> Result<Value, JvmError> {
        self.operands.pop().ok_or(JvmError::OperandStackIsEmpty)
    }

    pub fn peek_operand(&self) -> Result<&Value, JvmError> {
        self.operands.last().ok_or(JvmError::OperandStackIsEmpty)
    }

    pub fn peek_operand_at(&self, depth: usize) -> Result<&Value, JvmError> {
        if depth >= self.operands.len() {
            return Err(JvmError::OperandStackIsEmpty);
        }
        Ok(&self.operands[self.operands.len() - 1 - depth])
    }

    pub fn clear_operands(&mut self) {
        self.operands.clear();
    }

    pub fn operand_depth(&self) -> usize {
        self.operands.len()
    }

    pub fn locals(&self) -> &[Value] {
        &self.locals
    }

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }
}

/// The thread's frame stack; the top frame is the one being interpreted.
pub struct FrameStack {
    frames: Vec<JavaFrame>,
    max_depth: usize,
}

impl FrameStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub fn push_frame(&mut self, frame: JavaFrame) -> Result<(), JvmError> {
        if self.frames.len() >= self.max_depth {
            return Err(JvmError::FrameStackOverflow {
                limit: self.max_depth,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop_frame(&mut self) -> Result<JavaFrame, JvmError> {
        self.frames.pop().ok_or(JvmError::FrameStackIsEmpty)
    }

    pub fn cur_frame(&self) -> Result<&JavaFrame, JvmError> {
        self.frames.last().ok_or(JvmError::FrameStackIsEmpty)
    }

    pub fn cur_frame_mut(&mut self) -> Result<&mut JavaFrame, JvmError> {
        self.frames.last_mut().ok_or(JvmError::FrameStackIsEmpty)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[JavaFrame] {
        &self.frames
    }

    pub fn pc(&self) -> Result<usize, JvmError> {
        Ok(self.cur_frame()?.pc())
    }

    pub fn pc_mut(&mut self) -> Result<&mut usize, JvmError> {
        Ok(self.cur_frame_mut()?.pc_mut())
    }

    pub fn push_operand(&mut self, value: Value) -> Result<(), JvmError> {
        self.cur_frame_mut()?.push_operand(value)
    }

    pub fn pop_operand(&mut self) -> Result<Value, JvmError> {
        self.cur_frame_mut()?.pop_operand()
    }

    pub fn peek_operand(&self) -> Result<&Value, JvmError> {
        self.cur_frame()?.peek_operand()
    }

    pub fn peek_operand_at(&self, depth: usize) -> Result<&Value, JvmError> {
        self.cur_frame()?.peek_operand_at(depth)
    }

    pub fn get_local(&self, index: usize) -> Result<Value, JvmError> {
        Ok(*self.cur_frame()?.get_local(index)?)
    }

    pub fn set_local(&mut self, index: usize, value: Value) -> Result<(), JvmError> {
        self.cur_frame_mut()?.set_local(index, value)
    }

    pub fn get_local_int_val(&self, index: usize) -> Result<i32, JvmError> {
        self.get_local(index)?.as_int()
    }

    pub fn dup_top(&mut self) -> Result<(), JvmError> {
        let value = *self.peek_operand()?;
        if value.is_wide() {
            return Err(JvmError::UnexpectedType(
                "dup applied to a category-2 value".to_string(),
            ));
        }
        self.push_operand(value)
    }

    // Typed pops. The `_val` variants unwrap to the host representation, the
    // bare variants validate the tag but keep the Value.

    pub fn pop_int_val(&mut self) -> Result<i32, JvmError> {
        self.pop_operand()?.as_int()
    }

    pub fn pop_long_val(&mut self) -> Result<i64, JvmError> {
        self.pop_operand()?.as_long()
    }

    pub fn pop_float_val(&mut self) -> Result<f32, JvmError> {
        self.pop_operand()?.as_float()
    }

    pub fn pop_double_val(&mut self) -> Result<f64, JvmError> {
        self.pop_operand()?.as_double()
    }

    pub fn pop_int(&mut self) -> Result<Value, JvmError> {
        let value = self.pop_operand()?;
        value.as_int()?;
        Ok(value)
    }

    pub fn pop_long(&mut self) -> Result<Value, JvmError> {
        let value = self.pop_operand()?;
        value.as_long()?;
        Ok(value)
    }

    pub fn pop_float(&mut self) -> Result<Value, JvmError> {
        let value = self.pop_operand()?;
        value.as_float()?;
        Ok(value)
    }

    pub fn pop_double(&mut self) -> Result<Value, JvmError> {
        let value = self.pop_operand()?;
        value.as_double()?;
        Ok(value)
    }

    /// Pops a reference; null raises `NullPointerException`.
    pub fn pop_obj_val(&mut self) -> Result<ObjectRef, JvmError> {
        self.pop_operand()?.as_obj_ref()
    }

    /// Pops a reference or null, keeping the Value.
    pub fn pop_nullable_ref(&mut self) -> Result<Value, JvmError> {
        let value = self.pop_operand()?;
        value.as_nullable_obj_ref()?;
        Ok(value)
    }

    pub fn pop_nullable_ref_val(&mut self) -> Result<Option<ObjectRef>, JvmError> {
        self.pop_operand()?.as_nullable_obj_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(max_stack: u16, max_locals: u16) -> JavaFrame {
        JavaFrame::new(MethodId::from_usize(1), max_stack, max_locals, vec![])
    }

    fn stack_with(frame: JavaFrame) -> FrameStack {
        let mut stack = FrameStack::new(16);
        stack.push_frame(frame).unwrap();
        stack
    }

    #[test]
    fn store_then_load_round_trips() {
        let mut stack = stack_with(frame(4, 4));
        stack.set_local(2, Value::Integer(41)).unwrap();
        assert_eq!(stack.get_local(2).unwrap(), Value::Integer(41));
    }

    #[test]
    fn wide_local_claims_placeholder_slot() {
        let mut stack = stack_with(frame(4, 4));
        stack.set_local(1, Value::Long(7)).unwrap();
        assert_eq!(stack.get_local(1).unwrap(), Value::Long(7));
        assert_eq!(stack.get_local(2).unwrap(), Value::Null);
    }

    #[test]
    fn wide_local_at_last_slot_is_rejected() {
        let mut stack = stack_with(frame(4, 4));
        assert!(matches!(
            stack.set_local(3, Value::Double(1.0)),
            Err(JvmError::LocalIndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn operand_stack_respects_max_stack() {
        let mut stack = stack_with(frame(2, 0));
        stack.push_operand(Value::Integer(1)).unwrap();
        stack.push_operand(Value::Integer(2)).unwrap();
        assert!(matches!(
            stack.push_operand(Value::Integer(3)),
            Err(JvmError::OperandStackOverflow { max_stack: 2 })
        ));
    }

    #[test]
    fn dup_then_pop_is_identity() {
        let mut stack = stack_with(frame(4, 0));
        stack.push_operand(Value::Integer(9)).unwrap();
        stack.dup_top().unwrap();
        stack.pop_operand().unwrap();
        assert_eq!(stack.pop_operand().unwrap(), Value::Integer(9));
    }

    #[test]
    fn dup_rejects_category_2() {
        let mut stack = stack_with(frame(4, 0));
        stack.push_operand(Value::Long(1)).unwrap();
        assert!(matches!(
            stack.dup_top(),
            Err(JvmError::UnexpectedType(_))
        ));
    }

    #[test]
    fn frame_depth_is_bounded() {
        let mut stack = FrameStack::new(1);
        stack.push_frame(frame(1, 1)).unwrap();
        assert!(matches!(
            stack.push_frame(frame(1, 1)),
            Err(JvmError::FrameStackOverflow { limit: 1 })
        ));
    }

    #[test]
    fn null_reference_pop_raises_npe() {
        let mut stack = stack_with(frame(2, 0));
        stack.push_operand(Value::Null).unwrap();
        assert!(matches!(
            stack.pop_obj_val(),
            Err(JvmError::JavaException(ex))
                if ex.kind == crate::error::JavaExceptionKind::NullPointerException
        ));
    }
}
