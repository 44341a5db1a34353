use crate::error::JvmError;
use crate::interpreter::Interpreter;
use crate::keys::MethodKey;
use crate::rt::constant_pool::RuntimeConstant;
use crate::thread::JavaThreadState;
use crate::vm::{Value, VirtualMachine};
use crate::{build_exception, throw_exception};
use sigrun_common::instruction::{ArrayType, LookupSwitchData, TableSwitchData};

fn branch16(bci: usize, off: i16) -> usize {
    ((bci as isize) + (off as isize)) as usize
}

fn branch32(bci: usize, off: i32) -> usize {
    ((bci as isize) + (off as isize)) as usize
}

/// NaN on either side yields `nan_result` (−1 for the `l` forms, +1 for the
/// `g` forms); comparison is otherwise exact.
fn fcmp(v1: f32, v2: f32, nan_result: i32) -> i32 {
    if v1.is_nan() || v2.is_nan() {
        nan_result
    } else if v1 > v2 {
        1
    } else if v1 < v2 {
        -1
    } else {
        0
    }
}

fn dcmp(v1: f64, v2: f64, nan_result: i32) -> i32 {
    if v1.is_nan() || v2.is_nan() {
        nan_result
    } else if v1 > v2 {
        1
    } else if v1 < v2 {
        -1
    } else {
        0
    }
}

// Constants

#[inline]
pub(super) fn handle_aconst_null(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    thread.stack.push_operand(Value::Null)
}

#[inline]
pub(super) fn handle_iconst(thread: &mut JavaThreadState, value: i32) -> Result<(), JvmError> {
    thread.stack.push_operand(Value::Integer(value))
}

#[inline]
pub(super) fn handle_lconst(thread: &mut JavaThreadState, value: i64) -> Result<(), JvmError> {
    thread.stack.push_operand(Value::Long(value))
}

#[inline]
pub(super) fn handle_fconst(thread: &mut JavaThreadState, value: f32) -> Result<(), JvmError> {
    thread.stack.push_operand(Value::Float(value))
}

#[inline]
pub(super) fn handle_dconst(thread: &mut JavaThreadState, value: f64) -> Result<(), JvmError> {
    thread.stack.push_operand(Value::Double(value))
}

#[inline]
pub(super) fn handle_bipush(thread: &mut JavaThreadState, value: i8) -> Result<(), JvmError> {
    thread.stack.push_operand(Value::Integer(value as i32))
}

#[inline]
pub(super) fn handle_sipush(thread: &mut JavaThreadState, value: i16) -> Result<(), JvmError> {
    thread.stack.push_operand(Value::Integer(value as i32))
}

#[inline]
pub(super) fn handle_ldc(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let ldc_operand = {
        let ma = vm.method_area_read();
        let cp = ma.get_cp_by_method_id(&cur_method_id)?;
        match cp.get_constant(&idx, vm.interner())? {
            RuntimeConstant::Integer(val) => Value::Integer(*val),
            RuntimeConstant::Float(val) => Value::Float(*val),
            RuntimeConstant::Long(val) => Value::Long(*val),
            RuntimeConstant::Double(val) => Value::Double(*val),
            RuntimeConstant::String(str_entry) => {
                let string_sym = *str_entry.string_sym.get().ok_or(build_exception!(
                    ClassFormatError,
                    "string constant {} not resolved",
                    idx
                ))?;
                let string_ref = vm.heap_write().get_str_from_pool_or_new(string_sym)?;
                Value::Ref(string_ref)
            }
            other => return Err(JvmError::UnsupportedConstant(other.get_type())),
        }
    };
    thread.stack.push_operand(ldc_operand)
}

// Local loads and stores

#[inline]
pub(super) fn handle_load(thread: &mut JavaThreadState, index: usize) -> Result<(), JvmError> {
    let value = thread.stack.get_local(index)?;
    thread.stack.push_operand(value)
}

#[inline]
pub(super) fn handle_istore(thread: &mut JavaThreadState, index: usize) -> Result<(), JvmError> {
    let value = thread.stack.pop_int()?;
    thread.stack.set_local(index, value)
}

#[inline]
pub(super) fn handle_lstore(thread: &mut JavaThreadState, index: usize) -> Result<(), JvmError> {
    let value = thread.stack.pop_long()?;
    thread.stack.set_local(index, value)
}

#[inline]
pub(super) fn handle_fstore(thread: &mut JavaThreadState, index: usize) -> Result<(), JvmError> {
    let value = thread.stack.pop_float()?;
    thread.stack.set_local(index, value)
}

#[inline]
pub(super) fn handle_dstore(thread: &mut JavaThreadState, index: usize) -> Result<(), JvmError> {
    let value = thread.stack.pop_double()?;
    thread.stack.set_local(index, value)
}

#[inline]
pub(super) fn handle_astore(thread: &mut JavaThreadState, index: usize) -> Result<(), JvmError> {
    let value = thread.stack.pop_nullable_ref()?;
    thread.stack.set_local(index, value)
}

#[inline]
pub(super) fn handle_iinc(
    thread: &mut JavaThreadState,
    index: u8,
    const_val: i8,
) -> Result<(), JvmError> {
    let value = thread.stack.get_local_int_val(index as usize)?;
    thread.stack.set_local(
        index as usize,
        Value::Integer(value.wrapping_add(const_val as i32)),
    )
}

// Array loads and stores

#[inline]
pub(super) fn handle_array_load(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let index = thread.stack.pop_int_val()?;
    let array_ref = thread.stack.pop_obj_val()?;
    let value = vm.heap_read().read_array_element(array_ref.addr, index)?;
    thread.stack.push_operand(value)
}

#[inline]
pub(super) fn handle_int_array_store(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let value = thread.stack.pop_int_val()?;
    let index = thread.stack.pop_int_val()?;
    let array_ref = thread.stack.pop_obj_val()?;
    vm.heap_write()
        .write_array_element(array_ref.addr, index, Value::Integer(value))
}

#[inline]
pub(super) fn handle_lastore(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let value = thread.stack.pop_long()?;
    let index = thread.stack.pop_int_val()?;
    let array_ref = thread.stack.pop_obj_val()?;
    vm.heap_write().write_array_element(array_ref.addr, index, value)
}

#[inline]
pub(super) fn handle_fastore(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let value = thread.stack.pop_float()?;
    let index = thread.stack.pop_int_val()?;
    let array_ref = thread.stack.pop_obj_val()?;
    vm.heap_write().write_array_element(array_ref.addr, index, value)
}

#[inline]
pub(super) fn handle_dastore(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let value = thread.stack.pop_double()?;
    let index = thread.stack.pop_int_val()?;
    let array_ref = thread.stack.pop_obj_val()?;
    vm.heap_write().write_array_element(array_ref.addr, index, value)
}

#[inline]
pub(super) fn handle_aastore(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let value = thread.stack.pop_nullable_ref()?;
    let index = thread.stack.pop_int_val()?;
    let array_ref = thread.stack.pop_obj_val()?;
    vm.heap_write().write_array_element(array_ref.addr, index, value)
}

// Operand stack shuffles. Category shapes follow the value tags.

#[inline]
pub(super) fn handle_pop(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let value = thread.stack.pop_operand()?;
    if value.is_wide() {
        return Err(JvmError::UnexpectedType(
            "pop applied to a category-2 value".to_string(),
        ));
    }
    Ok(())
}

#[inline]
pub(super) fn handle_pop2(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let value1 = thread.stack.pop_operand()?;
    if !value1.is_wide() {
        let value2 = thread.stack.pop_operand()?;
        if value2.is_wide() {
            return Err(JvmError::UnexpectedType(
                "pop2 split a category-2 value".to_string(),
            ));
        }
    }
    Ok(())
}

#[inline]
pub(super) fn handle_dup(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    thread.stack.dup_top()
}

#[inline]
pub(super) fn handle_dup_x1(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let value1 = thread.stack.pop_operand()?;
    let value2 = thread.stack.pop_operand()?;
    if value1.is_wide() || value2.is_wide() {
        return Err(JvmError::UnexpectedType(
            "dup_x1 applied to a category-2 value".to_string(),
        ));
    }
    thread.stack.push_operand(value1)?;
    thread.stack.push_operand(value2)?;
    thread.stack.push_operand(value1)
}

#[inline]
pub(super) fn handle_dup_x2(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let value1 = thread.stack.pop_operand()?;
    if value1.is_wide() {
        return Err(JvmError::UnexpectedType(
            "dup_x2 applied to a category-2 value".to_string(),
        ));
    }
    let value2 = thread.stack.pop_operand()?;
    if value2.is_wide() {
        thread.stack.push_operand(value1)?;
        thread.stack.push_operand(value2)?;
        return thread.stack.push_operand(value1);
    }
    let value3 = thread.stack.pop_operand()?;
    thread.stack.push_operand(value1)?;
    thread.stack.push_operand(value3)?;
    thread.stack.push_operand(value2)?;
    thread.stack.push_operand(value1)
}

#[inline]
pub(super) fn handle_dup2(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let top = *thread.stack.peek_operand()?;
    if top.is_wide() {
        thread.stack.push_operand(top)
    } else {
        let value1 = *thread.stack.peek_operand()?;
        let value2 = *thread.stack.peek_operand_at(1)?;
        thread.stack.push_operand(value2)?;
        thread.stack.push_operand(value1)
    }
}

#[inline]
pub(super) fn handle_dup2_x1(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let value1 = thread.stack.pop_operand()?;
    if value1.is_wide() {
        let value2 = thread.stack.pop_operand()?;
        thread.stack.push_operand(value1)?;
        thread.stack.push_operand(value2)?;
        return thread.stack.push_operand(value1);
    }
    let value2 = thread.stack.pop_operand()?;
    let value3 = thread.stack.pop_operand()?;
    thread.stack.push_operand(value2)?;
    thread.stack.push_operand(value1)?;
    thread.stack.push_operand(value3)?;
    thread.stack.push_operand(value2)?;
    thread.stack.push_operand(value1)
}

#[inline]
pub(super) fn handle_dup2_x2(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let value1 = thread.stack.pop_operand()?;
    if value1.is_wide() {
        let value2 = thread.stack.pop_operand()?;
        if value2.is_wide() {
            thread.stack.push_operand(value1)?;
            thread.stack.push_operand(value2)?;
            return thread.stack.push_operand(value1);
        }
        let value3 = thread.stack.pop_operand()?;
        thread.stack.push_operand(value1)?;
        thread.stack.push_operand(value3)?;
        thread.stack.push_operand(value2)?;
        return thread.stack.push_operand(value1);
    }
    let value2 = thread.stack.pop_operand()?;
    let value3 = thread.stack.pop_operand()?;
    if value3.is_wide() {
        thread.stack.push_operand(value2)?;
        thread.stack.push_operand(value1)?;
        thread.stack.push_operand(value3)?;
        thread.stack.push_operand(value2)?;
        return thread.stack.push_operand(value1);
    }
    let value4 = thread.stack.pop_operand()?;
    thread.stack.push_operand(value2)?;
    thread.stack.push_operand(value1)?;
    thread.stack.push_operand(value4)?;
    thread.stack.push_operand(value3)?;
    thread.stack.push_operand(value2)?;
    thread.stack.push_operand(value1)
}

#[inline]
pub(super) fn handle_swap(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let value1 = thread.stack.pop_operand()?;
    let value2 = thread.stack.pop_operand()?;
    if value1.is_wide() || value2.is_wide() {
        return Err(JvmError::UnexpectedType(
            "swap applied to a category-2 value".to_string(),
        ));
    }
    thread.stack.push_operand(value1)?;
    thread.stack.push_operand(value2)
}

// Integer arithmetic

#[inline]
pub(super) fn handle_iadd(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer(v1.wrapping_add(v2)))
}

#[inline]
pub(super) fn handle_isub(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer(v1.wrapping_sub(v2)))
}

#[inline]
pub(super) fn handle_imul(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer(v1.wrapping_mul(v2)))
}

#[inline]
pub(super) fn handle_idiv(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero")?
    }
    thread.stack.push_operand(Value::Integer(v1.wrapping_div(v2)))
}

#[inline]
pub(super) fn handle_irem(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero")?
    }
    thread.stack.push_operand(Value::Integer(v1.wrapping_rem(v2)))
}

#[inline]
pub(super) fn handle_ineg(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer(v.wrapping_neg()))
}

// Long arithmetic

#[inline]
pub(super) fn handle_ladd(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Long(v1.wrapping_add(v2)))
}

#[inline]
pub(super) fn handle_lsub(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Long(v1.wrapping_sub(v2)))
}

#[inline]
pub(super) fn handle_lmul(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Long(v1.wrapping_mul(v2)))
}

#[inline]
pub(super) fn handle_ldiv(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero")?
    }
    thread.stack.push_operand(Value::Long(v1.wrapping_div(v2)))
}

#[inline]
pub(super) fn handle_lrem(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    if v2 == 0 {
        throw_exception!(ArithmeticException, "/ by zero")?
    }
    thread.stack.push_operand(Value::Long(v1.wrapping_rem(v2)))
}

#[inline]
pub(super) fn handle_lneg(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Long(v.wrapping_neg()))
}

// Float arithmetic. Division by zero follows IEEE, rem is fmod.

#[inline]
pub(super) fn handle_fadd(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_float_val()?;
    let v1 = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Float(v1 + v2))
}

#[inline]
pub(super) fn handle_fsub(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_float_val()?;
    let v1 = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Float(v1 - v2))
}

#[inline]
pub(super) fn handle_fmul(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_float_val()?;
    let v1 = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Float(v1 * v2))
}

#[inline]
pub(super) fn handle_fdiv(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_float_val()?;
    let v1 = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Float(v1 / v2))
}

#[inline]
pub(super) fn handle_frem(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_float_val()?;
    let v1 = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Float(v1 % v2))
}

#[inline]
pub(super) fn handle_fneg(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Float(-v))
}

// Double arithmetic

#[inline]
pub(super) fn handle_dadd(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_double_val()?;
    let v1 = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Double(v1 + v2))
}

#[inline]
pub(super) fn handle_dsub(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_double_val()?;
    let v1 = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Double(v1 - v2))
}

#[inline]
pub(super) fn handle_dmul(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_double_val()?;
    let v1 = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Double(v1 * v2))
}

#[inline]
pub(super) fn handle_ddiv(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_double_val()?;
    let v1 = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Double(v1 / v2))
}

#[inline]
pub(super) fn handle_drem(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_double_val()?;
    let v1 = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Double(v1 % v2))
}

#[inline]
pub(super) fn handle_dneg(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Double(-v))
}

// Shifts. Counts are masked to the operand width.

#[inline]
pub(super) fn handle_ishl(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    let shift = (v2 & 0x1f) as u32;
    thread.stack.push_operand(Value::Integer(v1.wrapping_shl(shift)))
}

#[inline]
pub(super) fn handle_ishr(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    let shift = (v2 & 0x1f) as u32;
    thread.stack.push_operand(Value::Integer(v1.wrapping_shr(shift)))
}

#[inline]
pub(super) fn handle_iushr(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    let shift = (v2 & 0x1f) as u32;
    let result = ((v1 as u32) >> shift) as i32;
    thread.stack.push_operand(Value::Integer(result))
}

#[inline]
pub(super) fn handle_lshl(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_long_val()?;
    let shift = (v2 & 0x3f) as u32;
    thread.stack.push_operand(Value::Long(v1.wrapping_shl(shift)))
}

#[inline]
pub(super) fn handle_lshr(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_long_val()?;
    let shift = (v2 & 0x3f) as u32;
    thread.stack.push_operand(Value::Long(v1.wrapping_shr(shift)))
}

#[inline]
pub(super) fn handle_lushr(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_long_val()?;
    let shift = (v2 & 0x3f) as u32;
    let result = ((v1 as u64) >> shift) as i64;
    thread.stack.push_operand(Value::Long(result))
}

// Bitwise

#[inline]
pub(super) fn handle_iand(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer(v1 & v2))
}

#[inline]
pub(super) fn handle_ior(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer(v1 | v2))
}

#[inline]
pub(super) fn handle_ixor(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer(v1 ^ v2))
}

#[inline]
pub(super) fn handle_land(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Long(v1 & v2))
}

#[inline]
pub(super) fn handle_lor(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Long(v1 | v2))
}

#[inline]
pub(super) fn handle_lxor(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Long(v1 ^ v2))
}

// Conversions. Narrowings truncate to the target width; `i2c` zero-extends.

#[inline]
pub(super) fn handle_i2l(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Long(v as i64))
}

#[inline]
pub(super) fn handle_i2f(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Float(v as f32))
}

#[inline]
pub(super) fn handle_i2d(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Double(v as f64))
}

#[inline]
pub(super) fn handle_l2i(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Integer(v as i32))
}

#[inline]
pub(super) fn handle_l2f(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Float(v as f32))
}

#[inline]
pub(super) fn handle_l2d(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_long_val()?;
    thread.stack.push_operand(Value::Double(v as f64))
}

#[inline]
pub(super) fn handle_f2i(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Integer(v as i32))
}

#[inline]
pub(super) fn handle_f2l(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Long(v as i64))
}

#[inline]
pub(super) fn handle_f2d(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Double(v as f64))
}

#[inline]
pub(super) fn handle_d2i(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Integer(v as i32))
}

#[inline]
pub(super) fn handle_d2l(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Long(v as i64))
}

#[inline]
pub(super) fn handle_d2f(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Float(v as f32))
}

#[inline]
pub(super) fn handle_i2b(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer((v as i8) as i32))
}

#[inline]
pub(super) fn handle_i2c(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer((v as u16) as i32))
}

#[inline]
pub(super) fn handle_i2s(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v = thread.stack.pop_int_val()?;
    thread.stack.push_operand(Value::Integer((v as i16) as i32))
}

// Comparisons

#[inline]
pub(super) fn handle_lcmp(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_long_val()?;
    let v1 = thread.stack.pop_long_val()?;
    let res = match v1.cmp(&v2) {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    };
    thread.stack.push_operand(Value::Integer(res))
}

#[inline]
pub(super) fn handle_fcmpl(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_float_val()?;
    let v1 = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Integer(fcmp(v1, v2, -1)))
}

#[inline]
pub(super) fn handle_fcmpg(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_float_val()?;
    let v1 = thread.stack.pop_float_val()?;
    thread.stack.push_operand(Value::Integer(fcmp(v1, v2, 1)))
}

#[inline]
pub(super) fn handle_dcmpl(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_double_val()?;
    let v1 = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Integer(dcmp(v1, v2, -1)))
}

#[inline]
pub(super) fn handle_dcmpg(thread: &mut JavaThreadState) -> Result<(), JvmError> {
    let v2 = thread.stack.pop_double_val()?;
    let v1 = thread.stack.pop_double_val()?;
    thread.stack.push_operand(Value::Integer(dcmp(v1, v2, 1)))
}

// Branches. Targets are relative to the opcode's own pc; the fall-through
// arm advances by the instruction size, so these handlers own the pc.

#[inline]
pub(super) fn handle_if_int(
    thread: &mut JavaThreadState,
    offset: i16,
    size: u16,
    predicate: fn(i32) -> bool,
) -> Result<(), JvmError> {
    let pc = thread.stack.pc()?;
    let value = thread.stack.pop_int_val()?;
    let new_pc = if predicate(value) {
        branch16(pc, offset)
    } else {
        pc + size as usize
    };
    *thread.stack.pc_mut()? = new_pc;
    Ok(())
}

#[inline]
pub(super) fn handle_if_icmp(
    thread: &mut JavaThreadState,
    offset: i16,
    size: u16,
    predicate: fn(i32, i32) -> bool,
) -> Result<(), JvmError> {
    let pc = thread.stack.pc()?;
    let v2 = thread.stack.pop_int_val()?;
    let v1 = thread.stack.pop_int_val()?;
    let new_pc = if predicate(v1, v2) {
        branch16(pc, offset)
    } else {
        pc + size as usize
    };
    *thread.stack.pc_mut()? = new_pc;
    Ok(())
}

#[inline]
pub(super) fn handle_if_acmp(
    thread: &mut JavaThreadState,
    offset: i16,
    size: u16,
    want_equal: bool,
) -> Result<(), JvmError> {
    let pc = thread.stack.pc()?;
    let v2 = thread.stack.pop_nullable_ref_val()?;
    let v1 = thread.stack.pop_nullable_ref_val()?;
    let new_pc = if (v1 == v2) == want_equal {
        branch16(pc, offset)
    } else {
        pc + size as usize
    };
    *thread.stack.pc_mut()? = new_pc;
    Ok(())
}

#[inline]
pub(super) fn handle_ifnull(
    thread: &mut JavaThreadState,
    offset: i16,
    size: u16,
    want_null: bool,
) -> Result<(), JvmError> {
    let pc = thread.stack.pc()?;
    let value = thread.stack.pop_nullable_ref_val()?;
    let new_pc = if value.is_none() == want_null {
        branch16(pc, offset)
    } else {
        pc + size as usize
    };
    *thread.stack.pc_mut()? = new_pc;
    Ok(())
}

#[inline]
pub(super) fn handle_goto(thread: &mut JavaThreadState, offset: i16) -> Result<(), JvmError> {
    let pc = thread.stack.pc()?;
    *thread.stack.pc_mut()? = branch16(pc, offset);
    Ok(())
}

#[inline]
pub(super) fn handle_goto_w(thread: &mut JavaThreadState, offset: i32) -> Result<(), JvmError> {
    let pc = thread.stack.pc()?;
    *thread.stack.pc_mut()? = branch32(pc, offset);
    Ok(())
}

#[inline]
pub(super) fn handle_tableswitch(
    thread: &mut JavaThreadState,
    switch: TableSwitchData,
) -> Result<(), JvmError> {
    let index = thread.stack.pop_int_val()?;
    let pc = thread.stack.pc()?;
    let target_offset = if index < switch.low || index > switch.high {
        switch.default_offset
    } else {
        switch.offsets[(index - switch.low) as usize]
    };
    *thread.stack.pc_mut()? = branch32(pc, target_offset);
    Ok(())
}

#[inline]
pub(super) fn handle_lookupswitch(
    thread: &mut JavaThreadState,
    switch: LookupSwitchData,
) -> Result<(), JvmError> {
    let key = thread.stack.pop_int_val()?;
    let pc = thread.stack.pc()?;
    let target_offset = match switch.pairs.binary_search_by_key(&key, |pair| pair.0) {
        Ok(i) => switch.pairs[i].1,
        Err(_) => switch.default_offset,
    };
    *thread.stack.pc_mut()? = branch32(pc, target_offset);
    Ok(())
}

// Field access

#[inline]
pub(super) fn handle_getfield(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let target_obj = thread.stack.pop_obj_val()?;
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let field_view = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_field_view(&idx, vm.interner())?;
    let target_class_id = vm
        .method_area_write()
        .get_class_id_or_load(field_view.class_sym, thread.id)?;
    let field_offset = vm
        .method_area_read()
        .get_instance_class(&target_class_id)?
        .get_instance_field(&field_view.name_and_type.into())?
        .offset;
    let value = vm.heap_read().read_field(target_obj.addr, field_offset)?;
    thread.stack.push_operand(value)
}

#[inline]
pub(super) fn handle_putfield(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let value = thread.stack.pop_operand()?;
    let target_obj = thread.stack.pop_obj_val()?;
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let field_view = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_field_view(&idx, vm.interner())?;
    let target_class_id = vm
        .method_area_write()
        .get_class_id_or_load(field_view.class_sym, thread.id)?;
    let field_offset = vm
        .method_area_read()
        .get_instance_class(&target_class_id)?
        .get_instance_field(&field_view.name_and_type.into())?
        .offset;
    vm.heap_write().write_field(target_obj.addr, field_offset, value)
}

#[inline]
pub(super) fn handle_getstatic(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let field_view = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_field_view(&idx, vm.interner())?;
    let target_class_id = vm
        .method_area_write()
        .get_class_id_or_load(field_view.class_sym, thread.id)?;
    Interpreter::ensure_initialized(thread, Some(target_class_id), vm)?;
    let field_key = field_view.name_and_type.into();
    let actual_class_id = vm
        .method_area_read()
        .resolve_static_field_class(target_class_id, &field_key)?;
    let value = vm
        .method_area_read()
        .get_static_field_value(&actual_class_id, &field_key)?;
    thread.stack.push_operand(value)
}

#[inline]
pub(super) fn handle_putstatic(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let value = thread.stack.pop_operand()?;
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let field_view = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_field_view(&idx, vm.interner())?;
    let target_class_id = vm
        .method_area_write()
        .get_class_id_or_load(field_view.class_sym, thread.id)?;
    Interpreter::ensure_initialized(thread, Some(target_class_id), vm)?;
    let field_key = field_view.name_and_type.into();
    let actual_class_id = vm
        .method_area_read()
        .resolve_static_field_class(target_class_id, &field_key)?;
    vm.method_area_read()
        .get_instance_class(&actual_class_id)?
        .set_static_field_value(&field_key, value)
}

// Invocations

#[inline]
pub(super) fn handle_invokevirtual(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let target_method_view = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_method_view(&idx, vm.interner())?;
    let method_key: MethodKey = target_method_view.name_and_type.into();
    vm.method_area_write()
        .get_class_id_or_load(target_method_view.class_sym, thread.id)?;

    let descriptor_id = vm
        .method_area_write()
        .get_or_new_method_descriptor_id(&method_key.desc)?;
    let arg_count = vm
        .method_area_read()
        .get_method_descriptor(&descriptor_id)
        .params
        .len()
        + 1;

    let receiver = thread.stack.peek_operand_at(arg_count - 1)?.as_obj_ref()?;
    let (target_method_id, _) = vm
        .method_area_read()
        .find_method(receiver.class_id, &method_key)
        .ok_or(build_exception!(
            NoSuchMethodError,
            method_key: method_key,
            class_sym: target_method_view.class_sym
        ))?;

    let args = Interpreter::prepare_method_args(thread, target_method_id, vm)?;
    Interpreter::invoke_method_internal(thread, target_method_id, args, vm)
}

#[inline]
pub(super) fn handle_invokespecial(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let (cur_class_id, target_method_view) = {
        let ma = vm.method_area_read();
        let cur_class_id = ma.get_method(&cur_method_id).class_id();
        let view = ma
            .get_cp_by_method_id(&cur_method_id)?
            .get_method_view(&idx, vm.interner())?;
        (cur_class_id, view)
    };
    let method_key: MethodKey = target_method_view.name_and_type.into();
    let symbolic_class_id = vm
        .method_area_write()
        .get_class_id_or_load(target_method_view.class_sym, thread.id)?;

    // `super.m()` dispatch: within a class carrying ACC_SUPER, a
    // non-constructor reference to a superclass resolves starting at the
    // current class's direct superclass.
    let lookup_class_id = {
        let ma = vm.method_area_read();
        let cur_class = ma.get_instance_class(&cur_class_id)?;
        let symbolic_is_interface = ma.get_class(&symbolic_class_id).is_interface();
        if !symbolic_is_interface
            && method_key.name != vm.br.init_sym
            && cur_class.flags().has_super_semantics()
            && cur_class_id != symbolic_class_id
            && ma.is_subclass_of(cur_class_id, symbolic_class_id)
        {
            cur_class.get_super().unwrap_or(symbolic_class_id)
        } else {
            symbolic_class_id
        }
    };

    let resolved = vm.method_area_read().find_method(lookup_class_id, &method_key);
    let target_method_id = match resolved {
        Some((method_id, _)) => method_id,
        None => {
            // An interface reference can still hit the public Object
            // methods.
            let ma = vm.method_area_read();
            let object_id = vm.br.get_java_lang_object_id()?;
            let fallback = if ma.get_class(&symbolic_class_id).is_interface() {
                ma.find_method(object_id, &method_key).filter(|(method_id, _)| {
                    let method = ma.get_method(method_id);
                    !method.is_static() && method.flags().is_public()
                })
            } else {
                None
            };
            match fallback {
                Some((method_id, _)) => method_id,
                None => {
                    return throw_exception!(
                        NoSuchMethodError,
                        method_key: method_key,
                        class_sym: target_method_view.class_sym
                    );
                }
            }
        }
    };

    let param_count = {
        let ma = vm.method_area_read();
        ma.get_method_descriptor_by_method_id(&target_method_id)
            .params
            .len()
    };
    thread.stack.peek_operand_at(param_count)?.as_obj_ref()?;

    let args = Interpreter::prepare_method_args(thread, target_method_id, vm)?;
    Interpreter::invoke_method_internal(thread, target_method_id, args, vm)
}

#[inline]
pub(super) fn handle_invokestatic(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let target_method_view = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_method_or_interface_method_view(&idx, vm.interner())?;
    let method_key: MethodKey = target_method_view.name_and_type.into();
    let target_class_id = vm
        .method_area_write()
        .get_class_id_or_load(target_method_view.class_sym, thread.id)?;
    Interpreter::ensure_initialized(thread, Some(target_class_id), vm)?;
    let (target_method_id, _) = vm
        .method_area_read()
        .find_method(target_class_id, &method_key)
        .ok_or(build_exception!(
            NoSuchMethodError,
            method_key: method_key,
            class_sym: target_method_view.class_sym
        ))?;
    let args = Interpreter::prepare_method_args(thread, target_method_id, vm)?;
    Interpreter::invoke_static_method(thread, target_method_id, vm, args)
}

#[inline]
pub(super) fn handle_invokeinterface(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
    count: u8,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let target_method_view = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_interface_method_view(&idx, vm.interner())?;
    let method_key: MethodKey = target_method_view.name_and_type.into();
    vm.method_area_write()
        .get_class_id_or_load(target_method_view.class_sym, thread.id)?;

    if count == 0 {
        return Err(JvmError::ClassStructure(
            "invokeinterface count operand must not be zero".to_string(),
        ));
    }
    let receiver = thread
        .stack
        .peek_operand_at(count as usize - 1)?
        .as_obj_ref()?;
    let (target_method_id, _) = vm
        .method_area_read()
        .find_method(receiver.class_id, &method_key)
        .ok_or(build_exception!(
            NoSuchMethodError,
            method_key: method_key,
            class_sym: target_method_view.class_sym
        ))?;

    let args = Interpreter::prepare_method_args(thread, target_method_id, vm)?;
    Interpreter::invoke_method_internal(thread, target_method_id, args, vm)
}

// Object creation

#[inline]
pub(super) fn handle_new(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let target_class_sym = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_class_sym(&idx, vm.interner())?;
    let target_class_id = vm
        .method_area_write()
        .get_class_id_or_load(target_class_sym, thread.id)?;
    Interpreter::ensure_initialized(thread, Some(target_class_id), vm)?;
    let instance_ref = {
        let ma = vm.method_area_read();
        let class = ma.get_instance_class(&target_class_id)?;
        vm.heap_write().alloc_instance(target_class_id, class)?
    };
    thread.stack.push_operand(Value::Ref(instance_ref))
}

#[inline]
pub(super) fn handle_newarray(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    array_type: ArrayType,
) -> Result<(), JvmError> {
    let size = thread.stack.pop_int_val()?;
    if size < 0 {
        throw_exception!(NegativeArraySizeException, "{}", size)?
    }
    let class_id = {
        let descriptor_sym = vm.interner().get_or_intern(array_type.descriptor());
        vm.method_area_write().load_array_class(descriptor_sym, thread.id)?
    };
    let array_ref = vm
        .heap_write()
        .alloc_primitive_array(class_id, array_type, size)?;
    thread.stack.push_operand(Value::Ref(array_ref))
}

#[inline]
pub(super) fn handle_anewarray(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let size = thread.stack.pop_int_val()?;
    if size < 0 {
        throw_exception!(NegativeArraySizeException, "{}", size)?
    }
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let element_sym = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_class_sym(&idx, vm.interner())?;
    let element_name = vm.interner().resolve(&element_sym).to_string();
    let array_name = if element_name.starts_with('[') {
        format!("[{}", element_name)
    } else {
        format!("[L{};", element_name)
    };
    let array_class_sym = vm.interner().get_or_intern(&array_name);
    let array_class_id = vm
        .method_area_write()
        .load_array_class(array_class_sym, thread.id)?;
    let array_ref = vm.heap_write().alloc_object_array(array_class_id, size)?;
    thread.stack.push_operand(Value::Ref(array_ref))
}

#[inline]
pub(super) fn handle_arraylength(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let array_ref = thread.stack.pop_obj_val()?;
    let length = vm.heap_read().get_array_length(array_ref.addr)?;
    thread.stack.push_operand(Value::Integer(length))
}

// Exceptions and type tests

#[inline]
pub(super) fn handle_athrow(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let exception_ref = thread.stack.pop_obj_val()?;
    let is_throwable = vm
        .method_area_read()
        .instance_of(exception_ref.class_id, vm.br.java_lang_throwable_sym);
    if !is_throwable {
        let name = vm
            .method_area_read()
            .class_name(exception_ref.class_id)
            .map(|sym| vm.interner().resolve(&sym).to_string())
            .unwrap_or_else(|| "<unknown class>".to_string());
        return Err(JvmError::NonThrowableThrown(name));
    }
    Err(JvmError::JavaExceptionThrown(exception_ref))
}

#[inline]
pub(super) fn handle_instanceof(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
    idx: u16,
) -> Result<(), JvmError> {
    let cur_method_id = thread.stack.cur_frame()?.method_id();
    let class_name_sym = vm
        .method_area_read()
        .get_cp_by_method_id(&cur_method_id)?
        .get_class_sym(&idx, vm.interner())?;

    let obj_ref = thread.stack.pop_nullable_ref_val()?;
    let Some(obj_ref) = obj_ref else {
        return thread.stack.push_operand(Value::Integer(0));
    };
    vm.method_area_write()
        .get_class_id_or_load(class_name_sym, thread.id)?;
    let res = vm
        .method_area_read()
        .instance_of(obj_ref.class_id, class_name_sym);
    thread
        .stack
        .push_operand(Value::Integer(if res { 1 } else { 0 }))
}

// Monitors

#[inline]
pub(super) fn handle_monitorenter(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let obj = thread.stack.pop_obj_val()?;
    vm.heap_write()
        .monitor_enter(obj.addr, std::thread::current().id())
}

#[inline]
pub(super) fn handle_monitorexit(
    thread: &mut JavaThreadState,
    vm: &VirtualMachine,
) -> Result<(), JvmError> {
    let obj = thread.stack.pop_obj_val()?;
    vm.heap_write()
        .monitor_exit(obj.addr, std::thread::current().id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{MethodId, ThreadId};
    use crate::vm::stack::JavaFrame;

    fn thread_with_stack(values: &[Value]) -> JavaThreadState {
        let mut thread = JavaThreadState::new(ThreadId::from_usize(0), 16);
        thread
            .stack
            .push_frame(JavaFrame::new(MethodId::from_usize(1), 16, 0, vec![]))
            .unwrap();
        for value in values {
            thread.stack.push_operand(*value).unwrap();
        }
        thread
    }

    fn drain(thread: &mut JavaThreadState) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(value) = thread.stack.pop_operand() {
            out.push(value);
        }
        out.reverse();
        out
    }

    #[test]
    fn dup_x1_inserts_below_the_second_value() {
        let mut thread = thread_with_stack(&[Value::Integer(2), Value::Integer(1)]);
        handle_dup_x1(&mut thread).unwrap();
        assert_eq!(
            drain(&mut thread),
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(1)]
        );
    }

    #[test]
    fn dup_x2_form2_treats_a_wide_value_as_one_unit() {
        let mut thread = thread_with_stack(&[Value::Long(9), Value::Integer(1)]);
        handle_dup_x2(&mut thread).unwrap();
        assert_eq!(
            drain(&mut thread),
            vec![Value::Integer(1), Value::Long(9), Value::Integer(1)]
        );
    }

    #[test]
    fn dup2_duplicates_one_wide_or_two_narrow() {
        let mut thread = thread_with_stack(&[Value::Long(5)]);
        handle_dup2(&mut thread).unwrap();
        assert_eq!(drain(&mut thread), vec![Value::Long(5), Value::Long(5)]);

        let mut thread = thread_with_stack(&[Value::Integer(1), Value::Integer(2)]);
        handle_dup2(&mut thread).unwrap();
        assert_eq!(
            drain(&mut thread),
            vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(1),
                Value::Integer(2)
            ]
        );
    }

    #[test]
    fn dup2_x1_moves_a_wide_value_below_a_narrow_one() {
        let mut thread = thread_with_stack(&[Value::Integer(3), Value::Long(7)]);
        handle_dup2_x1(&mut thread).unwrap();
        assert_eq!(
            drain(&mut thread),
            vec![Value::Long(7), Value::Integer(3), Value::Long(7)]
        );
    }

    #[test]
    fn dup2_x2_form4_swaps_two_wide_values_with_a_copy() {
        let mut thread = thread_with_stack(&[Value::Long(1), Value::Long(2)]);
        handle_dup2_x2(&mut thread).unwrap();
        assert_eq!(
            drain(&mut thread),
            vec![Value::Long(2), Value::Long(1), Value::Long(2)]
        );
    }

    #[test]
    fn dup2_x2_form1_handles_four_narrow_values() {
        let mut thread = thread_with_stack(&[
            Value::Integer(4),
            Value::Integer(3),
            Value::Integer(2),
            Value::Integer(1),
        ]);
        handle_dup2_x2(&mut thread).unwrap();
        assert_eq!(
            drain(&mut thread),
            vec![
                Value::Integer(2),
                Value::Integer(1),
                Value::Integer(4),
                Value::Integer(3),
                Value::Integer(2),
                Value::Integer(1)
            ]
        );
    }

    #[test]
    fn pop2_never_splits_a_wide_value() {
        let mut thread = thread_with_stack(&[Value::Integer(1), Value::Long(2)]);
        handle_pop2(&mut thread).unwrap();
        assert_eq!(drain(&mut thread), vec![Value::Integer(1)]);

        let mut thread = thread_with_stack(&[Value::Long(2), Value::Integer(1)]);
        assert!(handle_pop2(&mut thread).is_err());
    }

    #[test]
    fn swap_rejects_wide_values() {
        let mut thread = thread_with_stack(&[Value::Long(1), Value::Integer(2)]);
        assert!(handle_swap(&mut thread).is_err());
    }

    #[test]
    fn double_swap_is_identity() {
        let mut thread = thread_with_stack(&[Value::Integer(1), Value::Integer(2)]);
        handle_swap(&mut thread).unwrap();
        handle_swap(&mut thread).unwrap();
        assert_eq!(drain(&mut thread), vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn float_comparison_handles_nan_per_form() {
        assert_eq!(fcmp(f32::NAN, 0.0, -1), -1);
        assert_eq!(fcmp(f32::NAN, 0.0, 1), 1);
        assert_eq!(fcmp(1.0, 1.0, -1), 0);
        assert_eq!(dcmp(f64::NEG_INFINITY, 0.0, 1), -1);
        assert_eq!(dcmp(2.0, 1.0, -1), 1);
    }
}
