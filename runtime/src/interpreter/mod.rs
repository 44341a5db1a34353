use crate::debug_log;
use crate::error::JvmError;
use crate::interpreter::handlers::*;
use crate::interpreter::return_handlers::*;
use crate::keys::{ClassId, MethodId, MethodKey};
use crate::rt::RuntimeClass;
use crate::thread::JavaThreadState;
use crate::vm::stack::JavaFrame;
use crate::vm::{Value, VirtualMachine};
use crate::throw_exception;
use sigrun_common::instruction::Instruction;
use smallvec::SmallVec;
use std::ops::ControlFlow;

mod handlers;
mod return_handlers;

pub struct Interpreter;

impl Interpreter {
    fn interpret_instruction(
        thread: &mut JavaThreadState,
        instruction: Instruction,
        vm: &VirtualMachine,
    ) -> Result<ControlFlow<Option<Value>>, JvmError> {
        let is_branch = instruction.is_branch();
        let instr_size = instruction.byte_size();

        match instruction {
            Instruction::Nop => {}
            Instruction::AconstNull => handle_aconst_null(thread)?,
            Instruction::IconstM1 => handle_iconst(thread, -1)?,
            Instruction::Iconst0 => handle_iconst(thread, 0)?,
            Instruction::Iconst1 => handle_iconst(thread, 1)?,
            Instruction::Iconst2 => handle_iconst(thread, 2)?,
            Instruction::Iconst3 => handle_iconst(thread, 3)?,
            Instruction::Iconst4 => handle_iconst(thread, 4)?,
            Instruction::Iconst5 => handle_iconst(thread, 5)?,
            Instruction::Lconst0 => handle_lconst(thread, 0)?,
            Instruction::Lconst1 => handle_lconst(thread, 1)?,
            Instruction::Fconst0 => handle_fconst(thread, 0.0)?,
            Instruction::Fconst1 => handle_fconst(thread, 1.0)?,
            Instruction::Fconst2 => handle_fconst(thread, 2.0)?,
            Instruction::Dconst0 => handle_dconst(thread, 0.0)?,
            Instruction::Dconst1 => handle_dconst(thread, 1.0)?,
            Instruction::Bipush(value) => handle_bipush(thread, value)?,
            Instruction::Sipush(value) => handle_sipush(thread, value)?,
            Instruction::Ldc(idx) | Instruction::LdcW(idx) | Instruction::Ldc2W(idx) => {
                handle_ldc(thread, vm, idx)?
            }

            Instruction::Iload(pos)
            | Instruction::Lload(pos)
            | Instruction::Fload(pos)
            | Instruction::Dload(pos)
            | Instruction::Aload(pos) => handle_load(thread, pos as usize)?,
            Instruction::Iload0 | Instruction::Lload0 | Instruction::Fload0
            | Instruction::Dload0 | Instruction::Aload0 => handle_load(thread, 0)?,
            Instruction::Iload1 | Instruction::Lload1 | Instruction::Fload1
            | Instruction::Dload1 | Instruction::Aload1 => handle_load(thread, 1)?,
            Instruction::Iload2 | Instruction::Lload2 | Instruction::Fload2
            | Instruction::Dload2 | Instruction::Aload2 => handle_load(thread, 2)?,
            Instruction::Iload3 | Instruction::Lload3 | Instruction::Fload3
            | Instruction::Dload3 | Instruction::Aload3 => handle_load(thread, 3)?,

            Instruction::Iaload
            | Instruction::Laload
            | Instruction::Faload
            | Instruction::Daload
            | Instruction::Aaload
            | Instruction::Baload
            | Instruction::Caload
            | Instruction::Saload => handle_array_load(thread, vm)?,

            Instruction::Istore(pos) => handle_istore(thread, pos as usize)?,
            Instruction::Istore0 => handle_istore(thread, 0)?,
            Instruction::Istore1 => handle_istore(thread, 1)?,
            Instruction::Istore2 => handle_istore(thread, 2)?,
            Instruction::Istore3 => handle_istore(thread, 3)?,
            Instruction::Lstore(pos) => handle_lstore(thread, pos as usize)?,
            Instruction::Lstore0 => handle_lstore(thread, 0)?,
            Instruction::Lstore1 => handle_lstore(thread, 1)?,
            Instruction::Lstore2 => handle_lstore(thread, 2)?,
            Instruction::Lstore3 => handle_lstore(thread, 3)?,
            Instruction::Fstore(pos) => handle_fstore(thread, pos as usize)?,
            Instruction::Fstore0 => handle_fstore(thread, 0)?,
            Instruction::Fstore1 => handle_fstore(thread, 1)?,
            Instruction::Fstore2 => handle_fstore(thread, 2)?,
            Instruction::Fstore3 => handle_fstore(thread, 3)?,
            Instruction::Dstore(pos) => handle_dstore(thread, pos as usize)?,
            Instruction::Dstore0 => handle_dstore(thread, 0)?,
            Instruction::Dstore1 => handle_dstore(thread, 1)?,
            Instruction::Dstore2 => handle_dstore(thread, 2)?,
            Instruction::Dstore3 => handle_dstore(thread, 3)?,
            Instruction::Astore(pos) => handle_astore(thread, pos as usize)?,
            Instruction::Astore0 => handle_astore(thread, 0)?,
            Instruction::Astore1 => handle_astore(thread, 1)?,
            Instruction::Astore2 => handle_astore(thread, 2)?,
            Instruction::Astore3 => handle_astore(thread, 3)?,

            Instruction::Iastore | Instruction::Bastore | Instruction::Castore
            | Instruction::Sastore => handle_int_array_store(thread, vm)?,
            Instruction::Lastore => handle_lastore(thread, vm)?,
            Instruction::Fastore => handle_fastore(thread, vm)?,
            Instruction::Dastore => handle_dastore(thread, vm)?,
            Instruction::Aastore => handle_aastore(thread, vm)?,

            Instruction::Pop => handle_pop(thread)?,
            Instruction::Pop2 => handle_pop2(thread)?,
            Instruction::Dup => handle_dup(thread)?,
            Instruction::DupX1 => handle_dup_x1(thread)?,
            Instruction::DupX2 => handle_dup_x2(thread)?,
            Instruction::Dup2 => handle_dup2(thread)?,
            Instruction::Dup2X1 => handle_dup2_x1(thread)?,
            Instruction::Dup2X2 => handle_dup2_x2(thread)?,
            Instruction::Swap => handle_swap(thread)?,

            Instruction::Iadd => handle_iadd(thread)?,
            Instruction::Isub => handle_isub(thread)?,
            Instruction::Imul => handle_imul(thread)?,
            Instruction::Idiv => handle_idiv(thread)?,
            Instruction::Irem => handle_irem(thread)?,
            Instruction::Ineg => handle_ineg(thread)?,
            Instruction::Ladd => handle_ladd(thread)?,
            Instruction::Lsub => handle_lsub(thread)?,
            Instruction::Lmul => handle_lmul(thread)?,
            Instruction::Ldiv => handle_ldiv(thread)?,
            Instruction::Lrem => handle_lrem(thread)?,
            Instruction::Lneg => handle_lneg(thread)?,
            Instruction::Fadd => handle_fadd(thread)?,
            Instruction::Fsub => handle_fsub(thread)?,
            Instruction::Fmul => handle_fmul(thread)?,
            Instruction::Fdiv => handle_fdiv(thread)?,
            Instruction::Frem => handle_frem(thread)?,
            Instruction::Fneg => handle_fneg(thread)?,
            Instruction::Dadd => handle_dadd(thread)?,
            Instruction::Dsub => handle_dsub(thread)?,
            Instruction::Dmul => handle_dmul(thread)?,
            Instruction::Ddiv => handle_ddiv(thread)?,
            Instruction::Drem => handle_drem(thread)?,
            Instruction::Dneg => handle_dneg(thread)?,

            Instruction::Ishl => handle_ishl(thread)?,
            Instruction::Ishr => handle_ishr(thread)?,
            Instruction::Iushr => handle_iushr(thread)?,
            Instruction::Lshl => handle_lshl(thread)?,
            Instruction::Lshr => handle_lshr(thread)?,
            Instruction::Lushr => handle_lushr(thread)?,
            Instruction::Iand => handle_iand(thread)?,
            Instruction::Ior => handle_ior(thread)?,
            Instruction::Ixor => handle_ixor(thread)?,
            Instruction::Land => handle_land(thread)?,
            Instruction::Lor => handle_lor(thread)?,
            Instruction::Lxor => handle_lxor(thread)?,

            Instruction::Iinc(index, const_val) => handle_iinc(thread, index, const_val)?,

            Instruction::I2l => handle_i2l(thread)?,
            Instruction::I2f => handle_i2f(thread)?,
            Instruction::I2d => handle_i2d(thread)?,
            Instruction::L2i => handle_l2i(thread)?,
            Instruction::L2f => handle_l2f(thread)?,
            Instruction::L2d => handle_l2d(thread)?,
            Instruction::F2i => handle_f2i(thread)?,
            Instruction::F2l => handle_f2l(thread)?,
            Instruction::F2d => handle_f2d(thread)?,
            Instruction::D2i => handle_d2i(thread)?,
            Instruction::D2l => handle_d2l(thread)?,
            Instruction::D2f => handle_d2f(thread)?,
            Instruction::I2b => handle_i2b(thread)?,
            Instruction::I2c => handle_i2c(thread)?,
            Instruction::I2s => handle_i2s(thread)?,

            Instruction::Lcmp => handle_lcmp(thread)?,
            Instruction::Fcmpl => handle_fcmpl(thread)?,
            Instruction::Fcmpg => handle_fcmpg(thread)?,
            Instruction::Dcmpl => handle_dcmpl(thread)?,
            Instruction::Dcmpg => handle_dcmpg(thread)?,

            Instruction::IfEq(offset) => handle_if_int(thread, offset, instr_size, |v| v == 0)?,
            Instruction::IfNe(offset) => handle_if_int(thread, offset, instr_size, |v| v != 0)?,
            Instruction::IfLt(offset) => handle_if_int(thread, offset, instr_size, |v| v < 0)?,
            Instruction::IfGe(offset) => handle_if_int(thread, offset, instr_size, |v| v >= 0)?,
            Instruction::IfGt(offset) => handle_if_int(thread, offset, instr_size, |v| v > 0)?,
            Instruction::IfLe(offset) => handle_if_int(thread, offset, instr_size, |v| v <= 0)?,
            Instruction::IfIcmpEq(offset) => {
                handle_if_icmp(thread, offset, instr_size, |v1, v2| v1 == v2)?
            }
            Instruction::IfIcmpNe(offset) => {
                handle_if_icmp(thread, offset, instr_size, |v1, v2| v1 != v2)?
            }
            Instruction::IfIcmpLt(offset) => {
                handle_if_icmp(thread, offset, instr_size, |v1, v2| v1 < v2)?
            }
            Instruction::IfIcmpGe(offset) => {
                handle_if_icmp(thread, offset, instr_size, |v1, v2| v1 >= v2)?
            }
            Instruction::IfIcmpGt(offset) => {
                handle_if_icmp(thread, offset, instr_size, |v1, v2| v1 > v2)?
            }
            Instruction::IfIcmpLe(offset) => {
                handle_if_icmp(thread, offset, instr_size, |v1, v2| v1 <= v2)?
            }
            Instruction::IfAcmpEq(offset) => handle_if_acmp(thread, offset, instr_size, true)?,
            Instruction::IfAcmpNe(offset) => handle_if_acmp(thread, offset, instr_size, false)?,
            Instruction::Ifnull(offset) => handle_ifnull(thread, offset, instr_size, true)?,
            Instruction::Ifnonnull(offset) => handle_ifnull(thread, offset, instr_size, false)?,
            Instruction::Goto(offset) => handle_goto(thread, offset)?,
            Instruction::GotoW(offset) => handle_goto_w(thread, offset)?,
            Instruction::TableSwitch(switch) => handle_tableswitch(thread, switch)?,
            Instruction::Lookupswitch(switch) => handle_lookupswitch(thread, switch)?,

            Instruction::Return => return Ok(ControlFlow::Break(None)),
            Instruction::Ireturn => {
                let ret_value = handle_ireturn(thread)?;
                return Ok(ControlFlow::Break(Some(ret_value)));
            }
            Instruction::Lreturn => {
                let ret_value = handle_lreturn(thread)?;
                return Ok(ControlFlow::Break(Some(ret_value)));
            }
            Instruction::Freturn => {
                let ret_value = handle_freturn(thread)?;
                return Ok(ControlFlow::Break(Some(ret_value)));
            }
            Instruction::Dreturn => {
                let ret_value = handle_dreturn(thread)?;
                return Ok(ControlFlow::Break(Some(ret_value)));
            }
            Instruction::Areturn => {
                let ret_value = handle_areturn(thread)?;
                return Ok(ControlFlow::Break(Some(ret_value)));
            }

            Instruction::Getstatic(idx) => handle_getstatic(thread, vm, idx)?,
            Instruction::Putstatic(idx) => handle_putstatic(thread, vm, idx)?,
            Instruction::Getfield(idx) => handle_getfield(thread, vm, idx)?,
            Instruction::Putfield(idx) => handle_putfield(thread, vm, idx)?,

            Instruction::InvokeVirtual(idx) => handle_invokevirtual(thread, vm, idx)?,
            Instruction::InvokeSpecial(idx) => handle_invokespecial(thread, vm, idx)?,
            Instruction::InvokeStatic(idx) => handle_invokestatic(thread, vm, idx)?,
            Instruction::InvokeInterface(idx, count) => {
                handle_invokeinterface(thread, vm, idx, count)?
            }

            Instruction::New(idx) => handle_new(thread, vm, idx)?,
            Instruction::Newarray(array_type) => handle_newarray(thread, vm, array_type)?,
            Instruction::Anewarray(idx) => handle_anewarray(thread, vm, idx)?,
            Instruction::ArrayLength => handle_arraylength(thread, vm)?,
            Instruction::Athrow => handle_athrow(thread, vm)?,
            Instruction::Instanceof(idx) => handle_instanceof(thread, vm, idx)?,
            Instruction::Monitorenter => handle_monitorenter(thread, vm)?,
            Instruction::Monitorexit => handle_monitorexit(thread, vm)?,
        }

        if !is_branch {
            thread.stack.cur_frame_mut()?.increment_pc(instr_size);
        }
        Ok(ControlFlow::Continue(()))
    }

    /// The dispatch loop. A returned `Err(JavaExceptionThrown)` means the
    /// exception found no handler here and keeps propagating; the frame has
    /// already been popped by the caller of the faulting instruction chain.
    fn interpret_method(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        vm: &VirtualMachine,
    ) -> Result<Option<Value>, JvmError> {
        vm.safepoint(thread);
        let code = vm.method_area_read().get_method(&method_id).get_code()?;
        loop {
            let pc = thread.stack.pc()?;
            let instruction = Instruction::new_at(&code, pc)?;
            debug_log!("pc {:>5}: {:?}", pc, instruction);

            match Self::interpret_instruction(thread, instruction, vm) {
                Ok(ControlFlow::Break(res)) => return Ok(res),
                Ok(ControlFlow::Continue(())) => {}
                Err(e) => {
                    let exception_ref = match e {
                        JvmError::JavaException(exception) => {
                            vm.map_rust_error_to_java_exception(thread, exception)?
                        }
                        JvmError::JavaExceptionThrown(exception_ref) => exception_ref,
                        fatal => return Err(fatal),
                    };
                    if !Self::find_exception_handler(vm, &method_id, exception_ref, thread)? {
                        return Err(JvmError::JavaExceptionThrown(exception_ref));
                    }
                }
            }
        }
    }

    /// Walks the method's exception table in order. A handler matches when
    /// the pc lies in `[start_pc, end_pc)` and the catch type is 0 ("any")
    /// or a supertype of the throwable's class. On a match the operand stack
    /// is cleared, the throwable pushed and the pc moved to the handler.
    fn find_exception_handler(
        vm: &VirtualMachine,
        method_id: &MethodId,
        exception_ref: crate::vm::ObjectRef,
        thread: &mut JavaThreadState,
    ) -> Result<bool, JvmError> {
        let pc = thread.stack.pc()?;
        let exception_table = {
            let ma = vm.method_area_read();
            ma.get_method(method_id).get_exception_table()?.to_vec()
        };

        for entry in exception_table {
            if pc < entry.start_pc as usize || pc >= entry.end_pc as usize {
                continue;
            }

            let matches = if entry.catch_type == 0 {
                true
            } else {
                let catch_sym = {
                    let ma = vm.method_area_read();
                    ma.get_cp_by_method_id(method_id)?
                        .get_class_sym(&entry.catch_type, vm.interner())?
                };
                vm.method_area_write()
                    .get_class_id_or_load(catch_sym, thread.id)?;
                vm.method_area_read()
                    .instance_of(exception_ref.class_id, catch_sym)
            };

            if matches {
                let frame = thread.stack.cur_frame_mut()?;
                frame.clear_operands();
                frame.push_operand(Value::Ref(exception_ref))?;
                *frame.pc_mut() = entry.handler_pc as usize;
                thread.clear_backtrace();
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Pops the arguments of `method_id` off the caller's stack, receiver
    /// first in the result. A category-2 argument gets its `Null`
    /// placeholder slot here, so the vector maps 1:1 onto local slots.
    fn prepare_method_args(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        vm: &VirtualMachine,
    ) -> Result<Vec<Value>, JvmError> {
        let (param_wides, is_static) = {
            let ma = vm.method_area_read();
            let descriptor = ma.get_method_descriptor_by_method_id(&method_id);
            let wides: SmallVec<[bool; 8]> =
                descriptor.params.iter().map(|p| p.is_wide()).collect();
            (wides, ma.get_method(&method_id).is_static())
        };

        let mut args: SmallVec<[Value; 8]> = SmallVec::new();
        for &wide in param_wides.iter().rev() {
            let value = thread.stack.pop_operand()?;
            if wide {
                args.push(Value::Null);
            }
            args.push(value);
        }
        if !is_static {
            args.push(thread.stack.pop_operand()?);
        }
        args.reverse();
        Ok(args.into_vec())
    }

    fn pretty_frame_name(vm: &VirtualMachine, method_id: &MethodId) -> String {
        let ma = vm.method_area_read();
        let method = ma.get_method(method_id);
        let class_name = vm
            .interner()
            .resolve(&ma.get_class(&method.class_id()).name())
            .replace('/', ".");
        format!("{}.{}", class_name, vm.interner().resolve(&method.name))
    }

    fn invoke_native_method(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        args: Vec<Value>,
        vm: &VirtualMachine,
    ) -> Result<Option<Value>, JvmError> {
        let method_key = vm
            .method_area_read()
            .build_fully_qualified_native_method_key(&method_id);
        let Some(native) = vm.native_registry.get(&method_key) else {
            // A missing native is a no-op returning null; non-reference
            // returns get the matching zero so the caller's stack shape
            // stays right.
            debug_log!(
                "no native registered for {}; treating as a no-op",
                Self::pretty_frame_name(vm, &method_id)
            );
            let ma = vm.method_area_read();
            let descriptor = ma.get_method_descriptor_by_method_id(&method_id);
            return Ok(descriptor.ret.as_ref().map(Value::from));
        };
        native(vm, thread, args.as_slice())
    }

    fn invoke_java_method(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        args: Vec<Value>,
        vm: &VirtualMachine,
    ) -> Result<Option<Value>, JvmError> {
        let (max_stack, max_locals) = vm
            .method_area_read()
            .get_method(&method_id)
            .get_frame_attributes()?;
        let frame = JavaFrame::new(method_id, max_stack, max_locals, args);
        thread.stack.push_frame(frame)?;
        let method_ret = Self::interpret_method(thread, method_id, vm);
        thread.stack.pop_frame()?;
        match method_ret {
            Ok(ret) => Ok(ret),
            Err(e) => {
                if matches!(e, JvmError::JavaExceptionThrown(_)) {
                    thread.record_unwound_frame(Self::pretty_frame_name(vm, &method_id));
                }
                Err(e)
            }
        }
    }

    fn invoke_method_core(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        args: Vec<Value>,
        vm: &VirtualMachine,
    ) -> Result<Option<Value>, JvmError> {
        let (is_native, is_abstract) = {
            let ma = vm.method_area_read();
            let method = ma.get_method(&method_id);
            (method.is_native(), method.is_abstract())
        };
        if is_abstract {
            return Err(JvmError::MethodIsAbstract(Self::pretty_frame_name(
                vm, &method_id,
            )));
        }
        if is_native {
            Self::invoke_native_method(thread, method_id, args, vm)
        } else {
            Self::invoke_java_method(thread, method_id, args, vm)
        }
    }

    /// Invoke and reconcile with the caller frame: a non-void result lands
    /// on the caller's operand stack, then the method-return safepoint runs.
    fn invoke_method_internal(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        args: Vec<Value>,
        vm: &VirtualMachine,
    ) -> Result<(), JvmError> {
        let method_ret = Self::invoke_method_core(thread, method_id, args, vm)?;
        if let Some(ret) = method_ret {
            thread.stack.push_operand(ret)?;
        }
        vm.safepoint(thread);
        Ok(())
    }

    /// Entrypoint invoker: `<clinit>` and `main` are called by key with
    /// pre-built arguments and no marshalling. A class without a matching
    /// body is a no-op.
    pub fn invoke_by_name(
        thread: &mut JavaThreadState,
        class_id: ClassId,
        key: MethodKey,
        vm: &VirtualMachine,
        args: Vec<Value>,
    ) -> Result<Option<Value>, JvmError> {
        let method_id = {
            let ma = vm.method_area_read();
            let Ok(class) = ma.get_instance_class(&class_id) else {
                return Ok(None);
            };
            if key == vm.br.clinit_mk {
                class.get_clinit_method_id()
            } else {
                class.get_declared_method(&key)
            }
        };
        let Some(method_id) = method_id else {
            return Ok(None);
        };
        Self::invoke_method_core(thread, method_id, args, vm)
    }

    pub fn invoke_instance_method(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        vm: &VirtualMachine,
        args: Vec<Value>,
    ) -> Result<Option<Value>, JvmError> {
        Self::invoke_method_core(thread, method_id, args, vm)
    }

    /// `invokestatic` path: the defining class must be initialized, the
    /// target must carry the static bit and must not be a constructor.
    pub fn invoke_static_method(
        thread: &mut JavaThreadState,
        method_id: MethodId,
        vm: &VirtualMachine,
        args: Vec<Value>,
    ) -> Result<(), JvmError> {
        let (class_id, is_static, is_ctor) = {
            let ma = vm.method_area_read();
            let method = ma.get_method(&method_id);
            (
                method.class_id(),
                method.is_static(),
                method.name == vm.br.init_sym,
            )
        };
        if !is_static || is_ctor {
            throw_exception!(
                IncompatibleClassChangeError,
                "{} is not an invokable static method",
                Self::pretty_frame_name(vm, &method_id)
            )?
        }
        Self::ensure_initialized(thread, Some(class_id), vm)?;
        Self::invoke_method_internal(thread, method_id, args, vm)
    }

    /// load → link happened on class entry to the method area; this drives
    /// the init phase: superclass first, then interfaces that declare
    /// `<clinit>`, string constants, then the initializer itself.
    pub fn ensure_initialized(
        thread: &mut JavaThreadState,
        class_id: Option<ClassId>,
        vm: &VirtualMachine,
    ) -> Result<(), JvmError> {
        let Some(class_id) = class_id else {
            return Ok(());
        };

        {
            let ma = vm.method_area_read();
            let class = match ma.get_class(&class_id) {
                RuntimeClass::Instance(class) => class,
                // Array classes have no initializer.
                _ => return Ok(()),
            };
            if class.is_initialized_or_initializing() {
                return Ok(());
            }
            class.set_initializing();
        }

        let super_id = {
            let ma = vm.method_area_read();
            ma.get_instance_class(&class_id)?.get_super()
        };
        if let Some(super_id) = super_id {
            Self::ensure_initialized(thread, Some(super_id), vm)?;
        }

        let interfaces = {
            let ma = vm.method_area_read();
            ma.get_instance_class(&class_id)?.get_interfaces()?.clone()
        };
        for interface_id in interfaces {
            let has_clinit = {
                let ma = vm.method_area_read();
                ma.get_instance_class(&interface_id)?
                    .get_clinit_method_id()
                    .is_some()
            };
            if has_clinit {
                Self::ensure_initialized(thread, Some(interface_id), vm)?;
            }
        }

        // String ConstantValue fields wait for the heap; everything else got
        // its value at link time.
        let string_literals: Vec<_> = {
            let ma = vm.method_area_read();
            ma.get_instance_class(&class_id)?
                .get_static_fields()?
                .iter()
                .filter_map(|(key, field)| field.string_literal.map(|sym| (*key, sym)))
                .collect()
        };
        for (field_key, literal_sym) in string_literals {
            let string_ref = vm.heap_write().get_str_from_pool_or_new(literal_sym)?;
            vm.method_area_read()
                .get_instance_class(&class_id)?
                .set_static_field_value(&field_key, Value::Ref(string_ref))?;
        }

        if let Err(e) = Self::invoke_by_name(thread, class_id, vm.br.clinit_mk, vm, vec![]) {
            return match e {
                JvmError::JavaExceptionThrown(exception_ref) => {
                    // An initializer that throws takes the VM down; the
                    // collected trace is all the caller gets.
                    vm.report_uncaught_exception(thread, exception_ref);
                    Err(JvmError::ClassInitializationFailed(
                        vm.interner()
                            .resolve(&vm.method_area_read().get_class(&class_id).name())
                            .to_string(),
                    ))
                }
                other => Err(other),
            };
        }

        vm.method_area_read()
            .get_instance_class(&class_id)?
            .set_initialized();
        Ok(())
    }
}
