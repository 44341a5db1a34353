mod common;

use common::op;
use common::{
    TestClassBuilder, define, run_static, test_vm, test_vm_with_gc_threshold, thrown_class_name,
    u16_bytes,
};
use rstest::rstest;
use sigrun_classfile::attribute::method::ExceptionTableEntry;
use sigrun_classfile::flags::{FieldFlags, MethodFlags};
use sigrun_common::error::InstructionErr;
use sigrun_runtime::Value;
use sigrun_runtime::error::JvmError;

const STATIC_METHOD: u16 = MethodFlags::ACC_PUBLIC | MethodFlags::ACC_STATIC;
const INSTANCE_METHOD: u16 = MethodFlags::ACC_PUBLIC;

#[test]
fn iadd_of_two_constants() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Calc", "java/lang/Object");
    class.add_method(
        "answer",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![op::ICONST_2, op::ICONST_3, op::IADD, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "answer", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(5)));
}

#[test]
fn backward_branch_loop_sums_to_55() {
    let (vm, mut thread) = test_vm();
    let mut code = vec![
        op::ICONST_0,
        op::ISTORE_0,
        op::ICONST_0,
        op::ISTORE_1,
        // loop head at pc 4
        op::ILOAD_1,
        op::ILOAD_0,
        op::IADD,
        op::ISTORE_0,
        op::IINC,
        0x01,
        0x01,
        op::ILOAD_1,
        op::BIPUSH,
        10,
    ];
    // if_icmple at pc 14 branching back to pc 4
    code.push(op::IF_ICMPLE);
    code.extend_from_slice(&(-10i16).to_be_bytes());
    code.extend_from_slice(&[op::ILOAD_0, op::IRETURN]);

    let mut class = TestClassBuilder::new("Loop", "java/lang/Object");
    class.add_method("sum", "()I", STATIC_METHOD, 2, 2, code);
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "sum", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(55)));
}

#[test]
fn arraylength_on_null_raises_npe() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Nully", "java/lang/Object");
    class.add_method(
        "broken",
        "()I",
        STATIC_METHOD,
        1,
        0,
        vec![op::ACONST_NULL, op::ARRAYLENGTH, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let err = run_static(&vm, &mut thread, class_id, "broken", "()I").unwrap_err();
    assert_eq!(thrown_class_name(&vm, &err), "java.lang.NullPointerException");
}

#[test]
fn division_by_zero_is_caught_by_matching_handler() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Catcher", "java/lang/Object");
    let catch_type = class.class_const("java/lang/ArithmeticException");
    class.add_method_with_handlers(
        "divide",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![
            op::ICONST_1,
            op::ICONST_0,
            op::IDIV,
            op::IRETURN,
            op::NOP,
            op::NOP,
            op::NOP,
            // handler at pc 7: the throwable is on the cleared stack
            op::ICONST_M1,
            op::IRETURN,
        ],
        vec![ExceptionTableEntry {
            start_pc: 0,
            end_pc: 3,
            handler_pc: 7,
            catch_type,
        }],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "divide", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(-1)));
}

#[test]
fn handler_outside_pc_range_does_not_catch() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Uncaught", "java/lang/Object");
    let catch_type = class.class_const("java/lang/ArithmeticException");
    class.add_method_with_handlers(
        "divide",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![
            op::ICONST_1,
            op::ICONST_0,
            op::IDIV,
            op::IRETURN,
            op::ICONST_M1,
            op::IRETURN,
        ],
        // the faulting pc (2) is outside [3, 4)
        vec![ExceptionTableEntry {
            start_pc: 3,
            end_pc: 4,
            handler_pc: 4,
            catch_type,
        }],
    );
    let class_id = define(&vm, &thread, class);

    let err = run_static(&vm, &mut thread, class_id, "divide", "()I").unwrap_err();
    assert_eq!(thrown_class_name(&vm, &err), "java.lang.ArithmeticException");
}

#[test]
fn invokevirtual_dispatches_on_runtime_class() {
    let (vm, mut thread) = test_vm();

    let mut class_a = TestClassBuilder::new("A", "java/lang/Object");
    class_a.add_method("m", "()I", INSTANCE_METHOD, 1, 1, vec![op::ICONST_1, op::IRETURN]);
    define(&vm, &thread, class_a);

    let mut class_b = TestClassBuilder::new("B", "A");
    class_b.add_method("m", "()I", INSTANCE_METHOD, 1, 1, vec![op::ICONST_2, op::IRETURN]);
    define(&vm, &thread, class_b);

    let mut runner = TestClassBuilder::new("Runner", "java/lang/Object");
    let b_class = runner.class_const("B");
    let b_init = runner.method_ref("B", "<init>", "()V");
    let a_m = runner.method_ref("A", "m", "()I");
    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(b_class));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(b_init));
    code.push(op::INVOKEVIRTUAL);
    code.extend_from_slice(&u16_bytes(a_m));
    code.push(op::IRETURN);
    runner.add_method("run", "()I", STATIC_METHOD, 2, 0, code);
    let runner_id = define(&vm, &thread, runner);

    let result = run_static(&vm, &mut thread, runner_id, "run", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(2)));
}

#[test]
fn invokespecial_runs_superclass_constructor_on_same_receiver() {
    let (vm, mut thread) = test_vm();

    let mut class_a = TestClassBuilder::new("A", "java/lang/Object");
    class_a.add_field("y", "I", FieldFlags::ACC_PRIVATE);
    let object_init = class_a.method_ref("java/lang/Object", "<init>", "()V");
    let a_y = class_a.field_ref("A", "y", "I");
    let mut a_init = vec![op::ALOAD_0, op::INVOKESPECIAL];
    a_init.extend_from_slice(&u16_bytes(object_init));
    a_init.extend_from_slice(&[op::ALOAD_0, op::ICONST_5, op::PUTFIELD]);
    a_init.extend_from_slice(&u16_bytes(a_y));
    a_init.push(op::RETURN);
    class_a.add_method("<init>", "()V", INSTANCE_METHOD, 2, 1, a_init);
    define(&vm, &thread, class_a);

    let mut class_b = TestClassBuilder::new("B", "A");
    class_b.add_field("x", "I", FieldFlags::ACC_PRIVATE);
    let a_init_ref = class_b.method_ref("A", "<init>", "()V");
    let b_x = class_b.field_ref("B", "x", "I");
    let mut b_init = vec![op::ALOAD_0, op::INVOKESPECIAL];
    b_init.extend_from_slice(&u16_bytes(a_init_ref));
    b_init.extend_from_slice(&[op::ALOAD_0, op::BIPUSH, 7, op::PUTFIELD]);
    b_init.extend_from_slice(&u16_bytes(b_x));
    b_init.push(op::RETURN);
    class_b.add_method("<init>", "()V", INSTANCE_METHOD, 2, 1, b_init);
    define(&vm, &thread, class_b);

    let mut runner = TestClassBuilder::new("Ctor", "java/lang/Object");
    let b_class = runner.class_const("B");
    let b_init_ref = runner.method_ref("B", "<init>", "()V");
    let b_x_ref = runner.field_ref("B", "x", "I");
    let a_y_ref = runner.field_ref("A", "y", "I");
    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(b_class));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(b_init_ref));
    code.push(op::ASTORE_0);
    code.push(op::ALOAD_0);
    code.push(op::GETFIELD);
    code.extend_from_slice(&u16_bytes(b_x_ref));
    code.push(op::ALOAD_0);
    code.push(op::GETFIELD);
    code.extend_from_slice(&u16_bytes(a_y_ref));
    code.push(op::IADD);
    code.push(op::IRETURN);
    runner.add_method("run", "()I", STATIC_METHOD, 2, 1, code);
    let runner_id = define(&vm, &thread, runner);

    // 7 from B's own init plus 5 written by the super constructor.
    let result = run_static(&vm, &mut thread, runner_id, "run", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(12)));
}

#[test]
fn invokeinterface_selects_the_implementation() {
    let (vm, mut thread) = test_vm();

    let mut iface = TestClassBuilder::new("Iface", "java/lang/Object").interface();
    iface.add_abstract_method("m", "()I");
    define(&vm, &thread, iface);

    let mut impl_class = TestClassBuilder::new("Impl", "java/lang/Object");
    impl_class.add_interface("Iface");
    impl_class.add_method("m", "()I", INSTANCE_METHOD, 1, 1, vec![op::BIPUSH, 9, op::IRETURN]);
    define(&vm, &thread, impl_class);

    let mut runner = TestClassBuilder::new("IfaceRunner", "java/lang/Object");
    let impl_cls = runner.class_const("Impl");
    let impl_init = runner.method_ref("Impl", "<init>", "()V");
    let iface_m = runner.interface_method_ref("Iface", "m", "()I");
    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(impl_cls));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(impl_init));
    code.push(op::INVOKEINTERFACE);
    code.extend_from_slice(&u16_bytes(iface_m));
    code.extend_from_slice(&[1, 0]); // count, pad
    code.push(op::IRETURN);
    runner.add_method("run", "()I", STATIC_METHOD, 2, 0, code);
    let runner_id = define(&vm, &thread, runner);

    let result = run_static(&vm, &mut thread, runner_id, "run", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(9)));
}

#[test]
fn tableswitch_pads_and_selects() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Table", "java/lang/Object");

    // choose(I)I: 1 -> 10, 2 -> 20, otherwise 0
    let mut code = vec![op::ILOAD_0, op::TABLESWITCH];
    code.extend_from_slice(&[0, 0]); // padding: opcode at pc 1
    code.extend_from_slice(&23i32.to_be_bytes()); // default -> pc 24
    code.extend_from_slice(&1i32.to_be_bytes()); // low
    code.extend_from_slice(&2i32.to_be_bytes()); // high
    code.extend_from_slice(&25i32.to_be_bytes()); // case 1 -> pc 26
    code.extend_from_slice(&28i32.to_be_bytes()); // case 2 -> pc 29
    code.extend_from_slice(&[op::ICONST_0, op::IRETURN]); // pc 24
    code.extend_from_slice(&[op::BIPUSH, 10, op::IRETURN]); // pc 26
    code.extend_from_slice(&[op::BIPUSH, 20, op::IRETURN]); // pc 29
    class.add_method("choose", "(I)I", STATIC_METHOD, 1, 1, code);
    let class_id = define(&vm, &thread, class);

    for (input, expected) in [(1, 10), (2, 20), (5, 0), (-3, 0)] {
        let key = sigrun_runtime::keys::MethodKey {
            name: vm.interner().get_or_intern("choose"),
            desc: vm.interner().get_or_intern("(I)I"),
        };
        let result = sigrun_runtime::interpreter::Interpreter::invoke_by_name(
            &mut thread,
            class_id,
            key,
            &vm,
            vec![Value::Integer(input)],
        )
        .unwrap();
        assert_eq!(result, Some(Value::Integer(expected)), "input {}", input);
    }
}

#[test]
fn lookupswitch_matches_exact_keys() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Lookup", "java/lang/Object");

    // choose(I)I: -1 -> 10, 7 -> 20, otherwise 0
    let mut code = vec![op::ILOAD_0, op::LOOKUPSWITCH];
    code.extend_from_slice(&[0, 0]); // padding: opcode at pc 1
    code.extend_from_slice(&27i32.to_be_bytes()); // default -> pc 28
    code.extend_from_slice(&2i32.to_be_bytes()); // npairs
    code.extend_from_slice(&(-1i32).to_be_bytes());
    code.extend_from_slice(&29i32.to_be_bytes()); // -> pc 30
    code.extend_from_slice(&7i32.to_be_bytes());
    code.extend_from_slice(&32i32.to_be_bytes()); // -> pc 33
    code.extend_from_slice(&[op::ICONST_0, op::IRETURN]); // pc 28
    code.extend_from_slice(&[op::BIPUSH, 10, op::IRETURN]); // pc 30
    code.extend_from_slice(&[op::BIPUSH, 20, op::IRETURN]); // pc 33
    class.add_method("choose", "(I)I", STATIC_METHOD, 1, 1, code);
    let class_id = define(&vm, &thread, class);

    for (input, expected) in [(-1, 10), (7, 20), (0, 0)] {
        let key = sigrun_runtime::keys::MethodKey {
            name: vm.interner().get_or_intern("choose"),
            desc: vm.interner().get_or_intern("(I)I"),
        };
        let result = sigrun_runtime::interpreter::Interpreter::invoke_by_name(
            &mut thread,
            class_id,
            key,
            &vm,
            vec![Value::Integer(input)],
        )
        .unwrap();
        assert_eq!(result, Some(Value::Integer(expected)), "input {}", input);
    }
}

#[rstest]
#[case(32, 1)]
#[case(33, 2)]
fn ishl_masks_the_shift_count(#[case] count: u8, #[case] expected: i32) {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Shift", "java/lang/Object");
    class.add_method(
        "shift",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![op::ICONST_1, op::BIPUSH, count, op::ISHL, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "shift", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(expected)));
}

#[test]
fn iushr_fills_with_zero_for_negative_values() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Ushr", "java/lang/Object");
    class.add_method(
        "shift",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![op::ICONST_M1, op::ICONST_1, op::IUSHR, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "shift", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(0x7fff_ffff)));
}

#[test]
fn i2c_zero_extends_to_16_bits() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Chars", "java/lang/Object");
    class.add_method(
        "narrow",
        "()I",
        STATIC_METHOD,
        1,
        0,
        vec![op::ICONST_M1, op::I2C, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "narrow", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(0xffff)));
}

#[test]
fn swap_exchanges_the_top_two_values() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Swap", "java/lang/Object");
    class.add_method(
        "top",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![op::ICONST_1, op::ICONST_2, op::SWAP, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "top", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(1)));
}

#[test]
fn long_arguments_occupy_two_local_slots() {
    let (vm, mut thread) = test_vm();

    let mut callee = TestClassBuilder::new("Wide", "java/lang/Object");
    // wide(JI)I returns its int parameter, which sits in slot 2 behind the
    // long's two slots.
    callee.add_method(
        "wide",
        "(JI)I",
        STATIC_METHOD,
        1,
        3,
        vec![0x1c /* iload_2 */, op::IRETURN],
    );
    define(&vm, &thread, callee);

    let mut caller = TestClassBuilder::new("WideCaller", "java/lang/Object");
    let wide_ref = caller.method_ref("Wide", "wide", "(JI)I");
    let mut code = vec![op::LCONST_1, op::BIPUSH, 7, op::INVOKESTATIC];
    code.extend_from_slice(&u16_bytes(wide_ref));
    code.push(op::IRETURN);
    caller.add_method("call", "()I", STATIC_METHOD, 3, 0, code);
    let caller_id = define(&vm, &thread, caller);

    let result = run_static(&vm, &mut thread, caller_id, "call", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(7)));
}

#[test]
fn lcmp_on_sum_of_longs() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Longs", "java/lang/Object");
    class.add_method(
        "cmp",
        "()I",
        STATIC_METHOD,
        4,
        0,
        vec![
            op::LCONST_1,
            op::LCONST_1,
            op::LADD,
            op::LCONST_1,
            op::LCMP,
            op::IRETURN,
        ],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "cmp", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(1)));
}

#[test]
fn clinit_runs_before_first_static_read() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Counter", "java/lang/Object");
    class.add_field("count", "I", FieldFlags::ACC_STATIC);
    let count_ref = class.field_ref("Counter", "count", "I");
    let mut clinit = vec![op::BIPUSH, 42, op::PUTSTATIC];
    clinit.extend_from_slice(&u16_bytes(count_ref));
    clinit.push(op::RETURN);
    class.add_method("<clinit>", "()V", STATIC_METHOD, 1, 0, clinit);
    let mut getter = vec![op::GETSTATIC];
    getter.extend_from_slice(&u16_bytes(count_ref));
    getter.push(op::IRETURN);
    class.add_method("get", "()I", STATIC_METHOD, 1, 0, getter);
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "get", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(42)));
}

#[test]
fn string_literals_are_pooled_and_sized() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Strings", "java/lang/Object");

    let hello = class.string_const("hello");
    let length_ref = class.method_ref("java/lang/String", "length", "()I");
    let mut len_code = vec![op::LDC, hello as u8, op::INVOKEVIRTUAL];
    len_code.extend_from_slice(&u16_bytes(length_ref));
    len_code.push(op::IRETURN);
    class.add_method("len", "()I", STATIC_METHOD, 1, 0, len_code);

    let pooled = class.string_const("pooled");
    let same_code = vec![
        op::LDC,
        pooled as u8,
        op::LDC,
        pooled as u8,
        0xa5, // if_acmpeq
        0x00,
        0x07, // -> pc 11
        op::ICONST_0,
        op::IRETURN,
        op::NOP,
        op::NOP,
        op::ICONST_1,
        op::IRETURN,
    ];
    class.add_method("same", "()I", STATIC_METHOD, 2, 0, same_code);
    let class_id = define(&vm, &thread, class);

    assert_eq!(
        run_static(&vm, &mut thread, class_id, "len", "()I").unwrap(),
        Some(Value::Integer(5))
    );
    assert_eq!(
        run_static(&vm, &mut thread, class_id, "same", "()I").unwrap(),
        Some(Value::Integer(1))
    );
}

#[test]
fn instanceof_covers_null_subclass_and_mismatch() {
    let (vm, mut thread) = test_vm();

    let mut class_a = TestClassBuilder::new("Animal", "java/lang/Object");
    class_a.add_method("<init>", "()V", INSTANCE_METHOD, 1, 1, vec![op::RETURN]);
    define(&vm, &thread, class_a);
    let class_b = TestClassBuilder::new("Dog", "Animal");
    define(&vm, &thread, class_b);

    let mut runner = TestClassBuilder::new("Zoo", "java/lang/Object");
    let dog_class = runner.class_const("Dog");
    let dog_init = runner.method_ref("Dog", "<init>", "()V");
    let animal_class = runner.class_const("Animal");
    let string_class = runner.class_const("java/lang/String");

    let mut upcast = vec![op::NEW];
    upcast.extend_from_slice(&u16_bytes(dog_class));
    upcast.push(op::DUP);
    upcast.push(op::INVOKESPECIAL);
    upcast.extend_from_slice(&u16_bytes(dog_init));
    upcast.push(op::INSTANCEOF);
    upcast.extend_from_slice(&u16_bytes(animal_class));
    upcast.push(op::IRETURN);
    runner.add_method("upcast", "()I", STATIC_METHOD, 2, 0, upcast);

    let mut mismatch = vec![op::NEW];
    mismatch.extend_from_slice(&u16_bytes(dog_class));
    mismatch.push(op::DUP);
    mismatch.push(op::INVOKESPECIAL);
    mismatch.extend_from_slice(&u16_bytes(dog_init));
    mismatch.push(op::INSTANCEOF);
    mismatch.extend_from_slice(&u16_bytes(string_class));
    mismatch.push(op::IRETURN);
    runner.add_method("mismatch", "()I", STATIC_METHOD, 2, 0, mismatch);

    let mut null_check = vec![op::ACONST_NULL, op::INSTANCEOF];
    null_check.extend_from_slice(&u16_bytes(animal_class));
    null_check.push(op::IRETURN);
    runner.add_method("nullCheck", "()I", STATIC_METHOD, 1, 0, null_check);

    let runner_id = define(&vm, &thread, runner);
    assert_eq!(
        run_static(&vm, &mut thread, runner_id, "upcast", "()I").unwrap(),
        Some(Value::Integer(1))
    );
    assert_eq!(
        run_static(&vm, &mut thread, runner_id, "mismatch", "()I").unwrap(),
        Some(Value::Integer(0))
    );
    assert_eq!(
        run_static(&vm, &mut thread, runner_id, "nullCheck", "()I").unwrap(),
        Some(Value::Integer(0))
    );
}

#[test]
fn uncaught_exception_collects_the_invocation_trace() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Trace", "java/lang/Object");
    let inner_ref = class.method_ref("Trace", "inner", "()I");
    class.add_method(
        "inner",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![op::ICONST_1, op::ICONST_0, op::IDIV, op::IRETURN],
    );
    let mut outer = vec![op::INVOKESTATIC];
    outer.extend_from_slice(&u16_bytes(inner_ref));
    outer.push(op::IRETURN);
    class.add_method("outer", "()I", STATIC_METHOD, 1, 0, outer);
    let class_id = define(&vm, &thread, class);

    let err = run_static(&vm, &mut thread, class_id, "outer", "()I").unwrap_err();
    assert_eq!(thrown_class_name(&vm, &err), "java.lang.ArithmeticException");
    let trace: Vec<&str> = thread.backtrace().iter().map(|s| s.as_str()).collect();
    assert_eq!(trace, ["Trace.inner", "Trace.outer"]);
}

#[test]
fn athrow_of_user_constructed_exception_is_catchable_by_supertype() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Thrower", "java/lang/Object");
    let exc_class = class.class_const("java/lang/ArithmeticException");
    let exc_init = class.method_ref("java/lang/ArithmeticException", "<init>", "()V");
    let catch_type = class.class_const("java/lang/RuntimeException");

    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(exc_class));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(exc_init));
    code.push(op::ATHROW); // pc 7
    code.extend_from_slice(&[op::NOP, op::NOP]);
    code.extend_from_slice(&[op::BIPUSH, 33, op::IRETURN]); // handler at pc 10

    class.add_method_with_handlers(
        "boom",
        "()I",
        STATIC_METHOD,
        2,
        0,
        code,
        vec![ExceptionTableEntry {
            start_pc: 0,
            end_pc: 8,
            handler_pc: 10,
            catch_type,
        }],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "boom", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(33)));
}

#[test]
fn monitorenter_and_exit_balance_in_bytecode() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Locky", "java/lang/Object");
    let object_class = class.class_const("java/lang/Object");
    let object_init = class.method_ref("java/lang/Object", "<init>", "()V");
    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(object_class));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(object_init));
    code.extend_from_slice(&[
        op::DUP,
        op::MONITORENTER,
        op::DUP,
        op::MONITOREXIT,
        op::ICONST_1,
        op::IRETURN,
    ]);
    class.add_method("sync", "()I", STATIC_METHOD, 3, 0, code);
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "sync", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(1)));
}

#[test]
fn primitive_array_round_trip_in_bytecode() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Arrays", "java/lang/Object");
    // int[] a = new int[3]; a[1] = 7; return a[1] + a.length;
    let code = vec![
        op::ICONST_3,
        op::NEWARRAY,
        10, // T_INT
        op::ASTORE_2,
        0x2c, // aload_2
        op::ICONST_1,
        op::BIPUSH,
        7,
        op::IASTORE,
        0x2c, // aload_2
        op::ICONST_1,
        0x2e, // iaload
        0x2c, // aload_2
        op::ARRAYLENGTH,
        op::IADD,
        op::IRETURN,
    ];
    class.add_method("roundTrip", "()I", STATIC_METHOD, 3, 3, code);
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "roundTrip", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(10)));
}

#[test]
fn negative_array_size_raises() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("NegArray", "java/lang/Object");
    class.add_method(
        "make",
        "()I",
        STATIC_METHOD,
        1,
        0,
        vec![op::ICONST_M1, op::NEWARRAY, 10, op::ARRAYLENGTH, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let err = run_static(&vm, &mut thread, class_id, "make", "()I").unwrap_err();
    assert_eq!(
        thrown_class_name(&vm, &err),
        "java.lang.NegativeArraySizeException"
    );
}

#[test]
fn unsupported_opcode_is_fatal_and_uncatchable() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Casts", "java/lang/Object");
    let string_class = class.class_const("java/lang/String");
    let catch_all = 0;
    let mut code = vec![op::ACONST_NULL, 0xc0 /* checkcast */];
    code.extend_from_slice(&u16_bytes(string_class));
    code.extend_from_slice(&[op::ICONST_0, op::IRETURN]);
    class.add_method_with_handlers(
        "cast",
        "()I",
        STATIC_METHOD,
        1,
        0,
        code,
        vec![ExceptionTableEntry {
            start_pc: 0,
            end_pc: 5,
            handler_pc: 4,
            catch_type: catch_all,
        }],
    );
    let class_id = define(&vm, &thread, class);

    let err = run_static(&vm, &mut thread, class_id, "cast", "()I").unwrap_err();
    assert!(matches!(
        err,
        JvmError::Instruction(InstructionErr::UnsupportedOpcode { byte: 0xc0, pc: 1 })
    ));
}

#[test]
fn default_interface_method_is_preferred_over_abstract() {
    let (vm, mut thread) = test_vm();

    let mut iface = TestClassBuilder::new("WithDefault", "java/lang/Object").interface();
    iface.add_method(
        "d",
        "()I",
        INSTANCE_METHOD,
        1,
        1,
        vec![op::ICONST_2, op::ICONST_2, op::IADD, op::IRETURN],
    );
    define(&vm, &thread, iface);

    let impl_class = {
        let mut builder = TestClassBuilder::new("PlainImpl", "java/lang/Object");
        builder.add_interface("WithDefault");
        builder
    };
    define(&vm, &thread, impl_class);

    let mut runner = TestClassBuilder::new("DefaultRunner", "java/lang/Object");
    let impl_cls = runner.class_const("PlainImpl");
    let impl_init = runner.method_ref("PlainImpl", "<init>", "()V");
    let iface_d = runner.interface_method_ref("WithDefault", "d", "()I");
    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(impl_cls));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(impl_init));
    code.push(op::INVOKEINTERFACE);
    code.extend_from_slice(&u16_bytes(iface_d));
    code.extend_from_slice(&[1, 0]);
    code.push(op::IRETURN);
    runner.add_method("run", "()I", STATIC_METHOD, 2, 0, code);
    let runner_id = define(&vm, &thread, runner);

    let result = run_static(&vm, &mut thread, runner_id, "run", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(4)));
}

#[test]
fn inherited_method_resolves_through_the_superclass_chain() {
    let (vm, mut thread) = test_vm();

    let mut base = TestClassBuilder::new("Base", "java/lang/Object");
    base.add_method("m", "()I", INSTANCE_METHOD, 1, 1, vec![op::BIPUSH, 21, op::IRETURN]);
    define(&vm, &thread, base);
    define(&vm, &thread, TestClassBuilder::new("Mid", "Base"));
    define(&vm, &thread, TestClassBuilder::new("Leaf", "Mid"));

    let mut runner = TestClassBuilder::new("ChainRunner", "java/lang/Object");
    let leaf_cls = runner.class_const("Leaf");
    let leaf_init = runner.method_ref("Leaf", "<init>", "()V");
    let leaf_m = runner.method_ref("Leaf", "m", "()I");
    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(leaf_cls));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(leaf_init));
    code.push(op::INVOKEVIRTUAL);
    code.extend_from_slice(&u16_bytes(leaf_m));
    code.push(op::IRETURN);
    runner.add_method("run", "()I", STATIC_METHOD, 2, 0, code);
    let runner_id = define(&vm, &thread, runner);

    let result = run_static(&vm, &mut thread, runner_id, "run", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(21)));
}

#[test]
fn missing_native_is_a_no_op_with_typed_default() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Natives", "java/lang/Object");
    class.add_native_method("missingInt", "()I");
    class.add_native_method("missingRef", "()Ljava/lang/String;");
    let class_id = define(&vm, &thread, class);

    assert_eq!(
        run_static(&vm, &mut thread, class_id, "missingInt", "()I").unwrap(),
        Some(Value::Integer(0))
    );
    assert_eq!(
        run_static(&vm, &mut thread, class_id, "missingRef", "()Ljava/lang/String;").unwrap(),
        Some(Value::Null)
    );
}

#[rstest]
#[case(op::FCMPL, -1)]
#[case(op::FCMPG, 1)]
fn float_comparisons_distinguish_nan_forms(#[case] cmp_op: u8, #[case] expected: i32) {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Nan", "java/lang/Object");
    let nan = class.float_const(f32::NAN);
    class.add_method(
        "cmp",
        "()I",
        STATIC_METHOD,
        2,
        0,
        vec![op::LDC, nan as u8, op::FCONST_0, cmp_op, op::IRETURN],
    );
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "cmp", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(expected)));
}

#[test]
fn string_constant_value_is_materialized_at_init() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Lit", "java/lang/Object");
    class.add_static_string_constant("GREETING", "hello");
    let greeting_ref = class.field_ref("Lit", "GREETING", "Ljava/lang/String;");
    let length_ref = class.method_ref("java/lang/String", "length", "()I");
    let mut code = vec![op::GETSTATIC];
    code.extend_from_slice(&u16_bytes(greeting_ref));
    code.push(op::INVOKEVIRTUAL);
    code.extend_from_slice(&u16_bytes(length_ref));
    code.push(op::IRETURN);
    class.add_method("len", "()I", STATIC_METHOD, 1, 0, code);
    let class_id = define(&vm, &thread, class);

    let result = run_static(&vm, &mut thread, class_id, "len", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(5)));
}

#[test]
fn reachable_objects_survive_collection_at_every_safepoint() {
    let (vm, mut thread) = test_vm_with_gc_threshold(0);

    let mut holder = TestClassBuilder::new("Holder", "java/lang/Object");
    holder.add_field("v", "I", FieldFlags::ACC_PRIVATE);
    define(&vm, &thread, holder);

    let mut runner = TestClassBuilder::new("GcRunner", "java/lang/Object");
    let holder_cls = runner.class_const("Holder");
    let holder_init = runner.method_ref("Holder", "<init>", "()V");
    let holder_v = runner.field_ref("Holder", "v", "I");
    // Holder h = new Holder(); h.v = 7; helper(); return h.v;
    let helper_ref = runner.method_ref("GcRunner", "helper", "()V");
    let mut code = vec![op::NEW];
    code.extend_from_slice(&u16_bytes(holder_cls));
    code.push(op::DUP);
    code.push(op::INVOKESPECIAL);
    code.extend_from_slice(&u16_bytes(holder_init));
    code.push(op::ASTORE_0);
    code.push(op::ALOAD_0);
    code.extend_from_slice(&[op::BIPUSH, 7, op::PUTFIELD]);
    code.extend_from_slice(&u16_bytes(holder_v));
    code.push(op::INVOKESTATIC);
    code.extend_from_slice(&u16_bytes(helper_ref));
    code.push(op::ALOAD_0);
    code.push(op::GETFIELD);
    code.extend_from_slice(&u16_bytes(holder_v));
    code.push(op::IRETURN);
    runner.add_method("run", "()I", STATIC_METHOD, 2, 1, code);
    // helper allocates garbage that the sweep may reclaim
    let garbage_cls = runner.class_const("Holder");
    let garbage_init = runner.method_ref("Holder", "<init>", "()V");
    let mut helper = vec![op::NEW];
    helper.extend_from_slice(&u16_bytes(garbage_cls));
    helper.push(op::DUP);
    helper.push(op::INVOKESPECIAL);
    helper.extend_from_slice(&u16_bytes(garbage_init));
    helper.push(0x57); // pop
    helper.push(op::RETURN);
    runner.add_method("helper", "()V", STATIC_METHOD, 2, 0, helper);
    let runner_id = define(&vm, &thread, runner);

    let result = run_static(&vm, &mut thread, runner_id, "run", "()I").unwrap();
    assert_eq!(result, Some(Value::Integer(7)));
}

#[test]
fn out_of_bounds_store_raises() {
    let (vm, mut thread) = test_vm();
    let mut class = TestClassBuilder::new("Oob", "java/lang/Object");
    let code = vec![
        op::ICONST_1,
        op::NEWARRAY,
        10, // T_INT
        op::ICONST_5,
        op::ICONST_1,
        op::IASTORE,
        op::ICONST_0,
        op::IRETURN,
    ];
    class.add_method("store", "()I", STATIC_METHOD, 3, 0, code);
    let class_id = define(&vm, &thread, class);

    let err = run_static(&vm, &mut thread, class_id, "store", "()I").unwrap_err();
    assert_eq!(
        thrown_class_name(&vm, &err),
        "java.lang.ArrayIndexOutOfBoundsException"
    );
}
