use crate::error::JvmError;
use crate::keys::FullyQualifiedMethodKey;
use crate::native::{NativeMethod, NativeRegistry, NativeRet};
use crate::thread::JavaThreadState;
use crate::vm::{Value, VirtualMachine};
use std::io::Write;

pub(super) fn do_register_java_io_preregistered_natives(native_registry: &mut NativeRegistry) {
    let methods: &[(&str, &str, NativeMethod)] = &[
        ("println", "()V", java_io_print_stream_println_empty),
        ("println", "(I)V", java_io_print_stream_println_int),
        ("println", "(J)V", java_io_print_stream_println_long),
        ("println", "(F)V", java_io_print_stream_println_float),
        ("println", "(D)V", java_io_print_stream_println_double),
        ("println", "(Z)V", java_io_print_stream_println_boolean),
        ("println", "(C)V", java_io_print_stream_println_char),
        (
            "println",
            "(Ljava/lang/String;)V",
            java_io_print_stream_println_string,
        ),
        ("print", "(I)V", java_io_print_stream_print_int),
        ("print", "(J)V", java_io_print_stream_print_long),
        ("print", "(F)V", java_io_print_stream_print_float),
        ("print", "(D)V", java_io_print_stream_print_double),
        ("print", "(Z)V", java_io_print_stream_print_boolean),
        ("print", "(C)V", java_io_print_stream_print_char),
        (
            "print",
            "(Ljava/lang/String;)V",
            java_io_print_stream_print_string,
        ),
    ];
    for (name, desc, method) in methods {
        native_registry.register(
            FullyQualifiedMethodKey::new_with_str(
                "java/io/PrintStream",
                name,
                desc,
                &native_registry.string_interner,
            ),
            *method,
        );
    }
}

fn stream_fd(vm: &VirtualMachine, stream: &Value) -> Result<i32, JvmError> {
    let stream_ref = stream.as_obj_ref()?;
    let ma = vm.method_area_read();
    let class = ma.get_instance_class(&stream_ref.class_id)?;
    vm.heap_read()
        .read_field_by_name(stream_ref.addr, class, vm.br.print_stream_fd_fk.name)?
        .as_int()
}

fn emit(vm: &VirtualMachine, stream: &Value, text: &str, newline: bool) -> NativeRet {
    let fd = stream_fd(vm, stream)?;
    let payload = if newline {
        format!("{}\n", text)
    } else {
        text.to_string()
    };
    if fd == 2 {
        let mut err = std::io::stderr();
        err.write_all(payload.as_bytes()).expect("failed to write to stderr");
        err.flush().expect("failed to flush stderr");
    } else {
        let mut out = std::io::stdout();
        out.write_all(payload.as_bytes()).expect("failed to write to stdout");
        out.flush().expect("failed to flush stdout");
    }
    Ok(None)
}

/// Java prints a whole-number float as `1.0`, not `1`.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn string_arg(vm: &VirtualMachine, value: &Value) -> Result<String, JvmError> {
    match value.as_nullable_obj_ref()? {
        Some(string_ref) => vm.heap_read().get_rust_string_from_java_string(string_ref.addr),
        None => Ok("null".to_string()),
    }
}

fn char_arg(value: &Value) -> Result<String, JvmError> {
    let code = value.as_int()? as u32;
    let c = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
    Ok(c.to_string())
}

fn java_io_print_stream_println_empty(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], "", true)
}

fn java_io_print_stream_println_int(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &args[1].as_int()?.to_string(), true)
}

fn java_io_print_stream_println_long(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &args[1].as_long()?.to_string(), true)
}

fn java_io_print_stream_println_float(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &format_float(args[1].as_float()? as f64), true)
}

fn java_io_print_stream_println_double(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &format_float(args[1].as_double()?), true)
}

fn java_io_print_stream_println_boolean(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let text = if args[1].as_int()? != 0 { "true" } else { "false" };
    emit(vm, &args[0], text, true)
}

fn java_io_print_stream_println_char(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &char_arg(&args[1])?, true)
}

fn java_io_print_stream_println_string(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &string_arg(vm, &args[1])?, true)
}

fn java_io_print_stream_print_int(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &args[1].as_int()?.to_string(), false)
}

fn java_io_print_stream_print_long(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &args[1].as_long()?.to_string(), false)
}

fn java_io_print_stream_print_float(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &format_float(args[1].as_float()? as f64), false)
}

fn java_io_print_stream_print_double(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &format_float(args[1].as_double()?), false)
}

fn java_io_print_stream_print_boolean(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let text = if args[1].as_int()? != 0 { "true" } else { "false" };
    emit(vm, &args[0], text, false)
}

fn java_io_print_stream_print_char(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &char_arg(&args[1])?, false)
}

fn java_io_print_stream_print_string(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    emit(vm, &args[0], &string_arg(vm, &args[1])?, false)
}
