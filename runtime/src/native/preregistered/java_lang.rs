use crate::keys::FullyQualifiedMethodKey;
use crate::native::{NativeRegistry, NativeRet};
use crate::thread::JavaThreadState;
use crate::throw_exception;
use crate::vm::{Value, VirtualMachine};

pub(super) fn do_register_java_lang_preregistered_natives(native_registry: &mut NativeRegistry) {
    native_registry.register(
        FullyQualifiedMethodKey::new_with_str(
            "java/lang/Object",
            "hashCode",
            "()I",
            &native_registry.string_interner,
        ),
        java_lang_object_hash_code,
    );
    native_registry.register(
        FullyQualifiedMethodKey::new_with_str(
            "java/lang/System",
            "arraycopy",
            "(Ljava/lang/Object;ILjava/lang/Object;II)V",
            &native_registry.string_interner,
        ),
        java_lang_system_arraycopy,
    );
    native_registry.register(
        FullyQualifiedMethodKey::new_with_str(
            "java/lang/Throwable",
            "<init>",
            "(Ljava/lang/String;)V",
            &native_registry.string_interner,
        ),
        java_lang_throwable_init_with_message,
    );
    native_registry.register(
        FullyQualifiedMethodKey::new_with_str(
            "java/lang/Throwable",
            "getMessage",
            "()Ljava/lang/String;",
            &native_registry.string_interner,
        ),
        java_lang_throwable_get_message,
    );
    native_registry.register(
        FullyQualifiedMethodKey::new_with_str(
            "java/lang/String",
            "length",
            "()I",
            &native_registry.string_interner,
        ),
        java_lang_string_length,
    );
    native_registry.register(
        FullyQualifiedMethodKey::new_with_str(
            "java/lang/String",
            "charAt",
            "(I)C",
            &native_registry.string_interner,
        ),
        java_lang_string_char_at,
    );
}

fn java_lang_object_hash_code(
    _vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let this = args[0].as_obj_ref()?;
    Ok(Some(Value::Integer(this.addr as i32)))
}

fn java_lang_system_arraycopy(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let src = args[0].as_obj_ref()?;
    let src_pos = args[1].as_int()?;
    let dest = args[2].as_obj_ref()?;
    let dest_pos = args[3].as_int()?;
    let length = args[4].as_int()?;
    vm.heap_write()
        .copy_array_region(src.addr, src_pos, dest.addr, dest_pos, length)?;
    Ok(None)
}

/// Backs `Throwable.<init>(String)` for the whole builtin throwable
/// hierarchy; the `message` field is inherited from `java/lang/Throwable`.
fn java_lang_throwable_init_with_message(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let this = args[0].as_obj_ref()?;
    args[1].as_nullable_obj_ref()?;
    let ma = vm.method_area_read();
    let class = ma.get_instance_class(&this.class_id)?;
    vm.heap_write()
        .write_field_by_name(this.addr, class, vm.br.message_fk.name, args[1])?;
    Ok(None)
}

fn java_lang_throwable_get_message(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let this = args[0].as_obj_ref()?;
    let ma = vm.method_area_read();
    let class = ma.get_instance_class(&this.class_id)?;
    let message = vm
        .heap_read()
        .read_field_by_name(this.addr, class, vm.br.message_fk.name)?;
    Ok(Some(message))
}

fn java_lang_string_length(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let this = args[0].as_obj_ref()?;
    let heap = vm.heap_read();
    let value_array = heap.read_field(this.addr, 0)?.as_obj_ref()?;
    let length = heap.char_array_slice(value_array.addr)?.len();
    Ok(Some(Value::Integer(length as i32)))
}

fn java_lang_string_char_at(
    vm: &VirtualMachine,
    _thread: &mut JavaThreadState,
    args: &[Value],
) -> NativeRet {
    let this = args[0].as_obj_ref()?;
    let index = args[1].as_int()?;
    let heap = vm.heap_read();
    let value_array = heap.read_field(this.addr, 0)?.as_obj_ref()?;
    let chars = heap.char_array_slice(value_array.addr)?;
    if index < 0 || index as usize >= chars.len() {
        throw_exception!(
            ArrayIndexOutOfBoundsException,
            "Index {} out of bounds for length {}",
            index,
            chars.len()
        )?
    }
    Ok(Some(Value::Integer(chars[index as usize] as i32)))
}
