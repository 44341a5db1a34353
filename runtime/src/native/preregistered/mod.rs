use crate::native::NativeRegistry;

mod java_io;
mod java_lang;

pub(crate) fn register_all(native_registry: &mut NativeRegistry) {
    java_lang::do_register_java_lang_preregistered_natives(native_registry);
    java_io::do_register_java_io_preregistered_natives(native_registry);
}
