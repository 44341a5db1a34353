use crate::error::JvmError;
use crate::keys::{ClassId, FieldKey, MethodKey, Symbol};
use lasso::ThreadedRodeo;
use once_cell::sync::OnceCell;

/// Pre-interned names, keys and core class ids the runtime reaches for
/// constantly. Built once, shared behind an `Arc`.
pub struct BootstrapRegistry {
    // Common method keys
    pub clinit_mk: MethodKey,
    pub no_arg_constructor_mk: MethodKey,
    pub main_mk: MethodKey,

    // Common field keys
    pub message_fk: FieldKey,
    pub string_value_fk: FieldKey,
    pub system_out_fk: FieldKey,
    pub system_err_fk: FieldKey,
    pub print_stream_fd_fk: FieldKey,

    // Common class names (interned)
    pub java_lang_object_sym: Symbol,
    pub java_lang_string_sym: Symbol,
    pub java_lang_system_sym: Symbol,
    pub java_lang_throwable_sym: Symbol,
    pub java_io_print_stream_sym: Symbol,

    // Common method names (interned)
    pub init_sym: Symbol,
    pub clinit_sym: Symbol,
    pub main_sym: Symbol,

    // Common descriptors (interned)
    pub void_desc: Symbol,         // ()V
    pub string_desc: Symbol,       // Ljava/lang/String;
    pub string_array_desc: Symbol, // [Ljava/lang/String;
    pub char_array_desc: Symbol,   // [C

    // Core class IDs, filled in while the method area preloads builtins
    java_lang_object_id: OnceCell<ClassId>,
    java_lang_string_id: OnceCell<ClassId>,
    java_lang_throwable_id: OnceCell<ClassId>,
    java_lang_system_id: OnceCell<ClassId>,
    java_io_print_stream_id: OnceCell<ClassId>,
    char_array_class_id: OnceCell<ClassId>,
}

macro_rules! once_class_id {
    ($setter:ident, $getter:ident, $field:ident, $what:literal) => {
        pub fn $setter(&self, id: ClassId) -> Result<(), JvmError> {
            self.$field
                .set(id)
                .map_err(|_| JvmError::ClassStructure(concat!($what, " id already set").to_string()))
        }

        pub fn $getter(&self) -> Result<ClassId, JvmError> {
            self.$field
                .get()
                .copied()
                .ok_or(JvmError::ClassStructure(concat!($what, " id not set").to_string()))
        }
    };
}

impl BootstrapRegistry {
    pub fn new(interner: &ThreadedRodeo) -> Self {
        // Method names
        let init_sym = interner.get_or_intern("<init>");
        let clinit_sym = interner.get_or_intern("<clinit>");
        let main_sym = interner.get_or_intern("main");

        // Common descriptors
        let void_desc = interner.get_or_intern("()V");
        let string_desc = interner.get_or_intern("Ljava/lang/String;");
        let string_array_desc = interner.get_or_intern("[Ljava/lang/String;");
        let char_array_desc = interner.get_or_intern("[C");
        let print_stream_desc = interner.get_or_intern("Ljava/io/PrintStream;");
        let int_desc = interner.get_or_intern("I");

        Self {
            clinit_mk: MethodKey {
                name: clinit_sym,
                desc: void_desc,
            },
            no_arg_constructor_mk: MethodKey {
                name: init_sym,
                desc: void_desc,
            },
            main_mk: MethodKey {
                name: main_sym,
                desc: interner.get_or_intern("([Ljava/lang/String;)V"),
            },

            message_fk: FieldKey {
                name: interner.get_or_intern("message"),
                desc: string_desc,
            },
            string_value_fk: FieldKey {
                name: interner.get_or_intern("value"),
                desc: char_array_desc,
            },
            system_out_fk: FieldKey {
                name: interner.get_or_intern("out"),
                desc: print_stream_desc,
            },
            system_err_fk: FieldKey {
                name: interner.get_or_intern("err"),
                desc: print_stream_desc,
            },
            print_stream_fd_fk: FieldKey {
                name: interner.get_or_intern("fd"),
                desc: int_desc,
            },

            java_lang_object_sym: interner.get_or_intern("java/lang/Object"),
            java_lang_string_sym: interner.get_or_intern("java/lang/String"),
            java_lang_system_sym: interner.get_or_intern("java/lang/System"),
            java_lang_throwable_sym: interner.get_or_intern("java/lang/Throwable"),
            java_io_print_stream_sym: interner.get_or_intern("java/io/PrintStream"),

            init_sym,
            clinit_sym,
            main_sym,

            void_desc,
            string_desc,
            string_array_desc,
            char_array_desc,

            java_lang_object_id: OnceCell::new(),
            java_lang_string_id: OnceCell::new(),
            java_lang_throwable_id: OnceCell::new(),
            java_lang_system_id: OnceCell::new(),
            java_io_print_stream_id: OnceCell::new(),
            char_array_class_id: OnceCell::new(),
        }
    }

    once_class_id!(
        set_java_lang_object_id,
        get_java_lang_object_id,
        java_lang_object_id,
        "java/lang/Object"
    );
    once_class_id!(
        set_java_lang_string_id,
        get_java_lang_string_id,
        java_lang_string_id,
        "java/lang/String"
    );
    once_class_id!(
        set_java_lang_throwable_id,
        get_java_lang_throwable_id,
        java_lang_throwable_id,
        "java/lang/Throwable"
    );
    once_class_id!(
        set_java_lang_system_id,
        get_java_lang_system_id,
        java_lang_system_id,
        "java/lang/System"
    );
    once_class_id!(
        set_java_io_print_stream_id,
        get_java_io_print_stream_id,
        java_io_print_stream_id,
        "java/io/PrintStream"
    );
    once_class_id!(
        set_char_array_class_id,
        get_char_array_class_id,
        char_array_class_id,
        "char array class"
    );
}
