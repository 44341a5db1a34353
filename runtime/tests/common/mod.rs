use sigrun_classfile::ClassFile;
use sigrun_classfile::attribute::method::{CodeAttribute, ExceptionTableEntry, MethodAttribute};
use sigrun_classfile::constant::pool::ConstantPool;
use sigrun_classfile::constant::{ConstantInfo, NameAndTypeInfo, RefInfo};
use sigrun_classfile::field::{FieldAttr, FieldInfo};
use sigrun_classfile::flags::{ClassFlags, FieldFlags, MethodFlags};
use sigrun_classfile::method::MethodInfo;
use sigrun_runtime::error::JvmError;
use sigrun_runtime::interpreter::Interpreter;
use sigrun_runtime::keys::MethodKey;
use sigrun_runtime::thread::JavaThreadState;
use sigrun_runtime::{ClassId, ThreadId, Value, VirtualMachine, VmConfig};

/// Assembles a `ClassFile` value directly, the same shape the parser would
/// produce, so tests can exercise the interpreter with real constant pools.
pub struct TestClassBuilder {
    cp: Vec<ConstantInfo>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    interfaces: Vec<u16>,
}

impl TestClassBuilder {
    pub fn new(name: &str, super_name: &str) -> Self {
        let mut builder = Self {
            cp: vec![ConstantInfo::Unused],
            access_flags: ClassFlags::ACC_PUBLIC | ClassFlags::ACC_SUPER,
            this_class: 0,
            super_class: 0,
            fields: Vec::new(),
            methods: Vec::new(),
            interfaces: Vec::new(),
        };
        builder.this_class = builder.class_const(name);
        builder.super_class = builder.class_const(super_name);
        builder
    }

    pub fn interface(mut self) -> Self {
        self.access_flags = ClassFlags::ACC_PUBLIC | ClassFlags::ACC_INTERFACE | ClassFlags::ACC_ABSTRACT;
        self
    }

    fn push(&mut self, entry: ConstantInfo) -> u16 {
        self.cp.push(entry);
        (self.cp.len() - 1) as u16
    }

    pub fn utf8(&mut self, text: &str) -> u16 {
        self.push(ConstantInfo::Utf8(text.to_string()))
    }

    pub fn class_const(&mut self, name: &str) -> u16 {
        let name_idx = self.utf8(name);
        self.push(ConstantInfo::Class(name_idx))
    }

    pub fn string_const(&mut self, text: &str) -> u16 {
        let utf8_idx = self.utf8(text);
        self.push(ConstantInfo::String(utf8_idx))
    }

    pub fn float_const(&mut self, value: f32) -> u16 {
        self.push(ConstantInfo::Float(value))
    }

    fn name_and_type(&mut self, name: &str, desc: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(desc);
        self.push(ConstantInfo::NameAndType(NameAndTypeInfo {
            name_index,
            descriptor_index,
        }))
    }

    pub fn method_ref(&mut self, class: &str, name: &str, desc: &str) -> u16 {
        let class_index = self.class_const(class);
        let name_and_type_index = self.name_and_type(name, desc);
        self.push(ConstantInfo::MethodRef(RefInfo {
            class_index,
            name_and_type_index,
        }))
    }

    pub fn interface_method_ref(&mut self, class: &str, name: &str, desc: &str) -> u16 {
        let class_index = self.class_const(class);
        let name_and_type_index = self.name_and_type(name, desc);
        self.push(ConstantInfo::InterfaceMethodRef(RefInfo {
            class_index,
            name_and_type_index,
        }))
    }

    pub fn field_ref(&mut self, class: &str, name: &str, desc: &str) -> u16 {
        let class_index = self.class_const(class);
        let name_and_type_index = self.name_and_type(name, desc);
        self.push(ConstantInfo::FieldRef(RefInfo {
            class_index,
            name_and_type_index,
        }))
    }

    pub fn add_field(&mut self, name: &str, desc: &str, flags: u16) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(desc);
        self.fields.push(FieldInfo {
            access_flags: FieldFlags::new(flags),
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
    }

    /// A `static final String` field with a `ConstantValue` attribute.
    pub fn add_static_string_constant(&mut self, name: &str, literal: &str) {
        let constant_idx = self.string_const(literal);
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8("Ljava/lang/String;");
        self.fields.push(FieldInfo {
            access_flags: FieldFlags::new(
                FieldFlags::ACC_PUBLIC | FieldFlags::ACC_STATIC | FieldFlags::ACC_FINAL,
            ),
            name_index,
            descriptor_index,
            attributes: vec![FieldAttr::ConstantValue(constant_idx)],
        });
    }

    pub fn add_native_method(&mut self, name: &str, desc: &str) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(desc);
        self.methods.push(MethodInfo {
            access_flags: MethodFlags::new(
                MethodFlags::ACC_PUBLIC | MethodFlags::ACC_STATIC | MethodFlags::ACC_NATIVE,
            ),
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
    }

    pub fn add_method(
        &mut self,
        name: &str,
        desc: &str,
        flags: u16,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
    ) {
        self.add_method_with_handlers(name, desc, flags, max_stack, max_locals, code, Vec::new());
    }

    pub fn add_method_with_handlers(
        &mut self,
        name: &str,
        desc: &str,
        flags: u16,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
        exception_table: Vec<ExceptionTableEntry>,
    ) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(desc);
        self.methods.push(MethodInfo {
            access_flags: MethodFlags::new(flags),
            name_index,
            descriptor_index,
            attributes: vec![MethodAttribute::Code(CodeAttribute {
                max_stack,
                max_locals,
                code,
                exception_table,
                attributes: Vec::new(),
            })],
        });
    }

    pub fn add_abstract_method(&mut self, name: &str, desc: &str) {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(desc);
        self.methods.push(MethodInfo {
            access_flags: MethodFlags::new(MethodFlags::ACC_PUBLIC | MethodFlags::ACC_ABSTRACT),
            name_index,
            descriptor_index,
            attributes: Vec::new(),
        });
    }

    pub fn add_interface(&mut self, name: &str) {
        let idx = self.class_const(name);
        self.interfaces.push(idx);
    }

    pub fn build(self) -> ClassFile {
        ClassFile {
            minor_version: 0,
            major_version: 52,
            cp: ConstantPool { inner: self.cp },
            access_flags: ClassFlags::new(self.access_flags),
            this_class: self.this_class,
            super_class: self.super_class,
            interfaces: self.interfaces,
            fields: self.fields,
            methods: self.methods,
            attributes: Vec::new(),
        }
    }
}

pub fn test_vm() -> (VirtualMachine, JavaThreadState) {
    test_vm_with_gc_threshold(4)
}

/// A threshold of 0 makes every safepoint run a full mark-sweep.
pub fn test_vm_with_gc_threshold(gc_threshold_mb: usize) -> (VirtualMachine, JavaThreadState) {
    let config = VmConfig {
        class_path: Vec::new(),
        main_class: String::new(),
        heap_size_mb: 8,
        gc_threshold_mb,
        ..VmConfig::default()
    };
    let vm = VirtualMachine::new(config).expect("VM should boot");
    let thread = JavaThreadState::new(ThreadId::from_usize(0), 256);
    (vm, thread)
}

pub fn define(vm: &VirtualMachine, thread: &JavaThreadState, builder: TestClassBuilder) -> ClassId {
    vm.method_area_write()
        .define_class(builder.build(), thread.id)
        .expect("class should link")
}

/// Initializes the class and runs a no-argument static method through the
/// entrypoint invoker.
pub fn run_static(
    vm: &VirtualMachine,
    thread: &mut JavaThreadState,
    class_id: ClassId,
    name: &str,
    desc: &str,
) -> Result<Option<Value>, JvmError> {
    Interpreter::ensure_initialized(thread, Some(class_id), vm)?;
    let key = MethodKey {
        name: vm.interner().get_or_intern(name),
        desc: vm.interner().get_or_intern(desc),
    };
    Interpreter::invoke_by_name(thread, class_id, key, vm, vec![])
}

/// The class name of a throwable that escaped, dotted.
pub fn thrown_class_name(vm: &VirtualMachine, err: &JvmError) -> String {
    match err {
        JvmError::JavaExceptionThrown(exception_ref) => {
            let ma = vm.method_area_read();
            let sym = ma.class_name(exception_ref.class_id).expect("class exists");
            vm.interner().resolve(&sym).replace('/', ".")
        }
        other => panic!("expected a thrown Java exception, got {:?}", other),
    }
}

// Opcode bytes used by the test programs.
pub mod op {
    pub const ACONST_NULL: u8 = 0x01;
    pub const ICONST_M1: u8 = 0x02;
    pub const ICONST_0: u8 = 0x03;
    pub const ICONST_1: u8 = 0x04;
    pub const ICONST_2: u8 = 0x05;
    pub const ICONST_3: u8 = 0x06;
    pub const ICONST_5: u8 = 0x08;
    pub const LCONST_1: u8 = 0x0a;
    pub const FCONST_0: u8 = 0x0b;
    pub const BIPUSH: u8 = 0x10;
    pub const LDC: u8 = 0x12;
    pub const ILOAD_0: u8 = 0x1a;
    pub const ILOAD_1: u8 = 0x1b;
    pub const ALOAD_0: u8 = 0x2a;
    pub const ISTORE_0: u8 = 0x3b;
    pub const ISTORE_1: u8 = 0x3c;
    pub const ASTORE_0: u8 = 0x4b;
    pub const ASTORE_2: u8 = 0x4d;
    pub const IASTORE: u8 = 0x4f;
    pub const DUP: u8 = 0x59;
    pub const SWAP: u8 = 0x5f;
    pub const IADD: u8 = 0x60;
    pub const LADD: u8 = 0x61;
    pub const IDIV: u8 = 0x6c;
    pub const ISHL: u8 = 0x78;
    pub const IUSHR: u8 = 0x7c;
    pub const IINC: u8 = 0x84;
    pub const I2C: u8 = 0x92;
    pub const LCMP: u8 = 0x94;
    pub const FCMPL: u8 = 0x95;
    pub const FCMPG: u8 = 0x96;
    pub const IF_ICMPLE: u8 = 0xa4;
    pub const TABLESWITCH: u8 = 0xaa;
    pub const LOOKUPSWITCH: u8 = 0xab;
    pub const IRETURN: u8 = 0xac;
    pub const RETURN: u8 = 0xb1;
    pub const GETSTATIC: u8 = 0xb2;
    pub const PUTSTATIC: u8 = 0xb3;
    pub const GETFIELD: u8 = 0xb4;
    pub const PUTFIELD: u8 = 0xb5;
    pub const INVOKEVIRTUAL: u8 = 0xb6;
    pub const INVOKESPECIAL: u8 = 0xb7;
    pub const INVOKESTATIC: u8 = 0xb8;
    pub const INVOKEINTERFACE: u8 = 0xb9;
    pub const NEW: u8 = 0xbb;
    pub const NEWARRAY: u8 = 0xbc;
    pub const ARRAYLENGTH: u8 = 0xbe;
    pub const ATHROW: u8 = 0xbf;
    pub const INSTANCEOF: u8 = 0xc1;
    pub const MONITORENTER: u8 = 0xc2;
    pub const MONITOREXIT: u8 = 0xc3;
    pub const NOP: u8 = 0x00;
}

pub fn u16_bytes(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}
