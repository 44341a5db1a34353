use crate::VmConfig;
use crate::class_loader::system::SystemClassLoader;
use crate::debug_log;
use crate::error::JvmError;

mod system;

/// Bootstrap loading order: the synthesized core classes are registered
/// directly with the method area, everything else resolves through the
/// classpath scan here.
pub struct ClassLoader {
    system: SystemClassLoader,
}

impl ClassLoader {
    pub fn new(vm_config: &VmConfig) -> Result<Self, JvmError> {
        debug_log!(
            "Creating ClassLoader over classpath {:?}",
            vm_config.class_path
        );
        let system = SystemClassLoader::new(&vm_config.class_path)?;
        Ok(Self { system })
    }

    pub fn load(&self, name: &str) -> Result<Vec<u8>, JvmError> {
        let bytes = self.system.find_class(name)?;
        debug_log!("Bytecode of \"{name}\" found on the classpath.");
        Ok(bytes)
    }
}
