/// Build a [`crate::error::JvmError::JavaException`] value for a VM-raised
/// Java exception.
#[macro_export]
macro_rules! build_exception {
    ($kind:ident) => {
        $crate::error::JvmError::JavaException($crate::error::JavaExceptionFromJvm::new(
            $crate::error::JavaExceptionKind::$kind,
        ))
    };
    ($kind:ident, method_key: $method_key:expr, class_sym: $class_sym:expr) => {
        $crate::error::JvmError::JavaException(
            $crate::error::JavaExceptionFromJvm::with_method_not_found(
                $crate::error::JavaExceptionKind::$kind,
                $method_key,
                $class_sym,
            ),
        )
    };
    ($kind:ident, field_key: $field_key:expr, class_sym: $class_sym:expr) => {
        $crate::error::JvmError::JavaException(
            $crate::error::JavaExceptionFromJvm::with_field_not_found(
                $crate::error::JavaExceptionKind::$kind,
                $field_key,
                $class_sym,
            ),
        )
    };
    ($kind:ident, pool_idx: $pool_idx:expr, expected: $expected:expr, actual: $actual:expr) => {
        $crate::error::JvmError::JavaException(
            $crate::error::JavaExceptionFromJvm::with_runtime_pool_incompatible_class_change(
                $crate::error::JavaExceptionKind::$kind,
                $pool_idx,
                $expected,
                $actual,
            ),
        )
    };
    ($kind:ident, $($arg:tt)+) => {
        $crate::error::JvmError::JavaException($crate::error::JavaExceptionFromJvm::with_message(
            $crate::error::JavaExceptionKind::$kind,
            format!($($arg)+),
        ))
    };
}

/// `Err(build_exception!(..))`, for use in tail position or behind `?`.
#[macro_export]
macro_rules! throw_exception {
    ($($arg:tt)+) => {
        Err($crate::build_exception!($($arg)+))
    };
}
