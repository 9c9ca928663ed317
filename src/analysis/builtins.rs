// src/analysis/builtins.rs

//! Python builtin names.
//!
//! Names in this table are always in scope for analyzed blocks and are
//! never reported as free variables.

/// CPython builtins (functions, types, exceptions, constants) plus the
/// module-level dunders notebooks commonly touch.
pub const PYTHON_BUILTINS: &[&str] = &[
    // constants
    "True", "False", "None", "NotImplemented", "Ellipsis",
    "__debug__", "__name__", "__file__", "__doc__", "__builtins__",
    "__spec__", "__loader__", "__package__",
    // functions
    "abs", "aiter", "all", "anext", "any", "ascii", "bin", "bool",
    "breakpoint", "bytearray", "bytes", "callable", "chr", "classmethod",
    "compile", "complex", "delattr", "dict", "dir", "divmod", "enumerate",
    "eval", "exec", "filter", "float", "format", "frozenset", "getattr",
    "globals", "hasattr", "hash", "help", "hex", "id", "input", "int",
    "isinstance", "issubclass", "iter", "len", "list", "locals", "map",
    "max", "memoryview", "min", "next", "object", "oct", "open", "ord",
    "pow", "print", "property", "range", "repr", "reversed", "round",
    "set", "setattr", "slice", "sorted", "staticmethod", "str", "sum",
    "super", "tuple", "type", "vars", "zip",
    // exceptions and warnings
    "ArithmeticError", "AssertionError", "AttributeError", "BaseException",
    "BaseExceptionGroup", "BlockingIOError", "BrokenPipeError",
    "BufferError", "BytesWarning", "ChildProcessError",
    "ConnectionAbortedError", "ConnectionError", "ConnectionRefusedError",
    "ConnectionResetError", "DeprecationWarning", "EOFError",
    "EncodingWarning", "EnvironmentError", "Exception", "ExceptionGroup",
    "FileExistsError", "FileNotFoundError", "FloatingPointError",
    "FutureWarning", "GeneratorExit", "IOError", "ImportError",
    "ImportWarning", "IndentationError", "IndexError", "InterruptedError",
    "IsADirectoryError", "KeyError", "KeyboardInterrupt", "LookupError",
    "MemoryError", "ModuleNotFoundError", "NameError",
    "NotADirectoryError", "NotImplementedError", "OSError",
    "OverflowError", "PendingDeprecationWarning", "PermissionError",
    "ProcessLookupError", "RecursionError", "ReferenceError",
    "ResourceWarning", "RuntimeError", "RuntimeWarning", "StopAsyncIteration",
    "StopIteration", "SyntaxError", "SyntaxWarning", "SystemError",
    "SystemExit", "TabError", "TimeoutError", "TypeError",
    "UnboundLocalError", "UnicodeDecodeError", "UnicodeEncodeError",
    "UnicodeError", "UnicodeTranslateError", "UnicodeWarning",
    "UserWarning", "ValueError", "Warning", "ZeroDivisionError",
    // notebook conveniences
    "display", "get_ipython",
];

/// Whether `name` is a Python builtin (or a module-level dunder).
pub fn is_builtin(name: &str) -> bool {
    PYTHON_BUILTINS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_builtins_are_known() {
        for name in ["print", "len", "range", "ValueError", "True", "__name__"] {
            assert!(is_builtin(name), "{name} should be a builtin");
        }
    }

    #[test]
    fn user_names_are_not_builtins() {
        for name in ["x", "df", "train_model", "printx"] {
            assert!(!is_builtin(name), "{name} should not be a builtin");
        }
    }
}
