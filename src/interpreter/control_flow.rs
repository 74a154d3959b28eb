use crate::value::Value;

/// How a statement finished. `Return`, `Break` and `Continue` bubble up
/// through enclosing blocks until a call or loop boundary consumes them.
pub enum ControlFlow {
    Next,
    Return(Value),
    Break,
    Continue,
}
