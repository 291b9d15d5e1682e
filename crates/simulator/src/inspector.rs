//! Inspector that turns a regular transaction into a static call.

use revm::inspector::Inspector;
use revm::interpreter::interpreter::EthInterpreter;
use revm::interpreter::{CallInputs, CallOutcome};

/// Marks every call frame as static, including the outermost one.
///
/// Any `SSTORE`, `LOG*`, `CREATE*`, `SELFDESTRUCT` or value-bearing `CALL`
/// then halts the frame, exactly as it would under `STATICCALL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCallInspector;

impl<CTX> Inspector<CTX, EthInterpreter> for StaticCallInspector {
    #[inline]
    fn call(&mut self, _context: &mut CTX, inputs: &mut CallInputs) -> Option<CallOutcome> {
        inputs.is_static = true;
        None
    }
}
