use crate::constants::DATA_START;
use crate::messages::{Location, Messages};
use crate::ops::{ExecOp, RealOp};
use crate::program::{AnnotatedOp, Program};
use crate::vm::{StopCause, VirtualMachine, VmOptions};

mod eval;
mod logic;

pub fn real_program(ops: &[RealOp]) -> Program {
    Program {
        ops: ops
            .iter()
            .enumerate()
            .map(|(i, op)| AnnotatedOp {
                op: ExecOp::Real(*op),
                loc: Location::new(0, i as u32 + 1, 1),
            })
            .collect(),
        data: Vec::new(),
        data_start: DATA_START,
        symbols: Default::default(),
        files: Default::default(),
    }
}

pub fn run_program(
    program: &Program,
    options: VmOptions,
) -> (VirtualMachine, StopCause, Messages) {
    let mut vm = VirtualMachine::new(options);
    vm.reset(program);
    let mut messages = Messages::new();
    let cause = vm.run(program, &mut messages);
    (vm, cause, messages)
}

pub fn run_ops(ops: &[RealOp]) -> (VirtualMachine, StopCause, Messages) {
    run_program(&real_program(ops), VmOptions::default())
}
