use std::io::{Stdout, Write};

use tracing::{debug, info, trace, warn};

use super::bytecode::{Instruction, Reg};
use super::config::VmConfig;
use super::dump::Dump;
use super::error::{Fault, FaultKind};
use super::frame::FrameStack;
use super::heap::{Heap, Object};
use super::mailbox::Mailbox;
use super::program::Program;
use super::registers::RegisterFile;
use super::value::{cast, ObjectRef, TypeTag, Value};

/// Where the VM stands after (or before) a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ready,
    Halted,
    Faulted(Fault),
}

impl Status {
    /// 0 after HALT, the fault's code after a fault, -1 if nothing ran.
    pub fn exit_code(&self) -> i32 {
        match self {
            Status::Ready => -1,
            Status::Halted => 0,
            Status::Faulted(fault) => fault.kind.code(),
        }
    }
}

enum Flow {
    Next,
    Jump(usize),
    Halt,
}

pub struct VM<W: Write = Stdout> {
    program: Program,
    registers: RegisterFile,
    frames: FrameStack,
    mailbox: Mailbox,
    heap: Heap,
    ip: usize,
    config: VmConfig,
    status: Status,
    output: W,
}

impl VM<Stdout> {
    pub fn new(config: VmConfig) -> Self {
        Self::with_output(config, std::io::stdout())
    }
}

impl<W: Write> VM<W> {
    /// Builds a VM whose PUTINT output goes to `output`. Each PUTINT writes the
    /// value in decimal followed by a newline, not a bare number.
    pub fn with_output(config: VmConfig, output: W) -> Self {
        Self {
            program: Program::default(),
            registers: RegisterFile::new(),
            frames: FrameStack::new(),
            mailbox: Mailbox::new(),
            heap: Heap::new(config.heap_capacity),
            ip: 0,
            config,
            status: Status::Ready,
            output,
        }
    }

    pub fn load(&mut self, program: Program) {
        self.program = program;
    }

    /// Executes from `entry` until HALT or the first fault.
    pub fn run(&mut self, entry: usize) -> Result<(), Fault> {
        self.ip = entry;
        self.status = Status::Ready;

        loop {
            match self.dispatch_instruction() {
                Ok(true) => {
                    info!(ip = self.ip, "halted");
                    self.status = Status::Halted;
                    return Ok(());
                }
                Ok(false) => {}
                Err(kind) => {
                    let fault = Fault::new(kind, self.ip);

                    warn!(%fault, "execution faulted");
                    self.status = Status::Faulted(fault.clone());
                    return Err(fault);
                }
            }
        }
    }

    /// Executes the instruction at ip. Returns `true` on HALT.
    ///
    /// Every check happens before the first mutation, so a fault leaves the
    /// machine exactly as it was before the instruction and ip still points
    /// at it.
    pub fn step(&mut self) -> Result<bool, FaultKind> {
        self.dispatch_instruction()
    }

    fn dispatch_instruction(&mut self) -> Result<bool, FaultKind> {
        let instr = Instruction::decode(self.program.words(), self.ip)?;

        trace!(ip = self.ip, %instr, "dispatch");

        match self.execute(instr)? {
            Flow::Next => self.ip += instr.word_len(),
            Flow::Jump(addr) => self.ip = addr,
            Flow::Halt => return Ok(true),
        }

        Ok(false)
    }

    fn execute(&mut self, instr: Instruction) -> Result<Flow, FaultKind> {
        match instr {
            Instruction::Halt => return Ok(Flow::Halt),
            Instruction::Add { lhs, rhs, dest } => {
                self.add(lhs, rhs, dest)?;
            }
            Instruction::AddLocal { lhs, rhs, dest } => {
                let sum = self.add(lhs, rhs, dest)?;

                self.snapshot(dest, sum);
            }
            Instruction::Set { dest, val } => {
                self.registers.set(dest, Value::Int(val))?;
            }
            Instruction::SetLocal { dest, val } => {
                self.registers.set(dest, Value::Int(val))?;
                self.snapshot(dest, Value::Int(val));
            }
            Instruction::Store { src } => {
                let val = self.registers.get(src)?;

                self.mailbox.push(val);
            }
            Instruction::Load { dest } => {
                RegisterFile::check(dest)?;
                let val = self.mailbox.pop()?;

                self.registers.set(dest, val)?;
                self.snapshot(dest, val);
            }
            Instruction::PutInt { src } => {
                let val = self.registers.get_int(src)?;

                writeln!(self.output, "{val}").map_err(|e| FaultKind::Output {
                    message: e.to_string(),
                })?;
            }
            Instruction::Call { addr } => return self.call(addr as usize),
            Instruction::Send => return self.send(),
            Instruction::Cast { reg, tag } => {
                let val = cast(self.registers.get(reg)?, tag)?;

                self.registers.set(reg, val)?;
            }
            Instruction::New { dest, props, methods } => {
                RegisterFile::check(dest)?;
                let obj = self
                    .heap
                    .alloc(Object::new(props as usize, methods as usize))?;

                self.registers.set(dest, Value::Ref(obj))?;
            }
            Instruction::SetProp { obj, idx, val, tag } => {
                let obj = self.registers.get(obj)?.as_object()?;
                let val = TypeTag::try_from(tag)?.from_literal(val);

                self.heap.get_mut(obj)?.set_prop(idx as usize, val)?;
            }
            Instruction::Prop { obj, dest, idx, tag } => {
                let obj = self.registers.get(obj)?.as_object()?;
                RegisterFile::check(dest)?;
                let tag = TypeTag::try_from(tag)?;
                let val = tag.cast(self.heap.get(obj)?.prop(idx as usize)?)?;

                self.registers.set(dest, val)?;
                self.snapshot(dest, val);
            }
        }

        Ok(Flow::Next)
    }

    fn add(&mut self, lhs: Reg, rhs: Reg, dest: Reg) -> Result<Value, FaultKind> {
        let lhs = self.registers.get_int(lhs)?;
        let rhs = self.registers.get_int(rhs)?;
        let sum = Value::Int(lhs.wrapping_add(rhs));

        self.registers.set(dest, sum)?;

        Ok(sum)
    }

    // callers have already range checked `reg`
    fn snapshot(&mut self, reg: Reg, val: Value) {
        self.frames.snapshot(reg as usize, val);
    }

    /// Checks that `addr` lies inside the loaded program.
    fn check_address(&self, addr: usize) -> Result<usize, FaultKind> {
        if addr < self.program.len() {
            Ok(addr)
        } else {
            Err(FaultKind::OperandOutOfRange {
                operand: "address",
                index: addr,
                limit: self.program.len(),
            })
        }
    }

    fn call(&mut self, addr: usize) -> Result<Flow, FaultKind> {
        let addr = self.check_address(addr)?;
        let limit = self.config.max_call_depth;

        if self.frames.depth() >= limit {
            return Err(FaultKind::CallDepthExceeded { limit });
        }

        let resume = self.ip + 2;
        let resume = u16::try_from(resume).map_err(|_| FaultKind::OperandOutOfRange {
            operand: "return address",
            index: resume,
            limit: u16::MAX as usize + 1,
        })?;

        self.mailbox.push(Value::Int(resume));
        self.frames.enter();
        debug!(from = self.ip, to = addr, depth = self.frames.depth(), "call");

        Ok(Flow::Jump(addr))
    }

    fn send(&mut self) -> Result<Flow, FaultKind> {
        let front = *self.mailbox.front().ok_or(FaultKind::MailboxUnderflow)?;

        if self.frames.depth() == 0 {
            return Err(FaultKind::ReturnWithoutCall);
        }

        let resume = self.check_address(front.as_int()? as usize)?;

        self.mailbox.pop()?;
        self.frames.leave(&mut self.registers);
        debug!(from = self.ip, to = resume, depth = self.frames.depth(), "send");

        Ok(Flow::Jump(resume))
    }

    /// Destroys a heap object. There is no instruction for this; the host
    /// decides when an object is dead.
    pub fn destroy(&mut self, obj: ObjectRef) -> Result<Object, FaultKind> {
        self.heap.free(obj)
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub fn dump(&self) -> Dump {
        Dump::capture(self)
    }
}
