use std::fmt::{self, Display, Write};

use termion::{color, style};

use super::bytecode::Instruction;
use super::heap::Object;
use super::value::{ObjectRef, Value};
use super::vm::{Status, VM};

const REGISTERS_PER_ROW: usize = 10;

/// A copy of everything observable about a VM, taken after a run for
/// debugging. The text layout is not a stable format.
#[derive(Debug, Clone)]
pub struct Dump {
    pub status: Status,
    pub ip: usize,
    pub depth: usize,
    pub current: Option<Instruction>,
    pub registers: Vec<Value>,
    pub mailbox: Vec<Value>,
    pub frames: Vec<Vec<(usize, Value)>>,
    pub heap_capacity: usize,
    pub heap_live: usize,
    pub objects: Vec<(ObjectRef, Object)>,
}

impl Dump {
    pub fn capture<W: std::io::Write>(vm: &VM<W>) -> Self {
        Self {
            status: vm.status().clone(),
            ip: vm.ip(),
            depth: vm.frames().depth(),
            current: Instruction::decode(vm.program().words(), vm.ip()).ok(),
            registers: vm.registers().as_slice().to_vec(),
            mailbox: vm.mailbox().iter().copied().collect(),
            frames: vm
                .frames()
                .frames()
                .iter()
                .map(|frame| frame.iter().collect())
                .collect(),
            heap_capacity: vm.heap().capacity(),
            heap_live: vm.heap().live(),
            objects: vm
                .heap()
                .objects()
                .map(|(obj, o)| (obj, o.clone()))
                .collect(),
        }
    }

    /// Renders the dump, with terminal colors when `colored` is set.
    pub fn render(&self, colored: bool) -> String {
        if colored {
            format!("{self:#}")
        } else {
            self.to_string()
        }
    }

    fn write(&self, out: &mut impl Write, colored: bool) -> fmt::Result {
        let heading = |out: &mut dyn Write, text: &str| {
            if colored {
                writeln!(out, "{}{}{}{}", style::Bold, color::Fg(color::Cyan), text, style::Reset)
            } else {
                writeln!(out, "{text}")
            }
        };

        let status = match &self.status {
            Status::Ready => "ready".to_string(),
            Status::Halted => "halted".to_string(),
            Status::Faulted(fault) if colored => {
                format!("{}{fault}{}", color::Fg(color::Red), style::Reset)
            }
            Status::Faulted(fault) => fault.to_string(),
        };

        heading(&mut *out, "== state ==")?;
        writeln!(out, "status: {status} (exit code {})", self.status.exit_code())?;
        writeln!(out, "ip: {}  fp: {}", self.ip, self.depth)?;
        match &self.current {
            Some(instr) => writeln!(out, "instruction: {instr}")?,
            None => writeln!(out, "instruction: <none>")?,
        }

        heading(&mut *out, "== registers ==")?;
        for (row, chunk) in self.registers.chunks(REGISTERS_PER_ROW).enumerate() {
            let start = row * REGISTERS_PER_ROW;
            let cells: Vec<String> = chunk.iter().map(|v| format!("{:>5}", v.to_string())).collect();

            writeln!(out, "r{:<2}..r{:<2} {}", start, start + chunk.len() - 1, cells.join(" "))?;
        }

        heading(&mut *out, "== mailbox ==")?;
        let entries: Vec<String> = self.mailbox.iter().map(Value::to_string).collect();
        writeln!(out, "[{}]", entries.join(", "))?;

        heading(&mut *out, "== frames ==")?;
        for (depth, frame) in self.frames.iter().enumerate() {
            let marker = if depth == self.depth { '>' } else { ' ' };
            let locals: Vec<String> = frame.iter().map(|(r, v)| format!("r{r}={v}")).collect();

            writeln!(out, "{marker}#{depth:<3} {}", locals.join(" "))?;
        }

        heading(&mut *out, "== heap ==")?;
        writeln!(out, "live: {}/{}", self.heap_live, self.heap_capacity)?;
        for (obj, object) in self.objects.iter() {
            let props: Vec<String> = object.props().iter().map(Value::to_string).collect();
            let methods: Vec<String> = object.methods().iter().map(u16::to_string).collect();

            writeln!(
                out,
                "{:<5} props [{}] methods [{}]",
                obj.to_string(),
                props.join(", "),
                methods.join(", ")
            )?;
        }

        Ok(())
    }
}

/// `{:#}` adds terminal colors.
impl Display for Dump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, f.alternate())
    }
}
