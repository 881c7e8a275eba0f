use std::fmt::Display;

use super::error::FaultKind;

pub type Word = u16;
pub type Reg = u16;
pub type Addr = u16;
pub type Tag = u16;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum Opcode {
    Halt = 0,
    Add,
    AddLocal,
    Set,
    SetLocal,
    Store,
    Load,
    PutInt,
    Call,
    Send,
    Cast,
    New,
    SetProp,
    Prop,
}

impl Opcode {
    pub const ALL: [Opcode; 14] = [
        Opcode::Halt,
        Opcode::Add,
        Opcode::AddLocal,
        Opcode::Set,
        Opcode::SetLocal,
        Opcode::Store,
        Opcode::Load,
        Opcode::PutInt,
        Opcode::Call,
        Opcode::Send,
        Opcode::Cast,
        Opcode::New,
        Opcode::SetProp,
        Opcode::Prop,
    ];

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Halt => "HALT",
            Opcode::Add => "ADD",
            Opcode::AddLocal => "ADDL",
            Opcode::Set => "SET",
            Opcode::SetLocal => "SETL",
            Opcode::Store => "STORE",
            Opcode::Load => "LOAD",
            Opcode::PutInt => "PUTINT",
            Opcode::Call => "CALL",
            Opcode::Send => "SEND",
            Opcode::Cast => "CAST",
            Opcode::New => "NEW",
            Opcode::SetProp => "SETPROP",
            Opcode::Prop => "PROP",
        }
    }

    pub fn from_mnemonic(name: &str) -> Option<Opcode> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(name))
    }

    /// Number of operand words following the opcode word.
    pub fn operand_count(&self) -> usize {
        match self {
            Opcode::Halt | Opcode::Send => 0,
            Opcode::Store | Opcode::Load | Opcode::PutInt | Opcode::Call => 1,
            Opcode::Set | Opcode::SetLocal | Opcode::Cast => 2,
            Opcode::Add | Opcode::AddLocal | Opcode::New => 3,
            Opcode::SetProp | Opcode::Prop => 4,
        }
    }

    /// Index of the operand that holds an instruction address, if any.
    pub fn address_operand(&self) -> Option<usize> {
        match self {
            Opcode::Call => Some(0),
            _ => None,
        }
    }

    /// Index of the operand that holds a type tag, if any.
    pub fn tag_operand(&self) -> Option<usize> {
        match self {
            Opcode::Cast => Some(1),
            Opcode::SetProp | Opcode::Prop => Some(3),
            _ => None,
        }
    }
}

impl TryFrom<Word> for Opcode {
    type Error = FaultKind;

    fn try_from(word: Word) -> Result<Self, Self::Error> {
        Self::ALL
            .get(word as usize)
            .copied()
            .ok_or(FaultKind::InvalidOpcode { opcode: word })
    }
}

/// A decoded instruction. Field names follow the operand order on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction {
    Halt,
    Add { lhs: Reg, rhs: Reg, dest: Reg },
    AddLocal { lhs: Reg, rhs: Reg, dest: Reg },
    Set { dest: Reg, val: Word },
    SetLocal { dest: Reg, val: Word },
    Store { src: Reg },
    Load { dest: Reg },
    PutInt { src: Reg },
    Call { addr: Addr },
    Send,
    Cast { reg: Reg, tag: Tag },
    New { dest: Reg, props: Word, methods: Word },
    SetProp { obj: Reg, idx: Word, val: Word, tag: Tag },
    Prop { obj: Reg, dest: Reg, idx: Word, tag: Tag },
}

impl Instruction {
    /// Decodes the instruction starting at `ip`.
    pub fn decode(code: &[Word], ip: usize) -> Result<Self, FaultKind> {
        let word = *code.get(ip).ok_or(FaultKind::UnexpectedEndOfProgram)?;
        let opcode = Opcode::try_from(word)?;
        let end = ip + 1 + opcode.operand_count();
        let ops = code
            .get(ip + 1..end)
            .ok_or(FaultKind::UnexpectedEndOfProgram)?;

        Ok(match opcode {
            Opcode::Halt => Instruction::Halt,
            Opcode::Add => Instruction::Add { lhs: ops[0], rhs: ops[1], dest: ops[2] },
            Opcode::AddLocal => Instruction::AddLocal { lhs: ops[0], rhs: ops[1], dest: ops[2] },
            Opcode::Set => Instruction::Set { dest: ops[0], val: ops[1] },
            Opcode::SetLocal => Instruction::SetLocal { dest: ops[0], val: ops[1] },
            Opcode::Store => Instruction::Store { src: ops[0] },
            Opcode::Load => Instruction::Load { dest: ops[0] },
            Opcode::PutInt => Instruction::PutInt { src: ops[0] },
            Opcode::Call => Instruction::Call { addr: ops[0] },
            Opcode::Send => Instruction::Send,
            Opcode::Cast => Instruction::Cast { reg: ops[0], tag: ops[1] },
            Opcode::New => Instruction::New { dest: ops[0], props: ops[1], methods: ops[2] },
            Opcode::SetProp => Instruction::SetProp { obj: ops[0], idx: ops[1], val: ops[2], tag: ops[3] },
            Opcode::Prop => Instruction::Prop { obj: ops[0], dest: ops[1], idx: ops[2], tag: ops[3] },
        })
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Halt => Opcode::Halt,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::AddLocal { .. } => Opcode::AddLocal,
            Instruction::Set { .. } => Opcode::Set,
            Instruction::SetLocal { .. } => Opcode::SetLocal,
            Instruction::Store { .. } => Opcode::Store,
            Instruction::Load { .. } => Opcode::Load,
            Instruction::PutInt { .. } => Opcode::PutInt,
            Instruction::Call { .. } => Opcode::Call,
            Instruction::Send => Opcode::Send,
            Instruction::Cast { .. } => Opcode::Cast,
            Instruction::New { .. } => Opcode::New,
            Instruction::SetProp { .. } => Opcode::SetProp,
            Instruction::Prop { .. } => Opcode::Prop,
        }
    }

    /// Total words occupied, opcode included.
    pub fn word_len(&self) -> usize {
        1 + self.opcode().operand_count()
    }

    pub fn operands(&self) -> Vec<Word> {
        match *self {
            Instruction::Halt | Instruction::Send => vec![],
            Instruction::Add { lhs, rhs, dest } | Instruction::AddLocal { lhs, rhs, dest } => {
                vec![lhs, rhs, dest]
            }
            Instruction::Set { dest, val } | Instruction::SetLocal { dest, val } => vec![dest, val],
            Instruction::Store { src } | Instruction::PutInt { src } => vec![src],
            Instruction::Load { dest } => vec![dest],
            Instruction::Call { addr } => vec![addr],
            Instruction::Cast { reg, tag } => vec![reg, tag],
            Instruction::New { dest, props, methods } => vec![dest, props, methods],
            Instruction::SetProp { obj, idx, val, tag } => vec![obj, idx, val, tag],
            Instruction::Prop { obj, dest, idx, tag } => vec![obj, dest, idx, tag],
        }
    }

    pub fn encode(&self, out: &mut Vec<Word>) {
        out.push(self.opcode() as Word);
        out.extend(self.operands());
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Halt =>                               write!(f, "HALT"),
            Instruction::Add { lhs, rhs, dest } =>             write!(f, "ADD     r{lhs}, r{rhs}, r{dest}"),
            Instruction::AddLocal { lhs, rhs, dest } =>        write!(f, "ADDL    r{lhs}, r{rhs}, r{dest}"),
            Instruction::Set { dest, val } =>                  write!(f, "SET     r{dest}, {val}"),
            Instruction::SetLocal { dest, val } =>             write!(f, "SETL    r{dest}, {val}"),
            Instruction::Store { src } =>                      write!(f, "STORE   r{src}"),
            Instruction::Load { dest } =>                      write!(f, "LOAD    r{dest}"),
            Instruction::PutInt { src } =>                     write!(f, "PUTINT  r{src}"),
            Instruction::Call { addr } =>                      write!(f, "CALL    {addr}"),
            Instruction::Send =>                               write!(f, "SEND"),
            Instruction::Cast { reg, tag } =>                  write!(f, "CAST    r{reg}, {}", tag_name(*tag)),
            Instruction::New { dest, props, methods } =>       write!(f, "NEW     r{dest}, {props}, {methods}"),
            Instruction::SetProp { obj, idx, val, tag } =>     write!(f, "SETPROP r{obj}, {idx}, {val}, {}", tag_name(*tag)),
            Instruction::Prop { obj, dest, idx, tag } =>       write!(f, "PROP    r{obj}, r{dest}, {idx}, {}", tag_name(*tag)),
        }
    }
}

fn tag_name(tag: Tag) -> String {
    match tag {
        super::constants::TYPE_INT => "INT".to_string(),
        other => other.to_string(),
    }
}
