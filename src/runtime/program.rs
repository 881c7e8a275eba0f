use std::collections::HashMap;
use std::fmt::Display;

use super::bytecode::{Instruction, Opcode, Word};
use super::constants::{MAX_PROGRAM_LEN, TYPE_INT};
use super::error::LoadError;

const DEMO_SOURCE: &str = include_str!("demo.ivm");

/// An immutable flat sequence of 16 bit words. Addresses are absolute
/// offsets into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    code: Vec<Word>,
}

impl Program {
    pub fn new(code: Vec<Word>) -> Result<Self, LoadError> {
        if code.len() > MAX_PROGRAM_LEN {
            return Err(LoadError::ProgramTooLarge {
                len: code.len(),
                limit: MAX_PROGRAM_LEN,
            });
        }

        Ok(Self { code })
    }

    pub fn from_instructions(instrs: &[Instruction]) -> Result<Self, LoadError> {
        let mut code = vec![];

        for instr in instrs.iter() {
            instr.encode(&mut code);
        }

        Self::new(code)
    }

    /// The program shipped with the interpreter: two arguments are passed to
    /// an adding callee, the result printed, then an object property is
    /// written and read back.
    pub fn demo() -> Result<Self, LoadError> {
        Self::assemble(DEMO_SOURCE)
    }

    pub fn words(&self) -> &[Word] {
        &self.code
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Builds a program from assembly text.
    ///
    /// One instruction per line: a mnemonic followed by its operands, which may
    /// be separated by spaces or commas. Registers may be written `r3` or `3`,
    /// type tags `INT` or `0`. `name:` defines a label that a CALL may use
    /// in place of its address. A line starting with a number is copied
    /// word for word. `;` starts a comment.
    pub fn assemble(source: &str) -> Result<Self, LoadError> {
        let lines = parse_lines(source)?;
        let mut labels: HashMap<&str, usize> = HashMap::new();
        let mut offset = 0;

        for line in lines.iter() {
            for label in line.labels.iter() {
                if labels.insert(*label, offset).is_some() {
                    return Err(LoadError::DuplicateLabel {
                        line: line.line_no,
                        label: label.to_string(),
                    });
                }
            }

            offset += line.body.word_len();
        }

        let mut code = vec![];

        for line in lines.iter() {
            match &line.body {
                Body::Empty => {}
                Body::Raw(tokens) => {
                    for tok in tokens.iter() {
                        code.push(parse_word(tok, line.line_no)?);
                    }
                }
                Body::Instr { opcode, operands } => {
                    code.push(*opcode as Word);

                    for (i, tok) in operands.iter().enumerate() {
                        let is_address = opcode.address_operand() == Some(i);
                        let word = if opcode.tag_operand() == Some(i) && tok.eq_ignore_ascii_case("INT") {
                            TYPE_INT
                        } else if let Some(addr) = labels.get(tok).filter(|_| is_address) {
                            address_word(*addr, line.line_no, tok)?
                        } else if is_identifier(tok) && is_address {
                            return Err(LoadError::UndefinedLabel {
                                line: line.line_no,
                                label: tok.to_string(),
                            });
                        } else {
                            parse_operand(tok, line.line_no)?
                        };

                        code.push(word);
                    }
                }
            }
        }

        Self::new(code)
    }

    /// Decodes the program into `(address, instruction)` pairs, stopping at
    /// the first word that does not decode.
    pub fn instructions(&self) -> (Vec<(usize, Instruction)>, usize) {
        let mut ip = 0;
        let mut result = vec![];

        while let Ok(instr) = Instruction::decode(&self.code, ip) {
            result.push((ip, instr));
            ip += instr.word_len();
        }

        (result, ip)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (instrs, end) = self.instructions();

        for (addr, instr) in instrs.iter() {
            writeln!(f, "{addr:>5}  {instr}")?;
        }

        for (i, word) in self.code[end..].iter().enumerate() {
            writeln!(f, "{:>5}  .word   {word}", end + i)?;
        }

        Ok(())
    }
}

struct Line<'a> {
    line_no: usize,
    labels: Vec<&'a str>,
    body: Body<'a>,
}

enum Body<'a> {
    Empty,
    Raw(Vec<&'a str>),
    Instr {
        opcode: Opcode,
        operands: Vec<&'a str>,
    },
}

impl Body<'_> {
    fn word_len(&self) -> usize {
        match self {
            Body::Empty => 0,
            Body::Raw(tokens) => tokens.len(),
            Body::Instr { opcode, .. } => 1 + opcode.operand_count(),
        }
    }
}

fn parse_lines(source: &str) -> Result<Vec<Line<'_>>, LoadError> {
    let mut lines = vec![];

    for (i, raw) in source.lines().enumerate() {
        let line_no = i + 1;
        let text = raw.split(';').next().unwrap_or("");
        let mut tokens: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();
        let mut labels = vec![];

        while let Some(label) = tokens.first().copied().and_then(|t| t.strip_suffix(':')) {
            if !is_identifier(label) {
                return Err(LoadError::InvalidWord {
                    line: line_no,
                    token: tokens[0].to_string(),
                });
            }

            labels.push(label);
            tokens.remove(0);
        }

        let body = match tokens.first().copied() {
            None => Body::Empty,
            Some(first) if first.starts_with(|c: char| c.is_ascii_digit()) => Body::Raw(tokens),
            Some(first) => {
                let opcode = Opcode::from_mnemonic(first).ok_or(LoadError::UnknownMnemonic {
                    line: line_no,
                    token: first.to_string(),
                })?;
                let operands = tokens.split_off(1);

                if operands.len() != opcode.operand_count() {
                    return Err(LoadError::ArityMismatch {
                        line: line_no,
                        mnemonic: opcode.mnemonic(),
                        expected: opcode.operand_count(),
                        actual: operands.len(),
                    });
                }

                Body::Instr { opcode, operands }
            }
        };

        lines.push(Line {
            line_no,
            labels,
            body,
        });
    }

    Ok(lines)
}

fn is_identifier(tok: &str) -> bool {
    tok.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && tok.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_word(tok: &str, line: usize) -> Result<Word, LoadError> {
    tok.parse::<Word>().map_err(|_| LoadError::InvalidWord {
        line,
        token: tok.to_string(),
    })
}

fn parse_operand(tok: &str, line: usize) -> Result<Word, LoadError> {
    let digits = tok
        .strip_prefix('r')
        .or_else(|| tok.strip_prefix('R'))
        .unwrap_or(tok);

    parse_word(digits, line).map_err(|_| LoadError::InvalidWord {
        line,
        token: tok.to_string(),
    })
}

fn address_word(addr: usize, line: usize, tok: &str) -> Result<Word, LoadError> {
    Word::try_from(addr).map_err(|_| LoadError::InvalidWord {
        line,
        token: tok.to_string(),
    })
}
