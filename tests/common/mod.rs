#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use cminus::codegen::{Assembly, Instruction, Line, Register};
use cminus::config::Config;
use cminus::{compile, Compilation};

const STACK_TOP: i32 = 0x7fff_effc;
const DATA_START: i32 = 0x1001_0000;
const STACK_LIMIT: i32 = STACK_TOP - 0x10_0000;
const STEP_LIMIT: usize = 1_000_000;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn compile_ok(source: &str) -> Compilation {
    init_logger();
    match compile(source, &Config::default()) {
        Ok(c) => c,
        Err(e) => panic!("compilation failed: {}", e),
    }
}

/// Runs a program to completion and returns the integers it printed.
pub fn run(source: &str, input: &[i32]) -> Vec<i32> {
    let compilation = compile_ok(source);
    let mut machine = Machine::load(&compilation.assembly, input);
    if let Err(e) = machine.run() {
        panic!("{}\n{}", e, compilation.assembly);
    }
    machine.printed
}

/// Just enough of SPIM to execute what the compiler emits.
pub struct Machine {
    program: Vec<Instruction>,
    labels: HashMap<String, usize>,
    data_labels: HashMap<String, i32>,
    strings: HashMap<i32, String>,
    registers: HashMap<Register, i32>,
    memory: HashMap<i32, i32>,
    input: VecDeque<i32>,
    pc: usize,
    pub text: String,
    pub printed: Vec<i32>,
}

fn unescape(value: &str) -> String {
    value.trim_matches('"').replace("\\n", "\n")
}

impl Machine {
    pub fn load(assembly: &Assembly, input: &[i32]) -> Self {
        let mut program = vec![];
        let mut labels = HashMap::new();
        let mut data_labels = HashMap::new();
        let mut strings = HashMap::new();
        let mut next_data = DATA_START;

        for line in assembly.lines() {
            match line {
                Line::Label(l) => {
                    assert!(
                        labels.insert(l.clone(), program.len()).is_none(),
                        "label {} defined twice",
                        l
                    );
                }
                Line::Inst(i) => program.push(i.clone()),
                Line::Data { label, value, .. } => {
                    let s = unescape(value);
                    let size = (s.len() as i32 + 4) & !3;
                    data_labels.insert(label.clone(), next_data);
                    strings.insert(next_data, s);
                    next_data += size;
                }
                Line::Directive(_) | Line::Comment(_) => (),
            }
        }

        let mut registers = HashMap::new();
        registers.insert(Register::Sp, STACK_TOP);
        let pc = labels["main"];

        Self {
            program,
            labels,
            data_labels,
            strings,
            registers,
            memory: HashMap::new(),
            input: input.iter().copied().collect(),
            pc,
            text: String::new(),
            printed: vec![],
        }
    }

    pub fn register(&self, r: Register) -> i32 {
        self.registers.get(&r).copied().unwrap_or(0)
    }

    fn set(&mut self, r: Register, value: i32) {
        self.registers.insert(r, value);
    }

    fn check_address(address: i32) -> Result<(), String> {
        if address % 4 != 0 {
            return Err(format!("unaligned access to {:#x}", address));
        }
        if address <= STACK_LIMIT || address > STACK_TOP {
            return Err(format!("access outside of the stack at {:#x}", address));
        }
        Ok(())
    }

    fn load_word(&self, address: i32) -> Result<i32, String> {
        Self::check_address(address)?;
        Ok(self.memory.get(&address).copied().unwrap_or(0))
    }

    fn store_word(&mut self, address: i32, value: i32) -> Result<(), String> {
        Self::check_address(address)?;
        self.memory.insert(address, value);
        Ok(())
    }

    fn jump(&mut self, label: &str) -> Result<(), String> {
        self.pc = *self
            .labels
            .get(label)
            .ok_or_else(|| format!("jump to unknown label {}", label))?;
        Ok(())
    }

    pub fn run(&mut self) -> Result<(), String> {
        for _ in 0..STEP_LIMIT {
            if !self.step()? {
                return Ok(());
            }
        }
        Err("step limit exceeded".to_string())
    }

    /// Returns false once the program exits.
    fn step(&mut self) -> Result<bool, String> {
        let inst = self
            .program
            .get(self.pc)
            .cloned()
            .ok_or_else(|| format!("pc {} ran off the program", self.pc))?;
        self.pc += 1;

        match inst {
            Instruction::Li { rd, imm } => self.set(rd, imm),
            Instruction::La { rd, label } => {
                let address = *self
                    .data_labels
                    .get(&label)
                    .ok_or_else(|| format!("unknown data label {}", label))?;
                self.set(rd, address);
            }
            Instruction::Lw { rt, offset, base } => {
                let value = self.load_word(self.register(base).wrapping_add(offset))?;
                self.set(rt, value);
            }
            Instruction::Sw { rt, offset, base } => {
                self.store_word(self.register(base).wrapping_add(offset), self.register(rt))?;
            }
            Instruction::Move { rd, rs } => self.set(rd, self.register(rs)),
            Instruction::Addiu { rt, rs, imm } => self.set(rt, self.register(rs).wrapping_add(imm)),
            Instruction::Addu { rd, rs, rt } => {
                self.set(rd, self.register(rs).wrapping_add(self.register(rt)))
            }
            Instruction::Subu { rd, rs, rt } => {
                self.set(rd, self.register(rs).wrapping_sub(self.register(rt)))
            }
            Instruction::Mul { rd, rs, rt } => {
                self.set(rd, self.register(rs).wrapping_mul(self.register(rt)))
            }
            Instruction::Div { rd, rs, rt } => {
                let divisor = self.register(rt);
                if divisor == 0 {
                    return Err("division by zero".to_string());
                }
                self.set(rd, self.register(rs).wrapping_div(divisor));
            }
            Instruction::Sll { rd, rt, shamt } => {
                self.set(rd, self.register(rt).wrapping_shl(shamt))
            }
            Instruction::Set { cond, rd, rs, rt } => {
                let value = cond.holds(self.register(rs), self.register(rt));
                self.set(rd, value as i32);
            }
            Instruction::Beqz { rs, label } => {
                if self.register(rs) == 0 {
                    self.jump(&label)?;
                }
            }
            Instruction::J { label } => self.jump(&label)?,
            Instruction::Jal { label } => {
                self.set(Register::Ra, self.pc as i32);
                self.jump(&label)?;
            }
            Instruction::Jr { rs } => self.pc = self.register(rs) as usize,
            Instruction::Syscall => match self.register(Register::V0) {
                1 => {
                    let value = self.register(Register::A0);
                    self.text.push_str(&value.to_string());
                    self.printed.push(value);
                }
                4 => {
                    let address = self.register(Register::A0);
                    let s = self
                        .strings
                        .get(&address)
                        .ok_or_else(|| format!("no string at {:#x}", address))?;
                    self.text.push_str(s);
                }
                5 => {
                    let value = self
                        .input
                        .pop_front()
                        .ok_or_else(|| "program read past the end of its input".to_string())?;
                    self.set(Register::V0, value);
                }
                10 => return Ok(false),
                code => return Err(format!("unsupported syscall {}", code)),
            },
        }
        Ok(true)
    }
}
