use crate::analyzer::{Analysis, Annotations, Symbol, SymbolTable};
use crate::config::Config;
use crate::parser::{
    BinOpKind, CompoundStmt, Declaration, DeclarationKind, Expr, ExprKind, NodeId, Program, Stmt,
};

use super::{
    Assembly, CodegenError, CodegenResult, Condition, Emitter, Instruction, Register,
    ARGUMENT_REGISTERS,
};

use Register::{Fp, Gp, Ra, Sp, A0, T0, V0, V1};

const READ_ROUTINE: &str = "RD_INT";
const WRITE_ROUTINE: &str = "WR_INT";

pub fn function_label(name: &str) -> String {
    format!("fn_{}", name)
}

/// Lowers an analyzed program. Every expression leaves its value in `$v0`;
/// addressable ones also leave their address in `$v1`. `$t0` receives the
/// spilled left operand.
pub struct Codegen<'a> {
    symbol_table: &'a SymbolTable,
    annotations: &'a Annotations,
    emitter: Emitter,
    label_index: usize,
    return_label: String,
}

impl<'a> Codegen<'a> {
    pub fn new(analysis: &'a Analysis, config: &Config) -> Self {
        Self {
            symbol_table: &analysis.symbol_table,
            annotations: &analysis.annotations,
            emitter: Emitter::new(config.trace_code),
            label_index: 0,
            return_label: String::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> CodegenResult<Assembly> {
        self.gen_data();

        self.gen_startup(self.symbol_table.globals_size());
        self.gen_runtime();

        for decl in program.decls.iter() {
            if let DeclarationKind::Function { params, body } = &decl.kind {
                self.gen_function(decl, params, body)?;
            }
        }

        Ok(self.emitter.finish())
    }

    fn new_label(&mut self) -> String {
        let s = format!("L{:0>3}", self.label_index);
        self.label_index += 1;
        s
    }

    fn emit(&mut self, inst: Instruction) {
        self.emitter.emit(inst);
    }

    fn symbol(&self, node: NodeId, line: usize) -> CodegenResult<&'a Symbol> {
        let table: &'a SymbolTable = self.symbol_table;
        self.annotations
            .symbol(node)
            .map(|id| table.get(id))
            .ok_or(CodegenError::MissingAnnotation { line })
    }

    fn push(&mut self, rt: Register) {
        self.emit(Instruction::Addiu {
            rt: Sp,
            rs: Sp,
            imm: -4,
        });
        self.emit(Instruction::Sw {
            rt,
            offset: 0,
            base: Sp,
        });
    }

    fn pop(&mut self, rt: Register) {
        self.emit(Instruction::Lw {
            rt,
            offset: 0,
            base: Sp,
        });
        self.emit(Instruction::Addiu {
            rt: Sp,
            rs: Sp,
            imm: 4,
        });
    }

    fn syscall(&mut self, code: i32) {
        self.emit(Instruction::Li { rd: V0, imm: code });
        self.emit(Instruction::Syscall);
    }

    fn gen_data(&mut self) {
        self.emitter.directive(".data");
        self.emitter.data("inStr", ".asciiz", "\"Enter value for input instruction: \"");
        self.emitter.data("outStr", ".asciiz", "\"output instruction prints: \"");
        self.emitter.data("crlfz", ".asciiz", "\"\\n\"");
        self.emitter.directive(".text");
        self.emitter.directive(".globl main");
    }

    /// Reserves the globals below the initial stack pointer, then runs `main`.
    fn gen_startup(&mut self, globals_size: i32) {
        self.emitter.label("main");
        self.emitter.comment(format!("reserve {} bytes of globals", globals_size));
        self.emit(Instruction::Addiu {
            rt: Sp,
            rs: Sp,
            imm: -globals_size,
        });
        self.emit(Instruction::Move { rd: Gp, rs: Sp });
        self.emit(Instruction::Move { rd: Fp, rs: Sp });
        self.emit(Instruction::Jal {
            label: function_label("main"),
        });
        self.syscall(10);
    }

    fn gen_runtime(&mut self) {
        self.emitter.comment("print $a0 as an integer");
        self.emitter.label(WRITE_ROUTINE);
        self.emit(Instruction::Move { rd: T0, rs: A0 });
        self.emit(Instruction::La {
            rd: A0,
            label: "outStr".to_string(),
        });
        self.syscall(4);
        self.emit(Instruction::Move { rd: A0, rs: T0 });
        self.syscall(1);
        self.emit(Instruction::La {
            rd: A0,
            label: "crlfz".to_string(),
        });
        self.syscall(4);
        self.emit(Instruction::Jr { rs: Ra });

        self.emitter.comment("read an integer into $v0");
        self.emitter.label(READ_ROUTINE);
        self.emit(Instruction::La {
            rd: A0,
            label: "inStr".to_string(),
        });
        self.syscall(4);
        self.syscall(5);
        self.emit(Instruction::Jr { rs: Ra });
    }

    fn gen_function(
        &mut self,
        decl: &Declaration,
        params: &[Declaration],
        body: &CompoundStmt,
    ) -> CodegenResult<()> {
        let frame = self
            .symbol(decl.id, decl.line)?
            .frame
            .ok_or(CodegenError::MissingAnnotation { line: decl.line })?;
        if params.len() > ARGUMENT_REGISTERS.len() {
            return Err(CodegenError::TooManyArguments {
                name: decl.name.clone(),
                count: params.len(),
                line: decl.line,
            });
        }
        let size = frame.size();
        let locals = frame.locals_size;
        log::debug!("lowering '{}' with a {} byte frame", decl.name, size);

        let label = function_label(&decl.name);
        self.return_label = format!("{}_ret", label);
        self.emitter.comment(format!(
            "function {}: {} bytes of parameters, {} bytes of locals",
            decl.name, frame.params_size, locals
        ));
        self.emitter.label(label);

        self.emit(Instruction::Addiu {
            rt: Sp,
            rs: Sp,
            imm: -size,
        });
        self.emit(Instruction::Sw {
            rt: Ra,
            offset: size - 4,
            base: Sp,
        });
        self.emit(Instruction::Sw {
            rt: Fp,
            offset: size - 8,
            base: Sp,
        });
        self.emit(Instruction::Addiu {
            rt: Fp,
            rs: Sp,
            imm: locals,
        });
        for (param, reg) in params.iter().zip(ARGUMENT_REGISTERS) {
            let offset = self.symbol(param.id, param.line)?.offset();
            self.emit(Instruction::Sw {
                rt: reg,
                offset,
                base: Fp,
            });
        }

        self.gen_compound_stmt(body)?;

        let return_label = self.return_label.clone();
        self.emitter.label(return_label);
        self.emit(Instruction::Addiu {
            rt: Sp,
            rs: Fp,
            imm: -locals,
        });
        self.emit(Instruction::Lw {
            rt: Ra,
            offset: size - 4,
            base: Sp,
        });
        self.emit(Instruction::Lw {
            rt: Fp,
            offset: size - 8,
            base: Sp,
        });
        self.emit(Instruction::Addiu {
            rt: Sp,
            rs: Sp,
            imm: size,
        });
        self.emit(Instruction::Jr { rs: Ra });
        Ok(())
    }

    fn gen_compound_stmt(&mut self, stmt: &CompoundStmt) -> CodegenResult<()> {
        for s in stmt.stmts.iter() {
            self.gen_stmt(s)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> CodegenResult<()> {
        match stmt {
            Stmt::Expr(None) => Ok(()),
            Stmt::Expr(Some(expr)) => self.gen_expr(expr),
            Stmt::Compound(stmt) => self.gen_compound_stmt(stmt),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => self.gen_if(cond, then_branch, else_branch.as_deref()),
            Stmt::While { cond, body, .. } => self.gen_while(cond, body),
            Stmt::Return { value, .. } => {
                self.emitter.comment("return");
                if let Some(value) = value {
                    self.gen_expr(value)?;
                }
                let label = self.return_label.clone();
                self.emit(Instruction::J { label });
                Ok(())
            }
            Stmt::Assign { target, value, .. } => {
                self.emitter.comment("assign");
                self.gen_address(target)?;
                self.push(V1);
                self.gen_expr(value)?;
                self.pop(T0);
                self.emit(Instruction::Sw {
                    rt: V0,
                    offset: 0,
                    base: T0,
                });
                Ok(())
            }
        }
    }

    fn gen_if(&mut self, cond: &Expr, stmt: &Stmt, else_stmt: Option<&Stmt>) -> CodegenResult<()> {
        let else_label = self.new_label();
        let end_label = self.new_label();

        self.emitter.comment("if");
        self.gen_expr(cond)?;
        self.emit(Instruction::Beqz {
            rs: V0,
            label: else_label.clone(),
        });
        self.gen_stmt(stmt)?;
        match else_stmt {
            Some(else_stmt) => {
                self.emit(Instruction::J {
                    label: end_label.clone(),
                });
                self.emitter.label(else_label);
                self.gen_stmt(else_stmt)?;
                self.emitter.label(end_label);
            }
            None => self.emitter.label(else_label),
        }
        Ok(())
    }

    fn gen_while(&mut self, cond: &Expr, stmt: &Stmt) -> CodegenResult<()> {
        let begin_label = self.new_label();
        let end_label = self.new_label();

        self.emitter.comment("while");
        self.emitter.label(begin_label.clone());
        self.gen_expr(cond)?;
        self.emit(Instruction::Beqz {
            rs: V0,
            label: end_label.clone(),
        });
        self.gen_stmt(stmt)?;
        self.emit(Instruction::J { label: begin_label });
        self.emitter.label(end_label);
        Ok(())
    }

    /// Leaves the address of a variable or array element in `$v1`:
    /// `base + offset + 4 * index`, where an array parameter's base is the
    /// address stored in its slot.
    fn gen_address(&mut self, expr: &Expr) -> CodegenResult<()> {
        let ExprKind::Var { index, .. } = &expr.kind else {
            return Err(CodegenError::NotAddressable { line: expr.line });
        };
        let symbol = self.symbol(expr.id, expr.line)?;

        match index {
            Some(index) => {
                self.gen_expr(index)?;
                self.emit(Instruction::Sll {
                    rd: V0,
                    rt: V0,
                    shamt: 2,
                });
                self.gen_base(symbol, V1);
                self.emit(Instruction::Addu {
                    rd: V1,
                    rs: V1,
                    rt: V0,
                });
            }
            None => self.gen_base(symbol, V1),
        }
        Ok(())
    }

    fn gen_base(&mut self, symbol: &Symbol, rd: Register) {
        let base = if symbol.is_global { Gp } else { Fp };
        if symbol.holds_address() {
            self.emit(Instruction::Lw {
                rt: rd,
                offset: symbol.offset(),
                base,
            });
        } else {
            self.emit(Instruction::Addiu {
                rt: rd,
                rs: base,
                imm: symbol.offset(),
            });
        }
    }

    fn gen_expr(&mut self, expr: &Expr) -> CodegenResult<()> {
        match &expr.kind {
            ExprKind::Num(num) => self.emit(Instruction::Li { rd: V0, imm: *num }),
            ExprKind::Var { index, .. } => {
                let symbol = self.symbol(expr.id, expr.line)?;
                if symbol.is_array && index.is_none() {
                    // A whole array evaluates to its address.
                    self.gen_base(symbol, V0);
                } else {
                    self.gen_address(expr)?;
                    self.emit(Instruction::Lw {
                        rt: V0,
                        offset: 0,
                        base: V1,
                    });
                }
            }
            ExprKind::BinOp(kind, left, right) => {
                self.gen_expr(left)?;
                self.push(V0);
                self.gen_expr(right)?;
                self.pop(T0);
                self.gen_bin_op_kind(*kind);
            }
            ExprKind::Call { name, args } => self.gen_call(expr, name, args)?,
            ExprKind::Read { args } => {
                let arg = args
                    .first()
                    .ok_or(CodegenError::NotAddressable { line: expr.line })?;
                self.emitter.comment("input");
                self.gen_address(arg)?;
                self.push(V1);
                self.emit(Instruction::Jal {
                    label: READ_ROUTINE.to_string(),
                });
                self.pop(T0);
                self.emit(Instruction::Sw {
                    rt: V0,
                    offset: 0,
                    base: T0,
                });
            }
            ExprKind::Write { args } => {
                self.emitter.comment("output");
                for arg in args.iter() {
                    self.gen_expr(arg)?;
                }
                self.emit(Instruction::Move { rd: A0, rs: V0 });
                self.emit(Instruction::Jal {
                    label: WRITE_ROUTINE.to_string(),
                });
            }
        }
        Ok(())
    }

    /// `$v0 = $t0 op $v0`
    fn gen_bin_op_kind(&mut self, kind: BinOpKind) {
        let (rd, rs, rt) = (V0, T0, V0);
        let inst = match Condition::from_binop(kind) {
            Some(cond) => Instruction::Set { cond, rd, rs, rt },
            None => match kind {
                BinOpKind::Add => Instruction::Addu { rd, rs, rt },
                BinOpKind::Sub => Instruction::Subu { rd, rs, rt },
                BinOpKind::Mul => Instruction::Mul { rd, rs, rt },
                _ => Instruction::Div { rd, rs, rt },
            },
        };
        self.emit(inst);
    }

    /// Arguments are spilled as they are computed and only moved into the
    /// argument registers once all of them are known.
    fn gen_call(&mut self, call: &Expr, name: &str, args: &[Expr]) -> CodegenResult<()> {
        if args.len() > ARGUMENT_REGISTERS.len() {
            return Err(CodegenError::TooManyArguments {
                name: name.to_string(),
                count: args.len(),
                line: call.line,
            });
        }

        self.emitter.comment(format!("call {}", name));
        for arg in args.iter() {
            self.gen_expr(arg)?;
            self.push(V0);
        }
        for reg in ARGUMENT_REGISTERS.iter().take(args.len()).rev() {
            self.pop(*reg);
        }
        self.emit(Instruction::Jal {
            label: function_label(name),
        });
        Ok(())
    }
}
