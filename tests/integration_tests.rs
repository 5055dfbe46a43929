mod common;

use cminus::analyzer::{
    analyze, Analysis, ErrorKind, LookupMode, SemanticError, SymbolKind, Ty, TypeChecker,
};
use cminus::config::Config;
use cminus::error::CompileError;
use cminus::lexer::Lexer;
use cminus::parser::*;

fn generate_ast(input: &str) -> Program {
    common::init_logger();
    let tokens = Lexer::tokenize(input).unwrap();
    Parser::new(tokens).parse().unwrap()
}

fn analyze_str(input: &str) -> Result<Analysis, SemanticError> {
    analyze(&generate_ast(input), &Config::default())
}

fn semantic_error(input: &str) -> SemanticError {
    analyze_str(input).unwrap_err()
}

fn main_body(program: &Program) -> &CompoundStmt {
    let last = program.decls.last().unwrap();
    let DeclarationKind::Function { body, .. } = &last.kind else {
        panic!("last declaration is not a function");
    };
    body
}

fn assign_target(stmt: &Stmt) -> &Expr {
    let Stmt::Assign { target, .. } = stmt else {
        panic!("not an assignment: {:?}", stmt);
    };
    target
}

#[test]
fn global_assignment_resolves_to_gp_offset() {
    let analysis = analyze_str("int x; void main(void){ x = 1 + 2 * 3; }").unwrap();
    let (offset, x) = analysis
        .symbol_table
        .lookup("x", LookupMode::Full)
        .unwrap();
    assert_eq!(offset, 0);
    assert!(x.is_global);
    assert_eq!(x.kind, SymbolKind::Variable);
}

#[test]
fn too_few_arguments() {
    let err = semantic_error("int f(int a, int b){ return a; } void main(void){ f(1); }");
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
    assert!(err.message.contains("too few parameters"), "{}", err);
}

#[test]
fn too_many_arguments() {
    let err = semantic_error("int f(int a){ return a; } void main(void){ f(1, 2); }");
    assert_eq!(err.kind, ErrorKind::ArityMismatch);
    assert!(err.message.contains("too many parameters"), "{}", err);
}

#[test]
fn int_function_without_return() {
    let err = semantic_error("int g(void){ }");
    assert_eq!(err.kind, ErrorKind::MissingReturn);
    assert_eq!(err.line, 1);
}

#[test]
fn bare_return_in_int_function() {
    let err = semantic_error("int g(void){ if (1) return; return 1; } void main(void){ }");
    assert_eq!(err.kind, ErrorKind::MissingReturn);
}

#[test]
fn void_subscript_is_rejected() {
    let input = "void f(void){ }
void main(void){
    int x[3];
    x[f()];
}";
    let err = semantic_error(input);
    assert_eq!(err.kind, ErrorKind::SubscriptTypeError);
    assert_eq!(err.line, 4);
}

#[test]
fn main_before_helper_is_rejected() {
    let err = semantic_error("void main(void){ } int helper(void){ return 1; }");
    assert_eq!(err.kind, ErrorKind::MainPlacementError);
}

#[test]
fn gcd_program_is_well_typed() {
    let analysis = analyze_str(include_str!("programs/gcd.cm")).unwrap();
    let (_, gcdb) = analysis
        .symbol_table
        .lookup("gcdb", LookupMode::Full)
        .unwrap();
    assert_eq!(gcdb.params, vec![Ty::Integer, Ty::Integer]);
    assert_eq!(gcdb.return_type(), Some(Ty::Integer));
}

#[test]
fn program_without_main() {
    let err = semantic_error("int x;");
    assert_eq!(err.kind, ErrorKind::MainPlacementError);
}

#[test]
fn main_signature() {
    assert_eq!(
        semantic_error("int main(void){ return 0; }").kind,
        ErrorKind::MainSignatureError
    );
    assert_eq!(
        semantic_error("void main(int a){ }").kind,
        ErrorKind::MainSignatureError
    );
}

#[test]
fn error_display() {
    let err = semantic_error("void main(void){\n  y = 1;\n}");
    assert_eq!(err.kind, ErrorKind::UndeclaredIdentifier);
    assert_eq!(err.to_string(), "UndeclaredIdentifier at line 2: 'y' is not declared");
}

#[test]
fn undeclared_function() {
    let err = semantic_error("void main(void){ g(); }");
    assert_eq!(err.kind, ErrorKind::UndeclaredFunction);
}

#[test]
fn duplicate_declaration_reports_first_line() {
    let input = "void main(void){
    int x;
    int x;
}";
    let err = semantic_error(input);
    assert_eq!(err.kind, ErrorKind::DuplicateDeclaration);
    assert_eq!(err.line, 3);
    assert!(err.message.contains("line 2"), "{}", err);
}

#[test]
fn duplicate_search_zone() {
    // Shadowing a global variable is fine.
    assert!(analyze_str("int x; void main(void){ int x; x = 1; }").is_ok());
    // Functions stay visible from every scope.
    assert_eq!(
        semantic_error("void f(void){ } void main(void){ int f; }").kind,
        ErrorKind::DuplicateDeclaration
    );
    assert_eq!(
        semantic_error("int f(int f){ return 1; } void main(void){ }").kind,
        ErrorKind::DuplicateDeclaration
    );
}

#[test]
fn void_variables_are_rejected() {
    assert_eq!(
        semantic_error("void x; void main(void){ }").kind,
        ErrorKind::NonIntegerDeclaration
    );
    assert_eq!(
        semantic_error("void f(void a){ } void main(void){ }").kind,
        ErrorKind::NonIntegerDeclaration
    );
}

#[test]
fn subscripting_a_scalar() {
    let err = semantic_error("int x; void main(void){ x[0] = 1; }");
    assert_eq!(err.kind, ErrorKind::NotArray);
}

#[test]
fn calling_a_variable() {
    let err = semantic_error("int x; void main(void){ x(); }");
    assert_eq!(err.kind, ErrorKind::NotAFunction);
}

#[test]
fn function_used_as_variable() {
    let err = semantic_error("void f(void){ } void main(void){ int y; y = f; }");
    assert_eq!(err.kind, ErrorKind::NotAVariable);
}

#[test]
fn void_operand() {
    let err = semantic_error("void f(void){ } void main(void){ int y; y = f() + 1; }");
    assert_eq!(err.kind, ErrorKind::OperandTypeError);
}

#[test]
fn assignment_types() {
    assert_eq!(
        semantic_error("void f(void){ } void main(void){ int y; y = f(); }").kind,
        ErrorKind::AssignmentTypeError
    );
    assert_eq!(
        semantic_error("void main(void){ int a[2]; a = 1; }").kind,
        ErrorKind::AssignmentTypeError
    );
}

#[test]
fn void_condition() {
    let err = semantic_error("void f(void){ } void main(void){ while (f()) ; }");
    assert_eq!(err.kind, ErrorKind::ConditionTypeError);
}

#[test]
fn array_arguments() {
    let ok = "int sum(int a[], int n){ return a[n]; }
void main(void){ int v[4]; output(sum(v, 3)); }";
    assert!(analyze_str(ok).is_ok());

    assert_eq!(
        semantic_error("int sum(int a[]){ return a[0]; } void main(void){ sum(1); }").kind,
        ErrorKind::ArgumentTypeMismatch
    );
    assert_eq!(
        semantic_error("int id(int a){ return a; } void main(void){ int v[2]; id(v); }").kind,
        ErrorKind::ArgumentTypeMismatch
    );
}

#[test]
fn returning_an_array() {
    let err = semantic_error("int f(int a[]){ return a; } void main(void){ }");
    assert_eq!(err.kind, ErrorKind::OperandTypeError);
}

#[test]
fn value_returned_from_void_function() {
    let err = semantic_error("void f(void){ return 1; } void main(void){ }");
    assert_eq!(err.kind, ErrorKind::UnexpectedReturn);
}

#[test]
fn input_needs_a_variable() {
    assert!(analyze_str("void main(void){ int a[2]; input(a[1]); }").is_ok());
    assert_eq!(
        semantic_error("void main(void){ input(1 + 2); }").kind,
        ErrorKind::ArgumentTypeMismatch
    );
    assert_eq!(
        semantic_error("void main(void){ output(1, 2); }").kind,
        ErrorKind::ArityMismatch
    );
}

#[test]
fn builtins_are_declared_on_first_use() {
    let analysis = analyze_str("void main(void){ output(1); }").unwrap();
    let (_, output) = analysis
        .symbol_table
        .lookup("output", LookupMode::Full)
        .unwrap();
    assert_eq!(output.kind, SymbolKind::Function);
    assert_eq!(output.params, vec![Ty::Integer]);
    assert!(analysis
        .symbol_table
        .lookup("input", LookupMode::Full)
        .is_none());
}

#[test]
fn too_many_parameters() {
    let err = semantic_error(
        "int f(int a, int b, int c, int d, int e){ return a; } void main(void){ }",
    );
    assert_eq!(err.kind, ErrorKind::TooManyParameters);
}

#[test]
fn inner_declaration_shadows_outer() {
    let program = generate_ast(
        "void main(void){
    int x;
    x = 1;
    {
        int x;
        x = 2;
    }
    x = 3;
}",
    );
    let analysis = analyze(&program, &Config::default()).unwrap();
    let annotations = &analysis.annotations;

    let body = main_body(&program);
    let Stmt::Compound(inner) = &body.stmts[1] else {
        panic!();
    };
    let outer_x = annotations.symbol(body.decls[0].id).unwrap();
    let inner_x = annotations.symbol(inner.decls[0].id).unwrap();

    assert_ne!(outer_x, inner_x);
    assert_ne!(
        analysis.symbol_table.get(outer_x).offset(),
        analysis.symbol_table.get(inner_x).offset()
    );
    assert_eq!(
        annotations.symbol(assign_target(&body.stmts[0]).id),
        Some(outer_x)
    );
    assert_eq!(
        annotations.symbol(assign_target(&inner.stmts[0]).id),
        Some(inner_x)
    );
    assert_eq!(
        annotations.symbol(assign_target(&body.stmts[2]).id),
        Some(outer_x)
    );
    assert_eq!(analysis.symbol_table.get(outer_x).lines(), &[2, 3, 8]);
}

#[test]
fn frame_layout() {
    let program = generate_ast(
        "int f(int a, int b[], int c){
    int x;
    int arr[3];
    { int y; y = 1; }
    { int z; z = 2; }
    return x;
}
void main(void){ }",
    );
    let analysis = analyze(&program, &Config::default()).unwrap();
    let table = &analysis.symbol_table;
    let offset_of = |decl: &Declaration| {
        table
            .get(analysis.annotations.symbol(decl.id).unwrap())
            .offset()
    };

    let f = &program.decls[0];
    let DeclarationKind::Function { params, body } = &f.kind else {
        panic!();
    };
    let params: Vec<_> = params.iter().map(offset_of).collect();
    assert_eq!(params, vec![0, 4, 8]);

    let mut locals: Vec<_> = body.decls.iter().map(offset_of).collect();
    for stmt in body.stmts.iter() {
        if let Stmt::Compound(block) = stmt {
            locals.extend(block.decls.iter().map(offset_of));
        }
    }
    // x, arr (3 words, base at its lowest slot), y, z
    assert_eq!(locals, vec![-4, -16, -20, -24]);
    assert!(locals.windows(2).all(|w| w[0] > w[1]));

    let f = table
        .get(analysis.annotations.symbol(f.id).unwrap())
        .frame
        .unwrap();
    assert_eq!(f.params_size, 12);
    assert_eq!(f.locals_size, 24);
    assert_eq!(f.size(), 44);
}

#[test]
fn global_offsets_are_monotonic() {
    let program = generate_ast("int a; int b[3]; int c; int d[2]; void main(void){ }");
    let analysis = analyze(&program, &Config::default()).unwrap();

    let symbols: Vec<_> = program.decls[..4]
        .iter()
        .map(|d| {
            analysis
                .symbol_table
                .get(analysis.annotations.symbol(d.id).unwrap())
        })
        .collect();
    let offsets: Vec<_> = symbols.iter().map(|s| s.offset()).collect();
    assert_eq!(offsets, vec![0, 4, 16, 20]);
    for pair in symbols.windows(2) {
        assert_eq!(pair[0].offset() + pair[0].size().unwrap(), pair[1].offset());
    }
    assert!(symbols.iter().all(|s| s.is_global));
}

#[test]
fn oversized_arrays_are_rejected() {
    let config = Config::default();
    for input in [
        "int a[1000000000]; void main(void){ }",
        "void main(void){ int a[1000000000]; a[0] = 1; }",
        "int a[100000000]; int b[100000000]; void main(void){ }",
        "void main(void){ int a[100000000]; { int b[100000000]; } }",
    ] {
        match cminus::compile(input, &config) {
            Err(CompileError::Semantic(err)) => {
                assert_eq!(err.kind, ErrorKind::StorageOverflow, "{}", input)
            }
            other => panic!("{}: expected a storage error, got {:?}", input, other.err()),
        }
    }

    let largest = "int a[100000000]; void main(void){ int b[100000000]; b[0] = 1; }";
    assert!(analyze_str(largest).is_ok());
}

#[test]
fn type_checking_is_idempotent() {
    let program = generate_ast(include_str!("programs/gcd.cm"));
    let mut analysis = analyze(&program, &Config::default()).unwrap();
    let first = analysis.annotations.clone();

    TypeChecker::new(&mut analysis.symbol_table, &mut analysis.annotations)
        .check_program(&program)
        .unwrap();
    assert_eq!(first, analysis.annotations);
    assert!(!first.types().is_empty());
}

#[test]
fn expression_types_are_annotated() {
    let program = generate_ast("int v[2]; void main(void){ v[0] = 1 < 2; output(v[0]); }");
    let analysis = analyze(&program, &Config::default()).unwrap();
    let body = main_body(&program);

    let target = assign_target(&body.stmts[0]);
    assert_eq!(analysis.annotations.ty(target.id), Some(Ty::Integer));
    let Stmt::Expr(Some(call)) = &body.stmts[1] else {
        panic!();
    };
    assert_eq!(analysis.annotations.ty(call.id), Some(Ty::Void));
}

#[test]
fn trace_dumps_every_scope() {
    let config = Config {
        trace_analyze: true,
        ..Config::default()
    };
    let program = generate_ast("int g; void main(void){ int x; { int y; y = g; } }");
    let analysis = analyze(&program, &config).unwrap();

    assert!(analysis.trace.contains("Leaving block scope (depth 2)"));
    assert!(analysis
        .trace
        .contains("Leaving function 'main' scope (depth 1)"));
    assert!(analysis.trace.contains("Leaving global scope (depth 0)"));
    assert!(analysis.trace.contains("LineNumbers"));

    let quiet = analyze(&program, &Config::default()).unwrap();
    assert!(quiet.trace.is_empty());
}

#[test]
fn stage_errors_surface_through_compile() {
    let config = Config::default();
    assert!(matches!(
        cminus::compile("void main(void){ x = 1 @ 2; }", &config),
        Err(CompileError::Lex(_))
    ));
    assert!(matches!(
        cminus::compile("void main(void){ x = ; }", &config),
        Err(CompileError::Parse(_))
    ));
    assert!(matches!(
        cminus::compile("void main(void){ x = 1; }", &config),
        Err(CompileError::Semantic(SemanticError {
            kind: ErrorKind::UndeclaredIdentifier,
            ..
        }))
    ));
}
