//! Full-pipeline checks: lowering plus compile-time code execution, type
//! inference and validation.

mod common;

use common::*;
use epoch_lang::ast::{Ast, ExpressionOrAssignment, MetaEntity};
use epoch_lang::ir::{IrCodeBlockEntry, TypeId, VariableOrigin};
use epoch_lang::{validate_semantics, CompileSession, ErrorKind, StringPool};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = simple_logger::init();
}

#[test]
fn structure_constructor_populates_the_function_scope() {
    init_logging();
    let mut ast = Ast::new();

    let point = structure(&mut ast, "Point", &[("integer", "x"), ("integer", "y")]);

    let target = ident_expr(&mut ast, "p");
    let one = ident_expr(&mut ast, "1");
    let two = ident_expr(&mut ast, "2");
    let construct = statement_entry(&mut ast, "Point", vec![target, one, two]);
    let body = code_block(&mut ast, vec![construct]);
    let function = simple_function(&mut ast, "f", body);

    let program = program_of(vec![point, function]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "point.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(outcome.errors.is_empty(), "unexpected diagnostics: {}", outcome.errors);
    let ir = outcome.program.expect("all phases pass");

    let point_name = pool.pool("Point");
    assert!(ir.structure(point_name).is_some());
    assert_eq!(ir.structure(point_name).unwrap().members().len(), 2);

    let function = ir.function(pool.pool("f")).expect("f lowered");
    let scope = function.code().expect("body present").scope();
    let variable = scope
        .borrow()
        .find(pool.pool("p"))
        .expect("p added by the constructor helper");
    assert_eq!(variable.ty, TypeId::Structure(point_name));
    assert_eq!(variable.origin, VariableOrigin::Local);
}

#[test]
fn scalar_initialization_and_assignment_validate() {
    init_logging();
    let mut ast = Ast::new();

    let init_value = ident_expr(&mut ast, "0");
    let init = initialization_entry(&mut ast, "integer", "counter", vec![init_value]);

    let new_value = ident_expr(&mut ast, "42");
    let assign = assignment(
        &mut ast,
        &["counter"],
        "=",
        ExpressionOrAssignment::Expression(new_value),
    );
    let assign_entry = assignment_entry(&mut ast, assign);

    let body = code_block(&mut ast, vec![init, assign_entry]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "counter.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(outcome.errors.is_empty(), "unexpected diagnostics: {}", outcome.errors);
    assert!(outcome.program.is_some());
}

#[test]
fn constructor_statement_defines_a_scalar() {
    init_logging();
    let mut ast = Ast::new();

    let target = ident_expr(&mut ast, "x");
    let value = ident_expr(&mut ast, "5");
    let construct = statement_entry(&mut ast, "integer", vec![target, value]);
    let body = code_block(&mut ast, vec![construct]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "scalar.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    let ir = outcome.program.expect("phases pass");

    let function = ir.function(pool.pool("main")).unwrap();
    let scope = function.code().unwrap().scope();
    assert_eq!(
        scope.borrow().find(pool.pool("x")).unwrap().ty,
        TypeId::Integer
    );

    // The constructor statement itself resolved as a callable.
    let [IrCodeBlockEntry::Statement(statement)] =
        function.code().unwrap().entries.as_slice()
    else {
        panic!("expected the constructor statement entry");
    };
    assert!(statement.resolved_overload().is_some());
    assert_eq!(statement.return_ty(), TypeId::Integer);
}

#[test]
fn wrong_constructor_arity_fails_overload_resolution() {
    let mut ast = Ast::new();

    let target = ident_expr(&mut ast, "x");
    let construct = statement_entry(&mut ast, "integer", vec![target]);
    let body = code_block(&mut ast, vec![construct]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "arity.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(outcome.program.is_none());
    assert!(outcome
        .errors
        .iter()
        .any(|error| error.kind == ErrorKind::OverloadError));
}

#[test]
fn undefined_identifier_fails_inference() {
    let mut ast = Ast::new();

    let target = ident_expr(&mut ast, "x");
    let ghost = ident_expr(&mut ast, "ghost");
    let construct = statement_entry(&mut ast, "integer", vec![target, ghost]);
    let body = code_block(&mut ast, vec![construct]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "ghost.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(outcome.program.is_none());
    assert!(outcome
        .errors
        .iter()
        .any(|error| error.kind == ErrorKind::TypeError));
}

#[test]
fn unregistered_entity_reports_unknown_tag() {
    let mut ast = Ast::new();

    let condition = ident_expr(&mut ast, "true");
    let entity_body = code_block(&mut ast, vec![]);
    let entity = ast.add(epoch_lang::ast::Entity {
        identifier: ident("unless"),
        parameters: vec![condition],
        code: entity_body,
        chain: vec![],
    });
    let entry = entity_entry(&mut ast, entity);
    let body = code_block(&mut ast, vec![entry]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "unless.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(outcome.program.is_none());
    assert!(outcome
        .errors
        .iter()
        .any(|error| error.kind == ErrorKind::UnknownTag));
}

#[test]
fn unregistered_function_tag_reports_unknown_tag() {
    let mut ast = Ast::new();

    let body = code_block(&mut ast, vec![]);
    let function = ast.add(epoch_lang::ast::Function {
        name: ident("fast"),
        parameters: vec![],
        return_value: epoch_lang::ast::FunctionReturn::Undefined,
        tags: Some(vec![epoch_lang::ast::FunctionTag {
            name: ident("inline"),
            parameters: vec![],
        }]),
        code: Some(body),
    });
    let program = program_of(vec![MetaEntity::Function(function)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "tagged.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(outcome.program.is_none());
    assert!(outcome
        .errors
        .iter()
        .any(|error| error.kind == ErrorKind::UnknownTag));
}

#[test]
fn registered_external_tag_validates() {
    let mut ast = Ast::new();

    let function = ast.add(epoch_lang::ast::Function {
        name: ident("write"),
        parameters: vec![],
        return_value: epoch_lang::ast::FunctionReturn::Undefined,
        tags: Some(vec![epoch_lang::ast::FunctionTag {
            name: ident("external"),
            parameters: vec![epoch_lang::ast::LiteralToken::Str("kernel32.dll")],
        }]),
        code: None,
    });
    let program = program_of(vec![MetaEntity::Function(function)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "external.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(outcome.errors.is_empty(), "unexpected diagnostics: {}", outcome.errors);
    let ir = outcome.program.expect("phases pass");

    let function = ir.function(pool.pool("write")).unwrap();
    assert_eq!(function.tags.len(), 1);
    // A bodyless external still owns a code block in the IR.
    assert!(function.code().is_some());
}

#[test]
fn repeated_definitions_build_an_overload_set() {
    let mut ast = Ast::new();

    let body_a = code_block(&mut ast, vec![]);
    let body_b = code_block(&mut ast, vec![]);
    let program = program_of(vec![
        simple_function(&mut ast, "describe", body_a),
        simple_function(&mut ast, "describe", body_b),
    ]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "overloads.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    let ir = outcome.program.expect("phases pass");

    let base = pool.pool("describe");
    let overloads = ir.overloads_of(base);
    assert_eq!(overloads.len(), 2);
    assert_eq!(overloads[0], base);
    assert_ne!(overloads[1], base);
    assert!(ir.function(overloads[1]).is_some());

    // The generated overload name stays outside the source identifier
    // space.
    assert!(pool.get(overloads[1]).unwrap().contains("@@"));
}
