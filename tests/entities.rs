//! Entity, operator-statement and inner-block behaviour through the full
//! pass.

mod common;

use std::rc::Rc;

use common::*;
use epoch_lang::ast::{Ast, ExpressionOrAssignment};
use epoch_lang::ir::{IrCodeBlockEntry, TypeId};
use epoch_lang::{validate_semantics, CompileSession, StringPool};

#[test]
fn postfix_entity_records_its_closer_and_parameters() {
    let mut ast = Ast::new();

    let flag_value = ident_expr(&mut ast, "true");
    let init = initialization_entry(&mut ast, "boolean", "flag", vec![flag_value]);

    let loop_body = code_block(&mut ast, vec![]);
    let condition = ident_expr(&mut ast, "flag");
    let do_while = postfix_entity_entry(&mut ast, "do", loop_body, "while", vec![condition]);

    let body = code_block(&mut ast, vec![init, do_while]);
    let program = program_of(vec![simple_function(&mut ast, "spin", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "spin.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(
        outcome.errors.is_empty(),
        "unexpected diagnostics: {}",
        outcome.errors
    );
    let ir = outcome.program.expect("phases pass");

    let function = ir.function(pool.pool("spin")).expect("spin lowered");
    let [_, IrCodeBlockEntry::Entity(entity)] = function.code().unwrap().entries.as_slice() else {
        panic!("expected initialization followed by the do/while entity");
    };

    assert_eq!(pool.get(entity.name).as_deref(), Some("do"));
    assert_eq!(
        entity.postfix_name.and_then(|name| pool.get(name)).as_deref(),
        Some("while")
    );
    assert!(entity.tag.is_some());
    assert_eq!(entity.parameters.len(), 1);
    assert_eq!(entity.parameters[0].ty(), TypeId::Boolean);
    assert!(entity.code.is_some());
}

#[test]
fn operator_statements_take_their_operand_type() {
    let mut ast = Ast::new();

    let start = ident_expr(&mut ast, "0");
    let init = initialization_entry(&mut ast, "integer", "counter", vec![start]);
    let increment = preop_entry(&mut ast, "++", &["counter"]);
    let decrement = postop_entry(&mut ast, &["counter"], "--");

    let body = code_block(&mut ast, vec![init, increment, decrement]);
    let program = program_of(vec![simple_function(&mut ast, "count", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "count.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(
        outcome.errors.is_empty(),
        "unexpected diagnostics: {}",
        outcome.errors
    );
    let ir = outcome.program.expect("phases pass");

    let function = ir.function(pool.pool("count")).unwrap();
    let [_, IrCodeBlockEntry::PreOp(preop), IrCodeBlockEntry::PostOp(postop)] =
        function.code().unwrap().entries.as_slice()
    else {
        panic!("expected pre- and post-operator entries");
    };

    assert_eq!(pool.get(preop.operator).as_deref(), Some("++"));
    assert_eq!(preop.operand, vec![pool.pool("counter")]);
    assert_eq!(preop.ty(), TypeId::Integer);

    assert_eq!(pool.get(postop.operator).as_deref(), Some("--"));
    assert_eq!(postop.ty(), TypeId::Integer);
}

#[test]
fn inner_blocks_scope_onto_their_surroundings() {
    let mut ast = Ast::new();

    let start = ident_expr(&mut ast, "1");
    let init = initialization_entry(&mut ast, "integer", "outer", vec![start]);

    let new_value = ident_expr(&mut ast, "2");
    let reassign = assignment(
        &mut ast,
        &["outer"],
        "=",
        ExpressionOrAssignment::Expression(new_value),
    );
    let reassign_entry = assignment_entry(&mut ast, reassign);
    let inner = code_block(&mut ast, vec![reassign_entry]);
    let inner_entry = inner_block_entry(&mut ast, inner);

    let body = code_block(&mut ast, vec![init, inner_entry]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "blocks.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(
        outcome.errors.is_empty(),
        "unexpected diagnostics: {}",
        outcome.errors
    );
    let ir = outcome.program.expect("phases pass");

    let function = ir.function(pool.pool("main")).unwrap();
    let outer_block = function.code().unwrap();
    let [_, IrCodeBlockEntry::Inner(inner)] = outer_block.entries.as_slice() else {
        panic!("expected the inner block entry");
    };

    // The inner scope hangs off the function body scope, and the
    // assignment inside it resolved against the outer binding.
    let parent = inner.scope().borrow().parent().expect("inner has parent");
    assert!(Rc::ptr_eq(&parent, &outer_block.scope()));
    assert!(matches!(
        inner.entries.as_slice(),
        [IrCodeBlockEntry::Assignment(_)]
    ));

    // Every lowered block got a generated scope name.
    assert!(!outer_block.scope_name.is_null());
    assert!(!inner.scope_name.is_null());
    assert_ne!(outer_block.scope_name, inner.scope_name);
}

#[test]
fn entity_bodies_see_enclosing_variables() {
    let mut ast = Ast::new();

    let start = ident_expr(&mut ast, "0");
    let init = initialization_entry(&mut ast, "integer", "n", vec![start]);

    let bump = preop_entry(&mut ast, "++", &["n"]);
    let while_body = code_block(&mut ast, vec![bump]);
    let condition = binary_expr(&mut ast, "n", "<", "10");
    let while_entity = ast.add(epoch_lang::ast::Entity {
        identifier: ident("while"),
        parameters: vec![condition],
        code: while_body,
        chain: vec![],
    });
    let while_entry = entity_entry(&mut ast, while_entity);

    let body = code_block(&mut ast, vec![init, while_entry]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "loop.epoch");
    session.register_builtins(&pool);

    let outcome = validate_semantics(&ast, &program, &pool, &mut session).expect("no fatal error");
    assert!(
        outcome.errors.is_empty(),
        "unexpected diagnostics: {}",
        outcome.errors
    );
    let ir = outcome.program.expect("phases pass");

    let function = ir.function(pool.pool("main")).unwrap();
    let [_, IrCodeBlockEntry::Entity(entity)] = function.code().unwrap().entries.as_slice() else {
        panic!("expected the while entity");
    };
    assert_eq!(entity.parameters[0].ty(), TypeId::Boolean);
}
