//! Lowering-level checks: the shape of the IR produced by the semantic
//! pass before any phase runs.

mod common;

use std::rc::Rc;

use common::*;
use epoch_lang::ast::{Ast, Entity, ExpressionOrAssignment, Program};
use epoch_lang::ir::{AssignmentChain, ExpressionAtom, IrCodeBlockEntry};
use epoch_lang::{CompileSession, ErrorKind, SemanticPass, StringPool};

#[test]
fn empty_program_lowers_to_an_empty_ir() {
    let ast = Ast::new();
    let program = Program::new();
    let pool = StringPool::new();
    let mut session = CompileSession::new("", "empty.epoch");
    session.register_builtins(&pool);

    let mut pass = SemanticPass::new(&pool, &mut session);
    pass.lower(&ast, &program).expect("lowering succeeds");
    let ir = pass.detach_program().expect("program produced");

    assert!(ir.structures().is_empty());
    assert!(ir.functions().is_empty());
    assert!(ir.global_blocks.is_empty());
}

#[test]
fn simple_function_gets_the_first_overload_handle() {
    let mut ast = Ast::new();
    let body = code_block(&mut ast, vec![]);
    let program = program_of(vec![simple_function(&mut ast, "main", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "main.epoch");
    session.register_builtins(&pool);

    let mut pass = SemanticPass::new(&pool, &mut session);
    pass.lower(&ast, &program).expect("lowering succeeds");
    let ir = pass.detach_program().expect("program produced");

    let main = pool.pool("main");
    assert_eq!(ir.overloads_of(main), &[main]);

    let function = ir.function(main).expect("main lowered");
    let code = function.code().expect("body present");
    assert!(code.entries.is_empty());
    assert!(function.return_expression.is_none());
    assert!(function.return_initialization.is_none());

    // The body scope is fresh and parented on the global scope.
    let parent = code.scope().borrow().parent().expect("scope has parent");
    assert!(Rc::ptr_eq(&parent, &ir.global_scope()));
    assert!(code.owns_scope());
}

#[test]
fn chained_entities_keep_declaration_order() {
    let mut ast = Ast::new();

    let cond_a = ident_expr(&mut ast, "a");
    let cond_b = ident_expr(&mut ast, "b");
    let if_body = code_block(&mut ast, vec![]);
    let elseif_body = code_block(&mut ast, vec![]);
    let else_body = code_block(&mut ast, vec![]);

    let elseif = chained(&mut ast, "elseif", vec![cond_b], elseif_body);
    let else_entity = chained(&mut ast, "else", vec![], else_body);
    let entity = ast.add(Entity {
        identifier: ident("if"),
        parameters: vec![cond_a],
        code: if_body,
        chain: vec![elseif, else_entity],
    });

    let entry = entity_entry(&mut ast, entity);
    let global = code_block(&mut ast, vec![entry]);
    let program = program_of(vec![epoch_lang::ast::MetaEntity::Global(global)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "chain.epoch");
    session.register_builtins(&pool);

    let mut pass = SemanticPass::new(&pool, &mut session);
    pass.lower(&ast, &program).expect("lowering succeeds");
    let ir = pass.detach_program().expect("program produced");

    let [IrCodeBlockEntry::Entity(lowered)] = ir.global_blocks[0].entries.as_slice() else {
        panic!("expected a single entity entry");
    };

    assert_eq!(pool.get(lowered.name).as_deref(), Some("if"));
    assert!(lowered.tag.is_some());
    assert!(lowered.code.is_some());

    let chain_names: Vec<String> = lowered
        .chain
        .iter()
        .map(|entity| pool.get(entity.name).unwrap().to_string())
        .collect();
    assert_eq!(chain_names, vec!["elseif", "else"]);
    assert!(lowered.chain.iter().all(|entity| entity.code.is_some()));
    assert_eq!(lowered.chain[0].parameters.len(), 1);
}

#[test]
fn chained_assignment_nests_through_the_rhs() {
    let mut ast = Ast::new();

    let value = ident_expr(&mut ast, "42");
    let inner = assignment(
        &mut ast,
        &["b"],
        "=",
        ExpressionOrAssignment::Expression(value),
    );
    let outer = assignment(
        &mut ast,
        &["a"],
        "=",
        ExpressionOrAssignment::Assignment(inner),
    );

    let entry = assignment_entry(&mut ast, outer);
    let global = code_block(&mut ast, vec![entry]);
    let program = program_of(vec![epoch_lang::ast::MetaEntity::Global(global)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "assign.epoch");
    session.register_builtins(&pool);

    let mut pass = SemanticPass::new(&pool, &mut session);
    pass.lower(&ast, &program).expect("lowering succeeds");
    let ir = pass.detach_program().expect("program produced");

    let [IrCodeBlockEntry::Assignment(lowered)] = ir.global_blocks[0].entries.as_slice() else {
        panic!("expected a single assignment entry");
    };

    assert_eq!(lowered.lhs, vec![pool.pool("a")]);
    assert!(!lowered.operator.is_null());

    let Some(AssignmentChain::Assignment(nested)) = &lowered.rhs else {
        panic!("outer RHS should be an assignment chain link");
    };
    assert_eq!(nested.lhs, vec![pool.pool("b")]);

    let Some(AssignmentChain::Expression(expression)) = &nested.rhs else {
        panic!("inner RHS should be a terminal expression");
    };
    assert!(matches!(
        expression.atoms.as_slice(),
        [ExpressionAtom::LiteralInteger(42)]
    ));
}

#[test]
fn literal_classification_covers_all_forms() {
    let mut ast = Ast::new();

    let params = ["true", "false", "3.14", "42", "\"hello\"", "foo"]
        .into_iter()
        .map(|text| ident_expr(&mut ast, text))
        .collect();
    let entry = statement_entry(&mut ast, "probe", params);
    let global = code_block(&mut ast, vec![entry]);
    let program = program_of(vec![epoch_lang::ast::MetaEntity::Global(global)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "literals.epoch");
    session.register_builtins(&pool);

    let mut pass = SemanticPass::new(&pool, &mut session);
    pass.lower(&ast, &program).expect("lowering succeeds");
    let ir = pass.detach_program().expect("program produced");

    let [IrCodeBlockEntry::Statement(statement)] = ir.global_blocks[0].entries.as_slice() else {
        panic!("expected a single statement entry");
    };
    assert_eq!(statement.arguments.len(), 6);

    let atoms: Vec<&ExpressionAtom> = statement
        .arguments
        .iter()
        .map(|argument| &argument.atoms[0])
        .collect();

    assert!(matches!(atoms[0], ExpressionAtom::LiteralBoolean(true)));
    assert!(matches!(atoms[1], ExpressionAtom::LiteralBoolean(false)));
    assert!(
        matches!(atoms[2], ExpressionAtom::LiteralReal(value) if (value - 3.14).abs() < f32::EPSILON)
    );
    assert!(matches!(atoms[3], ExpressionAtom::LiteralInteger(42)));

    let ExpressionAtom::LiteralString(handle) = atoms[4] else {
        panic!("expected a string literal atom");
    };
    assert_eq!(pool.get(*handle).as_deref(), Some("hello"));

    let ExpressionAtom::Identifier { name, .. } = atoms[5] else {
        panic!("expected an identifier atom");
    };
    assert_eq!(*name, pool.pool("foo"));
}

#[test]
fn void_return_lowers_with_no_return_expression() {
    let mut ast = Ast::new();
    let body = code_block(&mut ast, vec![]);
    let program = program_of(vec![simple_function(&mut ast, "noop", body)]);

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "void.epoch");
    session.register_builtins(&pool);

    let mut pass = SemanticPass::new(&pool, &mut session);
    pass.lower(&ast, &program).expect("lowering succeeds");
    let ir = pass.detach_program().expect("program produced");

    let function = ir.function(pool.pool("noop")).expect("noop lowered");
    assert!(function.return_expression.is_none());
    assert!(function.return_initialization.is_none());
}

#[test]
fn reentrant_lowering_is_rejected() {
    let ast = Ast::new();
    let first = Program::new();
    let second = Program::new();

    let pool = StringPool::new();
    let mut session = CompileSession::new("", "reentrant.epoch");
    session.register_builtins(&pool);

    let mut pass = SemanticPass::new(&pool, &mut session);
    pass.lower(&ast, &first).expect("first lowering succeeds");

    let error = pass
        .lower(&ast, &second)
        .expect_err("second lowering must fail");
    assert_eq!(error.kind, ErrorKind::ReentrantAst);
}
