//! Builders for assembling ASTs by hand, standing in for the parser.
#![allow(dead_code)]

use epoch_lang::arena::Deferred;
use epoch_lang::ast::{
    AnyEntity, AnyStatement, Assignment, Ast, ChainedEntity, CodeBlock, CodeBlockEntry,
    ComponentInner, Entity, Expression, ExpressionComponent, ExpressionFragment,
    ExpressionOrAssignment, Function, FunctionParameter, FunctionReturn, Ident, IdentList,
    Initialization, MetaEntity, NamedFunctionParameter, PostfixEntity, PostOperatorStatement,
    PreOperatorStatement, Program, Statement, Structure, StructureMember, StructureMemberVariable,
};

pub fn ident(text: &str) -> Ident<'_> {
    Ident::new(text, 0)
}

/// An expression consisting of a single identifier-form component; the
/// lowering classifies the text as a literal or a variable reference.
pub fn ident_expr<'s>(ast: &mut Ast<'s>, text: &'s str) -> Deferred<Expression<'s>> {
    let component = ast.add(ExpressionComponent {
        unary_prefixes: Deferred::empty(),
        inner: ComponentInner::Identifier(ident(text)),
    });
    ast.add(Expression {
        first: component,
        remaining: vec![],
    })
}

pub fn ident_list<'s>(ast: &mut Ast<'s>, names: &[&'s str]) -> Deferred<IdentList<'s>> {
    let mut list = IdentList::new();
    for name in names {
        list.push(ident(name));
    }
    ast.add(list)
}

pub fn statement_entry<'s>(
    ast: &mut Ast<'s>,
    name: &'s str,
    params: Vec<Deferred<Expression<'s>>>,
) -> Deferred<CodeBlockEntry<'s>> {
    let statement = ast.add(Statement {
        identifier: ident(name),
        template_args: None,
        params,
    });
    ast.add(CodeBlockEntry::Statement(AnyStatement::Statement(statement)))
}

pub fn initialization_entry<'s>(
    ast: &mut Ast<'s>,
    type_name: &'s str,
    variable: &'s str,
    args: Vec<Deferred<Expression<'s>>>,
) -> Deferred<CodeBlockEntry<'s>> {
    let initialization = ast.add(Initialization {
        type_specifier: ident(type_name),
        template_args: None,
        lhs: ident(variable),
        rhs: args,
    });
    ast.add(CodeBlockEntry::Statement(AnyStatement::Initialization(
        initialization,
    )))
}

pub fn assignment_entry<'s>(
    ast: &mut Ast<'s>,
    assignment: Deferred<Assignment<'s>>,
) -> Deferred<CodeBlockEntry<'s>> {
    ast.add(CodeBlockEntry::Assignment(assignment))
}

pub fn entity_entry<'s>(
    ast: &mut Ast<'s>,
    entity: Deferred<Entity<'s>>,
) -> Deferred<CodeBlockEntry<'s>> {
    ast.add(CodeBlockEntry::Entity(AnyEntity::Plain(entity)))
}

pub fn code_block<'s>(
    ast: &mut Ast<'s>,
    entries: Vec<Deferred<CodeBlockEntry<'s>>>,
) -> Deferred<CodeBlock<'s>> {
    ast.add(CodeBlock { entries })
}

/// A parameterless function with a void return.
pub fn simple_function<'s>(
    ast: &mut Ast<'s>,
    name: &'s str,
    code: Deferred<CodeBlock<'s>>,
) -> MetaEntity<'s> {
    MetaEntity::Function(ast.add(Function {
        name: ident(name),
        parameters: vec![],
        return_value: FunctionReturn::Undefined,
        tags: None,
        code: Some(code),
    }))
}

/// A structure of plain `(type, name)` member variables.
pub fn structure<'s>(
    ast: &mut Ast<'s>,
    name: &'s str,
    members: &[(&'s str, &'s str)],
) -> MetaEntity<'s> {
    MetaEntity::Structure(ast.add(Structure {
        identifier: ident(name),
        template_params: None,
        members: members
            .iter()
            .map(|(type_name, member_name)| {
                StructureMember::Variable(StructureMemberVariable {
                    type_name: ident(type_name),
                    template_args: None,
                    name: ident(member_name),
                })
            })
            .collect(),
    }))
}

pub fn chained<'s>(
    ast: &mut Ast<'s>,
    name: &'s str,
    parameters: Vec<Deferred<Expression<'s>>>,
    code: Deferred<CodeBlock<'s>>,
) -> Deferred<ChainedEntity<'s>> {
    ast.add(ChainedEntity {
        identifier: ident(name),
        parameters,
        code,
    })
}

pub fn assignment<'s>(
    ast: &mut Ast<'s>,
    targets: &[&'s str],
    operator: &'s str,
    rhs: ExpressionOrAssignment<'s>,
) -> Deferred<Assignment<'s>> {
    let lhs = ident_list(ast, targets);
    ast.add(Assignment {
        lhs,
        operator: ident(operator),
        rhs,
    })
}

/// `lhs op rhs` with both operands in identifier form.
pub fn binary_expr<'s>(
    ast: &mut Ast<'s>,
    lhs: &'s str,
    op: &'s str,
    rhs: &'s str,
) -> Deferred<Expression<'s>> {
    let first = ast.add(ExpressionComponent {
        unary_prefixes: Deferred::empty(),
        inner: ComponentInner::Identifier(ident(lhs)),
    });
    let rhs_component = ast.add(ExpressionComponent {
        unary_prefixes: Deferred::empty(),
        inner: ComponentInner::Identifier(ident(rhs)),
    });
    let fragment = ast.add(ExpressionFragment {
        operator: ident(op),
        component: rhs_component,
    });
    ast.add(Expression {
        first,
        remaining: vec![fragment],
    })
}

pub fn preop_entry<'s>(
    ast: &mut Ast<'s>,
    op: &'s str,
    operand: &[&'s str],
) -> Deferred<CodeBlockEntry<'s>> {
    let list = ident_list(ast, operand);
    let statement = ast.add(PreOperatorStatement {
        operator: ident(op),
        operand: list,
    });
    ast.add(CodeBlockEntry::Statement(AnyStatement::PreOp(statement)))
}

pub fn postop_entry<'s>(
    ast: &mut Ast<'s>,
    operand: &[&'s str],
    op: &'s str,
) -> Deferred<CodeBlockEntry<'s>> {
    let list = ident_list(ast, operand);
    let statement = ast.add(PostOperatorStatement {
        operand: list,
        operator: ident(op),
    });
    ast.add(CodeBlockEntry::Statement(AnyStatement::PostOp(statement)))
}

pub fn inner_block_entry<'s>(
    ast: &mut Ast<'s>,
    block: Deferred<CodeBlock<'s>>,
) -> Deferred<CodeBlockEntry<'s>> {
    ast.add(CodeBlockEntry::Inner(block))
}

pub fn postfix_entity_entry<'s>(
    ast: &mut Ast<'s>,
    name: &'s str,
    code: Deferred<CodeBlock<'s>>,
    closer: &'s str,
    closer_params: Vec<Deferred<Expression<'s>>>,
) -> Deferred<CodeBlockEntry<'s>> {
    let entity = ast.add(PostfixEntity {
        identifier: ident(name),
        parameters: vec![],
        code,
        postfix_identifier: ident(closer),
        postfix_parameters: closer_params,
    });
    ast.add(CodeBlockEntry::Entity(AnyEntity::Postfix(entity)))
}

pub fn named_param<'s>(
    ast: &mut Ast<'s>,
    type_name: &'s str,
    name: &'s str,
) -> Deferred<FunctionParameter<'s>> {
    let named = ast.add(NamedFunctionParameter {
        type_name: ident(type_name),
        template_args: None,
        is_reference: false,
        name: ident(name),
    });
    ast.add(FunctionParameter::Named(named))
}

/// A function with explicit parameters and return slot.
pub fn function_with<'s>(
    ast: &mut Ast<'s>,
    name: &'s str,
    parameters: Vec<Deferred<FunctionParameter<'s>>>,
    return_value: FunctionReturn<'s>,
    code: Deferred<CodeBlock<'s>>,
) -> MetaEntity<'s> {
    MetaEntity::Function(ast.add(Function {
        name: ident(name),
        parameters,
        return_value,
        tags: None,
        code: Some(code),
    }))
}

pub fn program_of(entities: Vec<MetaEntity<'_>>) -> Program<'_> {
    Program {
        meta_entities: entities,
    }
}
