//! Phase 3: validation.
//!
//! Independent predicates over the decorated IR. Each predicate appends
//! its own diagnostics and the phase fails if any of them complained;
//! nothing here mutates the IR.

use log::debug;

use crate::errors::{CompileErrors, ErrorKind};
use crate::ir::{
    AssignmentChain, ExpressionAtom, IrAssignment, IrCodeBlock, IrCodeBlockEntry, IrEntity,
    IrExpression, IrParenthetical, IrProgram, IrStatement, ScopeRef,
};
use crate::pool::StringHandle;
use crate::session::CompileSession;

pub(crate) fn validate(
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> bool {
    debug!("validation over {} function(s)", program.functions().len());
    errors.clear_context();
    let before = errors.error_count();

    validate_overload_sets(program, errors);

    for block in &program.global_blocks {
        validate_block(block, program, session, errors);
    }

    for (_, function) in program.functions() {
        for tag in &function.tags {
            if !session.tag_helpers.contains_key(&tag.name) {
                if let Some(site) = &tag.site {
                    errors.set_context(site.clone());
                }
                errors.error(
                    ErrorKind::UnknownTag,
                    format!(
                        "function tag '{}' is not registered",
                        name_of(program, tag.name)
                    ),
                );
            }
        }

        if let Some(expression) = &function.return_expression {
            validate_expression(expression, program, errors);
        }
        if let Some(code) = function.code() {
            validate_block(code, program, session, errors);
        }
    }

    errors.error_count() == before
}

/// Overloads that pattern-match on literals must agree on arity with
/// every other overload of the same base name; dispatch falls back to
/// positional matching at runtime.
fn validate_overload_sets(program: &IrProgram<'_>, errors: &mut CompileErrors) {
    for (base, overloads) in program.overload_sets() {
        let mut arities: Vec<usize> = Vec::new();
        let mut has_pattern = false;

        for overload in overloads {
            let Some(function) = program.function(*overload) else {
                continue;
            };
            arities.push(function.parameters().len());
            has_pattern |= function.has_patterned_parameter();
        }

        if has_pattern && arities.windows(2).any(|pair| pair[0] != pair[1]) {
            errors.error(
                ErrorKind::TypeError,
                format!(
                    "overloads of '{}' pattern-match on literals but disagree on arity",
                    name_of(program, *base)
                ),
            );
        }
    }
}

fn validate_block(
    block: &IrCodeBlock,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) {
    let scope = block.scope();

    for entry in &block.entries {
        match entry {
            IrCodeBlockEntry::Statement(statement) => {
                validate_statement(statement, program, errors);
            }
            IrCodeBlockEntry::PreOp(preop) => {
                if !preop.ty().is_concrete() {
                    errors.error(
                        ErrorKind::TypeError,
                        "pre-operator statement has no resolved type",
                    );
                }
            }
            IrCodeBlockEntry::PostOp(postop) => {
                if !postop.ty().is_concrete() {
                    errors.error(
                        ErrorKind::TypeError,
                        "post-operator statement has no resolved type",
                    );
                }
            }
            IrCodeBlockEntry::Assignment(assignment) => {
                validate_assignment(assignment, &scope, program, errors);
            }
            IrCodeBlockEntry::Entity(entity) => {
                validate_entity(entity, program, session, errors);
            }
            IrCodeBlockEntry::Inner(inner) => validate_block(inner, program, session, errors),
            IrCodeBlockEntry::Initialization(init) => {
                if !program.lookup_type(init.type_name).is_concrete() {
                    if let Some(site) = &init.site {
                        errors.set_context(site.clone());
                    }
                    errors.error(
                        ErrorKind::TypeError,
                        format!(
                            "initialization names unknown type '{}'",
                            name_of(program, init.type_name)
                        ),
                    );
                }
                for argument in &init.arguments {
                    validate_expression(argument, program, errors);
                }
            }
        }
    }
}

fn validate_statement(
    statement: &IrStatement,
    program: &IrProgram<'_>,
    errors: &mut CompileErrors,
) {
    if let Some(site) = &statement.site {
        errors.set_context(site.clone());
    }

    if statement.resolved_overload().is_none() || !statement.return_ty().is_concrete() {
        errors.error(
            ErrorKind::OverloadError,
            format!(
                "statement '{}' does not resolve to a callable overload",
                name_of(program, statement.name)
            ),
        );
    }

    for argument in &statement.arguments {
        validate_expression(argument, program, errors);
    }
}

fn validate_assignment(
    assignment: &IrAssignment,
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    errors: &mut CompileErrors,
) {
    let Some(target) = assignment.lhs.first() else {
        errors.error(ErrorKind::TypeError, "assignment has no target");
        return;
    };

    if !scope.borrow().contains(*target) {
        errors.error(
            ErrorKind::TypeError,
            format!(
                "assignment target '{}' is not a known variable",
                name_of(program, *target)
            ),
        );
    }

    match &assignment.rhs {
        Some(AssignmentChain::Expression(expression)) => {
            validate_expression(expression, program, errors);
        }
        Some(AssignmentChain::Assignment(inner)) => {
            validate_assignment(inner, scope, program, errors);
        }
        None => errors.error(ErrorKind::TypeError, "assignment has no right-hand side"),
    }
}

fn validate_entity(
    entity: &IrEntity,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) {
    if entity.tag.is_none() {
        if let Some(site) = &entity.site {
            errors.set_context(site.clone());
        }
        errors.error(
            ErrorKind::UnknownTag,
            format!(
                "entity '{}' is not registered",
                name_of(program, entity.name)
            ),
        );
    }

    for parameter in &entity.parameters {
        validate_expression(parameter, program, errors);
    }
    if let Some(code) = &entity.code {
        validate_block(code, program, session, errors);
    }
    for chained in &entity.chain {
        validate_entity(chained, program, session, errors);
    }
}

fn validate_expression(
    expression: &IrExpression,
    program: &IrProgram<'_>,
    errors: &mut CompileErrors,
) {
    if !expression.ty().is_concrete() {
        errors.error(ErrorKind::TypeError, "expression has no resolved type");
    }

    for atom in &expression.atoms {
        match atom {
            ExpressionAtom::Identifier { name, ty }
            | ExpressionAtom::IdentifierReference { name, ty } => {
                if !ty.get().is_concrete() {
                    errors.error(
                        ErrorKind::TypeError,
                        format!("identifier '{}' has no resolved type", name_of(program, *name)),
                    );
                }
            }
            ExpressionAtom::Statement(statement) => {
                validate_statement(statement, program, errors);
            }
            ExpressionAtom::Parenthetical(IrParenthetical::Expression(inner)) => {
                validate_expression(inner, program, errors);
            }
            ExpressionAtom::Parenthetical(IrParenthetical::PreOp(preop)) => {
                if !preop.ty().is_concrete() {
                    errors.error(
                        ErrorKind::TypeError,
                        "pre-operator statement has no resolved type",
                    );
                }
            }
            ExpressionAtom::Parenthetical(IrParenthetical::PostOp(postop)) => {
                if !postop.ty().is_concrete() {
                    errors.error(
                        ErrorKind::TypeError,
                        "post-operator statement has no resolved type",
                    );
                }
            }
            _ => {}
        }
    }
}

fn name_of(program: &IrProgram<'_>, handle: StringHandle) -> String {
    program
        .string(handle)
        .map(|text| text.to_string())
        .unwrap_or_else(|| handle.to_string())
}
