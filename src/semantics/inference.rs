//! Phase 2: type inference.
//!
//! Expressions are flat atom lists, so inference folds each list left to
//! right: operand atoms produce types, operator atoms are applied over
//! them through the session's operator signature table, and member
//! accesses resolve against structure layouts. Statements resolve their
//! overload from the session signature registry or the program's own
//! overload sets. Every resolved type lands in a `Cell` slot on the IR,
//! so the walk borrows the program immutably.

use log::debug;

use crate::errors::{CompileErrors, ErrorKind};
use crate::ir::{
    AssignmentChain, ExpressionAtom, IrAssignment, IrCodeBlock, IrCodeBlockEntry, IrEntity,
    IrExpression, IrFunction, IrFunctionParam, IrParenthetical, IrProgram, IrStatement, ScopeRef,
    TypeId,
};
use crate::pool::StringHandle;
use crate::session::{CompileSession, FunctionSignature};

pub(crate) fn infer(
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> bool {
    debug!("type inference over {} function(s)", program.functions().len());
    errors.clear_context();
    let before = errors.error_count();

    // Signatures first: return expressions and parameter patterns, so
    // that calls between functions can resolve during the body walk.
    for (_, function) in program.functions() {
        let scope = function
            .code()
            .map(|code| code.scope())
            .unwrap_or_else(|| program.global_scope());

        for (_, param) in function.parameters() {
            if let IrFunctionParam::Patterned(pattern) = param {
                infer_expression(pattern, &scope, program, session, errors);
            }
        }
        if let Some(init) = &function.return_initialization {
            for argument in &init.arguments {
                infer_expression(argument, &scope, program, session, errors);
            }
        }
        if let Some(expression) = &function.return_expression {
            infer_expression(expression, &scope, program, session, errors);
        }
    }

    for block in &program.global_blocks {
        infer_block(block, program, session, errors);
    }
    for (_, function) in program.functions() {
        if let Some(code) = function.code() {
            infer_block(code, program, session, errors);
        }
    }

    errors.error_count() == before
}

fn infer_block(
    block: &IrCodeBlock,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) {
    let scope = block.scope();

    for entry in &block.entries {
        match entry {
            IrCodeBlockEntry::Statement(statement) => {
                infer_statement(statement, &scope, program, session, errors);
            }
            IrCodeBlockEntry::PreOp(preop) => {
                let ty = resolve_operand_chain(&preop.operand, &scope, program, errors);
                preop.set_ty(ty);
            }
            IrCodeBlockEntry::PostOp(postop) => {
                let ty = resolve_operand_chain(&postop.operand, &scope, program, errors);
                postop.set_ty(ty);
            }
            IrCodeBlockEntry::Assignment(assignment) => {
                infer_assignment(assignment, &scope, program, session, errors);
            }
            IrCodeBlockEntry::Entity(entity) => {
                infer_entity(entity, &scope, program, session, errors);
            }
            IrCodeBlockEntry::Inner(inner) => infer_block(inner, program, session, errors),
            IrCodeBlockEntry::Initialization(init) => {
                for argument in &init.arguments {
                    infer_expression(argument, &scope, program, session, errors);
                }
            }
        }
    }
}

fn infer_assignment(
    assignment: &IrAssignment,
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) {
    match &assignment.rhs {
        Some(AssignmentChain::Expression(expression)) => {
            infer_expression(expression, scope, program, session, errors);
        }
        Some(AssignmentChain::Assignment(inner)) => {
            infer_assignment(inner, scope, program, session, errors);
        }
        None => {}
    }
}

fn infer_entity(
    entity: &IrEntity,
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) {
    // Entity parameters evaluate in the enclosing scope, not the body's.
    for parameter in &entity.parameters {
        infer_expression(parameter, scope, program, session, errors);
    }
    if let Some(code) = &entity.code {
        infer_block(code, program, session, errors);
    }
    for chained in &entity.chain {
        infer_entity(chained, scope, program, session, errors);
    }
}

pub(crate) fn infer_statement(
    statement: &IrStatement,
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> TypeId {
    if let Some(site) = &statement.site {
        errors.set_context(site.clone());
    }

    for argument in &statement.arguments {
        infer_expression(argument, scope, program, session, errors);
    }

    if let Some(signature) = session.function_signatures.get(&statement.name) {
        if signature_matches(signature, statement) {
            statement.set_resolved_overload(statement.name);
            statement.set_return_ty(signature.return_type);
            return signature.return_type;
        }
    }

    for &overload in program.overloads_of(statement.name) {
        let Some(function) = program.function(overload) else {
            continue;
        };
        if function_matches(function, statement, program) {
            statement.set_resolved_overload(overload);
            let return_ty = function_return_type(function, program);
            statement.set_return_ty(return_ty);
            return return_ty;
        }
    }

    errors.error(
        ErrorKind::OverloadError,
        format!(
            "no matching overload for '{}'",
            name_of(program, statement.name)
        ),
    );
    statement.set_return_ty(TypeId::Error);
    TypeId::Error
}

fn signature_matches(signature: &FunctionSignature, statement: &IrStatement) -> bool {
    signature.parameters.len() == statement.arguments.len()
        && signature
            .parameters
            .iter()
            .zip(&statement.arguments)
            .all(|(parameter, argument)| match parameter.ty {
                // Identifier-typed parameters accept a bare name, e.g.
                // the binding slot of a constructor.
                TypeId::Identifier => argument.single_identifier().is_some(),
                ty => argument.ty() == ty,
            })
}

fn function_matches(
    function: &IrFunction,
    statement: &IrStatement,
    program: &IrProgram<'_>,
) -> bool {
    if function.parameters().len() != statement.arguments.len() {
        return false;
    }

    function
        .parameter_names()
        .zip(&statement.arguments)
        .all(|(name, argument)| {
            let expected = function.parameter_type(name, |handle| program.lookup_type(handle));
            expected == argument.ty()
        })
}

fn function_return_type(function: &IrFunction, program: &IrProgram<'_>) -> TypeId {
    if let Some(init) = &function.return_initialization {
        program.lookup_type(init.type_name)
    } else if let Some(expression) = &function.return_expression {
        expression.ty()
    } else {
        TypeId::Void
    }
}

pub(crate) fn infer_expression(
    expression: &IrExpression,
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> TypeId {
    let mut left: Option<TypeId> = None;
    let mut pending: Vec<(StringHandle, bool)> = Vec::new();

    for atom in &expression.atoms {
        match atom {
            ExpressionAtom::Operator {
                name,
                member_access,
            } => pending.push((*name, *member_access)),

            ExpressionAtom::Identifier { name, ty }
            | ExpressionAtom::IdentifierReference { name, ty } => {
                // A member name after `.` is not a variable; resolve it
                // against the structure on the left instead.
                if let (Some(base), [(_, true)]) = (left, pending.as_slice()) {
                    let member_ty = resolve_member(base, *name, program, errors);
                    ty.set(member_ty);
                    left = Some(member_ty);
                    pending.clear();
                    continue;
                }

                let resolved = match resolve_identifier(*name, scope, program, session) {
                    Some(resolved) => resolved,
                    None => {
                        errors.error(
                            ErrorKind::TypeError,
                            format!("undefined identifier '{}'", name_of(program, *name)),
                        );
                        TypeId::Error
                    }
                };
                ty.set(resolved);
                left = apply_pending(left, resolved, &mut pending, program, session, errors);
            }

            ExpressionAtom::LiteralInteger(_) => {
                left = apply_pending(left, TypeId::Integer, &mut pending, program, session, errors)
            }
            ExpressionAtom::LiteralReal(_) => {
                left = apply_pending(left, TypeId::Real, &mut pending, program, session, errors)
            }
            ExpressionAtom::LiteralBoolean(_) => {
                left = apply_pending(left, TypeId::Boolean, &mut pending, program, session, errors)
            }
            ExpressionAtom::LiteralString(_) => {
                left = apply_pending(left, TypeId::String, &mut pending, program, session, errors)
            }

            ExpressionAtom::Statement(statement) => {
                let ty = infer_statement(statement, scope, program, session, errors);
                left = apply_pending(left, ty, &mut pending, program, session, errors);
            }

            ExpressionAtom::Parenthetical(parenthetical) => {
                let ty = infer_parenthetical(parenthetical, scope, program, session, errors);
                left = apply_pending(left, ty, &mut pending, program, session, errors);
            }

            ExpressionAtom::TypeAnnotation(ty) => {
                left = apply_pending(left, *ty, &mut pending, program, session, errors)
            }

            // Codegen-era atoms; nothing to infer at this stage.
            ExpressionAtom::CopyFromStructure { .. }
            | ExpressionAtom::BindReference { .. }
            | ExpressionAtom::TempReferenceFromRegister => {}
        }
    }

    let result = if !pending.is_empty() {
        errors.error(ErrorKind::TypeError, "operator without an operand");
        TypeId::Error
    } else {
        left.unwrap_or(TypeId::Void)
    };
    expression.set_ty(result);
    result
}

/// Fold the pending operators over the freshly produced operand type.
/// With no left-hand value every pending operator is a unary prefix,
/// applied innermost-first; otherwise the first pending operator is the
/// infix one and the rest prefix the right-hand operand.
fn apply_pending(
    left: Option<TypeId>,
    operand: TypeId,
    pending: &mut Vec<(StringHandle, bool)>,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> Option<TypeId> {
    if pending.is_empty() {
        return Some(operand);
    }
    let ops: Vec<(StringHandle, bool)> = pending.drain(..).collect();

    match left {
        None => {
            let mut ty = operand;
            for (op, _) in ops.iter().rev() {
                ty = resolve_unary(*op, ty, program, session, errors);
            }
            Some(ty)
        }
        Some(lhs) => {
            let mut rhs = operand;
            for (op, _) in ops[1..].iter().rev() {
                rhs = resolve_unary(*op, rhs, program, session, errors);
            }

            let (op, member_access) = ops[0];
            if member_access {
                errors.error(
                    ErrorKind::TypeError,
                    "member access requires a member name on its right-hand side",
                );
                return Some(TypeId::Error);
            }
            Some(resolve_binary(op, lhs, rhs, program, session, errors))
        }
    }
}

fn infer_parenthetical(
    parenthetical: &IrParenthetical,
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> TypeId {
    match parenthetical {
        IrParenthetical::PreOp(preop) => {
            let ty = resolve_operand_chain(&preop.operand, scope, program, errors);
            preop.set_ty(ty);
            ty
        }
        IrParenthetical::PostOp(postop) => {
            let ty = resolve_operand_chain(&postop.operand, scope, program, errors);
            postop.set_ty(ty);
            ty
        }
        IrParenthetical::Expression(inner) => {
            infer_expression(inner, scope, program, session, errors)
        }
    }
}

fn resolve_identifier(
    name: StringHandle,
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
) -> Option<TypeId> {
    if let Some(variable) = scope.borrow().find(name) {
        return Some(variable.ty);
    }
    // Functions are first-class; a bare function name types as a
    // function reference.
    if !program.overloads_of(name).is_empty() {
        return Some(TypeId::Function);
    }
    if session.function_signatures.contains_key(&name) {
        return Some(TypeId::Function);
    }
    None
}

fn resolve_member(
    base: TypeId,
    member: StringHandle,
    program: &IrProgram<'_>,
    errors: &mut CompileErrors,
) -> TypeId {
    if base == TypeId::Error {
        return TypeId::Error;
    }
    let TypeId::Structure(structure_name) = base else {
        errors.error(
            ErrorKind::TypeError,
            format!("member access on a value of type {base}"),
        );
        return TypeId::Error;
    };
    let Some(structure) = program.structure(structure_name) else {
        errors.error(
            ErrorKind::TypeError,
            format!(
                "member access on unknown structure '{}'",
                name_of(program, structure_name)
            ),
        );
        return TypeId::Error;
    };
    let Some(found) = structure.member(member) else {
        errors.error(
            ErrorKind::TypeError,
            format!(
                "structure '{}' has no member '{}'",
                name_of(program, structure_name),
                name_of(program, member)
            ),
        );
        return TypeId::Error;
    };
    found.type_id(|handle| program.lookup_type(handle))
}

fn resolve_operand_chain(
    names: &[StringHandle],
    scope: &ScopeRef,
    program: &IrProgram<'_>,
    errors: &mut CompileErrors,
) -> TypeId {
    let Some((first, rest)) = names.split_first() else {
        errors.error(
            ErrorKind::TypeError,
            "operator statement without an operand",
        );
        return TypeId::Error;
    };
    let Some(variable) = scope.borrow().find(*first) else {
        errors.error(
            ErrorKind::TypeError,
            format!("undefined identifier '{}'", name_of(program, *first)),
        );
        return TypeId::Error;
    };

    let mut ty = variable.ty;
    for member in rest {
        ty = resolve_member(ty, *member, program, errors);
    }
    ty
}

fn resolve_unary(
    op: StringHandle,
    operand: TypeId,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> TypeId {
    if operand == TypeId::Error {
        return TypeId::Error;
    }

    let matched = session
        .operator_signatures
        .get(&op)
        .and_then(|overloads| {
            overloads
                .iter()
                .find(|signature| signature.operands == [operand])
        })
        .map(|signature| signature.return_type);

    matched.unwrap_or_else(|| {
        errors.error(
            ErrorKind::OverloadError,
            format!(
                "no overload of prefix operator '{}' accepts {operand}",
                name_of(program, op)
            ),
        );
        TypeId::Error
    })
}

fn resolve_binary(
    op: StringHandle,
    lhs: TypeId,
    rhs: TypeId,
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> TypeId {
    if lhs == TypeId::Error || rhs == TypeId::Error {
        return TypeId::Error;
    }

    let matched = session
        .operator_signatures
        .get(&op)
        .and_then(|overloads| {
            overloads
                .iter()
                .find(|signature| signature.operands == [lhs, rhs])
        })
        .map(|signature| signature.return_type);

    matched.unwrap_or_else(|| {
        errors.error(
            ErrorKind::OverloadError,
            format!(
                "no overload of operator '{}' accepts ({lhs}, {rhs})",
                name_of(program, op)
            ),
        );
        TypeId::Error
    })
}

fn name_of(program: &IrProgram<'_>, handle: StringHandle) -> String {
    program
        .string(handle)
        .map(|text| text.to_string())
        .unwrap_or_else(|| handle.to_string())
}
