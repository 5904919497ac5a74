//! Phase 1: compile-time code execution.
//!
//! The only compile-time code the front end runs is constructor
//! invocation for variable definitions: each statement whose name has a
//! registered helper gets that helper invoked, and each lowered
//! initialization adds its variable directly. Either way the lexical
//! scopes end up populated before type inference reads them.

use log::debug;

use crate::errors::{CompileErrors, ErrorKind};
use crate::ir::{
    IrCodeBlock, IrCodeBlockEntry, IrEntity, IrInitialization, IrProgram, IrStatement, ScopeRef,
    VariableOrigin,
};
use crate::session::CompileSession;

pub(crate) fn execute(
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    errors: &mut CompileErrors,
) -> bool {
    debug!("compile-time code execution over {} function(s)", program.functions().len());
    errors.clear_context();
    let before = errors.error_count();

    for block in &program.global_blocks {
        execute_block(program, session, block, errors);
    }

    for (_, function) in program.functions() {
        let Some(code) = function.code() else {
            continue;
        };
        if let Some(init) = &function.return_initialization {
            run_initialization(program, init, &code.scope(), true, errors);
        }
        execute_block(program, session, code, errors);
    }

    errors.error_count() == before
}

fn execute_block(
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    block: &IrCodeBlock,
    errors: &mut CompileErrors,
) {
    let scope = block.scope();

    for entry in &block.entries {
        match entry {
            IrCodeBlockEntry::Statement(statement) => {
                if let Some(helper) = session.constructor_helpers.get(&statement.name) {
                    if let Some(site) = &statement.site {
                        errors.set_context(site.clone());
                    }
                    helper(statement, program, &scope, false, errors);
                }
            }
            IrCodeBlockEntry::Initialization(init) => {
                run_initialization(program, init, &scope, false, errors);
            }
            IrCodeBlockEntry::Entity(entity) => execute_entity(program, session, entity, errors),
            IrCodeBlockEntry::Inner(inner) => execute_block(program, session, inner, errors),
            IrCodeBlockEntry::PreOp(_)
            | IrCodeBlockEntry::PostOp(_)
            | IrCodeBlockEntry::Assignment(_) => {}
        }
    }
}

fn execute_entity(
    program: &IrProgram<'_>,
    session: &CompileSession<'_>,
    entity: &IrEntity,
    errors: &mut CompileErrors,
) {
    if let Some(code) = &entity.code {
        execute_block(program, session, code, errors);
    }
    for chained in &entity.chain {
        execute_entity(program, session, chained, errors);
    }
}

fn run_initialization(
    program: &IrProgram<'_>,
    init: &IrInitialization,
    scope: &ScopeRef,
    in_return_expr: bool,
    errors: &mut CompileErrors,
) -> bool {
    if let Some(site) = &init.site {
        errors.set_context(site.clone());
    }

    let ty = program.lookup_type(init.type_name);
    if !ty.is_concrete() {
        let name = program
            .string(init.type_name)
            .map(|text| text.to_string())
            .unwrap_or_else(|| init.type_name.to_string());
        errors.error(
            ErrorKind::TypeError,
            format!("unknown type '{name}' in initialization"),
        );
        return false;
    }

    let origin = if in_return_expr {
        VariableOrigin::Return
    } else {
        VariableOrigin::Local
    };
    scope
        .borrow_mut()
        .add_variable(init.variable, ty, false, origin);
    true
}

/// The canonical constructor helper: a structure (or built-in scalar)
/// named `S` registers this under its own name, and `S(id, ...)` adds
/// `id` with type `S` to the active scope.
///
/// The first argument must be a lone identifier; the parser guarantees
/// this for well-formed trees, so a violation is reported rather than
/// assumed away.
pub fn construct_variable(
    statement: &IrStatement,
    program: &IrProgram<'_>,
    active_scope: &ScopeRef,
    in_return_expr: bool,
    errors: &mut CompileErrors,
) -> bool {
    let Some(first) = statement.arguments.first() else {
        errors.error(
            ErrorKind::TypeError,
            "constructor invocation is missing its variable identifier",
        );
        return false;
    };
    let Some(variable) = first.single_identifier() else {
        errors.error(
            ErrorKind::TypeError,
            "constructor invocation requires a variable identifier as its first argument",
        );
        return false;
    };

    let ty = program.lookup_type(statement.name);
    if !ty.is_concrete() {
        let name = program
            .string(statement.name)
            .map(|text| text.to_string())
            .unwrap_or_else(|| statement.name.to_string());
        errors.error(
            ErrorKind::TypeError,
            format!("constructor for unknown type '{name}'"),
        );
        return false;
    }

    let origin = if in_return_expr {
        VariableOrigin::Return
    } else {
        VariableOrigin::Local
    };
    active_scope
        .borrow_mut()
        .add_variable(variable, ty, false, origin);
    true
}
