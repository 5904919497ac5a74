//! The compilation session: everything the semantic pass consumes that
//! is not the AST itself.
//!
//! Process-wide tables in spirit, the session is carried explicitly: the
//! constructor-helper table driving compile-time code execution, the
//! function-tag helper table, the function and operator signature
//! registries used by overload resolution, and the entity registry. The
//! session also owns the source bounds and implements the diagnostic
//! locator contract.

use std::collections::HashMap;

use crate::ast::Ident;
use crate::errors::{CompileErrors, SourceSite};
use crate::ir::{EntityTag, IrFunctionTag, IrProgram, IrStatement, ScopeRef, TypeId};
use crate::pool::{StringHandle, StringPool};
use crate::semantics::ctexec;

/// Invoked during compile-time code execution for each statement whose
/// name has a registered helper; the canonical helper adds a constructed
/// variable to the active scope.
pub type ConstructorHelper = fn(
    statement: &IrStatement,
    program: &IrProgram<'_>,
    active_scope: &ScopeRef,
    in_return_expr: bool,
    errors: &mut CompileErrors,
) -> bool;

/// Invoked when a function tag is emitted; returns the interned name of
/// a runtime function to call for the tag, if any.
pub type TagHelper = fn(tag: &IrFunctionTag, strings: &StringPool) -> Option<StringHandle>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureParam {
    pub name: StringHandle,
    pub ty: TypeId,
    pub is_reference: bool,
}

/// A callable signature registered outside the program's own overload
/// sets (built-ins, structure constructors, externals).
#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub parameters: Vec<SignatureParam>,
    pub return_type: TypeId,
}

impl FunctionSignature {
    pub fn new(return_type: TypeId) -> Self {
        FunctionSignature {
            parameters: Vec::new(),
            return_type,
        }
    }

    pub fn add_parameter(&mut self, name: StringHandle, ty: TypeId, is_reference: bool) {
        self.parameters.push(SignatureParam {
            name,
            ty,
            is_reference,
        });
    }
}

/// One overload of an operator: operand types (one entry for unary, two
/// for binary) and the result type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorSignature {
    pub operands: Vec<TypeId>,
    pub return_type: TypeId,
}

/// Shared state of one compilation.
pub struct CompileSession<'src> {
    source: &'src str,
    source_name: String,
    pub constructor_helpers: HashMap<StringHandle, ConstructorHelper>,
    pub tag_helpers: HashMap<StringHandle, TagHelper>,
    pub function_signatures: HashMap<StringHandle, FunctionSignature>,
    pub operator_signatures: HashMap<StringHandle, Vec<OperatorSignature>>,
    pub entity_registry: HashMap<StringHandle, EntityTag>,
    next_entity_tag: u32,
}

impl<'src> CompileSession<'src> {
    pub fn new(source: &'src str, source_name: impl Into<String>) -> Self {
        CompileSession {
            source,
            source_name: source_name.into(),
            constructor_helpers: HashMap::new(),
            tag_helpers: HashMap::new(),
            function_signatures: HashMap::new(),
            operator_signatures: HashMap::new(),
            entity_registry: HashMap::new(),
            next_entity_tag: 0,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    // ---- registries ----------------------------------------------------

    /// Seed the session with the scalar constructors, the core operator
    /// set and the default entity registry.
    pub fn register_builtins(&mut self, strings: &StringPool) {
        let scalars = [
            ("integer", TypeId::Integer),
            ("real", TypeId::Real),
            ("boolean", TypeId::Boolean),
            ("string", TypeId::String),
        ];

        let mut guard = strings.lock();
        let id_param = guard.pool("id");
        let value_param = guard.pool("value");

        for (name, ty) in scalars {
            let handle = guard.pool(name);
            self.constructor_helpers
                .insert(handle, ctexec::construct_variable);

            let mut signature = FunctionSignature::new(ty);
            signature.add_parameter(id_param, TypeId::Identifier, false);
            signature.add_parameter(value_param, ty, false);
            self.function_signatures.insert(handle, signature);
        }

        let arithmetic = [
            (TypeId::Integer, TypeId::Integer),
            (TypeId::Real, TypeId::Real),
        ];
        for op in ["+", "-", "*", "/"] {
            let handle = guard.pool(op);
            let overloads = self.operator_signatures.entry(handle).or_default();
            for (operand, result) in arithmetic {
                overloads.push(OperatorSignature {
                    operands: vec![operand, operand],
                    return_type: result,
                });
            }
        }

        for op in ["==", "!="] {
            let handle = guard.pool(op);
            let overloads = self.operator_signatures.entry(handle).or_default();
            for operand in [TypeId::Integer, TypeId::Real, TypeId::Boolean] {
                overloads.push(OperatorSignature {
                    operands: vec![operand, operand],
                    return_type: TypeId::Boolean,
                });
            }
        }

        for op in ["<", ">", "<=", ">="] {
            let handle = guard.pool(op);
            let overloads = self.operator_signatures.entry(handle).or_default();
            for operand in [TypeId::Integer, TypeId::Real] {
                overloads.push(OperatorSignature {
                    operands: vec![operand, operand],
                    return_type: TypeId::Boolean,
                });
            }
        }

        // Unary forms.
        self.operator_signatures
            .entry(guard.pool("!"))
            .or_default()
            .push(OperatorSignature {
                operands: vec![TypeId::Boolean],
                return_type: TypeId::Boolean,
            });
        let negate = guard.pool("-");
        let negate_overloads = self.operator_signatures.entry(negate).or_default();
        negate_overloads.push(OperatorSignature {
            operands: vec![TypeId::Integer],
            return_type: TypeId::Integer,
        });
        negate_overloads.push(OperatorSignature {
            operands: vec![TypeId::Real],
            return_type: TypeId::Real,
        });

        self.tag_helpers.insert(guard.pool("external"), |_, _| None);
        drop(guard);

        for entity in ["if", "elseif", "else", "while", "do"] {
            self.register_entity(strings, entity);
        }
    }

    /// Register an entity name, allocating its dispatch tag.
    pub fn register_entity(&mut self, strings: &StringPool, name: &str) -> EntityTag {
        let handle = strings.pool(name);
        if let Some(existing) = self.entity_registry.get(&handle) {
            return *existing;
        }

        self.next_entity_tag += 1;
        let tag = EntityTag(self.next_entity_tag);
        self.entity_registry.insert(handle, tag);
        tag
    }

    pub fn entity_tag(&self, name: StringHandle) -> Option<EntityTag> {
        self.entity_registry.get(&name).copied()
    }

    pub fn register_tag_helper(&mut self, strings: &StringPool, name: &str, helper: TagHelper) {
        self.tag_helpers.insert(strings.pool(name), helper);
    }

    // ---- diagnostic locator --------------------------------------------

    /// 1-based line of the identifier within the session's source.
    pub fn find_line(&self, ident: &Ident<'_>) -> usize {
        let offset = ident.offset.min(self.source.len());
        self.source[..offset].matches('\n').count() + 1
    }

    /// 1-based column of the identifier within its line.
    pub fn find_column(&self, ident: &Ident<'_>) -> usize {
        let offset = ident.offset.min(self.source.len());
        match self.source[..offset].rfind('\n') {
            Some(newline) => offset - newline,
            None => offset + 1,
        }
    }

    /// The source name diagnostics should carry.
    pub fn find_source(&self, _ident: &Ident<'_>) -> &str {
        &self.source_name
    }

    pub fn locate(&self, ident: &Ident<'_>) -> SourceSite {
        SourceSite {
            source: self.find_source(ident).to_string(),
            line: self.find_line(ident),
            column: self.find_column(ident),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_reports_line_and_column() {
        let source = "first\nsecond line\nthird";
        let session = CompileSession::new(source, "demo.epoch");

        let offset = source.find("second").unwrap();
        let ident = Ident::new(&source[offset..offset + 6], offset);
        assert_eq!(session.find_line(&ident), 2);
        assert_eq!(session.find_column(&ident), 1);
        assert_eq!(session.find_source(&ident), "demo.epoch");

        let offset = source.find("line").unwrap();
        let ident = Ident::new(&source[offset..offset + 4], offset);
        assert_eq!(session.find_line(&ident), 2);
        assert_eq!(session.find_column(&ident), 8);
    }

    #[test]
    fn locator_clamps_out_of_range_offsets() {
        let session = CompileSession::new("tiny", "demo.epoch");
        let ident = Ident::new("synthetic", 9999);
        assert_eq!(session.find_line(&ident), 1);
    }

    #[test]
    fn builtins_register_constructors_operators_and_entities() {
        let pool = StringPool::new();
        let mut session = CompileSession::new("", "demo.epoch");
        session.register_builtins(&pool);

        assert!(session
            .constructor_helpers
            .contains_key(&pool.pool("integer")));
        assert!(session.function_signatures.contains_key(&pool.pool("real")));
        assert!(session.operator_signatures.contains_key(&pool.pool("+")));
        assert!(session.entity_tag(pool.pool("if")).is_some());
        assert!(session.entity_tag(pool.pool("unless")).is_none());
    }

    #[test]
    fn entity_tags_are_stable_per_name() {
        let pool = StringPool::new();
        let mut session = CompileSession::new("", "demo.epoch");

        let first = session.register_entity(&pool, "match");
        let second = session.register_entity(&pool, "match");
        assert_eq!(first, second);
    }
}
