//! The IR root object.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::CompileErrors;
use crate::ir::{
    IrCodeBlock, IrFunction, IrStructure, ScopeDescription, ScopeRef, TypeId,
};
use crate::pool::{StringHandle, StringPool};
use crate::semantics::{ctexec, inference, validate};
use crate::session::CompileSession;

/// The lowered program: owns every IR sub-entity plus the global scope,
/// and fronts the string pool for the rest of the IR.
pub struct IrProgram<'p> {
    strings: &'p StringPool,
    structures: IndexMap<StringHandle, IrStructure>,
    functions: IndexMap<StringHandle, IrFunction>,
    overload_sets: IndexMap<StringHandle, Vec<StringHandle>>,
    pub global_blocks: Vec<IrCodeBlock>,
    global_scope: ScopeRef,
    type_table: HashMap<StringHandle, TypeId>,
    anonymous_params: u32,
    lexical_scopes: u32,
}

impl<'p> IrProgram<'p> {
    pub fn new(strings: &'p StringPool) -> Self {
        let mut type_table = HashMap::new();
        {
            let mut guard = strings.lock();
            type_table.insert(guard.pool("integer"), TypeId::Integer);
            type_table.insert(guard.pool("real"), TypeId::Real);
            type_table.insert(guard.pool("boolean"), TypeId::Boolean);
            type_table.insert(guard.pool("string"), TypeId::String);
        }

        IrProgram {
            strings,
            structures: IndexMap::new(),
            functions: IndexMap::new(),
            overload_sets: IndexMap::new(),
            global_blocks: Vec::new(),
            global_scope: ScopeDescription::new().into_ref(),
            type_table,
            anonymous_params: 0,
            lexical_scopes: 0,
        }
    }

    pub fn strings(&self) -> &'p StringPool {
        self.strings
    }

    /// Intern `text` in the shared pool; idempotent per content.
    pub fn intern(&self, text: &str) -> StringHandle {
        self.strings.pool(text)
    }

    pub fn string(&self, handle: StringHandle) -> Option<Arc<str>> {
        self.strings.get(handle)
    }

    pub fn global_scope(&self) -> ScopeRef {
        self.global_scope.clone()
    }

    // ---- structures ----------------------------------------------------

    pub fn add_structure(&mut self, name: StringHandle, structure: IrStructure) {
        self.structures.insert(name, structure);
    }

    pub fn structures(&self) -> &IndexMap<StringHandle, IrStructure> {
        &self.structures
    }

    pub fn structure(&self, name: StringHandle) -> Option<&IrStructure> {
        self.structures.get(&name)
    }

    /// Make `name` resolvable as a structure type.
    pub fn register_structure_type(&mut self, name: StringHandle) {
        self.type_table.insert(name, TypeId::Structure(name));
    }

    /// Resolve an interned type name; `Error` when unknown.
    pub fn lookup_type(&self, name: StringHandle) -> TypeId {
        self.type_table
            .get(&name)
            .copied()
            .unwrap_or(TypeId::Error)
    }

    // ---- functions and overloads ---------------------------------------

    /// Allocate the overload handle for one more definition of
    /// `base_name`. The first overload keeps the base name itself;
    /// subsequent ones get generated names that cannot collide with any
    /// source-level identifier.
    pub fn create_function_overload(&mut self, base_name: &str) -> StringHandle {
        let base = self.strings.pool(base_name);
        let set = self.overload_sets.entry(base).or_default();
        if set.is_empty() {
            set.push(base);
            return base;
        }

        let mangled = format!("{base_name}@@overload@{}", set.len());
        let handle = self.strings.pool(&mangled);
        set.push(handle);
        handle
    }

    pub fn add_function(&mut self, overload: StringHandle, function: IrFunction) {
        self.functions.insert(overload, function);
    }

    pub fn functions(&self) -> &IndexMap<StringHandle, IrFunction> {
        &self.functions
    }

    pub fn function(&self, overload: StringHandle) -> Option<&IrFunction> {
        self.functions.get(&overload)
    }

    /// All overload handles registered for a base name.
    pub fn overloads_of(&self, base: StringHandle) -> &[StringHandle] {
        self.overload_sets
            .get(&base)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn overload_sets(&self) -> &IndexMap<StringHandle, Vec<StringHandle>> {
        &self.overload_sets
    }

    // ---- blocks and generated names ------------------------------------

    pub fn add_global_code_block(&mut self, block: IrCodeBlock) {
        self.global_blocks.push(block);
    }

    /// Name for a pattern-matched parameter; the `@@` infix keeps it out
    /// of the source identifier space.
    pub fn allocate_anonymous_param_name(&mut self) -> StringHandle {
        self.anonymous_params += 1;
        self.strings
            .pool_fast(&format!("@@anonparam@{}", self.anonymous_params))
    }

    /// Assign the block its stable scope name for codegen bookkeeping.
    pub fn allocate_lexical_scope_name(&mut self, block: &mut IrCodeBlock) {
        self.lexical_scopes += 1;
        block.scope_name = self
            .strings
            .pool_fast(&format!("@@scope@{}", self.lexical_scopes));
    }

    // ---- phases --------------------------------------------------------

    /// Phase 1: run registered constructor helpers so variable-definition
    /// statements populate their lexical scopes.
    pub fn compile_time_code_execution(
        &self,
        session: &CompileSession<'_>,
        errors: &mut CompileErrors,
    ) -> bool {
        ctexec::execute(self, session, errors)
    }

    /// Phase 2: resolve every atom's type and every statement's overload.
    pub fn type_inference(&self, session: &CompileSession<'_>, errors: &mut CompileErrors) -> bool {
        inference::infer(self, session, errors)
    }

    /// Phase 3: independent validation predicates over the decorated IR.
    pub fn validate(&self, session: &CompileSession<'_>, errors: &mut CompileErrors) -> bool {
        validate::validate(self, session, errors)
    }
}
