//! The semantic validation pass.
//!
//! This module lowers a parsed AST into the typed IR and then runs the
//! three analysis phases over it. The lowering is a single traverser
//! action pair driven by [`crate::traverse::Traverser`]:
//!
//! - On entry to a node the pass pushes a [`State`] and usually
//!   allocates an in-flight IR object onto the stack matching the node
//!   kind.
//! - On exit it pops both and attaches the finished IR object to its
//!   parent, chosen by inspecting the newly exposed top of the state
//!   stack. A statement under an expression component becomes an atom;
//!   the same statement under a code block becomes a block entry, and so
//!   on.
//!
//! The in-flight stacks are strongly typed on purpose: a state mismatch
//! that would corrupt a shared "current object" pointer instead shows up
//! here as an empty typed stack, which is reported as a fatal internal
//! error ("invalid parse state").
//!
//! After lowering, the phases run in order and each returns a boolean:
//!
//! 1. [`ctexec`] — compile-time code execution; constructor helpers
//!    populate the lexical scopes.
//! 2. [`inference`] — type inference; every atom, expression and
//!    statement gets its type slot filled.
//! 3. [`validate`] — independent predicates over the decorated IR.
//!
//! Any phase failure stops the pipeline; no partial IR escapes.

pub(crate) mod ctexec;
pub(crate) mod inference;
mod state;
pub(crate) mod validate;

pub use ctexec::construct_variable;

use log::{debug, trace};

use crate::ast::{
    Assignment, Ast, ChainedEntity, Entity, ExpressionFragment, Function,
    FunctionReferenceSignature, FunctionTag, Ident, Initialization, LiteralToken,
    NamedFunctionParameter, PostfixEntity, PostOperatorStatement, PreOperatorStatement, Program,
    Statement, Structure, StructureMemberFunctionRef, StructureMemberVariable,
};
use crate::errors::{CompileErrors, ErrorKind, Fatal};
use crate::ir::{
    AssignmentChain, ExpressionAtom, IrAssignment, IrCodeBlock, IrCodeBlockEntry, IrEntity,
    IrExpression, IrFunction, IrFunctionParam, IrFunctionTag, IrInitialization, IrParenthetical,
    IrPostOpStatement, IrPreOpStatement, IrProgram, IrStatement, IrStructure, IrStructureMember,
    IrStructureMemberFuncRef, IrStructureMemberVariable, ScopeDescription, TagArgument, TypeId,
    VariableOrigin,
};
use crate::pool::{StringHandle, StringPool};
use crate::session::{CompileSession, FunctionSignature};
use crate::traverse::{AstActions, AstNodeRef, Marker, Traverser, TraverseResult};

use self::state::State;

/// In-flight function reference signature (either a higher-order
/// function parameter or a structure member); its parameter types are
/// collected through the signature marker states.
struct FuncRefBuilder {
    name: StringHandle,
    param_types: Vec<StringHandle>,
    return_type: Option<StringHandle>,
}

/// Result of one full pass over a program.
pub struct PassOutcome<'p> {
    /// The lowered program; `None` when lowering or any phase failed.
    pub program: Option<IrProgram<'p>>,
    /// Everything the pass had to say about the input.
    pub errors: CompileErrors,
}

/// The stateful AST→IR lowering action.
pub struct SemanticPass<'p, 'sess, 'src> {
    strings: &'p StringPool,
    session: &'sess mut CompileSession<'src>,
    program: Option<IrProgram<'p>>,

    states: Vec<State>,
    in_function_return: bool,
    return_marker_exprs: usize,
    return_marker_inits: usize,

    expressions: Vec<IrExpression>,
    statements: Vec<IrStatement>,
    preops: Vec<IrPreOpStatement>,
    postops: Vec<IrPostOpStatement>,
    assignments: Vec<IrAssignment>,
    initializations: Vec<IrInitialization>,
    code_blocks: Vec<IrCodeBlock>,
    entities: Vec<IrEntity>,
    chained_entities: Vec<IrEntity>,
    postfix_entities: Vec<IrEntity>,
    functions: Vec<IrFunction>,
    structures: Vec<IrStructure>,
    tags: Vec<IrFunctionTag>,
    funcref_builders: Vec<FuncRefBuilder>,
    structure_funcrefs: Vec<FuncRefBuilder>,

    pub errors: CompileErrors,
}

impl<'p, 'sess, 'src> SemanticPass<'p, 'sess, 'src> {
    pub fn new(strings: &'p StringPool, session: &'sess mut CompileSession<'src>) -> Self {
        SemanticPass {
            strings,
            session,
            program: None,
            states: vec![State::Unknown],
            in_function_return: false,
            return_marker_exprs: 0,
            return_marker_inits: 0,
            expressions: Vec::new(),
            statements: Vec::new(),
            preops: Vec::new(),
            postops: Vec::new(),
            assignments: Vec::new(),
            initializations: Vec::new(),
            code_blocks: Vec::new(),
            entities: Vec::new(),
            chained_entities: Vec::new(),
            postfix_entities: Vec::new(),
            functions: Vec::new(),
            structures: Vec::new(),
            tags: Vec::new(),
            funcref_builders: Vec::new(),
            structure_funcrefs: Vec::new(),
            errors: CompileErrors::new(),
        }
    }

    /// Drive the traversal, converting `program` into the in-flight IR.
    pub fn lower(&mut self, ast: &Ast<'src>, program: &Program<'src>) -> Result<(), Fatal> {
        debug!("semantic pass: lowering AST to IR");
        Traverser::new(ast).traverse(program, self)
    }

    /// Phase 1: compile-time code execution.
    pub fn compile_time_code_execution(&mut self) -> bool {
        let Some(program) = self.program.as_ref() else {
            return false;
        };
        program.compile_time_code_execution(self.session, &mut self.errors)
    }

    /// Phase 2: type inference.
    pub fn type_inference(&mut self) -> bool {
        let Some(program) = self.program.as_ref() else {
            return false;
        };
        program.type_inference(self.session, &mut self.errors)
    }

    /// Phase 3: validation.
    pub fn validate(&mut self) -> bool {
        let Some(program) = self.program.as_ref() else {
            return false;
        };
        program.validate(self.session, &mut self.errors)
    }

    /// Hand the finished IR to the caller.
    pub fn detach_program(&mut self) -> Option<IrProgram<'p>> {
        self.program.take()
    }

    pub fn take_errors(&mut self) -> CompileErrors {
        std::mem::take(&mut self.errors)
    }

    // ---- state stack ---------------------------------------------------

    fn state(&self) -> State {
        self.states.last().copied().unwrap_or(State::Unknown)
    }

    fn push_state(&mut self, state: State) {
        self.states.push(state);
    }

    fn pop_state(&mut self) -> Result<(), Fatal> {
        if self.states.len() <= 1 {
            return Err(Fatal::internal("state stack underflow"));
        }
        self.states.pop();
        Ok(())
    }

    fn invalid_state(context: &str) -> Fatal {
        Fatal::internal(format!("invalid parse state ({context})"))
    }

    // ---- literal classification ----------------------------------------

    /// Classify an identifier's text as a literal atom or a variable
    /// reference, per the lazy-literal discipline: the parser leaves
    /// literals as raw identifier spans and the lowering decides.
    fn classify_atom(&mut self, ident: &Ident<'src>) -> ExpressionAtom {
        let text = ident.text;

        if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            let body = &text[1..text.len() - 1];
            return match unescape::unescape(body) {
                Some(value) => ExpressionAtom::LiteralString(self.strings.pool(&value)),
                None => {
                    self.errors.error(
                        ErrorKind::LiteralParseError,
                        format!("invalid string literal {text}"),
                    );
                    ExpressionAtom::LiteralString(StringHandle::NULL)
                }
            };
        }

        if text == "true" {
            return ExpressionAtom::LiteralBoolean(true);
        }
        if text == "false" {
            return ExpressionAtom::LiteralBoolean(false);
        }

        if text.contains('.') {
            return match text.parse::<f32>() {
                Ok(value) => ExpressionAtom::LiteralReal(value),
                Err(_) => {
                    self.errors.error(
                        ErrorKind::LiteralParseError,
                        format!("invalid floating point literal '{text}'"),
                    );
                    ExpressionAtom::LiteralReal(0.0)
                }
            };
        }

        match text.parse::<u32>() {
            Ok(value) => ExpressionAtom::LiteralInteger(value as i32),
            Err(_) => ExpressionAtom::identifier(self.strings.pool(text)),
        }
    }

    fn lower_literal_atom(&mut self, literal: &LiteralToken<'src>) -> Result<ExpressionAtom, Fatal> {
        Ok(match literal {
            LiteralToken::Undefined => {
                return Err(Fatal::internal("undefined literal token in expression"))
            }
            LiteralToken::Integer(value) => ExpressionAtom::LiteralInteger(*value),
            LiteralToken::UnsignedInteger(value) => ExpressionAtom::LiteralInteger(*value as i32),
            LiteralToken::Real(value) => ExpressionAtom::LiteralReal(*value),
            LiteralToken::Str(text) => ExpressionAtom::LiteralString(self.strings.pool(text)),
            LiteralToken::Boolean(value) => ExpressionAtom::LiteralBoolean(*value),
        })
    }

    fn lower_tag_argument(&mut self, literal: &LiteralToken<'src>) -> Result<TagArgument, Fatal> {
        Ok(match literal {
            LiteralToken::Undefined => {
                return Err(Fatal::internal("undefined literal token in function tag"))
            }
            LiteralToken::Integer(value) => TagArgument::Integer(*value),
            LiteralToken::UnsignedInteger(value) => TagArgument::UnsignedInteger(*value),
            LiteralToken::Real(value) => TagArgument::Real(*value),
            LiteralToken::Str(text) => TagArgument::String(self.strings.pool(text)),
            LiteralToken::Boolean(value) => TagArgument::Boolean(*value),
        })
    }

    // ---- node handlers: roots ------------------------------------------

    fn enter_program(&mut self) -> TraverseResult {
        if self.program.is_some() {
            // The parser may produce multiple AST fragments for separate
            // compilation, but they must be merged or submitted as fully
            // separate trees before semantic analysis.
            return Err(Fatal::reentrant());
        }

        self.push_state(State::Program);
        self.program = Some(IrProgram::new(self.strings));
        Ok(())
    }

    fn enter_undefined(&mut self) -> TraverseResult {
        // Undefined nodes are permitted in two situations: empty
        // programs and void function return expressions. Anything else
        // means a partially parsed tree reached the pass.
        if self.in_function_return || self.states.len() <= 1 {
            return Ok(());
        }
        Err(Fatal::internal("undefined AST node in unexpected context"))
    }

    // ---- node handlers: structures -------------------------------------

    fn enter_structure(&mut self) -> TraverseResult {
        self.structures.push(IrStructure::new());
        Ok(())
    }

    fn exit_structure(&mut self, node: &Structure<'src>) -> TraverseResult {
        if self.structures.len() != 1 {
            return Err(Fatal::unsupported(
                "nested structure definitions are not implemented",
            ));
        }
        let Some(structure) = self.structures.pop() else {
            return Err(Self::invalid_state("structure exit"));
        };
        let Some(program) = self.program.as_mut() else {
            return Err(Self::invalid_state("structure outside program"));
        };

        let name = program.intern(node.identifier.text);
        program.register_structure_type(name);

        // Every structure definition doubles as a constructor: register
        // the compile-time helper and the callable signature
        // `S(id, members...)`.
        let mut signature = FunctionSignature::new(TypeId::Structure(name));
        signature.add_parameter(program.intern("id"), TypeId::Identifier, false);
        for (member_name, member) in structure.members() {
            signature.add_parameter(
                *member_name,
                member.type_id(|handle| program.lookup_type(handle)),
                false,
            );
        }

        program.add_structure(name, structure);
        self.session
            .constructor_helpers
            .insert(name, ctexec::construct_variable);
        self.session.function_signatures.insert(name, signature);
        Ok(())
    }

    fn enter_member_variable(&mut self, node: &StructureMemberVariable<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("structure member outside program"));
        };
        let name = program.intern(node.name.text);
        let type_name = program.intern(node.type_name.text);

        let Some(structure) = self.structures.last_mut() else {
            return Err(Fatal::internal(
                "structure member variable outside a structure definition",
            ));
        };
        structure.add_member(
            name,
            IrStructureMember::Variable(IrStructureMemberVariable { type_name }),
        );
        Ok(())
    }

    fn enter_member_funcref(&mut self, node: &StructureMemberFunctionRef<'src>) -> TraverseResult {
        if self.structures.is_empty() {
            return Err(Fatal::internal(
                "structure member function reference outside a structure definition",
            ));
        }
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("structure member outside program"));
        };

        self.structure_funcrefs.push(FuncRefBuilder {
            name: program.intern(node.name.text),
            param_types: Vec::new(),
            return_type: None,
        });
        self.push_state(State::StructureFunction);
        Ok(())
    }

    fn exit_member_funcref(&mut self) -> TraverseResult {
        self.pop_state()?;
        let Some(builder) = self.structure_funcrefs.pop() else {
            return Err(Self::invalid_state("structure function reference exit"));
        };
        let Some(structure) = self.structures.last_mut() else {
            return Err(Self::invalid_state("structure function reference exit"));
        };
        structure.add_member(
            builder.name,
            IrStructureMember::FunctionReference(IrStructureMemberFuncRef {
                param_types: builder.param_types,
                return_type: builder.return_type,
            }),
        );
        Ok(())
    }

    // ---- node handlers: functions --------------------------------------

    fn enter_function(&mut self) -> TraverseResult {
        self.push_state(State::Function);
        self.functions.push(IrFunction::new());
        Ok(())
    }

    fn exit_function(&mut self, node: &Function<'src>) -> TraverseResult {
        self.pop_state()?;

        let Some(mut function) = self.functions.pop() else {
            return Err(Self::invalid_state("function exit"));
        };
        if !self.functions.is_empty() {
            return Err(Fatal::unsupported(
                "nested (inner) functions are not implemented",
            ));
        }
        let Some(program) = self.program.as_mut() else {
            return Err(Self::invalid_state("function outside program"));
        };

        // Tagless functions may omit their body (e.g. externals), but the
        // IR invariant is that every function owns a code block.
        if function.code().is_none() {
            let scope = ScopeDescription::with_parent(program.global_scope()).into_ref();
            function.set_code(IrCodeBlock::new(scope, true));
        }

        let param_names: Vec<StringHandle> = function.parameter_names().collect();
        for name in param_names {
            let Some(param) = function.parameter(name) else {
                continue;
            };
            if !param.is_local_variable() {
                continue;
            }
            let is_reference = param.is_reference();
            let ty = function.parameter_type(name, |handle| program.lookup_type(handle));
            if let Some(code) = function.code() {
                code.add_variable(name, ty, is_reference, VariableOrigin::Parameter);
            }
        }

        let overload = program.create_function_overload(node.name.text);
        program.add_function(overload, function);
        Ok(())
    }

    fn enter_function_parameter(&mut self) -> TraverseResult {
        self.push_state(State::FunctionParam);
        Ok(())
    }

    fn exit_function_parameter(&mut self) -> TraverseResult {
        self.pop_state()
    }

    fn enter_named_parameter(&mut self, node: &NamedFunctionParameter<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("parameter outside program"));
        };
        let name = program.intern(node.name.text);
        let type_name = program.intern(node.type_name.text);

        let Some(function) = self.functions.last_mut() else {
            return Err(Fatal::internal(
                "function parameter outside a function definition",
            ));
        };
        function.add_parameter(
            name,
            IrFunctionParam::Named {
                type_name,
                is_reference: node.is_reference,
            },
        );
        Ok(())
    }

    fn enter_nothing_parameter(&mut self) -> TraverseResult {
        let Some(program) = self.program.as_mut() else {
            return Err(Self::invalid_state("parameter outside program"));
        };
        let name = program.allocate_anonymous_param_name();
        let Some(function) = self.functions.last_mut() else {
            return Err(Fatal::internal(
                "function parameter outside a function definition",
            ));
        };
        function.add_parameter(name, IrFunctionParam::Nothing);
        Ok(())
    }

    fn enter_signature(&mut self, node: &FunctionReferenceSignature<'src>) -> TraverseResult {
        if self.functions.is_empty() {
            return Err(Self::invalid_state("function reference signature"));
        }
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("signature outside program"));
        };

        self.funcref_builders.push(FuncRefBuilder {
            name: program.intern(node.identifier.text),
            param_types: Vec::new(),
            return_type: None,
        });
        self.push_state(State::FunctionSignature);
        Ok(())
    }

    fn exit_signature(&mut self) -> TraverseResult {
        self.pop_state()?;
        let Some(builder) = self.funcref_builders.pop() else {
            return Err(Self::invalid_state("function reference signature exit"));
        };
        let Some(function) = self.functions.last_mut() else {
            return Err(Self::invalid_state("function reference signature exit"));
        };
        function.add_parameter(
            builder.name,
            IrFunctionParam::FunctionRef {
                param_types: builder.param_types,
                return_type: builder.return_type,
            },
        );
        Ok(())
    }

    fn enter_tag(&mut self, node: &FunctionTag<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("function tag outside program"));
        };
        let name = program.intern(node.name.text);
        let site = self.session.locate(&node.name);

        self.push_state(State::FunctionTag);
        self.tags.push(IrFunctionTag {
            name,
            arguments: Vec::new(),
            site: Some(site),
        });
        Ok(())
    }

    fn exit_tag(&mut self) -> TraverseResult {
        self.pop_state()?;
        let Some(tag) = self.tags.pop() else {
            return Err(Self::invalid_state("function tag exit"));
        };
        let Some(function) = self.functions.last_mut() else {
            return Err(Self::invalid_state("function tag outside a function"));
        };
        function.tags.push(tag);
        Ok(())
    }

    // ---- node handlers: blocks -----------------------------------------

    fn enter_code_block(&mut self) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("code block outside program"));
        };

        let (scope, owned) = match self.state() {
            State::Program => (program.global_scope(), false),
            State::Function => (
                ScopeDescription::with_parent(program.global_scope()).into_ref(),
                true,
            ),
            _ => {
                let Some(parent) = self.code_blocks.last() else {
                    return Err(Self::invalid_state("code block without a parent scope"));
                };
                (
                    ScopeDescription::with_parent(parent.scope()).into_ref(),
                    true,
                )
            }
        };

        self.code_blocks.push(IrCodeBlock::new(scope, owned));
        self.push_state(State::CodeBlock);
        Ok(())
    }

    fn exit_code_block(&mut self) -> TraverseResult {
        let Some(mut block) = self.code_blocks.pop() else {
            return Err(Self::invalid_state("code block exit"));
        };
        {
            let Some(program) = self.program.as_mut() else {
                return Err(Self::invalid_state("code block outside program"));
            };
            program.allocate_lexical_scope_name(&mut block);
        }

        self.pop_state()?;
        match self.state() {
            State::CodeBlock => {
                let Some(outer) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("inner block without an outer block"));
                };
                outer.add_entry(IrCodeBlockEntry::Inner(block));
            }
            State::Function => {
                let Some(function) = self.functions.last_mut() else {
                    return Err(Self::invalid_state("function body without a function"));
                };
                function.set_code(block);
            }
            State::Program => {
                let Some(program) = self.program.as_mut() else {
                    return Err(Self::invalid_state("code block outside program"));
                };
                program.add_global_code_block(block);
            }
            State::Entity => {
                let Some(entity) = self.entities.last_mut() else {
                    return Err(Self::invalid_state("entity body without an entity"));
                };
                entity.set_code(block);
            }
            State::ChainedEntity => {
                let Some(entity) = self.chained_entities.last_mut() else {
                    return Err(Self::invalid_state("chained body without an entity"));
                };
                entity.set_code(block);
            }
            State::PostfixEntity => {
                let Some(entity) = self.postfix_entities.last_mut() else {
                    return Err(Self::invalid_state("postfix body without an entity"));
                };
                entity.set_code(block);
            }
            _ => return Err(Self::invalid_state("code block exit")),
        }
        Ok(())
    }

    // ---- node handlers: entities ---------------------------------------

    fn enter_entity(&mut self, node: &Entity<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("entity outside program"));
        };
        let name = program.intern(node.identifier.text);

        let mut entity = IrEntity::new(name);
        entity.tag = self.session.entity_tag(name);
        entity.site = Some(self.session.locate(&node.identifier));

        self.push_state(State::Entity);
        self.entities.push(entity);
        Ok(())
    }

    fn exit_entity(&mut self) -> TraverseResult {
        self.pop_state()?;
        match self.state() {
            State::CodeBlock => {
                let Some(entity) = self.entities.pop() else {
                    return Err(Self::invalid_state("entity exit"));
                };
                let Some(block) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("entity outside a code block"));
                };
                block.add_entry(IrCodeBlockEntry::Entity(entity));
                Ok(())
            }
            _ => Err(Self::invalid_state("entity exit")),
        }
    }

    fn enter_chained_entity(&mut self, node: &ChainedEntity<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("chained entity outside program"));
        };
        let name = program.intern(node.identifier.text);

        let mut entity = IrEntity::new(name);
        entity.tag = self.session.entity_tag(name);
        entity.site = Some(self.session.locate(&node.identifier));

        self.push_state(State::ChainedEntity);
        self.chained_entities.push(entity);
        Ok(())
    }

    fn exit_chained_entity(&mut self) -> TraverseResult {
        self.pop_state()?;
        if self.state() != State::Entity {
            return Err(Self::invalid_state("chained entity exit"));
        }
        let Some(chained) = self.chained_entities.pop() else {
            return Err(Self::invalid_state("chained entity exit"));
        };
        let Some(outer) = self.entities.last_mut() else {
            return Err(Self::invalid_state("chained entity without an outer entity"));
        };
        outer.add_chained(chained);
        Ok(())
    }

    fn enter_postfix_entity(&mut self, node: &PostfixEntity<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("postfix entity outside program"));
        };
        let name = program.intern(node.identifier.text);

        let mut entity = IrEntity::new(name);
        entity.tag = self.session.entity_tag(name);
        entity.site = Some(self.session.locate(&node.identifier));

        self.push_state(State::PostfixEntity);
        self.postfix_entities.push(entity);
        Ok(())
    }

    fn exit_postfix_entity(&mut self, node: &PostfixEntity<'src>) -> TraverseResult {
        self.pop_state()?;
        match self.state() {
            State::CodeBlock => {
                let Some(mut entity) = self.postfix_entities.pop() else {
                    return Err(Self::invalid_state("postfix entity exit"));
                };
                let Some(program) = self.program.as_ref() else {
                    return Err(Self::invalid_state("postfix entity outside program"));
                };
                entity.postfix_name = Some(program.intern(node.postfix_identifier.text));

                let Some(block) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("postfix entity outside a code block"));
                };
                block.add_entry(IrCodeBlockEntry::Entity(entity));
                Ok(())
            }
            _ => Err(Self::invalid_state("postfix entity exit")),
        }
    }

    // ---- node handlers: statements -------------------------------------

    fn enter_statement(&mut self, node: &Statement<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("statement outside program"));
        };
        let name = program.intern(node.identifier.text);
        let site = self.session.locate(&node.identifier);
        self.errors.set_context(site.clone());

        let mut statement = IrStatement::new(name);
        statement.site = Some(site);

        self.push_state(State::Statement);
        self.statements.push(statement);
        Ok(())
    }

    fn exit_statement(&mut self) -> TraverseResult {
        self.pop_state()?;
        let Some(statement) = self.statements.pop() else {
            return Err(Self::invalid_state("statement exit"));
        };

        match self.state() {
            State::ExpressionComponent => {
                let Some(expression) = self.expressions.last_mut() else {
                    return Err(Self::invalid_state("statement atom without an expression"));
                };
                expression.add_atom(ExpressionAtom::Statement(Box::new(statement)));
                Ok(())
            }
            State::CodeBlock => {
                let Some(block) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("statement outside a code block"));
                };
                block.add_entry(IrCodeBlockEntry::Statement(statement));
                Ok(())
            }
            _ => Err(Self::invalid_state("statement exit")),
        }
    }

    fn enter_preop(&mut self, node: &PreOperatorStatement<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("statement outside program"));
        };
        let operator = program.intern(node.operator.text);

        self.push_state(State::PreOpStatement);
        self.preops.push(IrPreOpStatement::new(operator));
        Ok(())
    }

    fn exit_preop(&mut self) -> TraverseResult {
        self.pop_state()?;
        let Some(preop) = self.preops.pop() else {
            return Err(Self::invalid_state("pre-operator statement exit"));
        };

        match self.state() {
            State::ExpressionComponent => {
                let Some(expression) = self.expressions.last_mut() else {
                    return Err(Self::invalid_state("parenthetical without an expression"));
                };
                expression.add_atom(ExpressionAtom::Parenthetical(IrParenthetical::PreOp(
                    Box::new(preop),
                )));
                Ok(())
            }
            State::CodeBlock => {
                let Some(block) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("statement outside a code block"));
                };
                block.add_entry(IrCodeBlockEntry::PreOp(preop));
                Ok(())
            }
            _ => Err(Self::invalid_state("pre-operator statement exit")),
        }
    }

    fn enter_postop(&mut self, node: &PostOperatorStatement<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("statement outside program"));
        };
        let operator = program.intern(node.operator.text);

        self.push_state(State::PostOpStatement);
        self.postops.push(IrPostOpStatement::new(operator));
        Ok(())
    }

    fn exit_postop(&mut self) -> TraverseResult {
        self.pop_state()?;
        let Some(postop) = self.postops.pop() else {
            return Err(Self::invalid_state("post-operator statement exit"));
        };

        match self.state() {
            State::ExpressionComponent => {
                let Some(expression) = self.expressions.last_mut() else {
                    return Err(Self::invalid_state("parenthetical without an expression"));
                };
                expression.add_atom(ExpressionAtom::Parenthetical(IrParenthetical::PostOp(
                    Box::new(postop),
                )));
                Ok(())
            }
            State::CodeBlock => {
                let Some(block) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("statement outside a code block"));
                };
                block.add_entry(IrCodeBlockEntry::PostOp(postop));
                Ok(())
            }
            _ => Err(Self::invalid_state("post-operator statement exit")),
        }
    }

    // ---- node handlers: assignments and initializations ----------------

    fn enter_assignment(&mut self, node: &Assignment<'src>) -> TraverseResult {
        match self.state() {
            State::CodeBlock | State::Assignment => {}
            _ => return Err(Self::invalid_state("assignment entry")),
        }
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("assignment outside program"));
        };
        let operator = program.intern(node.operator.text);

        self.push_state(State::Assignment);
        self.assignments.push(IrAssignment::new(operator));
        Ok(())
    }

    fn exit_assignment(&mut self) -> TraverseResult {
        self.pop_state()?;
        match self.state() {
            State::CodeBlock => {
                let Some(assignment) = self.assignments.pop() else {
                    return Err(Self::invalid_state("assignment exit"));
                };
                let Some(block) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("assignment outside a code block"));
                };
                block.add_entry(IrCodeBlockEntry::Assignment(assignment));
                Ok(())
            }
            State::Assignment => {
                // Chained assignment: the inner link becomes the RHS of
                // the enclosing assignment.
                let Some(inner) = self.assignments.pop() else {
                    return Err(Self::invalid_state("assignment exit"));
                };
                let Some(outer) = self.assignments.last_mut() else {
                    return Err(Self::invalid_state("assignment chain without an outer link"));
                };
                outer.set_rhs(AssignmentChain::Assignment(Box::new(inner)));
                Ok(())
            }
            _ => Err(Self::invalid_state("assignment exit")),
        }
    }

    fn enter_initialization(&mut self, node: &Initialization<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("initialization outside program"));
        };
        let type_name = program.intern(node.type_specifier.text);
        let variable = program.intern(node.lhs.text);
        let site = self.session.locate(&node.lhs);
        self.errors.set_context(site.clone());

        let mut initialization = IrInitialization::new(type_name, variable);
        initialization.site = Some(site);

        self.push_state(State::Initialization);
        self.initializations.push(initialization);
        Ok(())
    }

    fn exit_initialization(&mut self) -> TraverseResult {
        self.pop_state()?;
        match self.state() {
            State::CodeBlock => {
                let Some(initialization) = self.initializations.pop() else {
                    return Err(Self::invalid_state("initialization exit"));
                };
                let Some(block) = self.code_blocks.last_mut() else {
                    return Err(Self::invalid_state("initialization outside a code block"));
                };
                block.add_entry(IrCodeBlockEntry::Initialization(initialization));
                Ok(())
            }
            // Left on its stack; the return-expression marker consumes it.
            State::FunctionReturn => Ok(()),
            _ => Err(Self::invalid_state("initialization exit")),
        }
    }

    // ---- node handlers: expressions ------------------------------------

    fn enter_expression(&mut self) -> TraverseResult {
        self.push_state(State::Expression);
        self.expressions.push(IrExpression::new());
        Ok(())
    }

    fn exit_expression(&mut self) -> TraverseResult {
        self.pop_state()?;
        match self.state() {
            State::Statement => {
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(statement) = self.statements.last_mut() else {
                    return Err(Self::invalid_state("statement parameter without a statement"));
                };
                statement.add_parameter(expression);
                Ok(())
            }
            State::Assignment => {
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(assignment) = self.assignments.last_mut() else {
                    return Err(Self::invalid_state("assignment RHS without an assignment"));
                };
                assignment.set_rhs(AssignmentChain::Expression(expression));
                Ok(())
            }
            State::Initialization => {
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(initialization) = self.initializations.last_mut() else {
                    return Err(Self::invalid_state("constructor argument without an initialization"));
                };
                initialization.arguments.push(expression);
                Ok(())
            }
            State::Entity => {
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(entity) = self.entities.last_mut() else {
                    return Err(Self::invalid_state("entity parameter without an entity"));
                };
                entity.add_parameter(expression);
                Ok(())
            }
            State::ChainedEntity => {
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(entity) = self.chained_entities.last_mut() else {
                    return Err(Self::invalid_state("entity parameter without an entity"));
                };
                entity.add_parameter(expression);
                Ok(())
            }
            State::PostfixEntity => {
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(entity) = self.postfix_entities.last_mut() else {
                    return Err(Self::invalid_state("entity parameter without an entity"));
                };
                entity.add_parameter(expression);
                Ok(())
            }
            // Left on its stack; the return-expression marker consumes it.
            State::FunctionReturn => Ok(()),
            State::FunctionParam => {
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(program) = self.program.as_mut() else {
                    return Err(Self::invalid_state("parameter outside program"));
                };
                let name = program.allocate_anonymous_param_name();
                let Some(function) = self.functions.last_mut() else {
                    return Err(Self::invalid_state("patterned parameter without a function"));
                };
                function.add_parameter(name, IrFunctionParam::Patterned(expression));
                Ok(())
            }
            State::ExpressionComponent => {
                // A parenthesized sub-expression becomes a single atom of
                // the enclosing expression.
                let Some(expression) = self.expressions.pop() else {
                    return Err(Self::invalid_state("expression exit"));
                };
                let Some(outer) = self.expressions.last_mut() else {
                    return Err(Self::invalid_state("parenthetical without an outer expression"));
                };
                outer.add_atom(ExpressionAtom::Parenthetical(IrParenthetical::Expression(
                    Box::new(expression),
                )));
                Ok(())
            }
            _ => Err(Self::invalid_state("expression exit")),
        }
    }

    fn enter_fragment(&mut self, node: &ExpressionFragment<'src>) -> TraverseResult {
        let Some(program) = self.program.as_ref() else {
            return Err(Self::invalid_state("expression fragment outside program"));
        };
        let operator = program.intern(node.operator.text);
        let member_access = node.operator.text == ".";

        let Some(expression) = self.expressions.last_mut() else {
            return Err(Self::invalid_state("expression fragment without an expression"));
        };
        expression.add_atom(ExpressionAtom::operator(operator, member_access));

        self.push_state(State::ExpressionFragment);
        Ok(())
    }

    // ---- node handlers: identifiers ------------------------------------

    fn enter_identifier(&mut self, ident: &Ident<'src>) -> TraverseResult {
        self.errors.set_context(self.session.locate(ident));

        match self.state() {
            State::ExpressionComponent | State::ExpressionFragment => {
                let atom = self.classify_atom(ident);
                let Some(expression) = self.expressions.last_mut() else {
                    return Err(Self::invalid_state("identifier without an expression"));
                };
                expression.add_atom(atom);
                Ok(())
            }
            State::ExpressionComponentPrefixes => {
                // Unary prefixes are operators applied to the upcoming
                // component term.
                let handle = self.strings.pool(ident.text);
                let Some(expression) = self.expressions.last_mut() else {
                    return Err(Self::invalid_state("prefix without an expression"));
                };
                expression.add_atom(ExpressionAtom::operator(handle, false));
                Ok(())
            }
            State::Function => {
                let handle = self.strings.pool(ident.text);
                let Some(function) = self.functions.last_mut() else {
                    return Err(Self::invalid_state("function name without a function"));
                };
                function.set_name(handle);
                Ok(())
            }
            State::Assignment => {
                // Left-hand side identifiers, including member access
                // chains; the RHS always arrives wrapped in an
                // expression or a nested assignment.
                let handle = self.strings.pool(ident.text);
                let Some(assignment) = self.assignments.last_mut() else {
                    return Err(Self::invalid_state("assignment target without an assignment"));
                };
                assignment.lhs.push(handle);
                Ok(())
            }
            State::PreOpStatement => {
                let handle = self.strings.pool(ident.text);
                let Some(preop) = self.preops.last_mut() else {
                    return Err(Self::invalid_state("operand without a statement"));
                };
                preop.operand.push(handle);
                Ok(())
            }
            State::PostOpStatement => {
                let handle = self.strings.pool(ident.text);
                let Some(postop) = self.postops.last_mut() else {
                    return Err(Self::invalid_state("operand without a statement"));
                };
                postop.operand.push(handle);
                Ok(())
            }
            State::FunctionSignatureParams => {
                let handle = self.strings.pool(ident.text);
                let Some(builder) = self.funcref_builders.last_mut() else {
                    return Err(Self::invalid_state("signature parameter without a signature"));
                };
                builder.param_types.push(handle);
                Ok(())
            }
            State::FunctionSignatureReturn => {
                let handle = self.strings.pool(ident.text);
                let Some(builder) = self.funcref_builders.last_mut() else {
                    return Err(Self::invalid_state("signature return without a signature"));
                };
                builder.return_type = Some(handle);
                Ok(())
            }
            State::StructureFunctionParams => {
                let handle = self.strings.pool(ident.text);
                let Some(builder) = self.structure_funcrefs.last_mut() else {
                    return Err(Self::invalid_state("signature parameter without a signature"));
                };
                builder.param_types.push(handle);
                Ok(())
            }
            State::StructureFunctionReturn => {
                let handle = self.strings.pool(ident.text);
                let Some(builder) = self.structure_funcrefs.last_mut() else {
                    return Err(Self::invalid_state("signature return without a signature"));
                };
                builder.return_type = Some(handle);
                Ok(())
            }
            // Chained entity identifiers and postfix closers are read
            // from the node itself at entry/exit.
            State::ChainedEntity | State::PostfixEntity => Ok(()),
            _ => Err(Self::invalid_state("identifier")),
        }
    }

    fn enter_literal(&mut self, literal: &LiteralToken<'src>) -> TraverseResult {
        match self.state() {
            State::FunctionTag => {
                let argument = self.lower_tag_argument(literal)?;
                let Some(tag) = self.tags.last_mut() else {
                    return Err(Self::invalid_state("tag argument without a tag"));
                };
                tag.arguments.push(argument);
                Ok(())
            }
            State::ExpressionComponent | State::ExpressionFragment => {
                let atom = self.lower_literal_atom(literal)?;
                let Some(expression) = self.expressions.last_mut() else {
                    return Err(Self::invalid_state("literal without an expression"));
                };
                expression.add_atom(atom);
                Ok(())
            }
            _ => Err(Self::invalid_state("literal token")),
        }
    }

    // ---- markers -------------------------------------------------------

    fn enter_marker(&mut self, marker: Marker) -> TraverseResult {
        match marker {
            Marker::FunctionReturnExpression => {
                self.push_state(State::FunctionReturn);
                self.in_function_return = true;
                self.return_marker_exprs = self.expressions.len();
                self.return_marker_inits = self.initializations.len();
            }
            Marker::ExpressionComponentPrefixes => {
                self.push_state(State::ExpressionComponentPrefixes)
            }
            Marker::FunctionSignatureParams => self.push_state(State::FunctionSignatureParams),
            Marker::FunctionSignatureReturn => self.push_state(State::FunctionSignatureReturn),
            Marker::StructureFunctionParams => self.push_state(State::StructureFunctionParams),
            Marker::StructureFunctionReturn => self.push_state(State::StructureFunctionReturn),
        }
        Ok(())
    }

    fn exit_marker(&mut self, marker: Marker) -> TraverseResult {
        match marker {
            Marker::FunctionReturnExpression => {
                let Some(function) = self.functions.last_mut() else {
                    return Err(Self::invalid_state("function return without a function"));
                };

                // Whatever the marker produced is still on its stack:
                // an expression, an initialization, or nothing (void).
                if self.expressions.len() > self.return_marker_exprs {
                    function.return_expression = self.expressions.pop();
                } else if self.initializations.len() > self.return_marker_inits {
                    function.return_initialization = self.initializations.pop();
                }

                self.pop_state()?;
                self.in_function_return = false;
                Ok(())
            }
            _ => self.pop_state(),
        }
    }
}

impl<'p, 'sess, 'src> AstActions<'src> for SemanticPass<'p, 'sess, 'src> {
    fn enter(&mut self, node: AstNodeRef<'_, 'src>) -> TraverseResult {
        trace!("enter {node:?}");
        match node {
            AstNodeRef::Undefined => self.enter_undefined(),
            AstNodeRef::Program(_) => self.enter_program(),
            AstNodeRef::Structure(_) => self.enter_structure(),
            AstNodeRef::StructureMemberVariable(member) => self.enter_member_variable(member),
            AstNodeRef::StructureMemberFunctionRef(member) => self.enter_member_funcref(member),
            AstNodeRef::Function(_) => self.enter_function(),
            AstNodeRef::FunctionParameter(_) => self.enter_function_parameter(),
            AstNodeRef::NamedFunctionParameter(param) => self.enter_named_parameter(param),
            AstNodeRef::FunctionReferenceSignature(signature) => self.enter_signature(signature),
            AstNodeRef::FunctionTag(tag) => self.enter_tag(tag),
            AstNodeRef::Nothing => self.enter_nothing_parameter(),
            AstNodeRef::Identifier(ident) => self.enter_identifier(ident),
            AstNodeRef::Literal(literal) => self.enter_literal(literal),
            AstNodeRef::Expression(_) => self.enter_expression(),
            AstNodeRef::ExpressionComponent(_) => {
                self.push_state(State::ExpressionComponent);
                Ok(())
            }
            AstNodeRef::ExpressionFragment(fragment) => self.enter_fragment(fragment),
            AstNodeRef::Statement(statement) => self.enter_statement(statement),
            AstNodeRef::PreOperatorStatement(statement) => self.enter_preop(statement),
            AstNodeRef::PostOperatorStatement(statement) => self.enter_postop(statement),
            AstNodeRef::Assignment(assignment) => self.enter_assignment(assignment),
            AstNodeRef::Initialization(initialization) => {
                self.enter_initialization(initialization)
            }
            AstNodeRef::CodeBlock(_) => self.enter_code_block(),
            AstNodeRef::Entity(entity) => self.enter_entity(entity),
            AstNodeRef::PostfixEntity(entity) => self.enter_postfix_entity(entity),
            AstNodeRef::ChainedEntity(entity) => self.enter_chained_entity(entity),
            AstNodeRef::Marker(marker) => self.enter_marker(marker),
        }
    }

    fn leave(&mut self, node: AstNodeRef<'_, 'src>) -> TraverseResult {
        trace!("leave {node:?}");
        match node {
            AstNodeRef::Program(_) => self.pop_state(),
            AstNodeRef::Structure(structure) => self.exit_structure(structure),
            AstNodeRef::StructureMemberFunctionRef(_) => self.exit_member_funcref(),
            AstNodeRef::Function(function) => self.exit_function(function),
            AstNodeRef::FunctionParameter(_) => self.exit_function_parameter(),
            AstNodeRef::FunctionReferenceSignature(_) => self.exit_signature(),
            AstNodeRef::FunctionTag(_) => self.exit_tag(),
            AstNodeRef::Expression(_) => self.exit_expression(),
            AstNodeRef::ExpressionComponent(_) => self.pop_state(),
            AstNodeRef::ExpressionFragment(_) => self.pop_state(),
            AstNodeRef::Statement(_) => self.exit_statement(),
            AstNodeRef::PreOperatorStatement(_) => self.exit_preop(),
            AstNodeRef::PostOperatorStatement(_) => self.exit_postop(),
            AstNodeRef::Assignment(_) => self.exit_assignment(),
            AstNodeRef::Initialization(_) => self.exit_initialization(),
            AstNodeRef::CodeBlock(_) => self.exit_code_block(),
            AstNodeRef::Entity(_) => self.exit_entity(),
            AstNodeRef::PostfixEntity(entity) => self.exit_postfix_entity(entity),
            AstNodeRef::ChainedEntity(_) => self.exit_chained_entity(),
            AstNodeRef::Marker(marker) => self.exit_marker(marker),
            // Leaf nodes need no exit bookkeeping.
            AstNodeRef::Undefined
            | AstNodeRef::StructureMemberVariable(_)
            | AstNodeRef::NamedFunctionParameter(_)
            | AstNodeRef::Nothing
            | AstNodeRef::Identifier(_)
            | AstNodeRef::Literal(_) => Ok(()),
        }
    }
}

/// Run the complete semantic pass: lowering plus the three phases.
///
/// Fatal conditions surface as `Err`; everything else lands in the
/// returned [`PassOutcome`], whose `program` is `None` whenever a phase
/// rejected the input.
pub fn validate_semantics<'p, 'src>(
    ast: &Ast<'src>,
    program: &Program<'src>,
    strings: &'p StringPool,
    session: &mut CompileSession<'src>,
) -> Result<PassOutcome<'p>, Fatal> {
    let mut pass = SemanticPass::new(strings, session);
    pass.lower(ast, program)?;

    if pass.errors.has_errors() {
        debug!("semantic pass: lowering produced errors; skipping phases");
        return Ok(PassOutcome {
            program: None,
            errors: pass.take_errors(),
        });
    }

    debug!("semantic pass: running compile-time code execution");
    if !pass.compile_time_code_execution() {
        return Ok(PassOutcome {
            program: None,
            errors: pass.take_errors(),
        });
    }

    debug!("semantic pass: running type inference");
    if !pass.type_inference() {
        return Ok(PassOutcome {
            program: None,
            errors: pass.take_errors(),
        });
    }

    debug!("semantic pass: running validation");
    if !pass.validate() {
        return Ok(PassOutcome {
            program: None,
            errors: pass.take_errors(),
        });
    }

    Ok(PassOutcome {
        program: pass.detach_program(),
        errors: pass.take_errors(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify<'a>(
        pass: &mut SemanticPass<'_, '_, 'a>,
        text: &'a str,
    ) -> ExpressionAtom {
        pass.classify_atom(&Ident::new(text, 0))
    }

    #[test]
    fn classification_covers_every_literal_form() {
        let pool = StringPool::new();
        let mut session = CompileSession::new("", "test.epoch");
        let mut pass = SemanticPass::new(&pool, &mut session);

        assert!(matches!(
            classify(&mut pass, "true"),
            ExpressionAtom::LiteralBoolean(true)
        ));
        assert!(matches!(
            classify(&mut pass, "false"),
            ExpressionAtom::LiteralBoolean(false)
        ));
        assert!(matches!(
            classify(&mut pass, "42"),
            ExpressionAtom::LiteralInteger(42)
        ));
        assert!(
            matches!(classify(&mut pass, "3.14"), ExpressionAtom::LiteralReal(value) if (value - 3.14).abs() < f32::EPSILON)
        );

        let atom = classify(&mut pass, "\"hello\"");
        let ExpressionAtom::LiteralString(handle) = atom else {
            panic!("expected string literal, got {atom:?}");
        };
        assert_eq!(pool.get(handle).as_deref(), Some("hello"));

        let atom = classify(&mut pass, "foo");
        let ExpressionAtom::Identifier { name, .. } = atom else {
            panic!("expected identifier, got {atom:?}");
        };
        assert_eq!(pool.get(name).as_deref(), Some("foo"));

        assert!(pass.errors.is_empty());
    }

    #[test]
    fn malformed_float_is_a_literal_parse_error() {
        let pool = StringPool::new();
        let mut session = CompileSession::new("", "test.epoch");
        let mut pass = SemanticPass::new(&pool, &mut session);

        classify(&mut pass, "3.x4");
        assert_eq!(pass.errors.len(), 1);
        assert_eq!(
            pass.errors.entries()[0].kind,
            ErrorKind::LiteralParseError
        );
    }

    #[test]
    fn string_unescaping_goes_through_the_pool() {
        let pool = StringPool::new();
        let mut session = CompileSession::new("", "test.epoch");
        let mut pass = SemanticPass::new(&pool, &mut session);

        let atom = classify(&mut pass, "\"line\\none\"");
        let ExpressionAtom::LiteralString(handle) = atom else {
            panic!("expected string literal");
        };
        assert_eq!(pool.get(handle).as_deref(), Some("line\none"));
    }
}
