//! Generic AST traversal.
//!
//! The traverser walks a [`Program`] in a fixed order per node kind and
//! hands every node to a pair of callbacks, entry before descending into
//! children and exit afterwards. Synthetic [`Marker`] nodes are injected
//! at a few places (function return expressions, unary prefix lists,
//! signature parameter lists) solely so that actions can maintain state;
//! the traverser attaches no semantic meaning to them.
//!
//! Callbacks return `Result` so that a contract violation can unwind the
//! walk; an action that receives a node kind it cannot place reports a
//! fatal internal error, because that means the traversal logic and the
//! action disagree about the grammar.

use crate::arena::{AstNode, Deferred};
use crate::ast::{
    AnyEntity, AnyStatement, Assignment, Ast, ChainedEntity, CodeBlock, CodeBlockEntry,
    ComponentInner, Entity, Expression, ExpressionComponent, ExpressionFragment,
    ExpressionOrAssignment, Function, FunctionParameter, FunctionReferenceSignature,
    FunctionReturn, FunctionTag, Ident, Initialization, LiteralToken, MetaEntity,
    NamedFunctionParameter, Parenthetical, PostfixEntity, PostOperatorStatement,
    PreOperatorStatement, Program, Statement, Structure, StructureMember,
    StructureMemberFunctionRef, StructureMemberVariable,
};
use crate::errors::Fatal;

pub type TraverseResult = Result<(), Fatal>;

/// Zero-data synthetic nodes injected into the traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    FunctionReturnExpression,
    ExpressionComponentPrefixes,
    FunctionSignatureParams,
    FunctionSignatureReturn,
    StructureFunctionParams,
    StructureFunctionReturn,
}

/// A borrowed view of any node kind the traverser can visit.
#[derive(Clone, Copy, Debug)]
pub enum AstNodeRef<'a, 'src> {
    Undefined,
    Program(&'a Program<'src>),
    Structure(&'a Structure<'src>),
    StructureMemberVariable(&'a StructureMemberVariable<'src>),
    StructureMemberFunctionRef(&'a StructureMemberFunctionRef<'src>),
    Function(&'a Function<'src>),
    FunctionParameter(&'a FunctionParameter<'src>),
    NamedFunctionParameter(&'a NamedFunctionParameter<'src>),
    FunctionReferenceSignature(&'a FunctionReferenceSignature<'src>),
    FunctionTag(&'a FunctionTag<'src>),
    Nothing,
    Identifier(&'a Ident<'src>),
    Literal(&'a LiteralToken<'src>),
    Expression(&'a Expression<'src>),
    ExpressionComponent(&'a ExpressionComponent<'src>),
    ExpressionFragment(&'a ExpressionFragment<'src>),
    Statement(&'a Statement<'src>),
    PreOperatorStatement(&'a PreOperatorStatement<'src>),
    PostOperatorStatement(&'a PostOperatorStatement<'src>),
    Assignment(&'a Assignment<'src>),
    Initialization(&'a Initialization<'src>),
    CodeBlock(&'a CodeBlock<'src>),
    Entity(&'a Entity<'src>),
    PostfixEntity(&'a PostfixEntity<'src>),
    ChainedEntity(&'a ChainedEntity<'src>),
    Marker(Marker),
}

/// Entry/exit actions driven by the traverser.
pub trait AstActions<'src> {
    fn enter(&mut self, node: AstNodeRef<'_, 'src>) -> TraverseResult;
    fn leave(&mut self, node: AstNodeRef<'_, 'src>) -> TraverseResult;
}

/// Walks a program over its arena.
pub struct Traverser<'ast, 'src> {
    ast: &'ast Ast<'src>,
}

impl<'ast, 'src> Traverser<'ast, 'src> {
    pub fn new(ast: &'ast Ast<'src>) -> Self {
        Traverser { ast }
    }

    pub fn traverse<A: AstActions<'src>>(
        &self,
        program: &Program<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        self.walk_program(program, actions)
    }

    fn node<T: AstNode<'src>>(&self, deferred: &Deferred<T>) -> Result<&'ast T, Fatal> {
        deferred
            .get(self.ast)
            .ok_or_else(|| Fatal::internal("empty deferred holder in a fully-parsed tree"))
    }

    fn leaf<A: AstActions<'src>>(
        &self,
        actions: &mut A,
        node: AstNodeRef<'_, 'src>,
    ) -> TraverseResult {
        actions.enter(node)?;
        actions.leave(node)
    }

    fn walk_program<A: AstActions<'src>>(
        &self,
        program: &Program<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Program(program))?;
        for entity in &program.meta_entities {
            match entity {
                MetaEntity::Undefined => self.leaf(actions, AstNodeRef::Undefined)?,
                MetaEntity::Structure(node) => self.walk_structure(self.node(node)?, actions)?,
                MetaEntity::Global(node) => self.walk_code_block(self.node(node)?, actions)?,
                MetaEntity::Function(node) => self.walk_function(self.node(node)?, actions)?,
            }
        }
        actions.leave(AstNodeRef::Program(program))
    }

    fn walk_structure<A: AstActions<'src>>(
        &self,
        structure: &Structure<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Structure(structure))?;
        for member in &structure.members {
            match member {
                StructureMember::Variable(variable) => {
                    self.leaf(actions, AstNodeRef::StructureMemberVariable(variable))?
                }
                StructureMember::FunctionRef(funcref) => {
                    self.walk_member_funcref(funcref, actions)?
                }
            }
        }
        actions.leave(AstNodeRef::Structure(structure))
    }

    fn walk_member_funcref<A: AstActions<'src>>(
        &self,
        funcref: &StructureMemberFunctionRef<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::StructureMemberFunctionRef(funcref))?;

        actions.enter(AstNodeRef::Marker(Marker::StructureFunctionParams))?;
        for ident in funcref.param_types.items(self.ast) {
            self.leaf(actions, AstNodeRef::Identifier(ident))?;
        }
        actions.leave(AstNodeRef::Marker(Marker::StructureFunctionParams))?;

        actions.enter(AstNodeRef::Marker(Marker::StructureFunctionReturn))?;
        if let Some(return_type) = &funcref.return_type {
            self.leaf(actions, AstNodeRef::Identifier(return_type))?;
        }
        actions.leave(AstNodeRef::Marker(Marker::StructureFunctionReturn))?;

        actions.leave(AstNodeRef::StructureMemberFunctionRef(funcref))
    }

    fn walk_function<A: AstActions<'src>>(
        &self,
        function: &Function<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Function(function))?;
        self.leaf(actions, AstNodeRef::Identifier(&function.name))?;

        for parameter in &function.parameters {
            self.walk_parameter(self.node(parameter)?, actions)?;
        }

        actions.enter(AstNodeRef::Marker(Marker::FunctionReturnExpression))?;
        match &function.return_value {
            FunctionReturn::Undefined => self.leaf(actions, AstNodeRef::Undefined)?,
            FunctionReturn::Expression(node) => self.walk_expression(self.node(node)?, actions)?,
            FunctionReturn::Initialization(node) => {
                self.walk_initialization(self.node(node)?, actions)?
            }
        }
        actions.leave(AstNodeRef::Marker(Marker::FunctionReturnExpression))?;

        if let Some(code) = &function.code {
            self.walk_code_block(self.node(code)?, actions)?;
        }

        if let Some(tags) = &function.tags {
            for tag in tags {
                self.walk_tag(tag, actions)?;
            }
        }

        actions.leave(AstNodeRef::Function(function))
    }

    fn walk_parameter<A: AstActions<'src>>(
        &self,
        parameter: &FunctionParameter<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::FunctionParameter(parameter))?;
        match parameter {
            FunctionParameter::Named(node) => {
                self.leaf(actions, AstNodeRef::NamedFunctionParameter(self.node(node)?))?
            }
            FunctionParameter::Patterned(node) => {
                self.walk_expression(self.node(node)?, actions)?
            }
            FunctionParameter::Signature(node) => self.walk_signature(self.node(node)?, actions)?,
            FunctionParameter::Nothing => self.leaf(actions, AstNodeRef::Nothing)?,
        }
        actions.leave(AstNodeRef::FunctionParameter(parameter))
    }

    fn walk_signature<A: AstActions<'src>>(
        &self,
        signature: &FunctionReferenceSignature<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::FunctionReferenceSignature(signature))?;

        actions.enter(AstNodeRef::Marker(Marker::FunctionSignatureParams))?;
        for ident in signature.param_types.items(self.ast) {
            self.leaf(actions, AstNodeRef::Identifier(ident))?;
        }
        actions.leave(AstNodeRef::Marker(Marker::FunctionSignatureParams))?;

        actions.enter(AstNodeRef::Marker(Marker::FunctionSignatureReturn))?;
        if let Some(return_type) = &signature.return_type {
            self.leaf(actions, AstNodeRef::Identifier(return_type))?;
        }
        actions.leave(AstNodeRef::Marker(Marker::FunctionSignatureReturn))?;

        actions.leave(AstNodeRef::FunctionReferenceSignature(signature))
    }

    fn walk_tag<A: AstActions<'src>>(
        &self,
        tag: &FunctionTag<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::FunctionTag(tag))?;
        for literal in &tag.parameters {
            self.leaf(actions, AstNodeRef::Literal(literal))?;
        }
        actions.leave(AstNodeRef::FunctionTag(tag))
    }

    fn walk_code_block<A: AstActions<'src>>(
        &self,
        block: &CodeBlock<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::CodeBlock(block))?;
        for entry in &block.entries {
            self.walk_block_entry(self.node(entry)?, actions)?;
        }
        actions.leave(AstNodeRef::CodeBlock(block))
    }

    fn walk_block_entry<A: AstActions<'src>>(
        &self,
        entry: &CodeBlockEntry<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        match entry {
            CodeBlockEntry::Undefined => self.leaf(actions, AstNodeRef::Undefined),
            CodeBlockEntry::Entity(AnyEntity::Undefined) => {
                self.leaf(actions, AstNodeRef::Undefined)
            }
            CodeBlockEntry::Entity(AnyEntity::Plain(node)) => {
                self.walk_entity(self.node(node)?, actions)
            }
            CodeBlockEntry::Entity(AnyEntity::Postfix(node)) => {
                self.walk_postfix_entity(self.node(node)?, actions)
            }
            CodeBlockEntry::Assignment(node) => self.walk_assignment(self.node(node)?, actions),
            CodeBlockEntry::Statement(AnyStatement::Undefined) => {
                self.leaf(actions, AstNodeRef::Undefined)
            }
            CodeBlockEntry::Statement(AnyStatement::PreOp(node)) => {
                self.walk_preop(self.node(node)?, actions)
            }
            CodeBlockEntry::Statement(AnyStatement::PostOp(node)) => {
                self.walk_postop(self.node(node)?, actions)
            }
            CodeBlockEntry::Statement(AnyStatement::Statement(node)) => {
                self.walk_statement(self.node(node)?, actions)
            }
            CodeBlockEntry::Statement(AnyStatement::Initialization(node)) => {
                self.walk_initialization(self.node(node)?, actions)
            }
            CodeBlockEntry::Inner(node) => self.walk_code_block(self.node(node)?, actions),
        }
    }

    fn walk_statement<A: AstActions<'src>>(
        &self,
        statement: &Statement<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Statement(statement))?;
        for param in &statement.params {
            self.walk_expression(self.node(param)?, actions)?;
        }
        actions.leave(AstNodeRef::Statement(statement))
    }

    fn walk_preop<A: AstActions<'src>>(
        &self,
        statement: &PreOperatorStatement<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::PreOperatorStatement(statement))?;
        for ident in statement.operand.items(self.ast) {
            self.leaf(actions, AstNodeRef::Identifier(ident))?;
        }
        actions.leave(AstNodeRef::PreOperatorStatement(statement))
    }

    fn walk_postop<A: AstActions<'src>>(
        &self,
        statement: &PostOperatorStatement<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::PostOperatorStatement(statement))?;
        for ident in statement.operand.items(self.ast) {
            self.leaf(actions, AstNodeRef::Identifier(ident))?;
        }
        actions.leave(AstNodeRef::PostOperatorStatement(statement))
    }

    fn walk_assignment<A: AstActions<'src>>(
        &self,
        assignment: &Assignment<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Assignment(assignment))?;
        for ident in assignment.lhs.items(self.ast) {
            self.leaf(actions, AstNodeRef::Identifier(ident))?;
        }
        match &assignment.rhs {
            ExpressionOrAssignment::Undefined => self.leaf(actions, AstNodeRef::Undefined)?,
            ExpressionOrAssignment::Expression(node) => {
                self.walk_expression(self.node(node)?, actions)?
            }
            ExpressionOrAssignment::Assignment(node) => {
                self.walk_assignment(self.node(node)?, actions)?
            }
        }
        actions.leave(AstNodeRef::Assignment(assignment))
    }

    fn walk_initialization<A: AstActions<'src>>(
        &self,
        initialization: &Initialization<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Initialization(initialization))?;
        for expression in &initialization.rhs {
            self.walk_expression(self.node(expression)?, actions)?;
        }
        actions.leave(AstNodeRef::Initialization(initialization))
    }

    fn walk_entity<A: AstActions<'src>>(
        &self,
        entity: &Entity<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Entity(entity))?;
        for param in &entity.parameters {
            self.walk_expression(self.node(param)?, actions)?;
        }
        self.walk_code_block(self.node(&entity.code)?, actions)?;
        for chained in &entity.chain {
            self.walk_chained_entity(self.node(chained)?, actions)?;
        }
        actions.leave(AstNodeRef::Entity(entity))
    }

    fn walk_chained_entity<A: AstActions<'src>>(
        &self,
        entity: &ChainedEntity<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::ChainedEntity(entity))?;
        self.leaf(actions, AstNodeRef::Identifier(&entity.identifier))?;
        for param in &entity.parameters {
            self.walk_expression(self.node(param)?, actions)?;
        }
        self.walk_code_block(self.node(&entity.code)?, actions)?;
        actions.leave(AstNodeRef::ChainedEntity(entity))
    }

    fn walk_postfix_entity<A: AstActions<'src>>(
        &self,
        entity: &PostfixEntity<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::PostfixEntity(entity))?;
        for param in &entity.parameters {
            self.walk_expression(self.node(param)?, actions)?;
        }
        self.walk_code_block(self.node(&entity.code)?, actions)?;
        self.leaf(actions, AstNodeRef::Identifier(&entity.postfix_identifier))?;
        for param in &entity.postfix_parameters {
            self.walk_expression(self.node(param)?, actions)?;
        }
        actions.leave(AstNodeRef::PostfixEntity(entity))
    }

    fn walk_expression<A: AstActions<'src>>(
        &self,
        expression: &Expression<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::Expression(expression))?;
        self.walk_component(self.node(&expression.first)?, actions)?;
        for fragment in &expression.remaining {
            self.walk_fragment(self.node(fragment)?, actions)?;
        }
        actions.leave(AstNodeRef::Expression(expression))
    }

    fn walk_fragment<A: AstActions<'src>>(
        &self,
        fragment: &ExpressionFragment<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::ExpressionFragment(fragment))?;
        self.walk_component(self.node(&fragment.component)?, actions)?;
        actions.leave(AstNodeRef::ExpressionFragment(fragment))
    }

    fn walk_component<A: AstActions<'src>>(
        &self,
        component: &ExpressionComponent<'src>,
        actions: &mut A,
    ) -> TraverseResult {
        actions.enter(AstNodeRef::ExpressionComponent(component))?;

        actions.enter(AstNodeRef::Marker(Marker::ExpressionComponentPrefixes))?;
        for prefix in component.unary_prefixes.items(self.ast) {
            self.leaf(actions, AstNodeRef::Identifier(prefix))?;
        }
        actions.leave(AstNodeRef::Marker(Marker::ExpressionComponentPrefixes))?;

        match &component.inner {
            ComponentInner::Undefined => self.leaf(actions, AstNodeRef::Undefined)?,
            ComponentInner::Identifier(ident) => {
                self.leaf(actions, AstNodeRef::Identifier(ident))?
            }
            ComponentInner::Literal(literal) => self.leaf(actions, AstNodeRef::Literal(literal))?,
            ComponentInner::Statement(node) => self.walk_statement(self.node(node)?, actions)?,
            ComponentInner::Parenthetical(parenthetical) => match parenthetical {
                Parenthetical::Undefined => self.leaf(actions, AstNodeRef::Undefined)?,
                Parenthetical::PreOp(node) => self.walk_preop(self.node(node)?, actions)?,
                Parenthetical::PostOp(node) => self.walk_postop(self.node(node)?, actions)?,
                Parenthetical::Expression(node) => {
                    self.walk_expression(self.node(node)?, actions)?
                }
            },
        }

        actions.leave(AstNodeRef::ExpressionComponent(component))
    }
}
