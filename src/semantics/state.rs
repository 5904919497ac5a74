//! Parse states of the lowering state machine.

/// One frame of the state stack the pass maintains while walking the
/// AST. On node entry the pass pushes the matching state; on exit it
/// pops it and attaches the finished IR object by inspecting the newly
/// exposed top.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum State {
    /// Sentinel below everything else; never popped.
    Unknown,
    Program,
    Function,
    FunctionParam,
    FunctionReturn,
    FunctionSignature,
    FunctionSignatureParams,
    FunctionSignatureReturn,
    FunctionTag,
    Expression,
    ExpressionComponent,
    ExpressionComponentPrefixes,
    ExpressionFragment,
    Statement,
    PreOpStatement,
    PostOpStatement,
    Assignment,
    Initialization,
    CodeBlock,
    Entity,
    PostfixEntity,
    ChainedEntity,
    StructureFunction,
    StructureFunctionParams,
    StructureFunctionReturn,
}
