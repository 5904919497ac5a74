//! IR functions, their parameter forms and tags.

use indexmap::IndexMap;

use crate::ir::{IrCodeBlock, IrExpression, IrInitialization, TypeId};
use crate::pool::StringHandle;

/// A literal argument attached to a function tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TagArgument {
    Integer(i32),
    UnsignedInteger(u32),
    Real(f32),
    String(StringHandle),
    Boolean(bool),
}

/// A lowered function tag.
#[derive(Clone, Debug)]
pub struct IrFunctionTag {
    pub name: StringHandle,
    pub arguments: Vec<TagArgument>,
    pub site: Option<crate::errors::SourceSite>,
}

/// One lowered function parameter.
#[derive(Clone, Debug)]
pub enum IrFunctionParam {
    Named {
        type_name: StringHandle,
        is_reference: bool,
    },
    /// A pattern-matched value; the expression is the pattern.
    Patterned(IrExpression),
    /// A higher-order function reference with the given signature.
    FunctionRef {
        param_types: Vec<StringHandle>,
        return_type: Option<StringHandle>,
    },
    Nothing,
}

impl IrFunctionParam {
    /// Whether the parameter binds a local variable in the function's
    /// scope.
    pub fn is_local_variable(&self) -> bool {
        matches!(
            self,
            IrFunctionParam::Named { .. } | IrFunctionParam::FunctionRef { .. }
        )
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, IrFunctionParam::Named { is_reference: true, .. })
    }
}

/// A lowered function definition, keyed in the program by its overload
/// handle. Parameters preserve declaration order.
#[derive(Clone, Debug, Default)]
pub struct IrFunction {
    pub name: StringHandle,
    parameters: IndexMap<StringHandle, IrFunctionParam>,
    pub return_expression: Option<IrExpression>,
    pub return_initialization: Option<IrInitialization>,
    pub tags: Vec<IrFunctionTag>,
    code: Option<IrCodeBlock>,
}

impl IrFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: StringHandle) {
        self.name = name;
    }

    pub fn add_parameter(&mut self, name: StringHandle, param: IrFunctionParam) {
        self.parameters.insert(name, param);
    }

    pub fn parameters(&self) -> &IndexMap<StringHandle, IrFunctionParam> {
        &self.parameters
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = StringHandle> + '_ {
        self.parameters.keys().copied()
    }

    pub fn parameter(&self, name: StringHandle) -> Option<&IrFunctionParam> {
        self.parameters.get(&name)
    }

    pub fn set_code(&mut self, code: IrCodeBlock) {
        self.code = Some(code);
    }

    pub fn code(&self) -> Option<&IrCodeBlock> {
        self.code.as_ref()
    }

    pub fn code_mut(&mut self) -> Option<&mut IrCodeBlock> {
        self.code.as_mut()
    }

    /// The parameter's type for overload matching, resolved through the
    /// given type table lookup.
    pub fn parameter_type(
        &self,
        name: StringHandle,
        lookup: impl Fn(StringHandle) -> TypeId,
    ) -> TypeId {
        match self.parameters.get(&name) {
            Some(IrFunctionParam::Named { type_name, .. }) => lookup(*type_name),
            Some(IrFunctionParam::FunctionRef { .. }) => TypeId::Function,
            Some(IrFunctionParam::Patterned(expression)) => expression.ty(),
            Some(IrFunctionParam::Nothing) => TypeId::Void,
            None => TypeId::Error,
        }
    }

    /// Whether any parameter is a literal pattern; such overloads must
    /// agree on arity with their siblings.
    pub fn has_patterned_parameter(&self) -> bool {
        self.parameters
            .values()
            .any(|param| matches!(param, IrFunctionParam::Patterned(_)))
    }
}
