//! IR entities.

use crate::errors::SourceSite;
use crate::ir::{IrCodeBlock, IrExpression};
use crate::pool::StringHandle;

/// Numeric tag an entity registry assigns to each known entity name; the
/// virtual machine dispatches on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityTag(pub u32);

/// A lowered entity invocation. Chained entities (`elseif`, `else`) hang
/// off the `chain` of their outer entity in declaration order; postfix
/// entities record their closer under `postfix_name`.
#[derive(Clone, Debug)]
pub struct IrEntity {
    pub name: StringHandle,
    pub tag: Option<EntityTag>,
    pub postfix_name: Option<StringHandle>,
    pub parameters: Vec<IrExpression>,
    pub code: Option<IrCodeBlock>,
    pub chain: Vec<IrEntity>,
    pub site: Option<SourceSite>,
}

impl IrEntity {
    pub fn new(name: StringHandle) -> Self {
        IrEntity {
            name,
            tag: None,
            postfix_name: None,
            parameters: Vec::new(),
            code: None,
            chain: Vec::new(),
            site: None,
        }
    }

    pub fn add_parameter(&mut self, expression: IrExpression) {
        self.parameters.push(expression);
    }

    pub fn set_code(&mut self, code: IrCodeBlock) {
        self.code = Some(code);
    }

    pub fn add_chained(&mut self, entity: IrEntity) {
        self.chain.push(entity);
    }
}
