use crate::{Func, InjectError, InjectResult, StructInfo, Type, Value};
use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
};

/// A primitive telling the engine how to produce or project a value from the
/// values it has already resolved.
#[derive(Clone, PartialEq, Debug)]
pub enum Valuer {
    /// Ignores its input and produces a constant.
    Const(Value),
    /// Produces its only input, or zero if there is none.
    Identity,
    /// Projects an item of a tuple.
    Index(usize),
    /// Projects a field of a record.
    Field(String),
    /// Selects one of its inputs by position.
    Param(usize),
    /// Calls a function with its inputs as arguments.
    Func(Func),
    /// Builds a struct, pairing each input with a field name.
    Struct(StructInfo, Vec<String>),
    /// Collects its inputs into a sequence of the given element type.
    Collector(Type),
}

impl Valuer {
    pub fn call(&self, args: &[Value]) -> InjectResult<Value> {
        match self {
            Valuer::Const(value) => Ok(value.clone()),
            Valuer::Identity => Ok(args.first().cloned().unwrap_or(Value::Zero)),
            Valuer::Index(index) => {
                let items = match args {
                    [Value::Tuple(items)] => items.as_slice(),
                    _ => args,
                };
                items.get(*index).cloned().ok_or_else(|| {
                    InjectError::InternalError(format!(
                        "index {} is out of range for {} values",
                        index,
                        items.len()
                    ))
                })
            }
            Valuer::Field(name) => {
                Ok(args.first().map_or(Value::Zero, |record| record.field(name)))
            }
            Valuer::Param(index) => args.get(*index).cloned().ok_or_else(|| {
                InjectError::InternalError(format!(
                    "parameter {} is out of range for {} arguments",
                    index,
                    args.len()
                ))
            }),
            Valuer::Func(func) => {
                let outputs = catch_unwind(AssertUnwindSafe(|| func.invoke(args)))
                    .map_err(|payload| InjectError::FunctionPanicked {
                        function: func.name().to_owned(),
                        message: panic_message(payload.as_ref()),
                    })??;
                Ok(Value::Tuple(outputs))
            }
            Valuer::Struct(info, fields) => {
                let record = Value::Record(
                    fields.iter().cloned().zip(args.iter().cloned()).collect(),
                );
                info.build(&record).map(Value::Service)
            }
            Valuer::Collector(_) => Ok(Value::Seq(args.to_vec())),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
