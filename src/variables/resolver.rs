//! Read path of the variable table.

use std::sync::Arc;

use super::{hash_key, VariableDescriptor, VariableValue};
use crate::context::RequestContext;

/// Looks up a variable by name and returns its value for the request.
///
/// Indexed variables are cached in the request's slot until their value is flagged
/// `no_cacheable`; other variables are computed on every call. Names without a descriptor
/// are tried against the prefix variables. Returns `None` when no descriptor serves the name
/// or its getter could not produce a value; a value with `not_found` set is returned as is.
pub fn get_variable(context: &mut RequestContext, name: &str) -> Option<VariableValue> {
    let (hash, key) = hash_key(name);
    let server = Arc::clone(&context.server);
    let table = &server.variables;

    match table.find(hash, &key) {
        Some(descriptor) => match descriptor.index {
            Some(index) => get_flushed(context, descriptor, index, &key),
            None => compute(context, descriptor, &key),
        },
        None => match table.find_prefix(&key) {
            Some(descriptor) => compute(context, descriptor, &key),
            None => None,
        },
    }
}

/// Reads a variable for a script. Unknown variables and variables without a value are
/// logged and give `None`.
pub fn var_get(context: &mut RequestContext, name: &str) -> Option<Vec<u8>> {
    match get_variable(context, name) {
        None => {
            log_error!("var_get", "{} is NULL", name);
            None
        }
        Some(value) if value.not_found => {
            log_error!("var_get", "{} not found", name);
            None
        }
        Some(value) => Some(value.data),
    }
}

fn compute(
    context: &RequestContext,
    descriptor: &VariableDescriptor,
    key: &str,
) -> Option<VariableValue> {
    let handler = descriptor.get_handler.as_ref()?;
    handler(context, key, descriptor.data).map(|mut value| {
        if descriptor.no_cacheable {
            value.no_cacheable = true;
        }
        value
    })
}

fn get_indexed(
    context: &mut RequestContext,
    descriptor: &VariableDescriptor,
    index: usize,
    key: &str,
) -> Option<VariableValue> {
    let cached = context.variables.get(index)?;
    if cached.valid || cached.not_found {
        return Some(cached.clone());
    }

    let computed = compute(context, descriptor, key);
    let slot = &mut context.variables[index];
    match computed {
        Some(value) => {
            *slot = value;
            slot.valid = !slot.not_found;
            Some(slot.clone())
        }
        None => {
            slot.valid = false;
            slot.not_found = true;
            None
        }
    }
}

fn get_flushed(
    context: &mut RequestContext,
    descriptor: &VariableDescriptor,
    index: usize,
    key: &str,
) -> Option<VariableValue> {
    if let Some(slot) = context.variables.get_mut(index) {
        if slot.valid || slot.not_found {
            if !slot.no_cacheable && !descriptor.no_cacheable {
                return Some(slot.clone());
            }
            trace!("flushing non cacheable variable '{}'", key);
            slot.valid = false;
            slot.not_found = false;
        }
    }
    get_indexed(context, descriptor, index, key)
}
