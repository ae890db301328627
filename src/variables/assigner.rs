//! Write path of the variable table.

use std::sync::Arc;

use super::{hash_key, VariableValue};
use crate::{context::RequestContext, copy_bytes};

/// Assigns `value` to the named variable and returns the stored bytes.
///
/// Only variables flagged changeable can be assigned. A variable with a setter gets a fresh
/// value handed to the setter; otherwise the value is written to the variable's request
/// slot. Unknown, read-only and slotless variables are logged and give `None` without
/// touching the request. A stored value is always valid, found and cacheable.
pub fn var_set(context: &mut RequestContext, name: &str, value: &[u8]) -> Option<Vec<u8>> {
    let data = match copy_bytes(value, value.len()) {
        Ok(data) => data,
        Err(err) => {
            log_error!("var_set", "{}", err);
            return None;
        }
    };

    let (hash, key) = hash_key(name);
    let server = Arc::clone(&context.server);
    let descriptor = match server.variables.find(hash, &key) {
        Some(descriptor) => descriptor,
        None => {
            log_error!("var_set", "{} is not found", name);
            return None;
        }
    };

    if !descriptor.changeable {
        log_error!("var_set", "{} not changeable", name);
        return None;
    }

    let stored = if let Some(handler) = &descriptor.set_handler {
        let assigned = VariableValue::new(data);
        handler(context, &assigned, descriptor.data);
        assigned.data
    } else if let Some(slot) = descriptor
        .index
        .and_then(|index| context.variables.get_mut(index))
    {
        *slot = VariableValue::new(data);
        slot.data.clone()
    } else {
        log_error!("var_set", "{} is not assigned", name);
        return None;
    };

    log_info!(
        "var_set",
        "set variable key:{} val:{}",
        name,
        String::from_utf8_lossy(&stored)
    );
    Some(stored)
}
