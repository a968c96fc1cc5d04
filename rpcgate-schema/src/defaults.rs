use serde_json::Value as JsonValue;

use crate::Schema;

/// Fill in declared defaults for top-level properties that `params` doesn't provide.
///
/// `schema` should already have its composition resolved (see
/// [`crate::resolve_composition`]) so that defaults inherited from base schemas are seen.
/// A property that is present with a `null` value counts as provided.  Nested objects are not
/// defaulted, and if `params` is not an object it's left alone.
///
/// Returns the number of properties that were filled in.
pub fn inject_defaults(params: &mut JsonValue, schema: &Schema) -> usize {
    let Some(object) = params.as_object_mut() else {
        return 0;
    };

    let mut injected = 0;
    for (name, property) in &schema.properties {
        let Some(default) = &property.default else {
            continue;
        };

        if !object.contains_key(name) {
            tracing::trace!(property = %name, %default, "Injecting default value");
            object.insert(name.clone(), default.clone());
            injected += 1;
        }
    }

    injected
}
