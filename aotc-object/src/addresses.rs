//! Reads a linked object's own symbol table back out (§6.2 steps 5-6:
//! the universal section's type-wrapper and code-function address
//! tables), so the packager never has to track offsets itself as it
//! appends symbols in [`crate::codegen`].

use std::collections::HashMap;

use object::{Object, ObjectSymbol};

use crate::error::{ObjectError, ObjectResult};

/// Maps every named symbol in `object_bytes` to its address.
pub fn resolve_symbol_addresses(object_bytes: &[u8]) -> ObjectResult<HashMap<String, u64>> {
    let file = object::read::File::parse(object_bytes).map_err(|e| ObjectError::Read(e.to_string()))?;
    let mut map = HashMap::new();
    for symbol in file.symbols() {
        if let Ok(name) = symbol.name() {
            if !name.is_empty() {
                map.insert(name.to_string(), symbol.address());
            }
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{emit_object, CompiledSymbol};

    #[test]
    fn resolves_every_emitted_function_symbol() {
        let triple: target_lexicon::Triple = "x86_64-unknown-linux-gnu".parse().unwrap();
        let functions = vec![CompiledSymbol { name: "f0".into(), bytes: vec![0x0f, 0x0b] }];
        let artifact = emit_object(&triple, *b"AOT1", &functions).unwrap();
        let addresses = resolve_symbol_addresses(&artifact.bytes).unwrap();
        assert!(addresses.contains_key("f0"));
        assert!(addresses.contains_key("version"));
    }
}
