use std::path::Path;

use launchpad_common::{Error, Result};
use tracing::debug;
use wasmtime::{Config, Engine, ExternType, Linker, Module, Store};

/// Name of the action every procedural descriptor must export.
pub const UP_EXPORT: &str = "up";

/// Compiles and runs procedural descriptors: WebAssembly modules (binary or
/// text format) exporting `up: () -> ()`.
///
/// Modules are instantiated without imports. Each `up` call gets a fresh
/// store with `fuel` units of fuel; running out is a trap.
pub struct ProceduralRunner {
    engine: Engine,
    fuel: u64,
}

impl ProceduralRunner {
    pub fn new(fuel: u64) -> Result<Self> {
        let mut config = Config::new();
        config.consume_fuel(true);

        let engine = Engine::new(&config)
            .map_err(|e| Error::Configuration(format!("wasm engine error: {e}")))?;

        Ok(Self { engine, fuel })
    }

    /// Load the module at `path` and call its `up` export to completion.
    pub fn run(&self, id: &str, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path).map_err(|e| Error::execution(id, e))?;
        let module = self.compile(id, &bytes)?;

        let mut store = Store::new(&self.engine, ());
        store
            .set_fuel(self.fuel)
            .map_err(|e| Error::execution(id, format!("failed to set fuel: {e}")))?;

        let linker: Linker<()> = Linker::new(&self.engine);
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| Error::execution(id, format!("instantiation error: {e:#}")))?;

        let up = instance
            .get_typed_func::<(), ()>(&mut store, UP_EXPORT)
            .map_err(|e| malformed(id, format!("`{UP_EXPORT}` is not callable: {e}")))?;

        up.call(&mut store, ())
            .map_err(|e| Error::execution(id, format!("{e:#}")))?;

        let remaining = store.get_fuel().unwrap_or(0);
        debug!(
            "{id}: `{UP_EXPORT}` returned, {} fuel used",
            self.fuel.saturating_sub(remaining)
        );
        Ok(())
    }

    /// Compile `bytes` and check the `up` export without running anything.
    fn compile(&self, id: &str, bytes: &[u8]) -> Result<Module> {
        let module = Module::new(&self.engine, bytes)
            .map_err(|e| malformed(id, format!("not a valid wasm module: {e:#}")))?;

        match module.get_export(UP_EXPORT) {
            Some(ExternType::Func(ty)) => {
                if ty.params().next().is_some() || ty.results().next().is_some() {
                    return Err(malformed(
                        id,
                        format!("`{UP_EXPORT}` must take no parameters and return nothing"),
                    ));
                }
            }
            Some(_) => {
                return Err(malformed(
                    id,
                    format!("export `{UP_EXPORT}` is not a function"),
                ));
            }
            None => {
                return Err(malformed(
                    id,
                    format!("module must export an `{UP_EXPORT}` function"),
                ));
            }
        }

        Ok(module)
    }
}

fn malformed(id: &str, reason: String) -> Error {
    Error::MalformedMigration {
        id: id.to_string(),
        reason,
    }
}
