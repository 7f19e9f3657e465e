//! Runs an entry artifact as a WebAssembly module.
//!
//! The entry artifact's bytes are compiled with wasmtime and its `run`
//! export is invoked (`_start` as a fallback). Process arguments are
//! exposed through three host imports in the `modweave` namespace:
//!
//! - `arg_count() -> i32` - number of arguments
//! - `arg_len(index: i32) -> i32` - byte length of one argument, or -1
//! - `arg_copy(index: i32, ptr: i32) -> i32` - copy one argument into
//!   the module's exported `memory` at `ptr`, returning the bytes
//!   written, or -1

use tracing::debug;
use wasmtime::{Caller, Engine, Extern, Linker, Module, Store};

use modweave_loader::Artifact;

use crate::error::HostError;

struct RunState {
    args: Vec<String>,
}

/// Compiles and runs entry artifacts.
pub struct WasmRunner {
    engine: Engine,
}

impl WasmRunner {
    /// A runner with default engine configuration.
    pub fn new() -> Self {
        Self {
            engine: Engine::default(),
        }
    }

    /// Run the artifact's entry export with the given arguments.
    pub fn run(&self, artifact: &Artifact, args: &[String]) -> Result<(), HostError> {
        debug!(artifact = %artifact.name(), args = args.len(), "running entry artifact");
        let module = Module::new(&self.engine, artifact.bytes())
            .map_err(|e| HostError::run("compile", e))?;

        let mut linker: Linker<RunState> = Linker::new(&self.engine);
        Self::link_args(&mut linker)?;

        let state = RunState {
            args: args.to_vec(),
        };
        let mut store = Store::new(&self.engine, state);
        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| HostError::run("instantiate", e))?;

        let entry = instance
            .get_typed_func::<(), ()>(&mut store, "run")
            .or_else(|_| instance.get_typed_func::<(), ()>(&mut store, "_start"))
            .map_err(|e| HostError::run("entry lookup", e))?;
        entry
            .call(&mut store, ())
            .map_err(|e| HostError::run("run", e))
    }

    fn link_args(linker: &mut Linker<RunState>) -> Result<(), HostError> {
        linker
            .func_wrap("modweave", "arg_count", |caller: Caller<'_, RunState>| {
                caller.data().args.len() as i32
            })
            .map_err(|e| HostError::run("link", e))?;
        linker
            .func_wrap(
                "modweave",
                "arg_len",
                |caller: Caller<'_, RunState>, index: i32| -> i32 {
                    caller
                        .data()
                        .args
                        .get(index as usize)
                        .map_or(-1, |arg| arg.len() as i32)
                },
            )
            .map_err(|e| HostError::run("link", e))?;
        linker
            .func_wrap(
                "modweave",
                "arg_copy",
                |mut caller: Caller<'_, RunState>, index: i32, ptr: i32| -> i32 {
                    let Some(arg) = caller.data().args.get(index as usize).cloned() else {
                        return -1;
                    };
                    let Some(Extern::Memory(memory)) = caller.get_export("memory") else {
                        return -1;
                    };
                    match memory.write(&mut caller, ptr as usize, arg.as_bytes()) {
                        Ok(()) => arg.len() as i32,
                        Err(_) => -1,
                    }
                },
            )
            .map_err(|e| HostError::run("link", e))?;
        Ok(())
    }
}

impl Default for WasmRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// The driver-side view of a loaded entry artifact.
pub trait RunEntry {
    /// Run the artifact's entry export with the given arguments.
    fn run(&self, args: &[String]) -> Result<(), HostError>;
}

impl RunEntry for Artifact {
    fn run(&self, args: &[String]) -> Result<(), HostError> {
        WasmRunner::new().run(self, args)
    }
}
