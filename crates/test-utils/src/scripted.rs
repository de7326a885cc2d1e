use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use labrun::{Context, Parameters, Procedure, ProcedureRegistry, Topic};
use serde_json::Value;

/// One step of a scripted procedure.
#[derive(Debug, Clone)]
pub enum Step {
    /// Emit a `results` record.
    Record(Value),
    /// Emit a `progress` value.
    Progress(f64),
    Sleep(Duration),
    /// `tracing::info!` from inside the procedure.
    Log(String),
    /// `ctx.emit(topic, payload)` on an arbitrary topic.
    Emit(Topic, Value),
    /// Return `Ok(())` early if a stop was requested.
    ReturnIfStopped,
    /// `ctx.check_stop()?`, i.e. unwind with `Cancelled` if stopped.
    CheckStop,
    /// Emit a record every `interval` until stopped, then return `Ok(())`.
    StreamUntilStopped { interval: Duration },
    Fail(String),
    Panic(String),
}

/// Hooks a scripted procedure went through, shared with the test.
#[derive(Debug, Clone, Default)]
pub struct HookTrace {
    inner: Arc<Mutex<Vec<&'static str>>>,
}

impl HookTrace {
    fn push(&self, hook: &'static str) {
        self.inner.lock().unwrap().push(hook);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.inner.lock().unwrap().clone()
    }
}

/// A procedure that replays a fixed list of steps.
#[derive(Debug, Clone)]
pub struct ScriptedProcedure {
    steps: Vec<Step>,
    invalid: Option<String>,
    fail_startup: Option<String>,
    trace: HookTrace,
}

impl Procedure for ScriptedProcedure {
    fn name(&self) -> &str {
        "ScriptedProcedure"
    }

    fn check_parameters(&self) -> anyhow::Result<()> {
        if let Some(reason) = &self.invalid {
            bail!("{reason}");
        }
        Ok(())
    }

    fn startup(&mut self, _ctx: &Context) -> anyhow::Result<()> {
        self.trace.push("startup");
        if let Some(reason) = &self.fail_startup {
            bail!("{reason}");
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &Context) -> anyhow::Result<()> {
        self.trace.push("execute");
        let mut counter = 0u64;
        for step in self.steps.clone() {
            match step {
                Step::Record(record) => ctx.emit_result(record),
                Step::Progress(p) => ctx.emit_progress(p),
                Step::Sleep(d) => std::thread::sleep(d),
                Step::Log(line) => tracing::info!("{line}"),
                Step::Emit(topic, payload) => ctx.emit(topic, payload),
                Step::ReturnIfStopped => {
                    if ctx.should_stop() {
                        return Ok(());
                    }
                }
                Step::CheckStop => ctx.check_stop()?,
                Step::StreamUntilStopped { interval } => {
                    while !ctx.should_stop() {
                        ctx.emit_result(serde_json::json!({ "i": counter }));
                        counter += 1;
                        std::thread::sleep(interval);
                    }
                    return Ok(());
                }
                Step::Fail(reason) => bail!("{reason}"),
                Step::Panic(reason) => panic!("{reason}"),
            }
        }
        Ok(())
    }

    fn shutdown(&mut self, _ctx: &Context) -> anyhow::Result<()> {
        self.trace.push("shutdown");
        Ok(())
    }
}

/// Builder for [`ScriptedProcedure`].
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    steps: Vec<Step>,
    invalid: Option<String>,
    fail_startup: Option<String>,
    trace: HookTrace,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn record(self, record: Value) -> Self {
        self.step(Step::Record(record))
    }

    pub fn progress(self, percent: f64) -> Self {
        self.step(Step::Progress(percent))
    }

    pub fn sleep_ms(self, ms: u64) -> Self {
        self.step(Step::Sleep(Duration::from_millis(ms)))
    }

    pub fn stream_until_stopped(self, interval_ms: u64) -> Self {
        self.step(Step::StreamUntilStopped {
            interval: Duration::from_millis(interval_ms),
        })
    }

    pub fn emit(self, topic: Topic, payload: Value) -> Self {
        self.step(Step::Emit(topic, payload))
    }

    pub fn log(self, line: &str) -> Self {
        self.step(Step::Log(line.to_string()))
    }

    pub fn fail(self, reason: &str) -> Self {
        self.step(Step::Fail(reason.to_string()))
    }

    pub fn panic(self, reason: &str) -> Self {
        self.step(Step::Panic(reason.to_string()))
    }

    /// Make `check_parameters` reject the procedure.
    pub fn invalid(mut self, reason: &str) -> Self {
        self.invalid = Some(reason.to_string());
        self
    }

    pub fn fail_startup(mut self, reason: &str) -> Self {
        self.fail_startup = Some(reason.to_string());
        self
    }

    pub fn trace(&self) -> HookTrace {
        self.trace.clone()
    }

    pub fn build(self) -> ScriptedProcedure {
        ScriptedProcedure {
            steps: self.steps,
            invalid: self.invalid,
            fail_startup: self.fail_startup,
            trace: self.trace,
        }
    }

    /// Registry with this script registered under `id`.
    pub fn registry(self, id: &str) -> ProcedureRegistry {
        let mut registry = ProcedureRegistry::new();
        registry.register(
            id,
            move |_params: &Parameters| -> anyhow::Result<Box<dyn Procedure>> {
                Ok(Box::new(self.clone().build()))
            },
        );
        registry
    }
}
