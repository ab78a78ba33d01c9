//! The tool invocation adapter: validate → build → execute → normalize.

mod builtin;
pub mod error;
pub mod execute;
pub mod normalize;
pub mod plan;
pub mod spec;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

pub use error::AdapterError;
pub use execute::{run_pipeline, ExecLimits, Launcher, RawOutput, ResolvedCommand, SystemLauncher};
pub use normalize::normalize;
pub use plan::{build_command, CommandPlan, HttpRequestPlan, PlanArg, ProcessStage};
pub use spec::{
    Action, BodyTemplate, Builtin, CommandTemplate, Condition, Constraint, HttpMethod,
    HttpTemplate, JsonField, OutputFormat, ParamSpec, ParamType, Segment, SuccessPolicy, ToolSpec,
};
pub use validate::{validate, ValidatedParams};

use crate::config::ServerConfig;
use crate::protocol::Outcome;
use crate::session::SessionRegistry;

/// Read-only state an invocation may consult.
#[derive(Clone, Copy)]
pub struct InvocationContext<'a> {
    pub config: &'a ServerConfig,
    pub sessions: &'a SessionRegistry,
}

pub struct ToolAdapter {
    launcher: Arc<dyn Launcher>,
}

impl ToolAdapter {
    pub fn new(launcher: Arc<dyn Launcher>) -> Self {
        Self { launcher }
    }

    /// Adapter backed by real processes and HTTP.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemLauncher::new()))
    }

    /// Run one tool call end to end. Never fails: every error becomes a
    /// failed [`Outcome`].
    pub async fn invoke(
        &self,
        spec: &ToolSpec,
        args: Option<&Value>,
        ctx: InvocationContext<'_>,
    ) -> Outcome {
        match self.try_invoke(spec, args, ctx).await {
            Ok(data) => {
                info!(tool = %spec.name, "tool call succeeded");
                Outcome::success(data)
            }
            Err(err) => {
                warn!(tool = %spec.name, kind = %err.kind(), "tool call failed: {err}");
                err.into()
            }
        }
    }

    async fn try_invoke(
        &self,
        spec: &ToolSpec,
        args: Option<&Value>,
        ctx: InvocationContext<'_>,
    ) -> Result<Value, AdapterError> {
        let params = validate(args, spec)?;
        let plan = build_command(&params, &spec.action, &ctx.config.vars)?;
        debug!(tool = %spec.name, plan = %plan.describe(), "built command plan");

        let timeout = spec.timeout.unwrap_or(ctx.config.tool_timeout);
        let raw = self.execute(&plan, timeout, ctx).await?;
        normalize(raw, &spec.success, &spec.output)
    }

    /// Run a plan under `timeout`, measured across all of its stages.
    pub async fn execute(
        &self,
        plan: &CommandPlan,
        timeout: Duration,
        ctx: InvocationContext<'_>,
    ) -> Result<RawOutput, AdapterError> {
        let limits = ExecLimits::new(timeout, ctx.config.max_output_bytes);
        match plan {
            CommandPlan::Process { stages } => {
                run_pipeline(stages, self.launcher.as_ref(), &ctx.config.env, &limits).await
            }
            CommandPlan::Http(request) => self.launcher.send_http(request, &limits).await,
            CommandPlan::Builtin { op, params } => {
                builtin::run(*op, params, ctx.sessions).map(RawOutput::Value)
            }
        }
    }
}
