use super::selector::{looks_like_path, MatchKind, SelectorChain};
use crate::command::{Command, ExecutionOutcome, Payload};
use crate::dom::ExecutionContext;

/// Stateless executor for commands against a window
#[derive(Debug, Clone, Default)]
pub struct CommandPlayer {
    selectors: SelectorChain,
}

impl CommandPlayer {
    pub fn new(selectors: SelectorChain) -> Self {
        Self { selectors }
    }

    pub fn execute(&self, command: &Command, ctx: &ExecutionContext<'_>) -> ExecutionOutcome {
        let Payload::Activate(activate) = &command.payload else {
            return command.execute(ctx);
        };

        if let Some(node) = self
            .selectors
            .resolve_with(MatchKind::ActivationId, &activate.selector, ctx.document)
        {
            ctx.document.click(node);
            return ExecutionOutcome::Activated(node);
        }

        let target = activate.target.as_deref().unwrap_or(&activate.selector);
        if let Some((kind, node)) = self.selectors.resolve(target, ctx.document) {
            tracing::debug!("Resolved {:?} via {:?}", target, kind);
            ctx.document.click(node);
            return ExecutionOutcome::Activated(node);
        }

        if looks_like_path(target) {
            tracing::debug!("No element for {:?}, navigating instead", target);
            ctx.window.navigate(target);
            return ExecutionOutcome::Navigated(target.to_string());
        }

        tracing::debug!("No element for {:?}, skipping", target);
        ExecutionOutcome::Skipped
    }

    pub fn execute_all(&self, commands: &[Command], ctx: &ExecutionContext<'_>) -> Vec<ExecutionOutcome> {
        commands.iter().map(|command| self.execute(command, ctx)).collect()
    }
}
