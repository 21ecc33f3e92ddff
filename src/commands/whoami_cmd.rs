use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandOutput};
use crate::error::ShellError;

pub const USAGE: &str = "Usage: whoami\n\nPrint the name of the shell user.";

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    fn name(&self) -> &'static str {
        "whoami"
    }

    async fn execute(&self, ctx: &mut CommandContext) -> Result<CommandOutput, ShellError> {
        Ok(CommandOutput::text(ctx.paths.user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{make_ctx, sample_fs};

    #[tokio::test]
    async fn test_whoami() {
        let mut ctx = make_ctx(sample_fs(), &[], &[]);
        let out = WhoamiCommand.execute(&mut ctx).await.unwrap();
        assert_eq!(out.stdout, "test");
    }
}
